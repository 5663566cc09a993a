//! Environment variable configuration handling

use crate::config::AppConfig;
use crate::error::ConfigError;
use std::env;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "VSPHERE_ADMIN_";

/// Apply environment variable configuration over base configuration
pub fn apply_env_config(base_config: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_env_from(base_config, |name| env::var(name).ok())
}

/// Apply configuration from any variable source keyed by full variable name
pub fn apply_env_from<F>(mut base_config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

    if let Some(host) = var("HOST") {
        base_config.connection.host = host;
    }

    if let Some(port) = var("PORT") {
        base_config.connection.port = parse_port(&port)?;
    }

    if let Some(user) = var("USER") {
        base_config.connection.user = user;
    }

    if let Some(password) = var("PASSWORD") {
        base_config.connection.password = Some(password);
    }

    if let Some(path) = var("INVENTORY") {
        base_config.inventory_path = path;
    }

    if let Some(level) = var("LOG_LEVEL") {
        base_config.log_level = level;
    }

    Ok(base_config)
}

/// Parse a TCP port, rejecting 0
pub fn parse_port(port_str: &str) -> Result<u16, ConfigError> {
    let port = port_str
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidFormat(format!("Invalid port: '{}'", port_str)))?;

    if port == 0 {
        return Err(ConfigError::InvalidFormat(
            "Invalid port: 0 is not a usable port".to_string(),
        ));
    }

    Ok(port)
}

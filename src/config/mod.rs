//! Configuration management module
//!
//! Handles loading configuration from multiple sources with proper precedence:
//! CLI arguments > environment variables > TOML files > defaults

use crate::error::ConfigError;
use crate::vsphere::Credentials;

pub mod cli;
pub mod env;
pub mod toml;

/// Default HTTPS port of the management endpoint
pub const DEFAULT_PORT: u16 = 443;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub inventory_path: String,
    pub log_level: String,
}

/// Management endpoint connection settings
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                port: DEFAULT_PORT,
                ..Default::default()
            },
            inventory_path: "inventory.json".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Build the effective configuration for a run
    pub fn load(cli: &cli::CliArgs) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(ref path) = cli.config {
            config = self::toml::load_toml_config(path)?.apply_to_config(config)?;
        }

        config = self::env::apply_env_config(config)?;
        cli.apply_to_config(config)
    }

    /// Check that everything needed to open a session is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.host.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "host".to_string(),
            });
        }

        if self.connection.user.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "user".to_string(),
            });
        }

        if self.connection.port == 0 {
            return Err(ConfigError::ValidationError(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        if self.inventory_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "inventory".to_string(),
            });
        }

        Ok(())
    }

    /// Turn the connection settings into login credentials, prompting for
    /// the password on the terminal when none was configured
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let password = match self.connection.password {
            Some(ref password) => password.clone(),
            None => rpassword::prompt_password(format!(
                "Enter password for host {} and user {}: ",
                self.connection.host, self.connection.user
            ))
            .map_err(|e| ConfigError::MissingRequired {
                field: format!("password ({})", e),
            })?,
        };

        Ok(Credentials {
            host: self.connection.host.clone(),
            port: self.connection.port,
            user: self.connection.user.clone(),
            password,
        })
    }
}

//! TOML configuration file parsing

use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ConfigError;

/// TOML configuration structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub connection: Option<ConnectionSection>,
    pub inventory: Option<InventorySection>,
    pub logging: Option<LoggingConfig>,
}

/// `[connection]` table
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// `[inventory]` table
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventorySection {
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl TomlConfig {
    /// Apply file values over base configuration
    pub fn apply_to_config(self, mut base_config: AppConfig) -> Result<AppConfig, ConfigError> {
        if let Some(connection) = self.connection {
            if let Some(host) = connection.host {
                base_config.connection.host = host;
            }
            if let Some(port) = connection.port {
                base_config.connection.port = port;
            }
            if let Some(user) = connection.user {
                base_config.connection.user = user;
            }
            if connection.password.is_some() {
                base_config.connection.password = connection.password;
            }
        }

        if let Some(path) = self.inventory.and_then(|inv| inv.path) {
            base_config.inventory_path = path;
        }

        if let Some(level) = self.logging.and_then(|logging| logging.level) {
            base_config.log_level = level;
        }

        Ok(base_config)
    }
}

/// Parse configuration from TOML text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
}

/// Load configuration from TOML file
pub fn load_toml_config(path: &str) -> Result<TomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_string(),
    })?;

    parse_toml_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[connection]
host = "vcenter.example.com"
port = 8443
user = "svc-automation@vsphere.local"

[inventory]
path = "/var/lib/vsphere-admin/inventory.json"

[logging]
level = "debug"
"#;

    #[test]
    fn test_parse_and_apply() {
        let parsed = parse_toml_config(SAMPLE).unwrap();
        let config = parsed.apply_to_config(AppConfig::default()).unwrap();

        assert_eq!(config.connection.host, "vcenter.example.com");
        assert_eq!(config.connection.port, 8443);
        assert_eq!(config.connection.user, "svc-automation@vsphere.local");
        assert_eq!(config.connection.password, None);
        assert_eq!(config.inventory_path, "/var/lib/vsphere-admin/inventory.json");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed = parse_toml_config("[logging]\nlevel = \"warn\"\n").unwrap();
        let config = parsed.apply_to_config(AppConfig::default()).unwrap();

        assert_eq!(config.connection.port, 443);
        assert_eq!(config.inventory_path, "inventory.json");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = parse_toml_config("[connection]\nhostname = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let parsed = load_toml_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            parsed.connection.unwrap().host.as_deref(),
            Some("vcenter.example.com")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_toml_config("/nonexistent/vsphere-admin.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}

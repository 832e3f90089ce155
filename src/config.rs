use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    pub records: RecordsConfig,
    pub transfer: TransferConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Airtable connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordsConfig {
    #[serde(default = "default_airtable_base")]
    pub api_base: String,
    /// Overridden by `AIRTABLE_BASE_ID`
    #[serde(default)]
    pub base_id: String,
    /// Overridden by `AIRTABLE_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub events_table: String,
    pub events_view: String,
    pub disbursements_table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// HCB connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    #[serde(default = "default_hcb_base")]
    pub api_base: String,
    /// Overridden by `HCB_API_TOKEN`
    #[serde(default, skip_serializing)]
    pub token: String,
    /// Organization that funds grants and receives withdrawals
    pub operating_org: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Transfer name prefixes; the disbursement number is appended
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NamingConfig {
    pub grant_label: String,
    pub withdrawal_label: String,
    pub custom_label: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            grant_label: "Daydream signup grant".to_string(),
            withdrawal_label: "Daydream withdrawal".to_string(),
            custom_label: "Daydream miscellaneous disbursement".to_string(),
        }
    }
}

/// Dashboard credential pair. Never stored in yaml; read from the environment.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

fn default_airtable_base() -> String {
    "https://api.airtable.com/v0".to_string()
}

fn default_hcb_base() -> String {
    "https://hcb.hackclub.com/api/v4".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Load `config/{env}.yaml`, apply environment overrides, and validate
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override secrets and port from the environment
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AIRTABLE_BASE_ID") {
            self.records.base_id = v;
        }
        if let Some(v) = lookup("AIRTABLE_API_KEY") {
            self.records.api_key = v;
        }
        if let Some(v) = lookup("HCB_API_TOKEN") {
            self.transfer.token = v;
        }
        if let Some(v) = lookup("BASIC_AUTH_USERNAME") {
            self.auth.username = v;
        }
        if let Some(v) = lookup("BASIC_AUTH_PASSWORD") {
            self.auth.password = v;
        }
        if let Some(v) = lookup("PORT") {
            self.gateway.port = v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    /// Every credential must be present before the server starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.records.base_id.is_empty() {
            return Err(ConfigError::Missing("AIRTABLE_BASE_ID"));
        }
        if self.records.api_key.is_empty() {
            return Err(ConfigError::Missing("AIRTABLE_API_KEY"));
        }
        if self.transfer.token.is_empty() {
            return Err(ConfigError::Missing("HCB_API_TOKEN"));
        }
        if self.auth.username.is_empty() {
            return Err(ConfigError::Missing("BASIC_AUTH_USERNAME"));
        }
        if self.auth.password.is_empty() {
            return Err(ConfigError::Missing("BASIC_AUTH_PASSWORD"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const YAML: &str = r#"
log_level: "info"
log_dir: "./logs"
log_file: "cash_cannon.log"
use_json: false
rotation: "daily"
gateway:
  host: "0.0.0.0"
  port: 8080
records:
  events_table: "events"
  events_view: "viwd1z4JsMUf15DNb"
  disbursements_table: "disbursements"
transfer:
  operating_org: "daydream"
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config = AppConfig::from_yaml(YAML).unwrap();

        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.records.api_base, "https://api.airtable.com/v0");
        assert_eq!(config.records.timeout_secs, 30);
        assert_eq!(config.transfer.api_base, "https://hcb.hackclub.com/api/v4");
        assert_eq!(config.transfer.operating_org, "daydream");
        assert_eq!(config.naming.grant_label, "Daydream signup grant");
        assert!(config.auth.username.is_empty());
    }

    #[test]
    fn test_env_overrides_and_validation() {
        let mut config = AppConfig::from_yaml(YAML).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("AIRTABLE_BASE_ID"))
        ));

        config
            .apply_env(env(&[
                ("AIRTABLE_BASE_ID", "appXYZ"),
                ("AIRTABLE_API_KEY", "pat123"),
                ("HCB_API_TOKEN", "hcb456"),
                ("BASIC_AUTH_USERNAME", "admin"),
                ("BASIC_AUTH_PASSWORD", "hunter2"),
                ("PORT", "9090"),
            ]))
            .unwrap();

        assert_eq!(config.records.base_id, "appXYZ");
        assert_eq!(config.transfer.token, "hcb456");
        assert_eq!(config.gateway.port, 9090);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut config = AppConfig::from_yaml(YAML).unwrap();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_missing_password_rejected() {
        let mut config = AppConfig::from_yaml(YAML).unwrap();
        config
            .apply_env(env(&[
                ("AIRTABLE_BASE_ID", "appXYZ"),
                ("AIRTABLE_API_KEY", "pat123"),
                ("HCB_API_TOKEN", "hcb456"),
                ("BASIC_AUTH_USERNAME", "admin"),
            ]))
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("BASIC_AUTH_PASSWORD"))
        ));
    }
}

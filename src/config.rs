use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::database::config::DatabaseConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Demo-plan defaults and warning policy.
///
/// `minutes_limit`, `assistant_limit` and `max_lifetime_days` seed new demo
/// accounts; the thresholds and the duration cap are global policy applied to
/// every account regardless of its plan row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_minutes_limit")]
    pub minutes_limit: f64,
    #[serde(default = "default_assistant_limit")]
    pub assistant_limit: i32,
    #[serde(default = "default_max_lifetime_days")]
    pub max_lifetime_days: i32,
    /// Fraction of the minutes budget at which the approaching warning fires
    #[serde(default = "default_approaching_threshold")]
    pub approaching_threshold: f64,
    /// Fraction of the minutes budget at which the critical warning fires
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
    /// Cap applied to new call durations while an account is critical
    #[serde(default = "default_duration_cap_seconds")]
    pub duration_cap_seconds: u32,
}

fn default_minutes_limit() -> f64 {
    10.0
}

fn default_assistant_limit() -> i32 {
    3
}

fn default_max_lifetime_days() -> i32 {
    7
}

fn default_approaching_threshold() -> f64 {
    0.8
}

fn default_critical_threshold() -> f64 {
    0.9
}

fn default_duration_cap_seconds() -> u32 {
    10
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            minutes_limit: default_minutes_limit(),
            assistant_limit: default_assistant_limit(),
            max_lifetime_days: default_max_lifetime_days(),
            approaching_threshold: default_approaching_threshold(),
            critical_threshold: default_critical_threshold(),
            duration_cap_seconds: default_duration_cap_seconds(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("VOICEMETER")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("VOICEMETER")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.limits.minutes_limit, 10.0);
        assert_eq!(config.limits.assistant_limit, 3);
        assert_eq!(config.limits.max_lifetime_days, 7);
        assert_eq!(config.limits.approaching_threshold, 0.8);
        assert_eq!(config.limits.critical_threshold, 0.9);
        assert_eq!(config.limits.duration_cap_seconds, 10);
    }

    #[test]
    fn test_config_builder_with_env() {
        let env_source = Environment::with_prefix("VOICEMETER")
            .prefix_separator("_")
            .separator("__");

        let builder = ConfigBuilder::builder()
            .add_source(config::Config::try_from(&Config::default()).unwrap())
            .add_source(env_source);

        let result = builder.build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_load_from_yaml_file() {
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 4000
logging:
  level: "warn"
limits:
  minutes_limit: 30.0
  assistant_limit: 5
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.limits.minutes_limit, 30.0);
        assert_eq!(config.limits.assistant_limit, 5);
        // Fields not present in the file keep their defaults
        assert_eq!(config.limits.max_lifetime_days, 7);
        assert_eq!(config.limits.critical_threshold, 0.9);
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let config = Config::load_from_file("nonexistent.yaml").unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.limits.minutes_limit, 10.0);
    }
}

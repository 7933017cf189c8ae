//! Layered application configuration.
//!
//! Precedence, lowest to highest: built-in defaults, YAML file, `APP_*`
//! environment variables (`__` as section separator), CLI overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use petstore_db::ConnectOpts;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub env: EnvName,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvName(pub String);

impl Default for EnvName {
    fn default() -> Self {
        Self("dev".to_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dsn: String,
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite:petstore.db?mode=rwc".to_owned(),
            pool: PoolConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_conns: u32,
    pub acquire_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_conns: 10,
            acquire_timeout_secs: 30,
            max_lifetime_secs: 3600,
        }
    }
}

impl From<&PoolConfig> for ConnectOpts {
    fn from(cfg: &PoolConfig) -> Self {
        Self {
            max_conns: Some(cfg.max_conns),
            acquire_timeout: Some(Duration::from_secs(cfg.acquire_timeout_secs)),
            max_lifetime: Some(Duration::from_secs(cfg.max_lifetime_secs)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_owned(),
        }
    }
}

/// Shared-cache in-memory database for `--mock` runs; every pooled
/// connection must see the same data.
pub const MOCK_DSN: &str = "sqlite:file:petstore_mock?mode=memory&cache=shared";

impl AppConfig {
    /// # Errors
    /// Fails when the YAML file or an `APP_*` variable does not fit the
    /// schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;
        Ok(config)
    }

    pub fn apply_cli_overrides(&mut self, port: Option<u16>, mock: bool) {
        if let Some(port) = port {
            self.server.port = port;
        }
        if mock {
            self.database.dsn = MOCK_DSN.to_owned();
        }
    }

    /// # Errors
    /// Serialization of the effective config never fails in practice; the
    /// result is propagated anyway.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert!(config.database.dsn.starts_with("sqlite:"));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").expect("tempfile");
        writeln!(
            file,
            "server:\n  port: 9000\nlogging:\n  format: json\n  level: debug"
        )
        .expect("write");

        let config = AppConfig::load(Some(file.path())).expect("load");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults.
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(Some(4242), true);
        assert_eq!(config.server.port, 4242);
        assert_eq!(config.database.dsn, MOCK_DSN);
    }
}

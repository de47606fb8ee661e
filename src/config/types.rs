use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::check::DEFAULT_STEP_DELAY;
use crate::repository::RepositoryOptions;
use crate::resource::ResourceOptions;
use crate::stats::DEFAULT_CORROBORATION;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct KycConfig {
    pub server: Option<ServerConfig>,
    pub storage: Option<StorageConfig>,
    pub resource: Option<ResourceConfig>,
    pub check: Option<CheckConfig>,
    pub statistics: Option<StatisticsConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    pub backend: Option<StorageBackend>,
    /// Database file, required for the sqlite backend.
    pub path: Option<PathBuf>,
    /// Alternative seed document replacing the built-in data.
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ResourceConfig {
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CheckConfig {
    pub step_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StatisticsConfig {
    pub corroboration: Option<u8>,
}

impl KycConfig {
    pub fn host(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.host.as_deref())
            .unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn backend(&self) -> StorageBackend {
        self.storage
            .as_ref()
            .and_then(|s| s.backend)
            .unwrap_or_default()
    }

    pub fn database_path(&self) -> Option<&PathBuf> {
        self.storage.as_ref().and_then(|s| s.path.as_ref())
    }

    pub fn seed_file(&self) -> Option<&PathBuf> {
        self.storage.as_ref().and_then(|s| s.seed_file.as_ref())
    }

    pub fn resource_options(&self) -> ResourceOptions {
        ResourceOptions {
            timeout: self
                .resource
                .as_ref()
                .and_then(|r| r.timeout_ms)
                .map(Duration::from_millis),
        }
    }

    pub fn step_delay(&self) -> Duration {
        self.check
            .as_ref()
            .and_then(|c| c.step_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_STEP_DELAY)
    }

    pub fn corroboration(&self) -> u8 {
        self.statistics
            .as_ref()
            .and_then(|s| s.corroboration)
            .unwrap_or(DEFAULT_CORROBORATION)
    }

    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            corroboration: self.corroboration(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KycConfig::default();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.backend(), StorageBackend::Memory);
        assert_eq!(config.corroboration(), 78);
        assert_eq!(config.step_delay(), Duration::from_millis(1000));
        assert!(config.resource_options().timeout.is_none());
    }

    #[test]
    fn test_yaml_sections() {
        let yaml = r#"
server:
  port: 9000
storage:
  backend: sqlite
  path: /tmp/kyc.db
resource:
  timeout_ms: 2500
check:
  step_delay_ms: 10
statistics:
  corroboration: 64
"#;
        let config: KycConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port(), 9000);
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.backend(), StorageBackend::Sqlite);
        assert_eq!(config.database_path().unwrap(), &PathBuf::from("/tmp/kyc.db"));
        assert_eq!(config.resource_options().timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.step_delay(), Duration::from_millis(10));
        assert_eq!(config.repository_options().corroboration, 64);
    }
}

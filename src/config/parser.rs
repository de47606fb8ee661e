use std::path::Path;

use tracing::warn;

use super::schema::CONFIG_SCHEMA;
use super::types::{KycConfig, StorageBackend};
use crate::errors::KycError;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<KycConfig, KycError> {
    if !path.exists() {
        return Err(KycError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(KycError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// [`parse_config`] with every failure reported as a configuration error.
pub async fn load_config(path: &Path) -> Result<KycConfig, KycError> {
    parse_config(path).await.map_err(|e| match e {
        KycError::Config(_) => e,
        other => KycError::Config(format!("{}: {}", path.display(), other)),
    })
}

/// Parse and validate configuration text.
pub fn parse_config_str(content: &str) -> Result<KycConfig, KycError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok(KycConfig::default());
    }

    for message in schema_warnings(&yaml)? {
        warn!(validation_error = %message, "Config schema warning");
    }

    let config: KycConfig = serde_yaml::from_value(yaml)?;
    validate_conflicts(&config)?;
    Ok(config)
}

/// Structural problems reported by the JSON schema. Advisory only: typed
/// parsing and [`validate_conflicts`] decide whether a config is usable.
pub fn schema_warnings(yaml: &serde_yaml::Value) -> Result<Vec<String>, KycError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| KycError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| KycError::Config(format!("Schema compilation error: {}", e)))?;

    let messages = match compiled.validate(&json_value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect(),
    };
    Ok(messages)
}

/// Detect settings that parse but cannot work together.
pub fn validate_conflicts(config: &KycConfig) -> Result<(), KycError> {
    if config.backend() == StorageBackend::Sqlite && config.database_path().is_none() {
        return Err(KycError::Config(
            "storage.backend is sqlite but storage.path is not set".into(),
        ));
    }

    if config.backend() == StorageBackend::Memory && config.database_path().is_some() {
        warn!("storage.path is ignored by the memory backend");
    }

    if config.corroboration() > 100 {
        return Err(KycError::Config(format!(
            "statistics.corroboration must be between 0 and 100, got {}",
            config.corroboration()
        )));
    }

    if let Some(0) = config.resource.as_ref().and_then(|r| r.timeout_ms) {
        return Err(KycError::Config("resource.timeout_ms must be positive".into()));
    }

    Ok(())
}

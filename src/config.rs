//! Runtime configuration
//!
//! Read from `REGISTRY_*` environment variables (a `.env` file is loaded
//! first by the binaries). Every key has a default, so an empty
//! environment yields a working setup against `cadastros.csv`.

use crate::record::Schema;
use crate::resolver::{
    HttpPostalDirectory, PostalDirectory, StaticPostalDirectory, DEFAULT_LOOKUP_URL,
};
use crate::store::RecordStore;
use crate::workflow::RevalidationPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Record file path
    pub file: PathBuf,
    /// Column layout, fixed per deployment
    pub schema: Schema,
    /// How update treats unchanged fields
    pub revalidation: RevalidationPolicy,
    /// Postal directory base URL
    pub lookup_url: String,
    /// Whole-request timeout; unset leaves only the 30 s connect limit
    pub lookup_timeout_secs: Option<u64>,
    /// JSON file of postal codes; when set, replaces the HTTP directory
    pub lookup_fixtures: Option<PathBuf>,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Log destination for the TUI (stdout belongs to the terminal)
    pub log_file: Option<PathBuf>,
    /// Bind address for the HTTP server
    pub server_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("cadastros.csv"),
            schema: Schema::Basic,
            revalidation: RevalidationPolicy::ChangedOnly,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            lookup_timeout_secs: None,
            lookup_fixtures: None,
            log_level: "info".to_string(),
            log_file: Some(PathBuf::from("registry.log")),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `REGISTRY_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::with_prefix("REGISTRY"))
    }

    fn from_environment(env: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(&self.file, self.schema)
    }

    /// Postal directory selected by the configuration
    pub fn directory(&self) -> Result<Box<dyn PostalDirectory>> {
        match &self.lookup_fixtures {
            Some(path) => {
                let directory = StaticPostalDirectory::from_json_file(path)
                    .with_context(|| format!("Failed to load postal fixtures from {}", path.display()))?;
                Ok(Box::new(directory))
            }
            None => Ok(Box::new(HttpPostalDirectory::new(
                self.lookup_url.clone(),
                self.lookup_timeout_secs.map(Duration::from_secs),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.file, PathBuf::from("cadastros.csv"));
        assert_eq!(config.schema, Schema::Basic);
        assert_eq!(config.revalidation, RevalidationPolicy::ChangedOnly);
        assert_eq!(config.lookup_timeout_secs, None);
        assert_eq!(config.store().schema(), Schema::Basic);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AppConfig = serde_json::from_str(
            r#"{"schema": "with_birth_date", "revalidation": "all", "lookup_timeout_secs": 5}"#,
        )
        .unwrap();
        assert_eq!(config.schema, Schema::WithBirthDate);
        assert_eq!(config.revalidation, RevalidationPolicy::All);
        assert_eq!(config.lookup_timeout_secs, Some(5));
        assert_eq!(config.lookup_url, DEFAULT_LOOKUP_URL);
    }

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("REGISTRY").source(Some(map))
    }

    #[test]
    fn test_registry_variables_map_to_fields() {
        let config = AppConfig::from_environment(environment(&[
            ("REGISTRY_FILE", "/tmp/alunos.csv"),
            ("REGISTRY_SCHEMA", "with_birth_date"),
            ("REGISTRY_REVALIDATION", "all"),
            ("REGISTRY_LOOKUP_TIMEOUT_SECS", "5"),
            ("REGISTRY_SERVER_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(config.file, PathBuf::from("/tmp/alunos.csv"));
        assert_eq!(config.schema, Schema::WithBirthDate);
        assert_eq!(config.revalidation, RevalidationPolicy::All);
        assert_eq!(config.lookup_timeout_secs, Some(5));
        assert_eq!(config.server_addr, "127.0.0.1:8080");
        assert_eq!(config.lookup_url, DEFAULT_LOOKUP_URL);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = AppConfig::from_environment(environment(&[])).unwrap();
        assert_eq!(config.file, PathBuf::from("cadastros.csv"));
        assert_eq!(config.schema, Schema::Basic);
        assert_eq!(config.lookup_timeout_secs, None);
    }

    #[test]
    fn test_unknown_schema_is_rejected() {
        let result = AppConfig::from_environment(environment(&[("REGISTRY_SCHEMA", "wide")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_fixture_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ceps.json");
        std::fs::write(
            &path,
            r#"{"01001000": {"locality": "São Paulo", "street": "Praça da Sé", "district": "Sé"}}"#,
        )
        .unwrap();

        let config = AppConfig {
            lookup_fixtures: Some(path),
            ..AppConfig::default()
        };
        let directory = config.directory().unwrap();
        assert_eq!(directory.name(), "static");
        assert_eq!(directory.fetch("01001000").unwrap().locality, "São Paulo");
    }

    #[test]
    fn test_missing_fixture_file_is_an_error() {
        let config = AppConfig {
            lookup_fixtures: Some(PathBuf::from("/nonexistent/ceps.json")),
            ..AppConfig::default()
        };
        assert!(config.directory().is_err());
    }
}

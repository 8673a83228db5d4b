//! Outlets configuration file.
//!
//! The config is a small JSON object. Only `outlets` is required; any other
//! keys are kept untouched in [`Config::extra`] so the loaded value mirrors
//! the file.
//!
//! ```json
//! { "outlets": ["bbc.co.uk", "theguardian.com"] }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// News outlet domains, queried in this order.
    pub outlets: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Read and parse the config file at `path`.
///
/// A missing file and unparsable JSON are both logged and returned as a
/// [`ConfigError`]; this function never panics.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!("Config file not found at {}", path.display());
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            error!(error = %e, "Failed to read config file");
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let config: Config = serde_json::from_str(&raw).map_err(|e| {
        error!("Error parsing JSON in {}: {}", path.display(), e);
        ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    if config.outlets.is_empty() {
        warn!("Config has no outlets; headline fetch will be empty");
    }
    info!(outlets = config.outlets.len(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(r#"{"outlets": ["bbc.co.uk", "cnn.com"]}"#);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.outlets, vec!["bbc.co.uk", "cnn.com"]);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_load_config_keeps_extra_keys() {
        let contents = r#"{"outlets": ["bbc.co.uk"], "owner": "newsroom", "limit": 3}"#;
        let file = write_config(contents);
        let config = load_config(file.path()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(contents).unwrap();
        assert_eq!(serde_json::to_value(&config).unwrap(), parsed);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.json");
        match load_config(&missing) {
            Err(ConfigError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_load_invalid_json() {
        let file = write_config(r#"{"outlets": ["bbc.co.uk""#);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_config_without_outlets() {
        let file = write_config(r#"{"sources": ["bbc.co.uk"]}"#);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_config_with_empty_outlets() {
        let file = write_config(r#"{"outlets": []}"#);
        let config = load_config(file.path()).unwrap();
        assert!(config.outlets.is_empty());
    }
}

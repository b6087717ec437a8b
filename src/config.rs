//! Policy tables consumed by the parser and the scanner.
//!
//! Defaults come from `rules/parser-rules.yaml`, baked in by `build.rs`.
//! A YAML file with the same keys overrides them at runtime; missing keys
//! keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::{EXCLUDED_DIRS, MOCK_AFFIXES, TEST_FILE_SUFFIXES};

/// Errors that can occur while loading a parser configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Policy tables for test-file parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Lowercase prefixes/suffixes that mark a `const` as mock data
    pub mock_affixes: Vec<String>,
    /// Filename suffixes accepted by `can_parse`
    pub test_file_suffixes: Vec<String>,
    /// Directory names pruned while scanning
    pub excluded_dirs: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            mock_affixes: MOCK_AFFIXES.iter().map(|s| s.to_string()).collect(),
            test_file_suffixes: TEST_FILE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ParserConfig {
    /// Parse a config from YAML text and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Load from `path` when given, otherwise fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_yaml_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Reject tables that would make the parser recognize nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mock_affixes.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid("mock_affixes must not be empty".to_string()));
        }
        if self.test_file_suffixes.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid("test_file_suffixes must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_tables() {
        let config = ParserConfig::default();
        assert_eq!(config.mock_affixes, vec!["mock", "test", "fixture", "stub", "spy"]);
        assert_eq!(
            config.test_file_suffixes,
            vec![".spec.ts", ".test.ts", ".spec.tsx", ".test.tsx"]
        );
        assert!(config.excluded_dirs.contains(&"node_modules".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ParserConfig::from_yaml_str("mock_affixes:\n  - fake\n").unwrap();
        assert_eq!(config.mock_affixes, vec!["fake"]);
        assert_eq!(config.test_file_suffixes, ParserConfig::default().test_file_suffixes);
    }

    #[test]
    fn test_empty_affixes_rejected() {
        let err = ParserConfig::from_yaml_str("mock_affixes: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = ParserConfig::from_yaml_str("mock_affixes: [unclosed\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rules.yaml");
        fs::write(&path, "excluded_dirs:\n  - vendor\n").unwrap();

        let config = ParserConfig::load(Some(&path)).unwrap();
        assert_eq!(config.excluded_dirs, vec!["vendor"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ParserConfig::load(Some(Path::new("/nonexistent/rules.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/rules.yaml"));
    }
}

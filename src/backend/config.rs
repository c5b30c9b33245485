//! Engine configuration.
//!
//! ## TOML Format
//!
//! ```toml
//! [engine]
//! replace_cache_size = 5
//! extract_cache_size = 5
//! missing_cache_size = 3
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! Every field is optional and falls back to the values shown.

use std::path::Path;

use serde::Deserialize;
use tracing::Level;

use crate::backend::errors::{RError, RResult};
use crate::backend::missing::DEFAULT_MISSING_CACHE_SIZE;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Cache sizes (the `[engine]` section).
    #[serde(default)]
    pub engine: EngineSettings,

    /// The `[logging]` section.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bounds of the per-engine caches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Replacement plans kept per `VectorReplacer`.
    pub replace_cache_size: usize,

    /// Extraction plans kept per `VectorExtractor`.
    pub extract_cache_size: usize,

    /// Symbols cached per level by the missingness checker.
    pub missing_cache_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            replace_cache_size: 5,
            extract_cache_size: 5,
            missing_cache_size: DEFAULT_MISSING_CACHE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> RResult<Level> {
        self.level
            .parse::<Level>()
            .map_err(|_| RError::Config(format!("unknown log level '{}'", self.level)))
    }
}

impl EngineConfig {
    /// Parse and validate configuration from TOML content.
    pub fn parse_toml(content: &str) -> RResult<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| RError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> RResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse_toml(&content)
    }

    pub fn validate(&self) -> RResult<()> {
        let sizes = [
            ("replace_cache_size", self.engine.replace_cache_size),
            ("extract_cache_size", self.engine.extract_cache_size),
            ("missing_cache_size", self.engine.missing_cache_size),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(RError::Config(format!("{} must be at least 1", name)));
        }
        self.logging.max_level()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.engine.replace_cache_size, 5);
        assert_eq!(config.engine.extract_cache_size, 5);
        assert_eq!(config.engine.missing_cache_size, 3);
        assert_eq!(config.logging.max_level(), Ok(Level::WARN));
        assert_eq!(EngineConfig::parse_toml(""), Ok(config));
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::parse_toml(
            r#"
            [engine]
            replace_cache_size = 8

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.replace_cache_size, 8);
        assert_eq!(config.engine.extract_cache_size, 5);
        assert_eq!(config.logging.max_level(), Ok(Level::DEBUG));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::parse_toml("[engine]\nmissing_cache_size = 0\n"),
            Err(RError::Config(m)) if m.contains("missing_cache_size")
        ));
        assert!(matches!(
            EngineConfig::parse_toml("[logging]\nlevel = \"loud\"\n"),
            Err(RError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::parse_toml("[engine]\nunknown = 1\n"),
            Err(RError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load(Path::new("/nonexistent/rcore.toml"));
        assert!(matches!(result, Err(RError::Config(m)) if m.contains("cannot read")));
    }
}

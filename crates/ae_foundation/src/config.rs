//! File-backed configuration loading/saving, shared by every tool's
//! settings struct (pipeline compiler, sampler compiler, build server).

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Types that can be loaded from and saved to a TOML or RON file on disk,
/// dispatching on the file extension.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to a `.toml` or `.ron` file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration loading/saving errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Underlying file IO failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file's contents could not be parsed as its declared format.
    #[error("parse error: {0}")]
    Parse(String),

    /// The value could not be serialized to its declared format.
    #[error("serialize error: {0}")]
    Serialize(String),

    /// The file extension isn't `.toml` or `.ron`.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
    struct Sample {
        name: String,
        value: u32,
    }
    impl Config for Sample {}

    #[test]
    fn round_trips_toml() {
        let dir = std::env::temp_dir().join(format!("ae_foundation_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.toml");
        let original = Sample { name: "x".into(), value: 7 };
        original.save_to_file(&path).unwrap();
        let loaded = Sample::load_from_file(&path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = std::env::temp_dir().join(format!("ae_foundation_test2_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.json");
        std::fs::write(&path, "{}").unwrap();
        let result = Sample::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}

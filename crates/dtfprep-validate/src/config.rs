//! Print-constraint configuration.

use crate::error::{ValidateError, ValidateResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Constraints a print file must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Lowest accepted resolution.
    pub min_dpi: f64,
    /// Highest accepted resolution.
    pub max_dpi: f64,
    /// Maximum print width in centimeters. This is a ceiling.
    pub width_cm: f64,
    /// How far below `width_cm` a file may be.
    pub width_tolerance_cm: f64,
    /// Minimum print height in centimeters.
    pub min_height_cm: f64,
    /// Transparent area percentage above which a file is flagged as having empty space.
    pub empty_space_threshold_pct: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_dpi: 290.0,
            max_dpi: 310.0,
            width_cm: 58.0,
            width_tolerance_cm: 2.5,
            min_height_cm: 1.0,
            empty_space_threshold_pct: 25.0,
        }
    }
}

impl ValidationConfig {
    /// Smallest accepted width.
    pub fn min_width_cm(&self) -> f64 {
        self.width_cm - self.width_tolerance_cm
    }

    /// Default config location.
    ///
    /// On Unix: `~/.local/share/dtfprep/validation.json`
    /// On Windows: `%LOCALAPPDATA%\dtfprep\validation.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("dtfprep").join("validation.json"))
    }

    /// Load a config file.
    pub fn load(path: &Path) -> ValidateResult<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| ValidateError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load `path` if given, otherwise the default location, otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> ValidateResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("Loading validation config from {}", path.display());
                Self::load(&path)
            }
            _ => {
                log::debug!("No validation config found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ValidateResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ValidateError::Config(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_min_width() {
        let config = ValidationConfig::default();
        assert_eq!(config.min_width_cm(), 55.5);
    }

    #[test]
    fn test_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("validation.json");
        let config = ValidationConfig {
            min_dpi: 150.0,
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(ValidationConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("validation.json");
        fs::write(&path, r#"{ "width_cm": 30.0 }"#).unwrap();

        let config = ValidationConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.width_cm, 30.0);
        assert_eq!(config.min_dpi, 290.0);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("validation.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(ValidationConfig::load(&path), Err(ValidateError::Config(_))));
        assert!(matches!(
            ValidationConfig::load(&dir.path().join("missing.json")),
            Err(ValidateError::Io(_))
        ));
    }
}

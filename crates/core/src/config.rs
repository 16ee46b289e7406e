use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable UI configuration, built once at startup and passed into the
/// render layer by reference. Colors are named so the palette can be themed
/// from a file without recompiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_selection_color")]
    pub selection_color: String,
}

fn default_page_size() -> u32 {
    50
}

fn default_title() -> String {
    "litebrowse".to_string()
}

fn default_accent_color() -> String {
    "yellow".to_string()
}

fn default_border_color() -> String {
    "dark_gray".to_string()
}

fn default_selection_color() -> String {
    "blue".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            title: default_title(),
            accent_color: default_accent_color(),
            border_color: default_border_color(),
            selection_color: default_selection_color(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl UiConfig {
    /// Loads configuration from a TOML file; a missing file yields the
    /// defaults.
    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::UiConfig;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = UiConfig::load_from_path(dir.path().join("absent.toml"))
            .expect("missing file should default");
        assert_eq!(config, UiConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ui.toml");
        std::fs::write(&path, "page_size = 25\naccent_color = \"magenta\"\n")
            .expect("write config");

        let config = UiConfig::load_from_path(&path).expect("config should parse");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.accent_color, "magenta");
        assert_eq!(config.border_color, UiConfig::default().border_color);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ui.toml");
        std::fs::write(&path, "page_size = \"not a number\"").expect("write config");

        let err = UiConfig::load_from_path(&path).expect_err("parse should fail");
        assert!(err.to_string().contains("failed to parse config file"));
    }
}

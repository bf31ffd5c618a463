//! Packaging options loaded from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main packaging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackConfig {
    #[serde(default)]
    pub package: PackageConfig,
    #[serde(default)]
    pub workbook: WorkbookConfig,
    #[serde(default)]
    pub properties: PropertiesConfig,
}

impl PackConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PackConfig = toml::from_str(content)?;
        if let Some(level) = config.package.compression_level {
            if config.package.compression == Compression::Stored {
                anyhow::bail!("Configuration error: compression_level {level} requires deflated compression");
            }
            if !(0..=9).contains(&level) {
                anyhow::bail!("Configuration error: compression_level must be within 0..=9, got {level}");
            }
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

/// Archive settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    #[serde(default)]
    pub compression: Compression,
    #[serde(default)]
    pub compression_level: Option<i64>,
}

/// Defaults written into `xl/workbook.xml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookConfig {
    pub app_name: String,
    pub show_objects: String,
    pub window_width: u32,
    pub window_height: u32,
    pub x_window: i32,
    pub y_window: i32,
    pub tab_ratio: u32,
    pub show_horizontal_scroll: bool,
    pub show_vertical_scroll: bool,
    pub show_sheet_tabs: bool,
    pub iterate: bool,
    pub iterate_count: u32,
    pub iterate_delta: f64,
    pub ref_mode: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            app_name: "sheetpack".to_string(),
            show_objects: "all".to_string(),
            window_width: 16384,
            window_height: 8192,
            x_window: 0,
            y_window: 0,
            tab_ratio: 204,
            show_horizontal_scroll: true,
            show_vertical_scroll: true,
            show_sheet_tabs: true,
            iterate: false,
            iterate_count: 100,
            iterate_delta: 0.001,
            ref_mode: "A1".to_string(),
        }
    }
}

/// Document properties for `docProps/app.xml` and `docProps/core.xml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesConfig {
    pub application: String,
    pub creator: Option<String>,
    /// W3CDTF timestamp, e.g. `2024-01-31T12:00:00Z`.
    pub created: Option<String>,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            application: "sheetpack".to_string(),
            creator: None,
            created: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() -> Result<()> {
        let config = PackConfig::from_toml_str("")?;
        assert_eq!(config, PackConfig::default());
        assert_eq!(config.package.compression, Compression::Deflated);
        assert_eq!(config.workbook.tab_ratio, 204);
        assert_eq!(config.workbook.iterate_count, 100);
        assert_eq!(config.workbook.ref_mode, "A1");
        Ok(())
    }

    #[test]
    fn test_partial_sections() -> Result<()> {
        let toml = r#"
            [package]
            compression = "stored"

            [workbook]
            app_name = "Ledger"
            window_width = 20000

            [properties]
            creator = "Finance"
            created = "2024-01-31T12:00:00Z"
        "#;
        let config = PackConfig::from_toml_str(toml)?;
        assert_eq!(config.package.compression, Compression::Stored);
        assert_eq!(config.workbook.app_name, "Ledger");
        assert_eq!(config.workbook.window_width, 20000);
        assert_eq!(config.workbook.window_height, 8192);
        assert_eq!(config.properties.application, "sheetpack");
        assert_eq!(config.properties.creator.as_deref(), Some("Finance"));
        Ok(())
    }

    #[test]
    fn test_invalid_compression_level() {
        let err = PackConfig::from_toml_str("[package]\ncompression_level = 12\n").unwrap_err();
        assert!(err.to_string().contains("0..=9"));

        let stored = "[package]\ncompression = \"stored\"\ncompression_level = 3\n";
        assert!(PackConfig::from_toml_str(stored).is_err());
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pack.toml");
        fs::write(&path, "[workbook]\ndate_format = 1\n")?;
        // Unknown keys are ignored like the rest of the TOML layer.
        let config = PackConfig::from_file(&path)?;
        assert_eq!(config.workbook, WorkbookConfig::default());

        assert!(PackConfig::from_file(dir.path().join("missing.toml")).is_err());
        Ok(())
    }
}

//! Configuration loading and parsing

use anyhow::{Context, Result};
use cap_log_decoder::FormatterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FormatConfig {
    /// Output template; the library default is used when absent
    pub template: Option<String>,
    /// Value for fields missing from a record
    pub default: Option<String>,
    /// Prepend a header line
    #[serde(default)]
    pub header: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output file; console when absent
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Build the library formatter configuration
    pub fn formatter_config(&self) -> FormatterConfig {
        let mut config = FormatterConfig::new();
        if let Some(template) = &self.format.template {
            config = config.with_template(template.clone());
        }
        if let Some(default) = &self.format.default {
            config = config.with_default_value(default.clone());
        }
        config
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

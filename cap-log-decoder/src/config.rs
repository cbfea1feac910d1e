//! Formatter configuration types
//!
//! This module defines the minimal configuration needed by the decoder library:
//! the output template and the value substituted for missing fields. Output
//! destinations and headers are handled by the application layer.

use serde::{Deserialize, Serialize};

/// Template used when the caller does not supply one
pub const DEFAULT_TEMPLATE: &str = "{date} {src} {dest} {protocol} {ttl} {tos} {id} {iplen} \
                                    {dgmlen} {ip_flags} {tcp_flags} {seq} {ack} {win} {tcplen} {len}";

/// Configuration for the record formatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    /// Output template with `{field}` / `{field:spec}` placeholders
    #[serde(default = "default_template")]
    pub template: String,

    /// Value rendered for placeholders whose field is absent from a record
    #[serde(default)]
    pub default_value: String,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            default_value: String::new(),
        }
    }
}

impl FormatterConfig {
    /// Create a new formatter configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the output template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Builder method: set the value used for missing fields
    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_config_builder() {
        let config = FormatterConfig::new()
            .with_template("{src} {dest}")
            .with_default_value("-");

        assert_eq!(config.template, "{src} {dest}");
        assert_eq!(config.default_value, "-");
    }

    #[test]
    fn test_defaults() {
        let config = FormatterConfig::new();
        assert_eq!(config.template, DEFAULT_TEMPLATE);
        assert!(config.default_value.is_empty());
        assert!(DEFAULT_TEMPLATE.starts_with("{date} {src} {dest} {protocol}"));
        assert!(DEFAULT_TEMPLATE.ends_with("{tcplen} {len}"));
    }
}

//! Configuration for the conversion driver

use serde::{Deserialize, Serialize};
use std::fmt;
use symlogic_parser::DEFAULT_MAX_DEPTH;

/// Main driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Deepest expression nesting the parser accepts
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// How converted expressions are printed
    #[serde(default)]
    pub format: OutputFormat,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            format: OutputFormat::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Output format of a converted expression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Expression source, e.g. `And(Not(a), Eq(b, 0))`
    #[default]
    Text,

    /// Rewritten tree as JSON
    Json,

    /// Rewritten tree in debug form
    Tree,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Tree => write!(f, "tree"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl DriverConfig {
    /// Load configuration: defaults, then the file if given, then
    /// `SYMLOGIC_*` environment variables (`SYMLOGIC_LOGGING__LEVEL` for
    /// nested keys)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DriverConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SYMLOGIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_load_without_file() {
        let config = DriverConfig::load(None).unwrap();
        assert_eq!(config.format, OutputFormat::Text);
        assert!(config.max_depth > 0);
    }

    #[test]
    fn test_load_missing_file_is_ignored() {
        let config = DriverConfig::load(Some("/nonexistent/symlogic-config")).unwrap();
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("symlogic-test-{}.toml", std::process::id()));
        fs::write(
            &path,
            "max_depth = 32\nformat = \"json\"\n\n[logging]\nlevel = \"debug\"\njson = true\n",
        )
        .unwrap();

        let loaded = DriverConfig::load(path.to_str());
        fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path =
            std::env::temp_dir().join(format!("symlogic-partial-{}.toml", std::process::id()));
        fs::write(&path, "format = \"tree\"\n").unwrap();

        let loaded = DriverConfig::load(path.to_str());
        fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.format, OutputFormat::Tree);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(serde_json::to_string(&OutputFormat::Json).unwrap(), "\"json\"");
        let parsed: OutputFormat = serde_json::from_str("\"tree\"").unwrap();
        assert_eq!(parsed, OutputFormat::Tree);
    }
}

//! Configuration management for haul
//!
//! Settings come from a TOML file (`haul.toml` by default), then
//! `HAUL_*` environment variables, then command line overrides.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "haul.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Graph rendering configuration
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact, full)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// How read-modify-write mutations guard against concurrent writers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Unconditional writes; a concurrent mutation can be lost
    #[default]
    LastWriteWins,
    /// Writes carry the revision read; stale writes fail with a conflict
    CompareAndSwap,
}

/// Store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Concurrency guard for tag and target mutations
    #[serde(default)]
    pub write_mode: WriteMode,

    /// JSON catalog snapshot used to seed the in-memory store
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

/// Output representation of a rendered graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Graphviz DOT text
    #[default]
    Dot,
    /// JSON nodes and edges
    Json,
    /// SVG image, rendered by Graphviz
    Svg,
    /// PNG image, rendered by Graphviz
    Png,
    /// PDF document, rendered by Graphviz
    Pdf,
}

/// Graph rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Graph title
    #[serde(default = "default_graph_label")]
    pub label: String,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Graphviz executable used for image formats
    #[serde(default = "default_dot_binary")]
    pub dot_binary: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            label: default_graph_label(),
            format: OutputFormat::default(),
            dot_binary: default_dot_binary(),
        }
    }
}

// Default value functions for serde
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }
fn default_graph_label() -> String { "haul graph".to_string() }
fn default_dot_binary() -> String { "dot".to_string() }

impl OutputFormat {
    /// Whether this format is produced by an external Graphviz run
    pub fn is_image(self) -> bool {
        matches!(self, OutputFormat::Svg | OutputFormat::Png | OutputFormat::Pdf)
    }

    /// Format name as understood by `dot -T`
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Dot => "dot",
            OutputFormat::Json => "json",
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dot" | "gv" => Ok(OutputFormat::Dot),
            "json" => Ok(OutputFormat::Json),
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(Error::config(format!(
                "Invalid graph format: {}. Valid options: dot, json, svg, png, pdf",
                other
            ))),
        }
    }
}

impl FromStr for WriteMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last_write_wins" => Ok(WriteMode::LastWriteWins),
            "compare_and_swap" | "cas" => Ok(WriteMode::CompareAndSwap),
            other => Err(Error::config(format!(
                "Invalid write mode: {}. Valid options: last_write_wins, compare_and_swap",
                other
            ))),
        }
    }
}

impl Config {
    /// Load configuration from `haul.toml` (if present) and environment variables
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        Self::load_with(path.exists().then_some(path), |key| std::env::var(key).ok())
    }

    // Overrides apply before validation so they can correct a bad file value.
    fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::parse_file(path)?,
            None => Config::default(),
        };

        config.apply_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::parse_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("HAUL_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("HAUL_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Some(mode) = lookup("HAUL_WRITE_MODE") {
            self.store.write_mode = mode.parse()?;
        }

        if let Some(path) = lookup("HAUL_CATALOG") {
            self.store.catalog_path = Some(PathBuf::from(path));
        }

        if let Some(format) = lookup("HAUL_GRAPH_FORMAT") {
            self.graph.format = format.parse()?;
        }

        if let Some(binary) = lookup("HAUL_DOT_BINARY") {
            self.graph.dot_binary = binary;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(Error::config(format!("Invalid log level: {}", other))),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "full" => {}
            other => return Err(Error::config(format!("Invalid log format: {}", other))),
        }

        if self.graph.format.is_image() && self.graph.dot_binary.trim().is_empty() {
            return Err(Error::config("Image output requires graph.dot_binary"));
        }

        Ok(())
    }
}

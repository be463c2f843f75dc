use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bridge::source::DEFAULT_TIMEOUT_MS;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "formmaster.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "formmaster",
    version,
    about = "Resolve form fields to stored values and fill them"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: formmaster.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the form controls found in an HTML page
    Extract {
        /// HTML file to analyse
        #[arg(long)]
        html: String,

        /// CSS selector limiting extraction to one subtree
        #[arg(long)]
        scope: Option<String>,

        /// Output format: console, json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Resolve and fill every control of an HTML page
    Fill {
        /// HTML file to fill
        #[arg(long)]
        html: String,

        /// URL the page was served from (selects site mappings)
        #[arg(long)]
        url: String,

        /// JSON file with {key, name, label, value} records
        #[arg(long)]
        values: Option<String>,

        /// Companion service asked for field values
        #[arg(long)]
        endpoint: Option<String>,

        /// User profile JSON
        #[arg(long)]
        profile: Option<String>,

        /// Site mappings (JSON or YAML)
        #[arg(long)]
        mappings: Option<String>,

        /// Data document read by table/regex mappings
        #[arg(long)]
        data: Option<String>,

        /// Write the filled HTML here
        #[arg(short, long)]
        output: Option<String>,

        /// Report format: console, json
        #[arg(long)]
        format: Option<String>,

        /// Inject indicator elements next to filled controls
        #[arg(long)]
        annotate: bool,

        /// Limit filling to the subtree matching this CSS selector
        #[arg(long)]
        scope: Option<String>,
    },

    /// Coerce one raw value for a control type
    Coerce {
        /// Control type (text, email, tel, date, select, ...)
        #[arg(long)]
        kind: String,

        /// Raw stored value
        #[arg(long)]
        value: String,

        /// Option as value=text (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `formmaster.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fill: FillConfig,

    pub profile: Option<String>,
    pub mappings: Option<String>,
    pub data: Option<String>,
    pub trace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default = "default_true")]
    pub profile_fallback: bool,

    #[serde(default = "default_console")]
    pub format: String,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            profile_fallback: true,
            format: "console".to_string(),
        }
    }
}

// Serde default helpers
fn default_timeout_ms() -> u64 { DEFAULT_TIMEOUT_MS }
fn default_true() -> bool { true }
fn default_console() -> String { "console".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Strict load: missing and malformed files are errors.
pub fn try_load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match try_load_config(config_path) {
        Ok(config) => config,
        Err(ConfigError::Read { .. }) => AppConfig::default(),
        Err(e) => {
            warn!(error = %e, "ignoring config file");
            AppConfig::default()
        }
    }
}

// ============================================================================
// Settings (merge CLI args with config file)
// ============================================================================

/// Fill settings after applying CLI > config > defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FillSettings {
    pub values: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    pub profile: Option<String>,
    pub mappings: Option<String>,
    pub data: Option<String>,
    pub trace: Option<String>,
    pub format: String,
    pub profile_fallback: bool,
}

impl FillSettings {
    pub fn resolve(
        config: &AppConfig,
        values: Option<String>,
        endpoint: Option<String>,
        profile: Option<String>,
        mappings: Option<String>,
        data: Option<String>,
        format: Option<String>,
    ) -> Self {
        Self {
            values,
            endpoint: endpoint.or_else(|| config.source.endpoint.clone()),
            timeout_ms: config.source.timeout_ms,
            profile: profile.or_else(|| config.profile.clone()),
            mappings: mappings.or_else(|| config.mappings.clone()),
            data: data.or_else(|| config.data.clone()),
            trace: config.trace.clone(),
            format: format.unwrap_or_else(|| config.fill.format.clone()),
            profile_fallback: config.fill.profile_fallback,
        }
    }
}

/// Parse a repeatable `value=text` option flag. A bare token is both.
pub fn parse_option_flag(raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((value, text)) => (value.to_string(), text.to_string()),
        None => (raw.to_string(), raw.to_string()),
    }
}

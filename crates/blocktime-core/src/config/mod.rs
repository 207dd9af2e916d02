//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML or JSON file given by `--config` or the `BLOCKTIME_CONFIG` env var
//! 3. **Environment variables**: `BLOCKTIME__*` env vars override specific fields
//!
//! Command-line flags are applied on top by the CLI.
//!
//! # Configuration Sections
//!
//! - [`ChainConfig`]: node endpoint, timeouts and retry policy
//! - [`CalculatorConfig`]: sampling and outlier-removal parameters
//! - [`OutputConfig`]: rendering format
//! - [`LoggingConfig`]: log level and format
//!
//! # Validation
//!
//! [`AppConfig::validate`] checks ranges up front. The sampling and statistics code
//! trusts the values it is handed and does not re-check them.
//!
//! # Example
//!
//! ```toml
//! [chain]
//! rpc_endpoint = "https://rpc.cosmos.network:443"
//! timeout_seconds = 10
//!
//! [calculator]
//! sample_size = 200
//! trim_percent = 0.1
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Node connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// CometBFT RPC endpoint. Must start with `http` or `https`.
    pub rpc_endpoint: String,

    /// Chain identifier, informational only. Defaults to `cosmoshub-4`.
    pub chain_id: String,

    /// Per-request timeout in seconds. Must be greater than 0. Defaults to `30`.
    pub timeout_seconds: u64,

    /// Retries for transient failures, on top of the first attempt. Defaults to `3`.
    pub max_retries: u32,

    /// Delay between retries in milliseconds. Defaults to `1000`.
    pub retry_delay_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "http://localhost:26657".to_string(),
            chain_id: "cosmoshub-4".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl ChainConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Sampling and robust-statistics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Number of most recent blocks to sample. Defaults to `100`.
    pub sample_size: usize,

    /// Minimum number of valid deltas required for a summary. Defaults to `30`.
    ///
    /// A window of `sample_size` blocks yields at most `sample_size - 1` deltas, so
    /// setting this equal to `sample_size` passes validation but can never produce
    /// a summary.
    pub min_sample_size: usize,

    /// IQR fence multiplier. Defaults to `1.5`.
    pub outlier_threshold: f64,

    /// Range narrowing factor in `(0, 1)`. Defaults to `0.95`.
    pub confidence_level: f64,

    /// Fraction trimmed from each end after MAD filtering, in `[0, 0.5)`. Defaults to `0.05`.
    pub trim_percent: f64,

    /// Use the MAD / modified z-score filter instead of IQR fences. Defaults to `true`.
    pub use_median_absolute: bool,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            min_sample_size: 30,
            outlier_threshold: 1.5,
            confidence_level: 0.95,
            trim_percent: 0.05,
            use_median_absolute: true,
        }
    }
}

/// Supported rendering formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            other => Err(format!("invalid output format: {other} (must be json, text, or table)")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Result rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Defaults to [`OutputFormat::Text`].
    pub format: OutputFormat,

    /// Show extended statistics. Defaults to `false`.
    pub verbose: bool,

    /// Pretty-print JSON output. Defaults to `true`.
    pub pretty_print: bool,

    /// Also write the rendered output to this file.
    pub save_to_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: OutputFormat::Text, verbose: false, pretty_print: true, save_to_file: None }
    }
}

/// Application logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub calculator: CalculatorConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML/JSON file with environment variable overrides.
    ///
    /// A missing file is not an error; defaults apply. Environment variables with the
    /// `BLOCKTIME__` prefix override any value, using `__` as the nesting separator
    /// (e.g., `BLOCKTIME__CALCULATOR__SAMPLE_SIZE=250`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let path = config_path.as_ref();
        let defaults = Self::default();

        let config_builder = Config::builder()
            .set_default("chain.rpc_endpoint", defaults.chain.rpc_endpoint)?
            .set_default("chain.chain_id", defaults.chain.chain_id)?
            .set_default("chain.timeout_seconds", defaults.chain.timeout_seconds)?
            .set_default("chain.max_retries", defaults.chain.max_retries)?
            .set_default("chain.retry_delay_ms", defaults.chain.retry_delay_ms)?
            .set_default("calculator.sample_size", defaults.calculator.sample_size as u64)?
            .set_default("calculator.min_sample_size", defaults.calculator.min_sample_size as u64)?
            .set_default("calculator.outlier_threshold", defaults.calculator.outlier_threshold)?
            .set_default("calculator.confidence_level", defaults.calculator.confidence_level)?
            .set_default("calculator.trim_percent", defaults.calculator.trim_percent)?
            .set_default("calculator.use_median_absolute", defaults.calculator.use_median_absolute)?
            .set_default("output.format", "text")?
            .set_default("output.verbose", false)?
            .set_default("output.pretty_print", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("BLOCKTIME").prefix_separator("__").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config.toml` with fallback to defaults.
    ///
    /// The path can be overridden using the `BLOCKTIME_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("BLOCKTIME_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string for the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        let chain = &self.chain;
        if chain.rpc_endpoint.is_empty() {
            return Err("RPC endpoint is required (use --rpc flag or config file)".to_string());
        }
        if !chain.rpc_endpoint.starts_with("http") {
            return Err(format!("Invalid RPC endpoint: {}", chain.rpc_endpoint));
        }
        if chain.timeout_seconds == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        let calc = &self.calculator;
        if calc.sample_size == 0 {
            return Err("Sample size must be greater than 0".to_string());
        }
        if calc.min_sample_size == 0 {
            return Err("Min sample size must be greater than 0".to_string());
        }
        if calc.min_sample_size > calc.sample_size {
            return Err("Min sample size cannot be greater than sample size".to_string());
        }
        if calc.outlier_threshold.is_nan() || calc.outlier_threshold <= 0.0 {
            return Err("Outlier threshold must be positive".to_string());
        }
        if !(calc.confidence_level > 0.0 && calc.confidence_level < 1.0) {
            return Err("Confidence level must be between 0 and 1 (exclusive)".to_string());
        }
        if !(0.0..0.5).contains(&calc.trim_percent) {
            return Err("Trim percent must be in [0, 0.5)".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}

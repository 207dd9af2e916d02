use blocktime_core::CoreError;
use thiserror::Error;

/// Errors surfaced by the `blocktime` binary.
#[derive(Error, Debug)]
pub enum CliError {
    /// Loading, validating or writing configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A calculation or prediction failed; shown as the core error's own message.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Cannot write output: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering results as JSON, TOML or text failed.
    #[error("Cannot render output: {0}")]
    Render(String),
}

impl From<config::ConfigError> for CliError {
    fn from(error: config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Render(error.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Render(error.to_string())
    }
}

impl From<std::fmt::Error> for CliError {
    fn from(error: std::fmt::Error) -> Self {
        Self::Render(error.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// Status lines go to stderr so stdout only carries results.
pub fn print_success(message: &str) {
    eprintln!("[SUCCESS] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn print_info(message: &str) {
    eprintln!("[INFO] {message}");
}

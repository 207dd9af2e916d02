pub mod analyze;
pub mod calculate;
pub mod config;
pub mod predict;
pub mod utils;

pub use analyze::AnalyzeArgs;
pub use calculate::CalculateArgs;
pub use config::{handle_config_command, ConfigCommands};
pub use predict::PredictArgs;

use blocktime_core::{
    calculator::BlockTimeCalculator,
    chain::{ChainQueryService, CometRpcClient},
    config::{AppConfig, OutputConfig, OutputFormat},
    sampling::RangeFetcher,
};
use clap::Args;
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;

use utils::{CliError, CliResult};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file, TOML or JSON (default: ./config.toml)
    #[arg(long, global = true, env = "BLOCKTIME_CONFIG")]
    pub config: Option<PathBuf>,

    /// RPC endpoint URL
    #[arg(long, global = true)]
    pub rpc: Option<String>,

    /// Chain ID
    #[arg(long, global = true)]
    pub chain_id: Option<String>,

    /// Request timeout in seconds (`30`, `30s` or `2m`)
    #[arg(long, global = true, value_parser = parse_timeout_secs)]
    pub timeout: Option<u64>,
}

impl GlobalArgs {
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Loads the config file with env overrides, then applies these flags.
    pub fn load_config(&self) -> CliResult<AppConfig> {
        let mut config = AppConfig::from_file(self.config_path())?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(rpc) = &self.rpc {
            config.chain.rpc_endpoint.clone_from(rpc);
        }
        if let Some(chain_id) = &self.chain_id {
            config.chain.chain_id.clone_from(chain_id);
        }
        if let Some(timeout) = self.timeout {
            config.chain.timeout_seconds = timeout;
        }
    }
}

/// Output flags shared by `calculate` and `predict`.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format (json, text, table)
    #[arg(long)]
    pub output: Option<OutputFormat>,

    /// Show detailed statistics
    #[arg(long)]
    pub verbose: bool,
}

impl OutputArgs {
    pub fn apply(&self, config: &mut OutputConfig) {
        if let Some(format) = self.output {
            config.format = format;
        }
        if self.verbose {
            config.verbose = true;
        }
    }
}

/// Validates `config` and builds a calculator backed by the CometBFT client.
pub fn connect(config: &AppConfig, cancel: CancellationToken) -> CliResult<BlockTimeCalculator> {
    config.validate().map_err(CliError::Config)?;

    let client = CometRpcClient::new(&config.chain).map_err(|e| CliError::Config(e.to_string()))?;
    tracing::debug!(
        endpoint = client.endpoint(),
        chain_id = %config.chain.chain_id,
        "connected to chain node"
    );

    let chain: Arc<dyn ChainQueryService> = Arc::new(client);
    let fetcher = RangeFetcher::new(Arc::clone(&chain)).with_cancellation(cancel);
    Ok(BlockTimeCalculator::new(chain, config.calculator.clone()).with_fetcher(fetcher))
}

fn parse_timeout_secs(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let (digits, scale) = if let Some(mins) = raw.strip_suffix('m') {
        (mins, 60)
    } else {
        (raw.strip_suffix('s').unwrap_or(raw), 1)
    };

    digits
        .parse::<u64>()
        .ok()
        .and_then(|value| value.checked_mul(scale))
        .ok_or_else(|| format!("invalid timeout: {raw}"))
}

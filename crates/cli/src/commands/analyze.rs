use blocktime_core::{
    calculator::DEFAULT_PROPOSER_MIN_DELTAS,
    config::{AppConfig, OutputFormat},
};
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::{connect, utils::CliResult};
use crate::render;

pub const DEFAULT_ANALYZE_SAMPLE_SIZE: usize = 500;

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Number of recent blocks to analyze
    #[arg(long, default_value_t = DEFAULT_ANALYZE_SAMPLE_SIZE)]
    pub sample_size: usize,

    /// Minimum blocks per proposer to include
    #[arg(long, default_value_t = DEFAULT_PROPOSER_MIN_DELTAS)]
    pub min_blocks: usize,

    /// Output format (json, text, table)
    #[arg(long)]
    pub output: Option<OutputFormat>,
}

impl AnalyzeArgs {
    pub async fn run(self, mut config: AppConfig, cancel: CancellationToken) -> CliResult<()> {
        if let Some(format) = self.output {
            config.output.format = format;
        }
        let calculator = connect(&config, cancel)?;

        tracing::info!(
            sample_size = self.sample_size,
            min_blocks = self.min_blocks,
            "analyzing proposer block times"
        );
        let proposers =
            calculator.analyze_recent_proposers(self.sample_size, self.min_blocks).await?;

        render::emit(&render::proposers(&proposers, &config.output)?, &config.output)
    }
}

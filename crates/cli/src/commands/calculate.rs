use blocktime_core::config::AppConfig;
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::{connect, utils::CliResult, OutputArgs};
use crate::render;

#[derive(Args, Debug, Clone, Default)]
pub struct CalculateArgs {
    /// First height of an explicit range (requires --end-height)
    #[arg(long, requires = "end_height")]
    pub start_height: Option<u64>,

    /// Last height of an explicit range (requires --start-height)
    #[arg(long, requires = "start_height")]
    pub end_height: Option<u64>,

    /// Number of recent blocks to sample
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// IQR fence multiplier
    #[arg(long)]
    pub outlier_threshold: Option<f64>,

    /// Confidence level for the estimated range (0-1)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Fraction trimmed from each end after MAD filtering
    #[arg(long)]
    pub trim_percent: Option<f64>,

    /// Use MAD outlier detection (false selects IQR fences)
    #[arg(long)]
    pub use_mad: Option<bool>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl CalculateArgs {
    fn apply(&self, config: &mut AppConfig) {
        let calculator = &mut config.calculator;
        if let Some(sample_size) = self.sample_size {
            calculator.sample_size = sample_size;
        }
        if let Some(threshold) = self.outlier_threshold {
            calculator.outlier_threshold = threshold;
        }
        if let Some(confidence) = self.confidence {
            calculator.confidence_level = confidence;
        }
        if let Some(trim) = self.trim_percent {
            calculator.trim_percent = trim;
        }
        if let Some(use_mad) = self.use_mad {
            calculator.use_median_absolute = use_mad;
        }
        self.output.apply(&mut config.output);
    }

    pub async fn run(self, mut config: AppConfig, cancel: CancellationToken) -> CliResult<()> {
        self.apply(&mut config);
        let calculator = connect(&config, cancel)?;

        let summary = match (self.start_height, self.end_height) {
            (Some(start), Some(end)) => calculator.calculate_stats_for_range(start, end).await?,
            _ => calculator.calculate_stats().await?,
        };

        render::emit(&render::summary(&summary, &config.output)?, &config.output)
    }
}

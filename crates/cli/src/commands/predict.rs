use blocktime_core::{config::AppConfig, predictor::Predictor};
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::{connect, utils::CliResult, OutputArgs};
use crate::render;

pub const DEFAULT_NEXT_BLOCKS: u64 = 10;

#[derive(Args, Debug, Clone, Default)]
pub struct PredictArgs {
    /// Target block height
    #[arg(value_name = "TARGET", conflicts_with_all = ["height", "next"])]
    pub target: Option<u64>,

    /// Target block height (alternative to TARGET)
    #[arg(long, conflicts_with = "next")]
    pub height: Option<u64>,

    /// Predict the next N blocks
    #[arg(long)]
    pub next: Option<u64>,

    /// Number of recent blocks to sample
    #[arg(long)]
    pub sample_size: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// What a `predict` invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictMode {
    Height(u64),
    Next(u64),
}

impl PredictArgs {
    #[must_use]
    pub fn mode(&self) -> PredictMode {
        match (self.target.or(self.height), self.next) {
            (Some(height), _) => PredictMode::Height(height),
            (None, Some(count)) => PredictMode::Next(count),
            (None, None) => PredictMode::Next(DEFAULT_NEXT_BLOCKS),
        }
    }

    pub async fn run(self, mut config: AppConfig, cancel: CancellationToken) -> CliResult<()> {
        if let Some(sample_size) = self.sample_size {
            config.calculator.sample_size = sample_size;
        }
        self.output.apply(&mut config.output);

        let predictor = Predictor::new(connect(&config, cancel)?);

        let rendered = match self.mode() {
            PredictMode::Height(height) => {
                let prediction = predictor.predict_height(height).await?;
                render::prediction(&prediction, &config.output)?
            }
            PredictMode::Next(count) => {
                let prediction = predictor.predict_next(count).await?;
                render::milestones(&prediction, &config.output)?
            }
        };

        render::emit(&rendered, &config.output)
    }
}

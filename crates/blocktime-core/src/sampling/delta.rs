use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;

use crate::types::BlockSample;

/// Time elapsed between a block and its predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDelta {
    /// Height of the later block.
    pub height: u64,
    pub timestamp: DateTime<Utc>,
    /// Proposer of the later block.
    pub proposer: String,
    pub seconds: f64,
}

/// Strictly positive block-time deltas in ascending height order.
///
/// Non-positive deltas (clock skew, duplicate timestamps) are dropped when the
/// series is built; they are neither errors nor outliers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaSeries {
    deltas: Vec<BlockDelta>,
}

impl DeltaSeries {
    /// Builds the series from height-ascending `samples`.
    #[must_use]
    pub fn from_samples(samples: &[BlockSample]) -> Self {
        let deltas = samples
            .windows(2)
            .filter_map(|pair| {
                let (prev, cur) = (&pair[0], &pair[1]);
                let seconds = as_seconds(cur.timestamp - prev.timestamp);
                (seconds > 0.0).then(|| BlockDelta {
                    height: cur.height,
                    timestamp: cur.timestamp,
                    proposer: cur.proposer.clone(),
                    seconds,
                })
            })
            .collect::<Vec<_>>();

        let skipped = samples.len().saturating_sub(1) - deltas.len();
        if skipped > 0 {
            tracing::debug!(skipped, "dropped non-positive block deltas");
        }

        Self { deltas }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDelta> {
        self.deltas.iter()
    }

    /// Delta values in seconds, in height order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.deltas.iter().map(|d| d.seconds).collect()
    }

    /// Deltas grouped by the proposer of the later block, each group in height order.
    #[must_use]
    pub fn by_proposer(&self) -> BTreeMap<&str, Vec<&BlockDelta>> {
        let mut groups: BTreeMap<&str, Vec<&BlockDelta>> = BTreeMap::new();
        for delta in &self.deltas {
            groups.entry(delta.proposer.as_str()).or_default().push(delta);
        }
        groups
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

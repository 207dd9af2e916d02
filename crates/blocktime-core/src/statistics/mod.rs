//! Outlier-robust statistics over block-time delta series.
//!
//! Everything in this module is synchronous, allocation-light and infallible:
//! degenerate inputs (empty, constant, tiny) are handled by policy branches and
//! never produce an error.
//!
//! - [`percentile`]: linear interpolation between order statistics
//! - [`robust`]: MAD / IQR outlier removal, symmetric trimming and summaries
//! - [`estimator`]: confidence-adjusted block-time range

pub mod estimator;
pub mod percentile;
pub mod robust;

pub use estimator::RangeEstimator;
pub use percentile::{percentile, sorted};
pub use robust::{clean, summarize, CleanedSeries, OutlierPolicy};

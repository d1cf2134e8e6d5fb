use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised while building or applying a segmentation.
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// There is no transaction history to segment. Nothing was changed.
    #[error("No transactions recorded yet, segmentation needs at least one sale")]
    InsufficientData,

    /// Another run holds the run lock.
    #[error("Segmentation run {run_id} is already in progress (started {started_at})")]
    RunConflict {
        run_id: String,
        started_at: NaiveDateTime,
    },

    #[error("Cluster count must be at least 1, got {0}")]
    InvalidClusterCount(usize),
}

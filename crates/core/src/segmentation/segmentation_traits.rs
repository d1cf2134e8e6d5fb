use async_trait::async_trait;
use std::time::Duration;

use crate::errors::Result;
use crate::segmentation::segmentation_model::{
    AppliedSegmentation, CustomerSegment, MembershipBatch, SegmentStats, SegmentationReport,
    SegmentationRun,
};

/// Trait for segmentation repository operations
#[async_trait]
pub trait SegmentationRepositoryTrait: Send + Sync {
    /// Takes the run lock by recording a `Running` run.
    ///
    /// Fails with `RunConflict` while another run younger than `stale_after`
    /// is running; older ones are marked failed first.
    async fn begin_run(
        &self,
        requested_clusters: usize,
        stale_after: Duration,
    ) -> Result<SegmentationRun>;

    /// Replaces every membership in one transaction and completes the run.
    ///
    /// Customers without any sale go to the reserved segment. A customer
    /// whose sales are missing from the batch (their first sale committed
    /// after the snapshot was read) is left unassigned until the next run.
    async fn replace_memberships(&self, batch: MembershipBatch) -> Result<AppliedSegmentation>;

    async fn fail_run(&self, run_id: &str, error: &str) -> Result<()>;

    fn list_segments(&self) -> Result<Vec<CustomerSegment>>;
    fn list_segment_stats(&self) -> Result<Vec<SegmentStats>>;
    fn list_runs(&self, limit: i64) -> Result<Vec<SegmentationRun>>;
}

/// Trait for segmentation service operations
#[async_trait]
pub trait SegmentationServiceTrait: Send + Sync {
    /// `None` uses the configured default cluster count.
    async fn run_segmentation(&self, n_clusters: Option<usize>) -> Result<SegmentationReport>;
    fn list_segment_stats(&self) -> Result<Vec<SegmentStats>>;
    fn list_runs(&self, limit: i64) -> Result<Vec<SegmentationRun>>;
}

use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;

use super::engine::cluster_customers;
use super::ranking::rank_profiles;
use super::reconcile::segment_definitions;
use super::rfm::aggregate_rfm;
use super::segmentation_errors::SegmentationError;
use super::segmentation_model::{
    MembershipBatch, SegmentStats, SegmentationConfig, SegmentationReport, SegmentationRun,
};
use super::segmentation_traits::{SegmentationRepositoryTrait, SegmentationServiceTrait};
use crate::errors::{Error, Result};
use crate::sales::SaleRepositoryTrait;
use crate::utils::time_utils::now_utc;

/// Runs the batch: RFM, clustering, ranking, and the atomic membership replace.
pub struct SegmentationService {
    repository: Arc<dyn SegmentationRepositoryTrait>,
    sale_repository: Arc<dyn SaleRepositoryTrait>,
    config: SegmentationConfig,
}

impl SegmentationService {
    pub fn new(
        repository: Arc<dyn SegmentationRepositoryTrait>,
        sale_repository: Arc<dyn SaleRepositoryTrait>,
        config: SegmentationConfig,
    ) -> Self {
        Self {
            repository,
            sale_repository,
            config,
        }
    }

    async fn compute_and_apply(
        &self,
        run: &SegmentationRun,
        requested_clusters: usize,
    ) -> Result<SegmentationReport> {
        let sales = self.sale_repository.load_sale_summaries()?;
        let rfm = aggregate_rfm(&sales, self.config.recency_reference, now_utc())?;
        let outcome = cluster_customers(&rfm, requested_clusters, &self.config)?;

        let profiles = rank_profiles(&outcome.rows);
        let definitions = segment_definitions(&profiles);
        let mut members_by_rank = vec![Vec::new(); definitions.len()];
        for row in &outcome.rows {
            members_by_rank[row.cluster_rank].push(row.customer_id.clone());
        }

        let applied = self
            .repository
            .replace_memberships(MembershipBatch {
                run_id: run.id.clone(),
                definitions,
                members_by_rank,
                naming: self.config.naming,
                requested_clusters,
                effective_clusters: outcome.effective_clusters,
                customers_analyzed: outcome.rows.len(),
                silhouette_score: outcome.silhouette_score,
                assigned_at: now_utc(),
            })
            .await?;

        Ok(SegmentationReport {
            run_id: run.id.clone(),
            customers_analyzed: outcome.rows.len(),
            unsegmented_customers: applied.unsegmented_customers,
            requested_clusters,
            effective_clusters: outcome.effective_clusters,
            silhouette_score: outcome.silhouette_score,
            segments: applied.segments,
        })
    }
}

#[async_trait]
impl SegmentationServiceTrait for SegmentationService {
    async fn run_segmentation(&self, n_clusters: Option<usize>) -> Result<SegmentationReport> {
        let requested = n_clusters.unwrap_or(self.config.default_clusters);
        if requested < 1 {
            return Err(SegmentationError::InvalidClusterCount(requested).into());
        }

        let run = self
            .repository
            .begin_run(requested, self.config.run_stale_after)
            .await?;
        info!("Segmentation run {} started ({} clusters)", run.id, requested);

        match self.compute_and_apply(&run, requested).await {
            Ok(report) => {
                info!(
                    "Segmentation run {} completed: {} customers in {} segments, {} unsegmented",
                    report.run_id,
                    report.customers_analyzed,
                    report.effective_clusters,
                    report.unsegmented_customers
                );
                Ok(report)
            }
            Err(e) => {
                match &e {
                    Error::Segmentation(SegmentationError::InsufficientData) => {
                        warn!("Segmentation run {} skipped: {}", run.id, e)
                    }
                    _ => error!("Segmentation run {} failed: {}", run.id, e),
                }
                if let Err(mark_err) = self.repository.fail_run(&run.id, &e.to_string()).await {
                    error!(
                        "Could not mark segmentation run {} as failed: {}",
                        run.id, mark_err
                    );
                }
                Err(e)
            }
        }
    }

    fn list_segment_stats(&self) -> Result<Vec<SegmentStats>> {
        self.repository.list_segment_stats()
    }

    fn list_runs(&self, limit: i64) -> Result<Vec<SegmentationRun>> {
        self.repository.list_runs(limit)
    }
}

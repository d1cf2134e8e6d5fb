use log::{debug, info};
use num_traits::ToPrimitive;
use std::collections::BTreeSet;

use super::kmeans::{silhouette_score, FeatureVector, KMeans, StandardScaler};
use super::ranking::rank_clusters;
use super::segmentation_errors::SegmentationError;
use super::segmentation_model::{ClusterOutcome, RfmRow, SegmentationConfig};
use crate::errors::Result;

impl RfmRow {
    pub fn features(&self) -> FeatureVector {
        [
            self.recency_days as f64,
            self.frequency as f64,
            self.monetary.to_f64().unwrap_or_default(),
        ]
    }
}

/// Clusters the RFM table into at most `requested_clusters` ranked groups.
///
/// `requested_clusters` is clamped to the number of customers. With a single
/// cluster left every customer is rank 0 and no quality score is computed.
pub fn cluster_customers(
    rows: &[RfmRow],
    requested_clusters: usize,
    config: &SegmentationConfig,
) -> Result<ClusterOutcome> {
    if requested_clusters < 1 {
        return Err(SegmentationError::InvalidClusterCount(requested_clusters).into());
    }
    if rows.is_empty() {
        return Err(SegmentationError::InsufficientData.into());
    }

    let features: Vec<FeatureVector> = rows.iter().map(RfmRow::features).collect();
    let scaler = StandardScaler::fit(&features);
    let scaled = scaler.transform(&features);

    let k = requested_clusters.min(rows.len());
    if k < requested_clusters {
        debug!(
            "Clamped cluster count from {} to {} customers",
            requested_clusters, k
        );
    }

    let (labels, inertia) = if k <= 1 {
        let inertia = scaled
            .iter()
            .map(|p| p.iter().map(|v| v * v).sum::<f64>())
            .sum();
        (vec![0usize; rows.len()], inertia)
    } else {
        let fit = KMeans {
            n_clusters: k,
            n_init: config.n_init,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            seed: config.random_seed,
        }
        .fit(&scaled)?;
        (fit.labels, fit.inertia)
    };

    let effective_clusters = labels.iter().collect::<BTreeSet<_>>().len();
    let silhouette = if k <= 1 {
        None
    } else {
        silhouette_score(&scaled, &labels)
    };
    let ranked = rank_clusters(rows, &labels);

    info!(
        "Clustered {} customers into {} of {} requested clusters (silhouette {:?})",
        rows.len(),
        effective_clusters,
        requested_clusters,
        silhouette
    );

    Ok(ClusterOutcome {
        rows: ranked,
        requested_clusters,
        effective_clusters,
        silhouette_score: silhouette,
        scaler,
        inertia,
    })
}

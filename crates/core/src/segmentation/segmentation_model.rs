//! Segmentation domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::kmeans::StandardScaler;
use crate::constants::{DEFAULT_CLUSTER_COUNT, DEFAULT_KMEANS_SEED};
use crate::errors::{Error, ValidationError};
use crate::promotions::Promotion;

/// A named, colored customer bucket. Its id survives re-segmentation so that
/// promotions keep pointing at the same conceptual group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegment {
    pub id: String,
    pub segment_name: String,
    pub description: Option<String>,
    pub color: String,
    /// The reserved bucket for customers without transactions. Never ranked.
    pub is_reserved: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown segmentation run status '{}'",
                other
            ))
            .into()),
        }
    }
}

/// One segmentation attempt. A `Running` row doubles as the run lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationRun {
    pub id: String,
    pub status: RunStatus,
    pub requested_clusters: i32,
    pub effective_clusters: Option<i32>,
    pub customers_analyzed: i32,
    pub unsegmented_customers: i32,
    pub silhouette_score: Option<f64>,
    pub error: Option<String>,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
}

/// Instant that recency is measured from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecencyReference {
    /// Wall clock at the time of the run.
    #[default]
    Now,
    /// Latest transaction timestamp across all customers. Reproducible.
    LatestTransaction,
}

impl FromStr for RecencyReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "now" => Ok(RecencyReference::Now),
            "latest" | "latest_transaction" => Ok(RecencyReference::LatestTransaction),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown recency reference '{}', expected 'now' or 'latest'",
                other
            ))
            .into()),
        }
    }
}

/// What happens to the name and color of a segment reused for a rank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentNaming {
    /// Keep whatever an administrator named the segment; refresh the description only.
    #[default]
    PreserveAdminNames,
    /// Rename and recolor reused segments to the rank defaults.
    ResetToDefaults,
}

#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    pub default_clusters: usize,
    pub random_seed: u64,
    pub n_init: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub recency_reference: RecencyReference,
    /// A `Running` run older than this no longer blocks new runs.
    pub run_stale_after: Duration,
    pub naming: SegmentNaming,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            default_clusters: DEFAULT_CLUSTER_COUNT,
            random_seed: DEFAULT_KMEANS_SEED,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            recency_reference: RecencyReference::Now,
            run_stale_after: Duration::from_secs(15 * 60),
            naming: SegmentNaming::PreserveAdminNames,
        }
    }
}

/// Recency/frequency/monetary features of one customer with at least one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfmRow {
    pub customer_id: String,
    pub recency_days: i64,
    pub frequency: i64,
    pub monetary: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRfmRow {
    pub customer_id: String,
    pub recency_days: i64,
    pub frequency: i64,
    pub monetary: Decimal,
    /// 0 is the cluster with the highest mean monetary value.
    pub cluster_rank: usize,
}

/// Mean features of the customers sharing a rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankProfile {
    pub rank: usize,
    pub customers: usize,
    pub mean_recency_days: f64,
    pub mean_frequency: f64,
    pub mean_monetary: Decimal,
}

/// Result of clustering one RFM table.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub rows: Vec<RankedRfmRow>,
    pub requested_clusters: usize,
    /// Number of distinct ranks actually produced.
    pub effective_clusters: usize,
    /// `None` when fewer than two or more than `n - 1` clusters came out.
    pub silhouette_score: Option<f64>,
    pub scaler: StandardScaler,
    pub inertia: f64,
}

/// Name, color and freshly computed description wanted for a rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDefinition {
    pub rank: usize,
    pub name: String,
    pub color: String,
    pub description: String,
}

/// Everything the repository needs to replace memberships for a run.
#[derive(Debug, Clone)]
pub struct MembershipBatch {
    pub run_id: String,
    pub definitions: Vec<SegmentDefinition>,
    /// Customer ids per rank, indexed like `definitions`.
    pub members_by_rank: Vec<Vec<String>>,
    pub naming: SegmentNaming,
    pub requested_clusters: usize,
    pub effective_clusters: usize,
    pub customers_analyzed: usize,
    pub silhouette_score: Option<f64>,
    pub assigned_at: NaiveDateTime,
}

/// How a rank ended up on a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedSegment {
    pub rank: usize,
    pub segment_id: String,
    pub segment_name: String,
    pub color: String,
    pub description: String,
    pub customers: usize,
    /// `reused`, `renamed` or `created`.
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedSegmentation {
    pub segments: Vec<AppliedSegment>,
    pub reserved_segment_id: Option<String>,
    pub unsegmented_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationReport {
    pub run_id: String,
    pub customers_analyzed: usize,
    pub unsegmented_customers: usize,
    pub requested_clusters: usize,
    pub effective_clusters: usize,
    pub silhouette_score: Option<f64>,
    pub segments: Vec<AppliedSegment>,
}

/// A segment with its current member count and promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStats {
    pub segment_id: String,
    pub segment_name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_reserved: bool,
    pub member_count: i64,
    pub promotion: Option<Promotion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recency_reference_parsing() {
        assert_eq!(
            "latest".parse::<RecencyReference>().unwrap(),
            RecencyReference::LatestTransaction
        );
        assert_eq!(" NOW ".parse::<RecencyReference>().unwrap(), RecencyReference::Now);
        assert!("yesterday".parse::<RecencyReference>().is_err());
    }

    #[test]
    fn test_run_status_round_trips_through_str() {
        for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            assert_eq!(status.as_str().parse::<RunStatus>().unwrap(), status);
        }
    }
}

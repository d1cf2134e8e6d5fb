//! Segmentation module - RFM aggregation, clustering, stable ranking and the
//! reconciliation of ranks onto durable customer segments.

mod engine;
mod kmeans;
mod ranking;
mod reconcile;
mod rfm;
mod segmentation_errors;
mod segmentation_model;
mod segmentation_service;
mod segmentation_traits;


pub use engine::cluster_customers;
pub use kmeans::{silhouette_score, FeatureVector, KMeans, KMeansFit, StandardScaler, RFM_FEATURES};
pub use ranking::{cluster_rank_map, rank_clusters, rank_profiles};
pub use reconcile::{
    default_segment_style, describe_profile, reconcile_segments, reserved_segment_definition,
    segment_definitions, SegmentAction, SegmentPlan,
};
pub use rfm::aggregate_rfm;
pub use segmentation_errors::SegmentationError;
pub use segmentation_model::{
    AppliedSegment, AppliedSegmentation, ClusterOutcome, CustomerSegment, MembershipBatch,
    RankProfile, RankedRfmRow, RecencyReference, RfmRow, RunStatus, SegmentDefinition,
    SegmentNaming, SegmentStats, SegmentationConfig, SegmentationReport, SegmentationRun,
};
pub use segmentation_service::SegmentationService;
pub use segmentation_traits::{SegmentationRepositoryTrait, SegmentationServiceTrait};

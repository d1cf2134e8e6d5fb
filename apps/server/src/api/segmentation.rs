use std::sync::Arc;

use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{
        RunSegmentationRequest, RunsQuery, SegmentStats, SegmentationRun,
        SegmentationRunResponse,
    },
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use retailpos_core::{errors::Error as CoreError, segmentation::SegmentationError};

async fn run_segmentation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunSegmentationRequest>,
) -> ApiResult<Json<SegmentationRunResponse>> {
    match state
        .segmentation_service
        .run_segmentation(request.n_clusters)
        .await
    {
        Ok(report) => Ok(Json(SegmentationRunResponse::from(report))),
        // Nothing to segment yet is a normal outcome for a fresh store.
        Err(e @ CoreError::Segmentation(SegmentationError::InsufficientData)) => {
            Ok(Json(SegmentationRunResponse::declined(e.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}

async fn list_segments(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SegmentStats>>> {
    let stats = state.segmentation_service.list_segment_stats()?;
    Ok(Json(stats.into_iter().map(SegmentStats::from).collect()))
}

async fn list_runs(
    Query(query): Query<RunsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SegmentationRun>>> {
    let runs = state
        .segmentation_service
        .list_runs(query.limit.clamp(1, 200))?;
    Ok(Json(runs.into_iter().map(SegmentationRun::from).collect()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/segmentation/run", post(run_segmentation))
        .route("/segmentation/runs", get(list_runs))
        .route("/segments", get(list_segments))
}

use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{CustomerSegment, DiscountPreview, DiscountPreviewQuery, NewPromotion, Promotion},
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use retailpos_core::promotions as core_promotions;

async fn get_customer_segments(
    Path(customer_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CustomerSegment>>> {
    let segments = state.promotion_service.get_customer_segments(&customer_id)?;
    Ok(Json(segments.into_iter().map(CustomerSegment::from).collect()))
}

async fn preview_discount(
    Path(customer_id): Path<String>,
    Query(query): Query<DiscountPreviewQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DiscountPreview>> {
    if query.gross_total.is_sign_negative() {
        return Err(ApiError::BadRequest(
            "gross_total cannot be negative".to_string(),
        ));
    }
    let resolution = state
        .promotion_service
        .preview_discount(&customer_id, query.gross_total)?;
    Ok(Json(DiscountPreview {
        gross_total: query.gross_total,
        discount: resolution.discount,
        net_total: query.gross_total - resolution.discount,
        promotion_id: resolution.promotion_id,
        segment_id: resolution.segment_id,
    }))
}

async fn list_promotions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Promotion>>> {
    let promotions = state.promotion_service.list_promotions()?;
    Ok(Json(promotions.into_iter().map(Promotion::from).collect()))
}

async fn create_promotion(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewPromotion>,
) -> ApiResult<Json<Promotion>> {
    let new_promotion = core_promotions::NewPromotion::try_from(payload)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let created = state.promotion_service.create_promotion(new_promotion).await?;
    Ok(Json(Promotion::from(created)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers/{id}/segments", get(get_customer_segments))
        .route("/customers/{id}/discount-preview", get(preview_discount))
        .route("/promotions", get(list_promotions).post(create_promotion))
}

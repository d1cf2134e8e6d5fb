use std::sync::Arc;

use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{CheckoutResponse, Sale},
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use retailpos_core::sales::CheckoutRequest;

const OPERATOR_HEADER: &str = "x-operator-id";

fn operator_id(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

async fn checkout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let operator = operator_id(&headers, &state.default_operator_id);
    let receipt = state.sale_service.checkout(request, &operator).await?;
    Ok(Json(CheckoutResponse::from(receipt)))
}

async fn get_sale(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Sale>> {
    let sale = state.sale_service.get_sale(&id)?;
    Ok(Json(Sale::from(sale)))
}

async fn list_customer_sales(
    Path(customer_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Sale>>> {
    let sales = state.sale_service.list_customer_sales(&customer_id)?;
    Ok(Json(sales.into_iter().map(Sale::from).collect()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sales/checkout", post(checkout))
        .route("/sales/{id}", get(get_sale))
        .route("/customers/{id}/sales", get(list_customer_sales))
}

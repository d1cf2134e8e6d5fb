//! Wire types of the HTTP API. Field names are snake_case.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use retailpos_core::promotions as core_promotions;
use retailpos_core::sales as core_sales;
use retailpos_core::segmentation as core_segmentation;

#[derive(Serialize, Debug, Clone)]
pub struct SaleItem {
    pub product_id: String,
    pub line_no: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<core_sales::SaleItem> for SaleItem {
    fn from(i: core_sales::SaleItem) -> Self {
        Self {
            product_id: i.product_id,
            line_no: i.line_no,
            quantity: i.quantity,
            unit_price: i.unit_price,
            line_total: i.line_total,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CheckoutResponse {
    pub success: bool,
    pub transaction_id: String,
    pub gross_total: Decimal,
    pub discount_applied: Decimal,
    pub net_total: Decimal,
    pub promotion_id: Option<String>,
    pub segment_id: Option<String>,
    pub items: Vec<SaleItem>,
    pub created_at: NaiveDateTime,
}

impl From<core_sales::CheckoutReceipt> for CheckoutResponse {
    fn from(r: core_sales::CheckoutReceipt) -> Self {
        Self {
            success: true,
            transaction_id: r.transaction_id,
            gross_total: r.gross_total,
            discount_applied: r.discount_applied,
            net_total: r.net_total,
            promotion_id: r.promotion_id,
            segment_id: r.segment_id,
            items: r.items.into_iter().map(SaleItem::from).collect(),
            created_at: r.created_at,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    pub operator_id: String,
    pub gross_total: Decimal,
    pub discount_amount: Decimal,
    pub net_total: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub items: Vec<SaleItem>,
}

impl From<core_sales::SaleTransaction> for Sale {
    fn from(s: core_sales::SaleTransaction) -> Self {
        Self {
            id: s.id,
            customer_id: s.customer_id,
            operator_id: s.operator_id,
            gross_total: s.gross_total,
            discount_amount: s.discount_amount,
            net_total: s.net_total,
            payment_method: s.payment_method.to_string(),
            notes: s.notes,
            created_at: s.created_at,
            items: s.items.into_iter().map(SaleItem::from).collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Promotion {
    pub id: String,
    pub segment_id: String,
    pub promotion_type: String,
    pub promotion_value: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<core_promotions::Promotion> for Promotion {
    fn from(p: core_promotions::Promotion) -> Self {
        Self {
            id: p.id,
            segment_id: p.segment_id,
            promotion_type: p.promotion_type.to_string(),
            promotion_value: p.promotion_value,
            description: p.description,
            is_active: p.is_active,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewPromotion {
    pub segment_id: String,
    pub promotion_type: String,
    pub promotion_value: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<NewPromotion> for core_promotions::NewPromotion {
    type Error = core_promotions::PromotionError;

    fn try_from(p: NewPromotion) -> Result<Self, Self::Error> {
        Ok(Self {
            id: None,
            promotion_type: p.promotion_type.parse()?,
            segment_id: p.segment_id,
            promotion_value: p.promotion_value,
            description: p.description,
        })
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CustomerSegment {
    pub segment_id: String,
    pub segment_name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_reserved: bool,
    pub assigned_at: NaiveDateTime,
    pub promotion: Option<Promotion>,
}

impl From<core_promotions::CustomerSegmentInfo> for CustomerSegment {
    fn from(s: core_promotions::CustomerSegmentInfo) -> Self {
        Self {
            segment_id: s.segment_id,
            segment_name: s.segment_name,
            description: s.description,
            color: s.color,
            is_reserved: s.is_reserved,
            assigned_at: s.assigned_at,
            promotion: s.promotion.map(Promotion::from),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RunSegmentationRequest {
    #[serde(default)]
    pub n_clusters: Option<usize>,
}

#[derive(Serialize, Debug, Clone)]
pub struct AppliedSegment {
    pub rank: usize,
    pub segment_id: String,
    pub segment_name: String,
    pub color: String,
    pub description: String,
    pub customers: usize,
    pub action: String,
}

impl From<core_segmentation::AppliedSegment> for AppliedSegment {
    fn from(s: core_segmentation::AppliedSegment) -> Self {
        Self {
            rank: s.rank,
            segment_id: s.segment_id,
            segment_name: s.segment_name,
            color: s.color,
            description: s.description,
            customers: s.customers,
            action: s.action,
        }
    }
}

/// Outcome of `POST /segmentation/run`. A run refused for lack of data is
/// still a 200 with `success: false` and the reason in `message`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct SegmentationRunResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub customers_analyzed: usize,
    pub unsegmented_customers: usize,
    pub requested_clusters: Option<usize>,
    pub effective_clusters: Option<usize>,
    pub silhouette_score: Option<f64>,
    pub segments: Vec<AppliedSegment>,
}

impl From<core_segmentation::SegmentationReport> for SegmentationRunResponse {
    fn from(r: core_segmentation::SegmentationReport) -> Self {
        Self {
            success: true,
            message: None,
            run_id: Some(r.run_id),
            customers_analyzed: r.customers_analyzed,
            unsegmented_customers: r.unsegmented_customers,
            requested_clusters: Some(r.requested_clusters),
            effective_clusters: Some(r.effective_clusters),
            silhouette_score: r.silhouette_score,
            segments: r.segments.into_iter().map(AppliedSegment::from).collect(),
        }
    }
}

impl SegmentationRunResponse {
    pub fn declined(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SegmentStats {
    pub segment_id: String,
    pub segment_name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_reserved: bool,
    pub member_count: i64,
    pub promotion: Option<Promotion>,
}

impl From<core_segmentation::SegmentStats> for SegmentStats {
    fn from(s: core_segmentation::SegmentStats) -> Self {
        Self {
            segment_id: s.segment_id,
            segment_name: s.segment_name,
            description: s.description,
            color: s.color,
            is_reserved: s.is_reserved,
            member_count: s.member_count,
            promotion: s.promotion.map(Promotion::from),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SegmentationRun {
    pub id: String,
    pub status: String,
    pub requested_clusters: i32,
    pub effective_clusters: Option<i32>,
    pub customers_analyzed: i32,
    pub unsegmented_customers: i32,
    pub silhouette_score: Option<f64>,
    pub error: Option<String>,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
}

impl From<core_segmentation::SegmentationRun> for SegmentationRun {
    fn from(r: core_segmentation::SegmentationRun) -> Self {
        Self {
            id: r.id,
            status: r.status.to_string(),
            requested_clusters: r.requested_clusters,
            effective_clusters: r.effective_clusters,
            customers_analyzed: r.customers_analyzed,
            unsegmented_customers: r.unsegmented_customers,
            silhouette_score: r.silhouette_score,
            error: r.error,
            started_at: r.started_at,
            finished_at: r.finished_at,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RunsQuery {
    #[serde(default = "default_runs_limit")]
    pub limit: i64,
}

fn default_runs_limit() -> i64 {
    20
}

#[derive(Deserialize, Debug, Clone)]
pub struct DiscountPreviewQuery {
    pub gross_total: Decimal,
}

#[derive(Serialize, Debug, Clone)]
pub struct DiscountPreview {
    pub gross_total: Decimal,
    pub discount: Decimal,
    pub net_total: Decimal,
    pub promotion_id: Option<String>,
    pub segment_id: Option<String>,
}

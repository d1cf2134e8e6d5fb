//! Database models for segmentation.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use retailpos_core::segmentation::{CustomerSegment, RunStatus, SegmentationRun};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::customer_segments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CustomerSegmentDB {
    pub id: String,
    pub segment_name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_reserved: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<CustomerSegmentDB> for CustomerSegment {
    fn from(db: CustomerSegmentDB) -> Self {
        Self {
            id: db.id,
            segment_name: db.segment_name,
            description: db.description,
            color: db.color,
            is_reserved: db.is_reserved,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::customer_segment_memberships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MembershipDB {
    pub id: String,
    pub customer_id: String,
    pub segment_id: String,
    pub run_id: Option<String>,
    pub assigned_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::segmentation_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SegmentationRunDB {
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

impl TryFrom<SegmentationRunDB> for SegmentationRun {
    type Error = StorageError;

    fn try_from(db: SegmentationRunDB) -> Result<Self, Self::Error> {
        let status = db
            .status
            .parse::<RunStatus>()
            .map_err(|e| StorageError::Decode(e.to_string()))?;
        Ok(Self {
            id: db.id,
            status,
            requested_clusters: db.requested_clusters,
            effective_clusters: db.effective_clusters,
            customers_analyzed: db.customers_analyzed,
            unsegmented_customers: db.unsegmented_customers,
            silhouette_score: db.silhouette_score,
            error: db.error,
            started_at: db.started_at,
            finished_at: db.finished_at,
        })
    }
}

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use retailpos_core::errors::Error;
use retailpos_core::promotions::{
    CustomerSegmentInfo, NewPromotion, Promotion, PromotionRepositoryTrait,
};
use retailpos_core::utils::time_utils::now_utc;
use retailpos_core::Result;

use super::model::PromotionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{customer_segment_memberships, customer_segments, promotions};
use crate::segmentation::CustomerSegmentDB;

/// Active promotions attached to the segments a customer currently belongs to.
///
/// Shared with the checkout unit of work so the discount is read on the
/// writer connection, inside the sale's own transaction.
pub fn load_active_promotions_for_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> Result<Vec<Promotion>> {
    let rows = promotions::table
        .inner_join(
            customer_segment_memberships::table
                .on(customer_segment_memberships::segment_id.eq(promotions::segment_id)),
        )
        .filter(customer_segment_memberships::customer_id.eq(customer_id))
        .filter(promotions::is_active.eq(true))
        .order(promotions::id.asc())
        .select(PromotionDB::as_select())
        .load(conn)
        .map_err(StorageError::from)?;
    rows.into_iter()
        .map(|row| Promotion::try_from(row).map_err(Error::from))
        .collect()
}

pub struct PromotionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PromotionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        PromotionRepository { pool, writer }
    }
}

#[async_trait]
impl PromotionRepositoryTrait for PromotionRepository {
    fn get_customer_segments(&self, customer_id: &str) -> Result<Vec<CustomerSegmentInfo>> {
        let mut conn = get_connection(&self.pool)?;
        let memberships: Vec<(CustomerSegmentDB, chrono::NaiveDateTime)> =
            customer_segment_memberships::table
                .inner_join(customer_segments::table)
                .filter(customer_segment_memberships::customer_id.eq(customer_id))
                .order(customer_segment_memberships::assigned_at.desc())
                .select((
                    CustomerSegmentDB::as_select(),
                    customer_segment_memberships::assigned_at,
                ))
                .load(&mut conn)
                .map_err(StorageError::from)?;

        let segment_ids: Vec<&str> = memberships.iter().map(|(s, _)| s.id.as_str()).collect();
        let mut by_segment: HashMap<String, Promotion> = promotions::table
            .filter(promotions::segment_id.eq_any(&segment_ids))
            .select(PromotionDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|row| Promotion::try_from(row).map(|p| (p.segment_id.clone(), p)))
            .collect::<std::result::Result<_, StorageError>>()?;

        Ok(memberships
            .into_iter()
            .map(|(segment, assigned_at)| CustomerSegmentInfo {
                promotion: by_segment.remove(&segment.id),
                segment_id: segment.id,
                segment_name: segment.segment_name,
                description: segment.description,
                color: segment.color,
                is_reserved: segment.is_reserved,
                assigned_at,
            })
            .collect())
    }

    fn get_by_segment(&self, segment_id: &str) -> Result<Option<Promotion>> {
        let mut conn = get_connection(&self.pool)?;
        promotions::table
            .filter(promotions::segment_id.eq(segment_id))
            .select(PromotionDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(|row| Promotion::try_from(row).map_err(Error::from))
            .transpose()
    }

    fn list(&self) -> Result<Vec<Promotion>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = promotions::table
            .order(promotions::created_at.asc())
            .select(PromotionDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Promotion::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn create(&self, new_promotion: NewPromotion) -> Result<Promotion> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Promotion> {
                let now = now_utc();
                let row = PromotionDB {
                    id: new_promotion
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    segment_id: new_promotion.segment_id,
                    promotion_type: new_promotion.promotion_type.as_str().to_string(),
                    promotion_value: new_promotion.promotion_value.to_string(),
                    description: new_promotion.description,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                let saved = diesel::insert_into(promotions::table)
                    .values(&row)
                    .returning(PromotionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Promotion::try_from(saved)?)
            })
            .await
    }
}

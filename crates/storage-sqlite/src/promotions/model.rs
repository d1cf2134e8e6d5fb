//! Database models for promotions.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::parse_decimal;
use retailpos_core::promotions::{Promotion, PromotionType};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::promotions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PromotionDB {
    pub id: String,
    pub segment_id: String,
    pub promotion_type: String,
    pub promotion_value: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<PromotionDB> for Promotion {
    type Error = StorageError;

    fn try_from(db: PromotionDB) -> Result<Self, Self::Error> {
        let promotion_type = db
            .promotion_type
            .parse::<PromotionType>()
            .map_err(|e| StorageError::Decode(e.to_string()))?;
        Ok(Self {
            promotion_value: parse_decimal(&db.promotion_value, "promotions.promotion_value")?,
            promotion_type,
            id: db.id,
            segment_id: db.segment_id,
            description: db.description,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

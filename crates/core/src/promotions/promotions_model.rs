//! Promotion domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::promotions_errors::PromotionError;
use crate::errors::Result;

/// How a promotion's value is applied to the gross total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PromotionType {
    /// `value` is a percentage of the gross total, at most 100.
    Percentage,
    /// `value` is a flat currency amount.
    Fixed,
}

impl PromotionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionType::Percentage => "percentage",
            PromotionType::Fixed => "fixed",
        }
    }
}

impl fmt::Display for PromotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionType {
    type Err = PromotionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" | "percent" => Ok(PromotionType::Percentage),
            "fixed" | "fixed_amount" => Ok(PromotionType::Fixed),
            other => Err(PromotionError::UnknownType(other.to_string())),
        }
    }
}

/// Domain model representing a promotion attached to exactly one segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub segment_id: String,
    pub promotion_type: PromotionType,
    pub promotion_value: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for attaching a promotion to a segment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    pub id: Option<String>,
    pub segment_id: String,
    pub promotion_type: PromotionType,
    pub promotion_value: Decimal,
    pub description: Option<String>,
}

impl NewPromotion {
    /// Values are non-negative; percentages are capped at 100.
    pub fn validate(&self) -> Result<()> {
        if self.promotion_value.is_sign_negative() && !self.promotion_value.is_zero() {
            return Err(PromotionError::NegativeValue(self.promotion_value).into());
        }
        if self.promotion_type == PromotionType::Percentage
            && self.promotion_value > Decimal::ONE_HUNDRED
        {
            return Err(PromotionError::PercentageAbove100(self.promotion_value).into());
        }
        Ok(())
    }
}

/// A customer's current segment membership together with the segment's
/// promotion, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegmentInfo {
    pub segment_id: String,
    pub segment_name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_reserved: bool,
    pub assigned_at: NaiveDateTime,
    pub promotion: Option<Promotion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_promotion(promotion_type: PromotionType, value: Decimal) -> NewPromotion {
        NewPromotion {
            id: None,
            segment_id: "seg-1".to_string(),
            promotion_type,
            promotion_value: value,
            description: None,
        }
    }

    #[test]
    fn test_percentage_capped_at_100() {
        assert!(new_promotion(PromotionType::Percentage, dec!(100)).validate().is_ok());
        assert!(new_promotion(PromotionType::Percentage, dec!(100.01))
            .validate()
            .is_err());
    }

    #[test]
    fn test_fixed_allows_values_above_100() {
        assert!(new_promotion(PromotionType::Fixed, dec!(25000)).validate().is_ok());
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(new_promotion(PromotionType::Fixed, dec!(-5)).validate().is_err());
        assert!(new_promotion(PromotionType::Percentage, dec!(-0.5))
            .validate()
            .is_err());
    }

    #[test]
    fn test_promotion_type_round_trips_storage_strings() {
        assert_eq!(
            "percentage".parse::<PromotionType>().unwrap(),
            PromotionType::Percentage
        );
        assert_eq!("FIXED".parse::<PromotionType>().unwrap(), PromotionType::Fixed);
        assert!("bogo".parse::<PromotionType>().is_err());
        assert_eq!(PromotionType::Fixed.as_str(), "fixed");
    }
}

//! Discount resolution.
//!
//! The discount of a checkout is always re-derived here from the customer's
//! current segment promotions; a discount submitted by a client is never an
//! input.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::promotions_model::{Promotion, PromotionType};
use crate::constants::MONEY_DECIMAL_PRECISION;

/// The single discount chosen for a gross total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountResolution {
    /// Always within `[0, gross]`.
    pub discount: Decimal,
    pub promotion_id: Option<String>,
    pub segment_id: Option<String>,
}

impl DiscountResolution {
    pub fn none() -> Self {
        Self {
            discount: Decimal::ZERO,
            promotion_id: None,
            segment_id: None,
        }
    }
}

/// Discount a single promotion would grant on `gross`, before clamping.
pub fn candidate_discount(promotion: &Promotion, gross: Decimal) -> Decimal {
    match promotion.promotion_type {
        PromotionType::Percentage => {
            // The value is at most 100, so dividing first never exceeds `gross`.
            let raw = match gross.checked_mul(promotion.promotion_value) {
                Some(product) => product / Decimal::ONE_HUNDRED,
                None => gross / Decimal::ONE_HUNDRED * promotion.promotion_value,
            };
            raw.round_dp_with_strategy(MONEY_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
        }
        PromotionType::Fixed => promotion.promotion_value,
    }
}

/// Picks the largest candidate discount among the active promotions and
/// clamps it to the gross total.
///
/// Under the at-most-one-membership invariant there is at most one candidate;
/// the max rule keeps the outcome customer-favourable if that ever changes.
/// Equal candidates keep the first one seen.
pub fn resolve_discount<'a, I>(promotions: I, gross: Decimal) -> DiscountResolution
where
    I: IntoIterator<Item = &'a Promotion>,
{
    if gross <= Decimal::ZERO {
        return DiscountResolution::none();
    }

    let mut best: Option<(&Promotion, Decimal)> = None;
    for promotion in promotions.into_iter().filter(|p| p.is_active) {
        let candidate = candidate_discount(promotion, gross);
        match best {
            Some((_, current)) if candidate <= current => {}
            _ => best = Some((promotion, candidate)),
        }
    }

    match best {
        Some((promotion, candidate)) => DiscountResolution {
            discount: candidate.max(Decimal::ZERO).min(gross),
            promotion_id: Some(promotion.id.clone()),
            segment_id: Some(promotion.segment_id.clone()),
        },
        None => DiscountResolution::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    fn promotion(id: &str, promotion_type: PromotionType, value: Decimal) -> Promotion {
        Promotion {
            id: id.to_string(),
            segment_id: format!("seg-{}", id),
            promotion_type,
            promotion_value: value,
            description: None,
            is_active: true,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_percentage_discount_on_gross() {
        let promos = vec![promotion("p1", PromotionType::Percentage, dec!(10))];
        let resolution = resolve_discount(&promos, dec!(200));
        assert_eq!(resolution.discount, dec!(20));
        assert_eq!(resolution.promotion_id.as_deref(), Some("p1"));
        assert_eq!(resolution.segment_id.as_deref(), Some("seg-p1"));
    }

    #[test]
    fn test_percentage_discount_rounds_to_cents() {
        let promo = promotion("p1", PromotionType::Percentage, dec!(12.5));
        // 12.5% of 10.05 = 1.25625
        assert_eq!(candidate_discount(&promo, dec!(10.05)), dec!(1.26));
    }

    #[test]
    fn test_percentage_of_largest_gross_stays_within_gross() {
        let promo = promotion("p1", PromotionType::Percentage, dec!(100));
        let resolution = resolve_discount([&promo], Decimal::MAX);
        assert!(resolution.discount > Decimal::ZERO);
        assert!(resolution.discount <= Decimal::MAX);
        assert_eq!(resolution.promotion_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_no_promotions_means_zero_discount() {
        let resolution = resolve_discount(&Vec::<Promotion>::new(), dec!(150));
        assert_eq!(resolution, DiscountResolution::none());
    }

    #[test]
    fn test_largest_candidate_wins() {
        let promos = vec![
            promotion("pct", PromotionType::Percentage, dec!(5)),
            promotion("flat", PromotionType::Fixed, dec!(30)),
        ];
        // 5% of 400 = 20 < 30 flat
        let resolution = resolve_discount(&promos, dec!(400));
        assert_eq!(resolution.discount, dec!(30));
        assert_eq!(resolution.promotion_id.as_deref(), Some("flat"));

        // 5% of 1000 = 50 > 30 flat
        let resolution = resolve_discount(&promos, dec!(1000));
        assert_eq!(resolution.discount, dec!(50));
        assert_eq!(resolution.promotion_id.as_deref(), Some("pct"));
    }

    #[test]
    fn test_fixed_discount_clamped_to_gross() {
        let promos = vec![promotion("flat", PromotionType::Fixed, dec!(50))];
        let resolution = resolve_discount(&promos, dec!(35.50));
        assert_eq!(resolution.discount, dec!(35.50));
    }

    #[test]
    fn test_inactive_promotions_are_ignored() {
        let mut promo = promotion("p1", PromotionType::Percentage, dec!(50));
        promo.is_active = false;
        let resolution = resolve_discount(&[promo], dec!(100));
        assert_eq!(resolution.discount, Decimal::ZERO);
        assert!(resolution.promotion_id.is_none());
    }

    #[test]
    fn test_zero_gross_yields_zero_discount() {
        let promos = vec![promotion("flat", PromotionType::Fixed, dec!(10))];
        assert_eq!(resolve_discount(&promos, Decimal::ZERO).discount, Decimal::ZERO);
    }
}

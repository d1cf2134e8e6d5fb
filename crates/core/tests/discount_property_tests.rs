//! Property-based integration tests for discount resolution.

use chrono::NaiveDateTime;
use proptest::prelude::*;
use rust_decimal::Decimal;
use retailpos_core::promotions::{resolve_discount, Promotion, PromotionType};

// =============================================================================
// Generators
// =============================================================================

fn arb_promotion(idx: usize) -> impl Strategy<Value = Promotion> {
    (
        prop_oneof![Just(PromotionType::Percentage), Just(PromotionType::Fixed)],
        0i64..=10_000,
        0i64..10_000_000,
        any::<bool>(),
    )
        .prop_map(move |(promotion_type, pct_hundredths, fixed_cents, is_active)| {
            let promotion_value = match promotion_type {
                PromotionType::Percentage => Decimal::new(pct_hundredths, 2),
                PromotionType::Fixed => Decimal::new(fixed_cents, 2),
            };
            Promotion {
                id: format!("promo-{}", idx),
                segment_id: format!("seg-{}", idx),
                promotion_type,
                promotion_value,
                description: None,
                is_active,
                created_at: NaiveDateTime::default(),
                updated_at: NaiveDateTime::default(),
            }
        })
}

fn arb_promotions() -> impl Strategy<Value = Vec<Promotion>> {
    (0usize..4).prop_flat_map(|n| (0..n).map(arb_promotion).collect::<Vec<_>>())
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// 0 <= discount <= gross and net = gross - discount exactly.
    #[test]
    fn prop_discount_within_gross(
        promotions in arb_promotions(),
        gross_cents in 0i64..100_000_000,
    ) {
        let gross = Decimal::new(gross_cents, 2);
        let resolution = resolve_discount(&promotions, gross);

        prop_assert!(resolution.discount >= Decimal::ZERO);
        prop_assert!(resolution.discount <= gross);
        let net = gross - resolution.discount;
        prop_assert_eq!(net + resolution.discount, gross);
        prop_assert!(net >= Decimal::ZERO);
    }

    /// Inactive promotions never contribute.
    #[test]
    fn prop_inactive_promotions_ignored(
        promotions in arb_promotions(),
        gross_cents in 1i64..100_000_000,
    ) {
        let gross = Decimal::new(gross_cents, 2);
        let resolution = resolve_discount(&promotions, gross);
        if let Some(id) = resolution.promotion_id {
            let chosen = promotions.iter().find(|p| p.id == id).unwrap();
            prop_assert!(chosen.is_active);
        }
        if promotions.iter().all(|p| !p.is_active) {
            prop_assert_eq!(resolution.discount, Decimal::ZERO);
        }
    }
}

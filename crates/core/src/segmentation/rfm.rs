//! RFM aggregation over committed sales.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::segmentation_errors::SegmentationError;
use super::segmentation_model::{RecencyReference, RfmRow};
use crate::errors::Result;
use crate::sales::SaleSummary;
use crate::utils::time_utils::whole_days_between;

struct Accumulator {
    latest: NaiveDateTime,
    frequency: i64,
    monetary: Decimal,
}

/// Builds one RFM row per customer with at least one sale, ordered by
/// customer id.
///
/// `now` is only consulted for [`RecencyReference::Now`].
pub fn aggregate_rfm(
    sales: &[SaleSummary],
    reference: RecencyReference,
    now: NaiveDateTime,
) -> Result<Vec<RfmRow>> {
    if sales.is_empty() {
        return Err(SegmentationError::InsufficientData.into());
    }

    let mut per_customer: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for sale in sales {
        let acc = per_customer
            .entry(sale.customer_id.as_str())
            .or_insert(Accumulator {
                latest: sale.created_at,
                frequency: 0,
                monetary: Decimal::ZERO,
            });
        acc.latest = acc.latest.max(sale.created_at);
        acc.frequency += 1;
        acc.monetary = acc.monetary.saturating_add(sale.net_total);
    }

    let reference_instant = match reference {
        RecencyReference::Now => now,
        RecencyReference::LatestTransaction => per_customer
            .values()
            .map(|acc| acc.latest)
            .max()
            .unwrap_or(now),
    };

    Ok(per_customer
        .into_iter()
        .map(|(customer_id, acc)| RfmRow {
            customer_id: customer_id.to_string(),
            recency_days: whole_days_between(acc.latest, reference_instant),
            frequency: acc.frequency,
            monetary: acc.monetary,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sale(customer_id: &str, created_at: NaiveDateTime, net_total: Decimal) -> SaleSummary {
        SaleSummary {
            customer_id: customer_id.to_string(),
            created_at,
            net_total,
        }
    }

    #[test]
    fn test_empty_history_is_insufficient_data() {
        let err = aggregate_rfm(&[], RecencyReference::Now, at(1, 0)).unwrap_err();
        assert!(matches!(
            err,
            Error::Segmentation(SegmentationError::InsufficientData)
        ));
    }

    #[test]
    fn test_aggregates_per_customer_against_latest_transaction() {
        let sales = vec![
            sale("b", at(1, 10), dec!(10.50)),
            sale("a", at(5, 9), dec!(100)),
            sale("b", at(3, 12), dec!(4.50)),
            sale("a", at(10, 8), dec!(20)),
        ];

        let rows = aggregate_rfm(&sales, RecencyReference::LatestTransaction, at(30, 0)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customer_id, "a");
        assert_eq!(rows[0].frequency, 2);
        assert_eq!(rows[0].monetary, dec!(120));
        assert_eq!(rows[0].recency_days, 0);

        assert_eq!(rows[1].customer_id, "b");
        assert_eq!(rows[1].frequency, 2);
        assert_eq!(rows[1].monetary, dec!(15.00));
        // 3rd 12:00 -> 10th 08:00 is 6 whole days.
        assert_eq!(rows[1].recency_days, 6);
    }

    #[test]
    fn test_now_reference_uses_wall_clock() {
        let sales = vec![sale("a", at(1, 0), dec!(1))];
        let rows = aggregate_rfm(&sales, RecencyReference::Now, at(11, 0)).unwrap();
        assert_eq!(rows[0].recency_days, 10);
    }

    #[test]
    fn test_future_dated_sale_never_yields_negative_recency() {
        let sales = vec![sale("a", at(20, 0), dec!(1))];
        let rows = aggregate_rfm(&sales, RecencyReference::Now, at(11, 0)).unwrap();
        assert_eq!(rows[0].recency_days, 0);
    }
}

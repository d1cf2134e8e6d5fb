use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromotionError {
    #[error("Promotion value {0} cannot be negative")]
    NegativeValue(Decimal),

    #[error("Percentage promotion value {0} exceeds 100")]
    PercentageAbove100(Decimal),

    #[error("Unknown promotion type '{0}'")]
    UnknownType(String),

    #[error("Segment {segment_id} already has a promotion")]
    SegmentAlreadyHasPromotion { segment_id: String },
}

use chrono::{NaiveDateTime, Utc};

/// Current UTC wall clock as a naive timestamp, the form every row is stored in.
pub fn now_utc() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Whole days elapsed from `earlier` to `reference`.
///
/// Partial days are truncated and a reference before `earlier` yields 0, so a
/// clock skew between writers can never produce a negative recency.
pub fn whole_days_between(earlier: NaiveDateTime, reference: NaiveDateTime) -> i64 {
    (reference - earlier).num_days().max(0)
}

//! Synthetic input data.
//!
//! Every strategy consumes the same upfront-allocated sequence of timestamp
//! pairs, so the runs stay comparable and the input order is fixed for the
//! process lifetime.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::types::PgRange;

/// One input record: a pair of wall-clock timestamps. Unrelated to any
/// `Request` row until a strategy maps it to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The stored form: a half-open `[start, end)` date range. Nothing
    /// validates that start < end.
    pub fn date_range(&self) -> PgRange<NaiveDate> {
        (self.start.date_naive()..self.end.date_naive()).into()
    }
}

/// Generates `count` records, both ends sampled independently from the
/// current wall clock at generation time.
pub fn generate(count: usize) -> Vec<Interval> {
    (0..count)
        .map(|_| Interval::new(Utc::now(), Utc::now()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound;

    #[test]
    fn generates_requested_length() {
        assert_eq!(generate(1_000).len(), 1_000);
        assert!(generate(0).is_empty());
    }

    #[test]
    fn date_range_is_half_open() {
        let start = "2024-03-01T10:00:00Z".parse().unwrap();
        let end = "2024-03-04T10:00:00Z".parse().unwrap();
        let range = Interval::new(start, end).date_range();

        assert_eq!(range.start, Bound::Included("2024-03-01".parse().unwrap()));
        assert_eq!(range.end, Bound::Excluded("2024-03-04".parse().unwrap()));
    }

    #[test]
    fn reversed_pairs_are_not_rejected() {
        let start = "2024-03-04T10:00:00Z".parse().unwrap();
        let end = "2024-03-01T10:00:00Z".parse().unwrap();
        let range = Interval::new(start, end).date_range();

        assert_eq!(range.start, Bound::Included("2024-03-04".parse().unwrap()));
        assert_eq!(range.end, Bound::Excluded("2024-03-01".parse().unwrap()));
    }
}

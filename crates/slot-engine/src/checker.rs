//! Single-range availability check.
//!
//! The degenerate case of the finders: one caller-supplied range of any
//! length, tested against one busy set with the same half-open overlap rule.

use chrono::{DateTime, Utc};

use crate::interval::{BusySet, Interval};

/// True iff no interval in `busy` overlaps `[start, end)`.
pub fn is_free(busy: &BusySet, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    !busy.overlaps(&Interval::new(start, end))
}

/// The busy intervals that make `[start, end)` unavailable.
pub fn blocking_intervals(busy: &BusySet, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Interval> {
    let range = Interval::new(start, end);
    busy.conflicts_with(&range).copied().collect()
}

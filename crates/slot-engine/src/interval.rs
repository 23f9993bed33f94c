//! Time intervals, candidate slots, and per-participant busy sets.
//!
//! All ranges are half-open `[start, end)`. Two ranges overlap when
//! `a.start < b.end && b.start < a.end`, so back-to-back ranges (one ends
//! exactly when the other starts) never conflict.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A busy period derived from one provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Half-open overlap test. Adjacent intervals do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A candidate free span proposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    /// A slot of `length` beginning at `start`.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start,
            end: start + length,
        }
    }

    pub fn as_interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

impl From<Slot> for Interval {
    fn from(slot: Slot) -> Self {
        slot.as_interval()
    }
}

/// The busy intervals of one participant over a queried window.
///
/// Built once per request and never mutated afterwards; order carries no
/// meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusySet {
    intervals: Vec<Interval>,
}

impl BusySet {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// True if any interval in the set overlaps `range`.
    pub fn overlaps(&self, range: &Interval) -> bool {
        self.intervals.iter().any(|busy| busy.overlaps(range))
    }

    /// Every interval in the set that overlaps `range`.
    pub fn conflicts_with<'a>(&'a self, range: &'a Interval) -> impl Iterator<Item = &'a Interval> {
        self.intervals.iter().filter(move |busy| busy.overlaps(range))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl FromIterator<Interval> for BusySet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        let a = Interval::new(at(9), at(10));
        let b = Interval::new(at(10), at(11));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn contained_interval_overlaps() {
        let outer = Interval::new(at(9), at(12));
        let inner = Interval::new(at(10), at(11));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn zero_length_interval_never_blocks() {
        let point = Interval::new(at(10), at(10));
        let slot = Interval::new(at(9), at(11));
        // start < end fails on the point side, so nothing can overlap it
        assert!(!point.overlaps(&slot));
    }

    #[test]
    fn busy_set_reports_conflicts() {
        let busy: BusySet = vec![Interval::new(at(9), at(10)), Interval::new(at(13), at(14))]
            .into_iter()
            .collect();
        let range = Interval::new(at(9), at(14));
        assert_eq!(busy.conflicts_with(&range).count(), 2);
        assert!(!busy.overlaps(&Interval::new(at(10), at(13))));
    }
}

//! Property-based tests for the slot finders using proptest.
//!
//! These check invariants that must hold for *any* busy set and clock, not
//! just the scenarios in `finder_tests.rs`.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use slot_engine::{BusySet, FinderConfig, Interval, SlotFinder};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A busy interval somewhere in the first 40 days of 2024, 15 minutes to
/// 8 hours long, on a 15-minute grid.
fn arb_interval() -> impl Strategy<Value = Interval> {
    (0i64..40 * 96, 1i64..=32).prop_map(|(quarter, len)| {
        let start = base() + Duration::minutes(quarter * 15);
        Interval::new(start, start + Duration::minutes(len * 15))
    })
}

fn arb_busy() -> impl Strategy<Value = BusySet> {
    prop::collection::vec(arb_interval(), 0..30).prop_map(BusySet::new)
}

/// Any minute during the first two days.
fn arb_now() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..2 * 24 * 60).prop_map(|m| base() + Duration::minutes(m))
}

fn arb_window_days() -> impl Strategy<Value = u32> {
    prop_oneof![
        Just(1u32),
        Just(7),
        Just(14),
        Just(29),
        Just(30),
        Just(60),
        Just(89),
        Just(90),
        Just(120),
    ]
}

/// A range of 0-72 hours starting on a whole hour in the first two days.
fn arb_range() -> impl Strategy<Value = (DateTime<Utc>, DateTime<Utc>)> {
    (0i64..48, 0i64..=72).prop_map(|(offset, len)| {
        let start = base() + Duration::hours(offset);
        (start, start + Duration::hours(len))
    })
}

// ---------------------------------------------------------------------------
// Single-window finder
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn single_window_slots_never_overlap_busy(
        busy in arb_busy(),
        now in arb_now(),
        days in arb_window_days(),
    ) {
        let slots = SlotFinder::default().find_slots(&busy, days, now).unwrap();
        for slot in &slots {
            prop_assert!(!busy.overlaps(&slot.as_interval()), "{:?} overlaps busy", slot);
        }
    }

    #[test]
    fn single_window_slots_are_strictly_future(
        busy in arb_busy(),
        now in arb_now(),
        days in arb_window_days(),
    ) {
        for slot in SlotFinder::default().find_slots(&busy, days, now).unwrap() {
            prop_assert!(slot.start > now);
        }
    }

    #[test]
    fn single_window_slots_sit_in_business_hours(
        busy in arb_busy(),
        now in arb_now(),
        days in arb_window_days(),
    ) {
        let close = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        for slot in SlotFinder::default().find_slots(&busy, days, now).unwrap() {
            prop_assert!((9..18).contains(&slot.start.hour()));
            prop_assert_eq!(slot.end - slot.start, Duration::hours(1));
            prop_assert!(slot.end <= slot.start.date_naive().and_time(close).and_utc());
        }
    }

    #[test]
    fn single_window_is_capped_and_chronological(
        busy in arb_busy(),
        now in arb_now(),
        days in arb_window_days(),
    ) {
        let slots = SlotFinder::default().find_slots(&busy, days, now).unwrap();
        prop_assert!(slots.len() <= 5);
        for pair in slots.windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn long_windows_space_out_suggestions(
        busy in arb_busy(),
        now in arb_now(),
        days in arb_window_days(),
    ) {
        let config = FinderConfig::default();
        let skip = i64::from(config.skip_days_for(days));
        let slots = SlotFinder::default().find_slots(&busy, days, now).unwrap();
        for pair in slots.windows(2) {
            let gap = (pair[1].start.date_naive() - pair[0].start.date_naive()).num_days();
            prop_assert!(gap >= skip, "gap {} days < skip {} for window {}", gap, skip, days);
        }
    }

    #[test]
    fn single_window_is_idempotent(
        busy in arb_busy(),
        now in arb_now(),
        days in arb_window_days(),
    ) {
        let finder = SlotFinder::default();
        prop_assert_eq!(finder.find_slots(&busy, days, now).unwrap(), finder.find_slots(&busy, days, now).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Range finders
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn common_slots_avoid_both_and_stay_in_range(
        a in arb_busy(),
        b in arb_busy(),
        now in arb_now(),
        (start, end) in arb_range(),
        max_count in 1usize..10,
    ) {
        let slots = SlotFinder::default().find_common_slots(&a, &b, start, end, max_count, now);
        prop_assert!(slots.len() <= max_count);
        for slot in &slots {
            prop_assert!(!a.overlaps(&slot.as_interval()));
            prop_assert!(!b.overlaps(&slot.as_interval()));
            prop_assert!(slot.start > now);
            prop_assert!(slot.start >= start && slot.end <= end);
        }
    }

    #[test]
    fn common_slots_are_commutative(
        a in arb_busy(),
        b in arb_busy(),
        now in arb_now(),
        (start, end) in arb_range(),
        max_count in 1usize..10,
    ) {
        let finder = SlotFinder::default();
        prop_assert_eq!(
            finder.find_common_slots(&a, &b, start, end, max_count, now),
            finder.find_common_slots(&b, &a, start, end, max_count, now)
        );
    }

    #[test]
    fn single_range_equals_common_with_empty_partner(
        a in arb_busy(),
        now in arb_now(),
        (start, end) in arb_range(),
        max_count in 1usize..10,
    ) {
        let finder = SlotFinder::default();
        prop_assert_eq!(
            finder.find_slots_in_range(&a, start, end, max_count, now),
            finder.find_common_slots(&a, &BusySet::empty(), start, end, max_count, now)
        );
    }

    #[test]
    fn checker_agrees_with_range_finder(
        a in arb_busy(),
        (start, end) in arb_range(),
    ) {
        // With the clock before the range, every free hour is found.
        let now = start - Duration::minutes(1);
        let slots = SlotFinder::default().find_slots_in_range(&a, start, end, usize::MAX, now);
        for slot in &slots {
            prop_assert!(slot_engine::is_free(&a, slot.start, slot.end));
        }
        let hours = (end - start).num_hours();
        let free_hours = (0..hours)
            .map(|h| start + Duration::hours(h))
            .filter(|s| slot_engine::is_free(&a, *s, *s + Duration::hours(1)))
            .count();
        prop_assert_eq!(slots.len(), free_hours);
    }
}

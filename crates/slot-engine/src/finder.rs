//! Free-slot search over busy sets.
//!
//! Three walks share one acceptance rule: a candidate `[current, current + slot)`
//! is kept only when it starts strictly after `now` and overlaps no interval in
//! any of the relevant busy sets.
//!
//! - [`SlotFinder::find_slots`] walks business hours day by day from today,
//!   spacing suggestions out over long windows via the skip table.
//! - [`SlotFinder::find_slots_in_range`] and [`SlotFinder::find_common_slots`]
//!   walk an explicit range with no business-hour restriction.
//!
//! `now` is an argument, not a clock read. Callers capture it once per request
//! so a walk cannot see time move underneath it.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use crate::config::{FinderConfig, MAX_WINDOW_DAYS};
use crate::error::{Result, SlotError};
use crate::event::local_instant;
use crate::interval::{BusySet, Slot};

#[derive(Debug, Clone, Default)]
pub struct SlotFinder {
    config: FinderConfig,
}

impl SlotFinder {
    /// Build a finder, rejecting configurations the walks cannot honor.
    pub fn new(config: FinderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// The span the single-window walk covers: business opening on the day of
    /// `now` through business close on the day `window_days` later.
    ///
    /// Fetch busy data for this span; it starts earlier and ends later than
    /// `[now, now + window_days)`. `window_days` must be in
    /// `1..=MAX_WINDOW_DAYS`.
    pub fn single_window_bounds(
        &self,
        now: DateTime<Utc>,
        window_days: u32,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        if window_days == 0 {
            return Err(SlotError::InvalidRequest("windowDays must be positive".into()));
        }
        let period_end = Some(window_days)
            .filter(|days| *days <= MAX_WINDOW_DAYS)
            .and_then(|days| now.checked_add_signed(Duration::days(i64::from(days))))
            .ok_or_else(|| SlotError::InvalidRequest("windowDays out of range".into()))?;
        Ok((
            self.opening_on(self.local_date(now)),
            self.closing_on(self.local_date(period_end)),
        ))
    }

    /// Suggest up to `max_results` slots within business hours over the next
    /// `window_days` days.
    ///
    /// After each accepted slot the walk jumps ahead by the skip table's days
    /// for this window size (resetting to business opening), or continues one
    /// step at a time when the table yields zero.
    pub fn find_slots(
        &self,
        busy: &BusySet,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        let (mut current, end_of_period) = self.single_window_bounds(now, window_days)?;
        let skip_days = self.config.skip_days_for(window_days);
        let length = self.config.slot_length();
        let step = self.config.step();

        let mut slots = Vec::new();
        while slots.len() < self.config.max_results && current < end_of_period {
            let slot = Slot::starting_at(current, length);
            if current > now && !busy.overlaps(&slot.as_interval()) {
                slots.push(slot);
                if skip_days > 0 {
                    match self
                        .local_date(current)
                        .checked_add_days(Days::new(u64::from(skip_days)))
                    {
                        Some(next_day) => current = self.opening_on(next_day),
                        None => break,
                    }
                    continue;
                }
            }
            match current.checked_add_signed(step) {
                Some(next) => current = self.align_to_business_hours(next),
                None => break,
            }
        }

        debug!(
            window_days,
            skip_days,
            busy = busy.len(),
            found = slots.len(),
            "single-window search finished"
        );
        Ok(slots)
    }

    /// Reject an explicit range the range walks cannot search.
    pub fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
        if start >= end {
            return Err(SlotError::InvalidRequest(format!(
                "start {} must precede end {}",
                start, end
            )));
        }
        Ok(())
    }

    /// The range-walk cap: the configured default when `requested` is absent.
    pub fn max_count(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            None => Ok(self.config.default_max_count),
            Some(0) => Err(SlotError::InvalidRequest("maxCount must be positive".into())),
            Some(n) => Ok(n),
        }
    }

    /// Suggest up to `max_count` slots in `[start, end)` free for one participant.
    pub fn find_slots_in_range(
        &self,
        busy: &BusySet,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_count: usize,
        now: DateTime<Utc>,
    ) -> Vec<Slot> {
        self.walk_range(&[busy], start, end, max_count, now)
    }

    /// Suggest up to `max_count` slots in `[start, end)` free for both
    /// participants. Argument order does not affect the result.
    pub fn find_common_slots(
        &self,
        busy_a: &BusySet,
        busy_b: &BusySet,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_count: usize,
        now: DateTime<Utc>,
    ) -> Vec<Slot> {
        self.walk_range(&[busy_a, busy_b], start, end, max_count, now)
    }

    fn walk_range(
        &self,
        busy_sets: &[&BusySet],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_count: usize,
        now: DateTime<Utc>,
    ) -> Vec<Slot> {
        let length = self.config.slot_length();
        let step = self.config.step();

        let mut slots = Vec::new();
        let mut current = start;
        while slots.len() < max_count && current < end {
            let slot = Slot::starting_at(current, length);
            if slot.end > end {
                break;
            }
            let candidate = slot.as_interval();
            if current > now && busy_sets.iter().all(|busy| !busy.overlaps(&candidate)) {
                slots.push(slot);
            }
            current += step;
        }

        debug!(
            participants = busy_sets.len(),
            max_count,
            found = slots.len(),
            "range search finished"
        );
        slots
    }

    /// Move `current` forward to the nearest instant at which a whole slot
    /// fits inside the same day's business hours.
    fn align_to_business_hours(&self, current: DateTime<Utc>) -> DateTime<Utc> {
        let hours = self.config.business_hours;
        let local = current.with_timezone(&self.config.timezone).naive_local();
        let date = local.date();
        if local.time() < hours.start {
            self.opening_on(date)
        } else if local + self.config.slot_length() > date.and_time(hours.end) {
            date.succ_opt()
                .map_or(DateTime::<Utc>::MAX_UTC, |next| self.opening_on(next))
        } else {
            current
        }
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.config.timezone).date_naive()
    }

    fn opening_on(&self, date: NaiveDate) -> DateTime<Utc> {
        self.wall_clock(date, self.config.business_hours.start)
    }

    fn closing_on(&self, date: NaiveDate) -> DateTime<Utc> {
        self.wall_clock(date, self.config.business_hours.end)
    }

    fn wall_clock(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        local_instant(naive, self.config.timezone).unwrap_or_else(|| naive.and_utc())
    }
}

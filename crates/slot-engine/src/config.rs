//! Finder configuration: business hours, slot geometry, skip policy, and the
//! busy filter applied by each endpoint family.
//!
//! Every field has a default, so an empty JSON object `{}` deserializes to the
//! stock behavior: 09:00-18:00 UTC, one-hour slots walked hourly, five
//! suggestions per window, three per explicit range.

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::event::BusyFilter;

/// Local wall-clock hours within which the single-window finder proposes slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl BusinessHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        }
    }
}

/// After accepting a slot in a window of at least `min_window_days`, jump
/// `skip_days` calendar days ahead before looking again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRule {
    pub min_window_days: u32,
    pub skip_days: u32,
}

impl SkipRule {
    pub const fn new(min_window_days: u32, skip_days: u32) -> Self {
        Self {
            min_window_days,
            skip_days,
        }
    }
}

/// Stock skip table: two weeks apart for quarter-long windows, one week apart
/// for month-long windows, hourly density otherwise.
pub const DEFAULT_SKIP_RULES: [SkipRule; 2] = [SkipRule::new(90, 14), SkipRule::new(30, 7)];

/// Longest single-window search, and longest skip, in days (about a century).
pub const MAX_WINDOW_DAYS: u32 = 366 * 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinderConfig {
    /// Wall clock used for business hours and for all-day events.
    pub timezone: Tz,
    pub business_hours: BusinessHours,
    pub slot_minutes: u32,
    pub step_minutes: u32,
    /// Cap on suggestions from the single-window finder.
    pub max_results: usize,
    /// Cap on suggestions from the range finders when the request has none.
    pub default_max_count: usize,
    pub skip_rules: Vec<SkipRule>,
    /// Busy filter for the single-window finder.
    pub window_filter: BusyFilter,
    /// Busy filter for both explicit-range finders.
    pub range_filter: BusyFilter,
    /// Busy filter for the availability checker.
    pub check_filter: BusyFilter,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            business_hours: BusinessHours::default(),
            slot_minutes: 60,
            step_minutes: 60,
            max_results: 5,
            default_max_count: 3,
            skip_rules: DEFAULT_SKIP_RULES.to_vec(),
            window_filter: BusyFilter::AnyEvent,
            range_filter: BusyFilter::ManualOrAllDay,
            check_filter: BusyFilter::AnyEvent,
        }
    }
}

impl FinderConfig {
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FinderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn slot_length(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }

    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes))
    }

    /// Days to jump after an accepted slot for a window of `window_days`.
    ///
    /// The rule with the highest threshold not exceeding `window_days` wins;
    /// table order is irrelevant.
    pub fn skip_days_for(&self, window_days: u32) -> u32 {
        self.skip_rules
            .iter()
            .filter(|rule| window_days >= rule.min_window_days)
            .max_by_key(|rule| rule.min_window_days)
            .map_or(0, |rule| rule.skip_days)
    }

    pub fn validate(&self) -> Result<()> {
        if self.business_hours.start >= self.business_hours.end {
            return Err(SlotError::InvalidConfig(format!(
                "business hours start {} must precede end {}",
                self.business_hours.start, self.business_hours.end
            )));
        }
        if self.slot_minutes == 0 {
            return Err(SlotError::InvalidConfig("slot_minutes must be positive".into()));
        }
        if self.step_minutes == 0 {
            return Err(SlotError::InvalidConfig("step_minutes must be positive".into()));
        }
        if self.slot_length() > self.business_hours.length() {
            return Err(SlotError::InvalidConfig(format!(
                "a {}-minute slot does not fit in business hours {}-{}",
                self.slot_minutes, self.business_hours.start, self.business_hours.end
            )));
        }
        if let Some(rule) = self
            .skip_rules
            .iter()
            .find(|rule| rule.skip_days > MAX_WINDOW_DAYS)
        {
            return Err(SlotError::InvalidConfig(format!(
                "skip_days {} exceeds the {}-day limit",
                rule.skip_days, MAX_WINDOW_DAYS
            )));
        }
        if self.max_results == 0 || self.default_max_count == 0 {
            return Err(SlotError::InvalidConfig(
                "max_results and default_max_count must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// `"HH:MM"` (seconds optional) for business-hour bounds.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", raw, e)))
    }
}

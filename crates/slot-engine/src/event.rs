//! Provider event records and their normalization into busy intervals.
//!
//! Events arrive in the calendar provider's shape: `start`/`end` objects
//! carrying either a `dateTime` (timed event) or a `date` (all-day event),
//! an `eventType` tag, and an optional `transparency`. Unknown fields are kept
//! verbatim so a listing can be handed back to the caller unchanged.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Result, SlotError};
use crate::interval::{BusySet, Interval};

/// One bound of a provider event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventTime {
    pub fn date_time(value: impl Into<String>) -> Self {
        Self {
            date_time: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self {
            date: Some(value.into()),
            ..Self::default()
        }
    }

    /// The bound as an instant. A timed value wins over a date; a date
    /// resolves to local midnight in `tz`.
    pub fn resolve(&self, tz: Tz) -> Result<DateTime<Utc>> {
        let raw = self
            .date_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.date.as_deref().filter(|s| !s.is_empty()))
            .ok_or_else(|| SlotError::MalformedEvent("event bound has neither dateTime nor date".into()))?;
        parse_timestamp(raw, tz).map_err(|e| SlotError::MalformedEvent(e.to_string()))
    }
}

/// A calendar entry as returned by the provider's event listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    pub fn timed(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(EventTime::date_time(start)),
            end: Some(EventTime::date_time(end)),
            event_type: Some("default".into()),
            ..Self::default()
        }
    }

    pub fn all_day(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(EventTime::date(start)),
            end: Some(EventTime::date(end)),
            ..Self::default()
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_transparency(mut self, transparency: impl Into<String>) -> Self {
        self.transparency = Some(transparency.into());
        self
    }

    /// All-day events carry a date-only start.
    pub fn is_all_day(&self) -> bool {
        self.start.as_ref().is_some_and(|s| s.date.is_some())
    }

    /// Entered by a person rather than generated (focus time, working
    /// location, out-of-office). A missing tag is the provider's default.
    pub fn is_manual(&self) -> bool {
        self.event_type.as_deref().unwrap_or("default") == "default"
    }

    /// Marked "free": the entry does not block time.
    pub fn is_transparent(&self) -> bool {
        self.transparency.as_deref() == Some("transparent")
    }

    /// Normalize to a busy interval. Fails when either bound is missing or
    /// unparsable, or when the event ends before it starts.
    pub fn interval(&self, tz: Tz) -> Result<Interval> {
        let start = self
            .start
            .as_ref()
            .ok_or_else(|| SlotError::MalformedEvent("event has no start".into()))?
            .resolve(tz)?;
        let end = self
            .end
            .as_ref()
            .ok_or_else(|| SlotError::MalformedEvent("event has no end".into()))?
            .resolve(tz)?;
        if end < start {
            return Err(SlotError::MalformedEvent(format!(
                "event ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(Interval::new(start, end))
    }
}

/// Which provider events count as busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyFilter {
    /// Every listed event blocks time.
    #[default]
    AnyEvent,
    /// Only manual or all-day events that are not marked transparent.
    ManualOrAllDay,
}

impl BusyFilter {
    pub fn admits(&self, event: &RawEvent) -> bool {
        match self {
            BusyFilter::AnyEvent => true,
            BusyFilter::ManualOrAllDay => {
                (event.is_manual() || event.is_all_day()) && !event.is_transparent()
            }
        }
    }
}

impl BusySet {
    /// Build a busy set from provider events.
    ///
    /// Events rejected by `filter` are dropped. Malformed events are logged
    /// and skipped; one bad record never blocks the whole search.
    pub fn from_events(events: &[RawEvent], filter: BusyFilter, tz: Tz) -> Self {
        let mut skipped = 0usize;
        let busy: BusySet = events
            .iter()
            .filter(|event| filter.admits(event))
            .filter_map(|event| match event.interval(tz) {
                Ok(interval) => Some(interval),
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "skipping malformed event");
                    None
                }
            })
            .collect();
        debug!(
            listed = events.len(),
            busy = busy.len(),
            skipped,
            ?filter,
            "built busy set"
        );
        busy
    }
}

/// Parse an ISO-8601 timestamp into an instant.
///
/// Accepts RFC 3339 (with offset or `Z`), naive local datetimes with or
/// without seconds and fractional seconds, and bare dates. Naive values and
/// dates are read as wall-clock time in `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| SlotError::InvalidTimestamp(format!("'{}' is not ISO-8601", raw)))?;
    local_instant(naive, tz)
        .ok_or_else(|| SlotError::InvalidTimestamp(format!("'{}' does not exist in {}", raw, tz)))
}

/// Resolve a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// spring-forward gap move one hour later.
pub fn local_instant(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

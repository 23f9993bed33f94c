//! Request handling: validate, fetch, filter, search.
//!
//! [`Scheduler`] ties an [`EventSource`] to a [`SlotFinder`]. Each entry point
//! reads the clock once, fetches busy data for the participants involved
//! (concurrently when there are two), builds busy sets with the filter the
//! configuration names for that endpoint family, and runs the search.
//!
//! Request fields are optional at the type level so that an absent field is
//! reported as [`SlotError::MissingField`] instead of a deserialization error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::checker;
use crate::config::FinderConfig;
use crate::error::{Result, SlotError};
use crate::event::{parse_timestamp, BusyFilter, RawEvent};
use crate::finder::SlotFinder;
use crate::interval::{BusySet, Slot};
use crate::source::EventSource;

/// Source of "now" for the future-only filter.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Suggestions over the next `windowDays` days.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleWindowRequest {
    pub credential: Option<String>,
    #[serde(alias = "days")]
    pub window_days: Option<u32>,
}

/// Suggestions in an explicit range for one participant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeRequest {
    pub credential: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub max_count: Option<usize>,
}

/// Suggestions in an explicit range free for both participants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonRangeRequest {
    pub credential_a: Option<String>,
    pub credential_b: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub max_count: Option<usize>,
}

/// One participant over one range; used by the check and listing endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowQuery {
    pub credential: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub type CheckRequest = WindowQuery;
pub type EventsRequest = WindowQuery;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<RawEvent>,
}

/// Failure body. Never used for an empty-but-successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&SlotError> for ErrorResponse {
    fn from(e: &SlotError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct Scheduler<S, C = SystemClock> {
    source: S,
    clock: C,
    finder: SlotFinder,
}

impl<S: EventSource> Scheduler<S, SystemClock> {
    pub fn new(source: S, config: FinderConfig) -> Result<Self> {
        Ok(Self {
            source,
            clock: SystemClock,
            finder: SlotFinder::new(config)?,
        })
    }
}

impl<S: EventSource, C: Clock> Scheduler<S, C> {
    /// Replace the clock, e.g. with a [`FixedClock`] for reproducible output.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Scheduler<S, C2> {
        Scheduler {
            source: self.source,
            clock,
            finder: self.finder,
        }
    }

    pub fn config(&self) -> &FinderConfig {
        self.finder.config()
    }

    /// Business-hour suggestions over the coming `windowDays` days.
    #[instrument(skip_all, fields(window_days = ?request.window_days))]
    pub async fn suggest(&self, request: &SingleWindowRequest) -> Result<SlotsResponse> {
        let credential = required(&request.credential, "credential")?;
        let window_days = request.window_days.ok_or(SlotError::MissingField("windowDays"))?;

        let now = self.clock.now();
        let (fetch_start, fetch_end) = self.finder.single_window_bounds(now, window_days)?;
        let busy = self
            .fetch_busy(credential, fetch_start, fetch_end, self.config().window_filter)
            .await?;
        let slots = self.finder.find_slots(&busy, window_days, now)?;
        Ok(SlotsResponse { slots })
    }

    /// Hourly suggestions in `[start, end)` for a participant whose partner
    /// has not linked a calendar yet.
    #[instrument(skip_all)]
    pub async fn suggest_in_range(&self, request: &RangeRequest) -> Result<SlotsResponse> {
        let credential = required(&request.credential, "credential")?;
        let (start, end) = self.bounds(&request.start, &request.end)?;
        let max_count = self.finder.max_count(request.max_count)?;

        let now = self.clock.now();
        let busy = self
            .fetch_busy(credential, start, end, self.config().range_filter)
            .await?;
        let slots = self
            .finder
            .find_slots_in_range(&busy, start, end, max_count, now);
        Ok(SlotsResponse { slots })
    }

    /// Hourly suggestions in `[start, end)` free for both participants.
    ///
    /// Both calendars are fetched concurrently; if either fetch fails the
    /// whole request fails.
    #[instrument(skip_all)]
    pub async fn suggest_common(&self, request: &CommonRangeRequest) -> Result<SlotsResponse> {
        let credential_a = required(&request.credential_a, "credentialA")?;
        let credential_b = required(&request.credential_b, "credentialB")?;
        let (start, end) = self.bounds(&request.start, &request.end)?;
        let max_count = self.finder.max_count(request.max_count)?;

        let now = self.clock.now();
        let filter = self.config().range_filter;
        let (busy_a, busy_b) = futures::try_join!(
            self.fetch_busy(credential_a, start, end, filter),
            self.fetch_busy(credential_b, start, end, filter),
        )?;
        let slots = self
            .finder
            .find_common_slots(&busy_a, &busy_b, start, end, max_count, now);
        Ok(SlotsResponse { slots })
    }

    /// Whether `[start, end)` is entirely free.
    #[instrument(skip_all)]
    pub async fn check(&self, request: &CheckRequest) -> Result<CheckResponse> {
        let credential = required(&request.credential, "credential")?;
        let (start, end) = self.bounds(&request.start, &request.end)?;

        let busy = self
            .fetch_busy(credential, start, end, self.config().check_filter)
            .await?;
        Ok(CheckResponse {
            ok: checker::is_free(&busy, start, end),
        })
    }

    /// The provider's events for `[start, end)`, unchanged.
    #[instrument(skip_all)]
    pub async fn list_events(&self, request: &EventsRequest) -> Result<EventsResponse> {
        let credential = required(&request.credential, "credential")?;
        let (start, end) = self.bounds(&request.start, &request.end)?;

        let events = self.source.fetch_events(credential, start, end).await?;
        Ok(EventsResponse { events })
    }

    async fn fetch_busy(
        &self,
        credential: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: BusyFilter,
    ) -> Result<BusySet> {
        let events = self.source.fetch_events(credential, start, end).await?;
        debug!(count = events.len(), "events fetched");
        Ok(BusySet::from_events(&events, filter, self.config().timezone))
    }

    fn bounds(
        &self,
        start: &Option<String>,
        end: &Option<String>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = required(start, "start")?;
        let end = required(end, "end")?;
        let tz = self.config().timezone;
        let (start, end) = (parse_timestamp(start, tz)?, parse_timestamp(end, tz)?);
        SlotFinder::check_range(start, end)?;
        Ok((start, end))
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(SlotError::MissingField(field))
}

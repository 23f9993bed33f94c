//! Interval sources: where busy data comes from.
//!
//! An [`EventSource`] lists the provider events overlapping a window for one
//! credential, with recurring events already expanded into single instances.
//! The engine never retries; a failed fetch surfaces as
//! [`SlotError::Upstream`](crate::error::SlotError::Upstream).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SlotError};
use crate::event::RawEvent;
use crate::interval::Interval;

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events for `credential` that overlap `[window_start, window_end)`.
    async fn fetch_events(
        &self,
        credential: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>>;
}

/// In-memory calendars keyed by credential.
///
/// Behaves like a provider listing: events outside the window are left out,
/// malformed events are always listed, and an unknown credential is an
/// upstream failure.
#[derive(Debug, Clone)]
pub struct StaticSource {
    calendars: HashMap<String, Vec<RawEvent>>,
    timezone: Tz,
}

impl StaticSource {
    pub fn new(timezone: Tz) -> Self {
        Self {
            calendars: HashMap::new(),
            timezone,
        }
    }

    pub fn with_calendar(mut self, credential: impl Into<String>, events: Vec<RawEvent>) -> Self {
        self.insert(credential, events);
        self
    }

    pub fn insert(&mut self, credential: impl Into<String>, events: Vec<RawEvent>) {
        self.calendars.insert(credential.into(), events);
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

#[async_trait]
impl EventSource for StaticSource {
    async fn fetch_events(
        &self,
        credential: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>> {
        let events = self
            .calendars
            .get(credential)
            .ok_or_else(|| SlotError::Upstream("unknown credential".into()))?;
        let window = Interval::new(window_start, window_end);
        Ok(events
            .iter()
            .filter(|event| {
                event
                    .interval(self.timezone)
                    .map_or(true, |interval| interval.overlaps(&window))
            })
            .cloned()
            .collect())
    }
}

#[cfg(feature = "google")]
pub use google::GoogleCalendarSource;

#[cfg(feature = "google")]
mod google {
    use async_trait::async_trait;
    use chrono::{DateTime, SecondsFormat, Utc};
    use reqwest::{Client, Url};
    use serde::Deserialize;
    use tracing::debug;

    use super::EventSource;
    use crate::error::{Result, SlotError};
    use crate::event::RawEvent;

    const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

    /// Google Calendar `events.list`, authenticated with an OAuth access token
    /// passed as the credential.
    #[derive(Debug, Clone)]
    pub struct GoogleCalendarSource {
        http: Client,
        base_url: String,
        calendar_id: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct EventsPage {
        #[serde(default)]
        items: Vec<RawEvent>,
        next_page_token: Option<String>,
    }

    impl GoogleCalendarSource {
        pub fn new() -> Self {
            Self {
                http: Client::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
                calendar_id: "primary".to_string(),
            }
        }

        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
            self.calendar_id = calendar_id.into();
            self
        }

        fn events_url(&self) -> Result<Url> {
            let mut url = Url::parse(&self.base_url)
                .map_err(|e| SlotError::InvalidConfig(format!("calendar base URL: {}", e)))?;
            url.path_segments_mut()
                .map_err(|_| SlotError::InvalidConfig("calendar base URL cannot have a path".into()))?
                .pop_if_empty()
                .extend(["calendars", self.calendar_id.as_str(), "events"]);
            Ok(url)
        }
    }

    impl Default for GoogleCalendarSource {
        fn default() -> Self {
            Self::new()
        }
    }

    fn upstream(e: reqwest::Error) -> SlotError {
        SlotError::Upstream(e.to_string())
    }

    #[async_trait]
    impl EventSource for GoogleCalendarSource {
        async fn fetch_events(
            &self,
            credential: &str,
            window_start: DateTime<Utc>,
            window_end: DateTime<Utc>,
        ) -> Result<Vec<RawEvent>> {
            let url = self.events_url()?;
            let time_min = window_start.to_rfc3339_opts(SecondsFormat::Millis, true);
            let time_max = window_end.to_rfc3339_opts(SecondsFormat::Millis, true);

            let mut events = Vec::new();
            let mut page_token: Option<String> = None;
            loop {
                let mut query = vec![
                    ("timeMin", time_min.clone()),
                    ("timeMax", time_max.clone()),
                    ("singleEvents", "true".to_string()),
                    ("orderBy", "startTime".to_string()),
                ];
                if let Some(token) = &page_token {
                    query.push(("pageToken", token.clone()));
                }

                let page: EventsPage = self
                    .http
                    .get(url.clone())
                    .bearer_auth(credential)
                    .query(&query)
                    .send()
                    .await
                    .map_err(upstream)?
                    .error_for_status()
                    .map_err(upstream)?
                    .json()
                    .await
                    .map_err(upstream)?;

                events.extend(page.items);
                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }

            debug!(count = events.len(), %time_min, %time_max, "fetched calendar events");
            Ok(events)
        }
    }

}

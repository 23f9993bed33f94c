//! Event sources selectable from the command line.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use slot_engine::error::{Result, SlotError};
use slot_engine::{EventSource, GoogleCalendarSource, RawEvent, StaticSource};
use tracing::debug;

/// Reads a participant's events from a JSON file named by the credential.
///
/// The file holds either a bare array of events or a provider listing with
/// an `items` array.
#[derive(Debug, Clone)]
pub struct FileSource {
    timezone: Tz,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventFile {
    Events(Vec<RawEvent>),
    Listing { items: Vec<RawEvent> },
}

impl FileSource {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

#[async_trait]
impl EventSource for FileSource {
    async fn fetch_events(
        &self,
        credential: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>> {
        let raw = tokio::fs::read_to_string(credential)
            .await
            .map_err(|e| SlotError::Upstream(format!("cannot read {}: {}", credential, e)))?;
        let file: EventFile = serde_json::from_str(&raw)
            .map_err(|e| SlotError::Upstream(format!("cannot parse {}: {}", credential, e)))?;
        let events = match file {
            EventFile::Events(events) => events,
            EventFile::Listing { items } => items,
        };
        debug!(path = credential, count = events.len(), "loaded event file");

        // Window the listing the way a provider would.
        StaticSource::new(self.timezone)
            .with_calendar(credential, events)
            .fetch_events(credential, window_start, window_end)
            .await
    }
}

/// The source chosen with `--source`.
pub enum CliSource {
    File(FileSource),
    Google(GoogleCalendarSource),
}

#[async_trait]
impl EventSource for CliSource {
    async fn fetch_events(
        &self,
        credential: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>> {
        match self {
            CliSource::File(source) => source.fetch_events(credential, window_start, window_end).await,
            CliSource::Google(source) => source.fetch_events(credential, window_start, window_end).await,
        }
    }
}

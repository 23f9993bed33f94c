//! # slot-engine
//!
//! Mutual free-slot search for two people's calendars.
//!
//! Given busy intervals fetched from a calendar provider and a search window,
//! the engine enumerates candidate one-hour slots that overlap no busy
//! interval, optionally intersected across two participants, bounded by a
//! count and restricted to the future.
//!
//! ## Modules
//!
//! - [`interval`] — `Interval`, `Slot`, `BusySet` and the half-open overlap rule
//! - [`event`] — Provider event records, busy filters, timestamp parsing
//! - [`config`] — Business hours, slot geometry, skip-interval table
//! - [`finder`] — Single-window, single-range, and two-participant slot search
//! - [`checker`] — Is one exact range free?
//! - [`source`] — `EventSource` trait and its in-memory and Google implementations
//! - [`service`] — `Scheduler`: request validation, concurrent fetch, search
//! - [`error`] — Error types

pub mod checker;
pub mod config;
pub mod error;
pub mod event;
pub mod finder;
pub mod interval;
pub mod service;
pub mod source;

pub use checker::is_free;
pub use config::{BusinessHours, FinderConfig, SkipRule, MAX_WINDOW_DAYS};
pub use error::SlotError;
pub use event::{parse_timestamp, BusyFilter, EventTime, RawEvent};
pub use finder::SlotFinder;
pub use interval::{BusySet, Interval, Slot};
pub use service::{Clock, FixedClock, Scheduler, SystemClock};
#[cfg(feature = "google")]
pub use source::GoogleCalendarSource;
pub use source::{EventSource, StaticSource};

//! WASM bindings for slot-engine.
//!
//! Exposes the slot finders and the availability check to JavaScript via
//! `wasm-bindgen`. Busy data is passed as a JSON array of provider events (the
//! `items` of a calendar events listing); results come back as JSON strings.
//! Fetching stays on the JavaScript side, so the `google` feature is off.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use slot_engine::error::Result;
use slot_engine::service::{CheckResponse, SlotsResponse};
use slot_engine::{parse_timestamp, BusyFilter, BusySet, FinderConfig, RawEvent, SlotFinder};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Helpers: JSON in, JSON out
// ---------------------------------------------------------------------------

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Parse an optional JSON config; absent means defaults.
fn load_finder(config_json: Option<&str>) -> Result<SlotFinder> {
    let config = match config_json {
        Some(json) if !json.trim().is_empty() => FinderConfig::from_json(json)?,
        _ => FinderConfig::default(),
    };
    SlotFinder::new(config)
}

fn parse_busy(events_json: &str, filter: BusyFilter, finder: &SlotFinder) -> Result<BusySet> {
    let events: Vec<RawEvent> = serde_json::from_str(events_json)?;
    Ok(BusySet::from_events(&events, filter, finder.config().timezone))
}

/// Both bounds of an explicit range, checked the same way the scheduler
/// checks them.
fn parse_range(start: &str, end: &str, finder: &SlotFinder) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let tz = finder.config().timezone;
    let (start, end) = (parse_timestamp(start, tz)?, parse_timestamp(end, tz)?);
    SlotFinder::check_range(start, end)?;
    Ok((start, end))
}

/// `now` as given, or the host clock.
fn resolve_now(now: Option<&str>, finder: &SlotFinder) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => parse_timestamp(raw, finder.config().timezone),
        None => Ok(Utc::now()),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn slots_json(
    events_json: &str,
    window_days: u32,
    now: Option<&str>,
    config_json: Option<&str>,
) -> Result<String> {
    let finder = load_finder(config_json)?;
    let busy = parse_busy(events_json, finder.config().window_filter, &finder)?;
    let now = resolve_now(now, &finder)?;

    to_json(&SlotsResponse {
        slots: finder.find_slots(&busy, window_days, now)?,
    })
}

fn range_slots_json(
    events_json: &str,
    start: &str,
    end: &str,
    max_count: Option<u32>,
    now: Option<&str>,
    config_json: Option<&str>,
) -> Result<String> {
    let finder = load_finder(config_json)?;
    let busy = parse_busy(events_json, finder.config().range_filter, &finder)?;
    let (start, end) = parse_range(start, end, &finder)?;
    let max_count = finder.max_count(max_count.map(|n| n as usize))?;
    let now = resolve_now(now, &finder)?;

    to_json(&SlotsResponse {
        slots: finder.find_slots_in_range(&busy, start, end, max_count, now),
    })
}

fn common_slots_json(
    events_a_json: &str,
    events_b_json: &str,
    start: &str,
    end: &str,
    max_count: Option<u32>,
    now: Option<&str>,
    config_json: Option<&str>,
) -> Result<String> {
    let finder = load_finder(config_json)?;
    let filter = finder.config().range_filter;
    let busy_a = parse_busy(events_a_json, filter, &finder)?;
    let busy_b = parse_busy(events_b_json, filter, &finder)?;
    let (start, end) = parse_range(start, end, &finder)?;
    let max_count = finder.max_count(max_count.map(|n| n as usize))?;
    let now = resolve_now(now, &finder)?;

    to_json(&SlotsResponse {
        slots: finder.find_common_slots(&busy_a, &busy_b, start, end, max_count, now),
    })
}

fn check_json(events_json: &str, start: &str, end: &str, config_json: Option<&str>) -> Result<String> {
    let finder = load_finder(config_json)?;
    let busy = parse_busy(events_json, finder.config().check_filter, &finder)?;
    let (start, end) = parse_range(start, end, &finder)?;

    to_json(&CheckResponse {
        ok: slot_engine::is_free(&busy, start, end),
    })
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Suggest business-hour slots over the next `window_days` days.
///
/// Returns `{"slots":[{start,end},...]}`.
///
/// # Arguments
/// - `events_json` -- JSON array of provider events for the participant
/// - `window_days` -- Search window length in days (1 to `MAX_WINDOW_DAYS`)
/// - `now` -- Optional ISO-8601 "current time"; defaults to the host clock
/// - `config_json` -- Optional finder configuration
#[wasm_bindgen(js_name = "findSlots")]
pub fn find_slots(
    events_json: &str,
    window_days: u32,
    now: Option<String>,
    config_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    slots_json(events_json, window_days, now.as_deref(), config_json.as_deref()).map_err(js_err)
}

/// Suggest hourly slots in `[start, end)` free for one participant.
#[wasm_bindgen(js_name = "findSlotsInRange")]
pub fn find_slots_in_range(
    events_json: &str,
    start: &str,
    end: &str,
    max_count: Option<u32>,
    now: Option<String>,
    config_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    range_slots_json(
        events_json,
        start,
        end,
        max_count,
        now.as_deref(),
        config_json.as_deref(),
    )
    .map_err(js_err)
}

/// Suggest hourly slots in `[start, end)` free for both participants.
#[wasm_bindgen(js_name = "findCommonSlots")]
pub fn find_common_slots(
    events_a_json: &str,
    events_b_json: &str,
    start: &str,
    end: &str,
    max_count: Option<u32>,
    now: Option<String>,
    config_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    common_slots_json(
        events_a_json,
        events_b_json,
        start,
        end,
        max_count,
        now.as_deref(),
        config_json.as_deref(),
    )
    .map_err(js_err)
}

/// Whether `[start, end)` is free. Returns `{"ok":bool}`.
#[wasm_bindgen(js_name = "isFree")]
pub fn is_free(
    events_json: &str,
    start: &str,
    end: &str,
    config_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    check_json(events_json, start, end, config_json.as_deref()).map_err(js_err)
}

//! WASM bindings for booking-engine.
//!
//! Exposes availability checks, alternative suggestions, recommendations and
//! day grids to JavaScript via `wasm-bindgen`. Every export takes the ledger
//! snapshot and the request as JSON strings and returns a JSON string.
//!
//! The optional `options` argument carries engine tunables and a pinned clock:
//!
//! ```json
//! {
//!   "config": { "max_suggestions": 5, "timezone": "Asia/Manila" },
//!   "now": "2026-03-01T08:00:00"
//! }
//! ```
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p booking-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/booking-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/booking_engine_wasm.wasm
//! ```

use booking_engine::model::{ResourceId, ResourceType};
use booking_engine::{
    AvailabilityRequest, Clock, Engine, EngineConfig, InMemoryLedger, RecommendationRequest,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Inputs crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct EngineOptions {
    #[serde(default)]
    config: EngineConfig,
    /// Local time used as "now"; the system clock when absent.
    #[serde(default)]
    now: Option<NaiveDateTime>,
}

#[derive(Deserialize)]
struct DayGridRequest {
    resource_type: ResourceType,
    resource_id: ResourceId,
    date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

/// Load the ledger, build an engine over it and run one query.
fn run<T: Serialize>(
    ledger_json: &str,
    options_json: Option<&str>,
    query: impl FnOnce(&Engine<'_>) -> booking_engine::Result<T>,
) -> Result<String, String> {
    let ledger = InMemoryLedger::from_json(ledger_json)
        .map_err(|e| format!("Invalid ledger JSON: {}", e))?;
    let options: EngineOptions = match options_json {
        Some(json) => parse(json, "options")?,
        None => EngineOptions::default(),
    };
    let engine = Engine::over(&ledger)
        .with_config(options.config)
        .map_err(|e| e.to_string())?
        .with_clock(options.now.map_or(Clock::System, Clock::Fixed));

    let result = query(&engine).map_err(|e| e.to_string())?;
    serde_json::to_string(&result).map_err(|e| format!("Serialization error: {}", e))
}

fn check_availability_json(
    ledger: &str,
    request: &str,
    options: Option<&str>,
) -> Result<String, String> {
    let request: AvailabilityRequest = parse(request, "request")?;
    run(ledger, options, |engine| engine.check_availability(&request))
}

fn suggest_alternatives_json(
    ledger: &str,
    request: &str,
    options: Option<&str>,
) -> Result<String, String> {
    let request: AvailabilityRequest = parse(request, "request")?;
    run(ledger, options, |engine| engine.suggest_alternatives(&request))
}

fn get_recommendations_json(
    ledger: &str,
    request: &str,
    options: Option<&str>,
) -> Result<String, String> {
    let request: RecommendationRequest = parse(request, "request")?;
    run(ledger, options, |engine| engine.get_recommendations(&request))
}

fn day_grid_json(ledger: &str, request: &str, options: Option<&str>) -> Result<String, String> {
    let request: DayGridRequest = parse(request, "request")?;
    run(ledger, options, |engine| {
        engine.day_grid(request.resource_type, request.resource_id, request.date)
    })
}

fn to_js(result: Result<String, String>) -> Result<String, JsValue> {
    result.map_err(|e| JsValue::from_str(&e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Check one resource for conflicts.
///
/// `request_json` is an `AvailabilityRequest`, e.g.
/// `{"resource_type":"facility","resource_id":1,"date":"2026-03-10",
///   "requirement":{"kind":"window","passengers":1,
///   "window":{"start":"09:00:00","end":"10:00:00"}}}`.
/// Returns the availability report, with alternatives when the request conflicts.
#[wasm_bindgen(js_name = "checkAvailability")]
pub fn check_availability(
    ledger_json: &str,
    request_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(check_availability_json(ledger_json, request_json, options_json.as_deref()))
}

/// Plan alternative slots or dates for one resource.
#[wasm_bindgen(js_name = "suggestAlternatives")]
pub fn suggest_alternatives(
    ledger_json: &str,
    request_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(suggest_alternatives_json(ledger_json, request_json, options_json.as_deref()))
}

/// Rank the available resources of a type for a requester.
///
/// `request_json` is a `RecommendationRequest`; `window`, `quantity` and
/// `passengers` are optional.
#[wasm_bindgen(js_name = "getRecommendations")]
pub fn get_recommendations(
    ledger_json: &str,
    request_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(get_recommendations_json(ledger_json, request_json, options_json.as_deref()))
}

/// Every slot of one day for a facility or vehicle, flagged free or taken.
///
/// `request_json` is `{"resource_type", "resource_id", "date"}`.
#[wasm_bindgen(js_name = "dayGrid")]
pub fn day_grid(
    ledger_json: &str,
    request_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(day_grid_json(ledger_json, request_json, options_json.as_deref()))
}

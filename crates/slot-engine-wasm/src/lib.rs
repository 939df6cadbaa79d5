//! WASM bindings for slot-engine.
//!
//! Exposes slot computation and the booking/cancellation checks to JavaScript
//! via `wasm-bindgen`. Requests and results cross the boundary as JSON strings
//! in the same shapes the `slots` CLI reads and writes.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::Utc;
use serde::Serialize;
use slot_engine::{BookingCheck, CancellationCheck, DaySlotGroup, SlotError, SlotRequest};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SlotDto {
    start: String,
    end: String,
}

#[derive(Serialize)]
struct DayDto {
    date: String,
    hours: Vec<SlotDto>,
}

impl From<&DaySlotGroup> for DayDto {
    fn from(g: &DaySlotGroup) -> Self {
        Self {
            date: g.date.to_rfc3339(),
            hours: g
                .hours
                .iter()
                .map(|s| SlotDto {
                    start: s.start.to_rfc3339(),
                    end: s.end.to_rfc3339(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct AdmissionDto {
    start: String,
    end: String,
}

fn js_error(e: SlotError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Compute bookable slots grouped by local day.
///
/// `request_json` is a slot request object (`start`, `end`, and optionally
/// `timezone`, `now`, `slot_minutes`, `availability`, `booked`). When `now`
/// is omitted the current time is used. Returns a JSON array of
/// `{date, hours: [{start, end}]}` objects with RFC 3339 datetimes in the
/// requester's offset.
#[wasm_bindgen(js_name = "computeAvailableSlots")]
pub fn compute_available_slots(request_json: &str) -> Result<String, JsValue> {
    let request = SlotRequest::from_json(request_json).map_err(js_error)?;
    let groups = request.compute(Utc::now()).map_err(js_error)?;

    let dtos: Vec<DayDto> = groups.iter().map(DayDto::from).collect();
    to_json(&dtos)
}

/// Check whether a session request can be booked.
///
/// Returns the admitted `{start, end}` range (seconds dropped) or throws the
/// rejection reason.
#[wasm_bindgen(js_name = "checkBooking")]
pub fn check_booking(request_json: &str) -> Result<String, JsValue> {
    let check = BookingCheck::from_json(request_json).map_err(js_error)?;
    let admission = check.evaluate(Utc::now()).map_err(js_error)?;

    to_json(&AdmissionDto {
        start: admission.admitted.start.to_rfc3339(),
        end: admission.admitted.end.to_rfc3339(),
    })
}

/// Check whether a session may still be canceled. Throws the reason if not.
#[wasm_bindgen(js_name = "checkCancellation")]
pub fn check_cancellation(request_json: &str) -> Result<(), JsValue> {
    let check = CancellationCheck::from_json(request_json).map_err(js_error)?;
    check.evaluate(Utc::now()).map_err(js_error)
}

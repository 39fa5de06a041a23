// [apps/orchestrator/src/handlers/telemetry.rs]
/*!
 * APARATO: HANDLERS DE INGESTA DE TELEMETRÍA (§9)
 * RESPONSABILIDAD: `POST /v1/telemetry`, `/v1/telemetry/batch`,
 *    `/v1/telemetry/crash` — ENCOLADO FIRE-AND-FORGET
 *
 * Ninguno de estos handlers toca la base de datos en el camino
 * caliente: el evento se serializa y se empuja a `TelemetryQueue`, que
 * un worker de fondo drena por lotes (ver `kernel`).
 */

use axum::{extract::State, Json};
use bundlenudge_domain_models::wire::{TelemetryAckResponse, TelemetryBatchRequest, TelemetryEvent};
use serde_json::json;
use tracing::instrument;

use crate::state::AppState;

#[instrument(skip(state, event), fields(device_id = %event.device_id, event_name = %event.event_name))]
pub async fn ingest_telemetry(State(state): State<AppState>, Json(event): Json<TelemetryEvent>) -> Json<TelemetryAckResponse> {
    state.telemetry.push(serde_json::to_value(&event).unwrap_or_else(|_| json!({})));
    Json(TelemetryAckResponse { accepted: true })
}

#[instrument(skip(state, batch), fields(count = batch.events.len()))]
pub async fn ingest_telemetry_batch(
    State(state): State<AppState>,
    Json(batch): Json<TelemetryBatchRequest>,
) -> Json<TelemetryAckResponse> {
    for event in &batch.events {
        state.telemetry.push(serde_json::to_value(event).unwrap_or_else(|_| json!({})));
    }
    Json(TelemetryAckResponse { accepted: true })
}

#[instrument(skip(state, event), fields(device_id = %event.device_id))]
pub async fn ingest_crash(State(state): State<AppState>, Json(event): Json<TelemetryEvent>) -> Json<TelemetryAckResponse> {
    if let Err(error) = state.devices.increment_crash_count(event.device_id).await {
        tracing::warn!(error = %error, "⚠️ [TELEMETRY_CRASH]: failed to bump crash_count, continuing");
    }
    let mut crash_event = serde_json::to_value(&event).unwrap_or_else(|_| json!({}));
    if let Some(object) = crash_event.as_object_mut() {
        object.insert("eventName".to_string(), json!("crash"));
    }
    state.telemetry.push(crash_event);
    Json(TelemetryAckResponse { accepted: true })
}

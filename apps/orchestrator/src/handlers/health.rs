// [apps/orchestrator/src/handlers/health.rs]
/*!
 * APARATO: HANDLERS DE SALUD DEL DISPOSITIVO (C6)
 * RESPONSABILIDAD: `GET /v1/apps/{appId}/health-config`,
 *    `POST /v1/health/failure`
 *
 * `health/failure` es deliberadamente fail-open (§7): el dispositivo
 * recibe 200 aunque la escritura en `bundlenudge-infra-db` falle, para
 * que un hipo de persistencia en el servidor nunca retrase la rutina
 * de auto-recuperación del propio dispositivo.
 */

use axum::{
    extract::{Path, State},
    Json,
};
use bundlenudge_domain_models::wire::{HealthConfigResponse, HealthFailureRequest, HealthFailureResponse};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::handlers::error::ApiError;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn get_health_config(
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<HealthConfigResponse>, ApiError> {
    let config = state.health.get_config(app_id).await?.unwrap_or_default();
    Ok(Json(HealthConfigResponse { events: config.events, endpoints: config.endpoints }))
}

#[instrument(skip(state, payload), fields(release_id = %payload.release_id, device_id = %payload.device_id))]
pub async fn report_health_failure(
    State(state): State<AppState>,
    Json(payload): Json<HealthFailureRequest>,
) -> Result<Json<HealthFailureResponse>, ApiError> {
    let now = state.clock.now();
    let is_fresh = state.health_dedup.observe(payload.release_id, payload.device_id, now);

    // `record_failure` always upserts missing_events (§6: duplicates still refresh
    // the reported set); `is_fresh` only gates whether this report counts as a new
    // activation-denominator failure for the windowed counters (§4.4), which the
    // repository already enforces structurally via the (release_id, device_id) PK.
    if let Err(error) = state.health.record_failure(payload.release_id, payload.device_id, &payload.missing_events).await {
        warn!(error = %error, "⚠️ [HEALTH_FAILURE]: failed to persist report, accepting anyway");
    }
    if !is_fresh {
        tracing::debug!("🔁 [HEALTH_FAILURE]: duplicate report within dedup window, missing_events refreshed only");
    }
    Ok(Json(HealthFailureResponse { received: true }))
}

// [apps/orchestrator/src/handlers/devices.rs]
/*!
 * APARATO: HANDLER DE REGISTRO DE DISPOSITIVOS
 * RESPONSABILIDAD: `POST /v1/devices/register` — EMITE EL DEVICE-TOKEN
 *    Y MATERIALIZA EL PRIMER CHECK-IN (§6)
 *
 * Única ruta bajo `/v1` que no exige `device_auth_guard` — es
 * precisamente donde el token se emite por primera vez. Re-registrar
 * un dispositivo ya conocido es idempotente: simplemente emite un
 * token nuevo y actualiza el check-in.
 */

use axum::{extract::State, Json};
use bundlenudge_core_clock_ids::token::DEFAULT_TOKEN_TTL_SECONDS;
use bundlenudge_domain_models::wire::{RegisterDeviceRequest, RegisterDeviceResponse};
use bundlenudge_domain_models::DomainError;
use tracing::{info, instrument};

use crate::handlers::error::ApiError;
use crate::state::AppState;

#[instrument(skip(state, payload), fields(device_id = %payload.device_id, app_id = %payload.app_id))]
pub async fn register_device(
    State(state): State<AppState>,
    Json(payload): Json<RegisterDeviceRequest>,
) -> Result<Json<RegisterDeviceResponse>, ApiError> {
    let app = state
        .apps
        .get_by_id(payload.app_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("app {} not found", payload.app_id)))?;

    if app.is_deleted() {
        return Err(DomainError::not_found(format!("app {} has been deleted", payload.app_id)).into());
    }

    state
        .devices
        .upsert_checkin(payload.device_id, payload.app_id, payload.platform, None, None)
        .await?;

    let (access_token, expires_at) = state
        .token_codec
        .issue(
            state.clock.as_ref(),
            payload.device_id,
            payload.app_id,
            "",
            &payload.platform.to_string(),
            DEFAULT_TOKEN_TTL_SECONDS,
        )
        .map_err(|error| DomainError::internal(format!("token issuance failed: {error}")))?;

    info!("🔌 [DEVICE_REGISTER]: device {} registered for app {}", payload.device_id, payload.app_id);
    Ok(Json(RegisterDeviceResponse { access_token, expires_at: expires_at.timestamp() }))
}

// [apps/orchestrator/src/handlers/updates.rs]
/*!
 * APARATO: HANDLER DE RESOLUCIÓN DE ACTUALIZACIONES (C7)
 * CLASIFICACIÓN: HOT PATH (ESTRATO L3)
 * RESPONSABILIDAD: `POST /v1/updates/check` — EL ÚNICO ENDPOINT QUE
 *    TODO DISPOSITIVO LLAMA EN CADA ARRANQUE (§4.4, §4.5)
 *
 * Deliberadamente no exige `device_auth_guard` (§4.5 paso 1: "checks
 * no autenticados se permiten, sujetos a rate limiting más estricto")
 * — un dispositivo sin token válido (aún no registrado, o con token
 * vencido) no debe quedar sin poder de recuperación vía OTA. El
 * orden de evaluación es fijo: hash-equality short-circuit, luego
 * targeting, luego rollout — cada paso corto-circuita el resto.
 */

use axum::{extract::State, Json};
use bundlenudge_core_rollout::is_included;
use bundlenudge_core_targeting::{compare_versions, evaluate, DeviceContext};
use bundlenudge_domain_models::wire::{CheckUpdateRequest, CheckUpdateResponse, ReleaseWireInfo};
use serde_json::json;
use tracing::{info, instrument};

use crate::handlers::error::ApiError;
use crate::state::AppState;

#[instrument(skip(state, payload), fields(device_id = %payload.device_id, app_id = %payload.app_id))]
pub async fn check_update(
    State(state): State<AppState>,
    Json(payload): Json<CheckUpdateRequest>,
) -> Result<Json<CheckUpdateResponse>, ApiError> {
    state
        .devices
        .upsert_checkin(
            payload.device_id,
            payload.app_id,
            payload.platform,
            payload.current_bundle_version.as_deref(),
            payload.current_bundle_hash.as_deref(),
        )
        .await?;

    state.telemetry.push(json!({
        "event": "check",
        "deviceId": payload.device_id,
        "appId": payload.app_id,
        "appVersion": payload.app_version,
    }));

    let channel_name = payload.channel_hint.as_deref().unwrap_or("production");
    let channel = match resolve_channel(&state, payload.app_id, channel_name).await? {
        Some(channel) => channel,
        None => return Ok(Json(CheckUpdateResponse::no_update())),
    };

    let Some(active_release_id) = channel.active_release_id else {
        return Ok(Json(CheckUpdateResponse::no_update()));
    };

    let Some(release) = state.releases.get_by_id(active_release_id).await? else {
        return Ok(Json(CheckUpdateResponse::no_update()));
    };

    if !release.status.is_servable() {
        // El canal aún apunta aquí (caché vencido, o una carrera con un
        // rollback que todavía no repuntó la fila) pero `rolled_back`/
        // `rejected` dejaron de servirse (§4.3).
        return Ok(Json(CheckUpdateResponse::no_update()));
    }

    if payload.current_bundle_hash.as_deref() == Some(release.bundle_hash.as_str()) {
        if let Err(error) = state.health.record_activation(release.id, payload.device_id).await {
            tracing::warn!(error = %error, "⚠️ [UPDATES_CHECK]: failed to record activation, continuing");
        }
        return Ok(Json(CheckUpdateResponse::no_update()));
    }

    let device_context = DeviceContext {
        app_version: payload.app_version.clone(),
        os_version: extract_os_version(&payload.device_info),
        platform: payload.platform,
    };

    if let Err(ineligible) = evaluate(&channel.targeting_rules, &device_context) {
        return Ok(Json(eligibility_response(&release, &payload.app_version, ineligible)));
    }
    if let Err(ineligible) = evaluate(&release.targeting_rules, &device_context) {
        return Ok(Json(eligibility_response(&release, &payload.app_version, ineligible)));
    }

    if !is_included(release.rollout_percentage, release.id, payload.device_id) {
        return Ok(Json(CheckUpdateResponse::no_update()));
    }

    info!(release_id = %release.id, device_id = %payload.device_id, "📦 [UPDATES_CHECK]: offering update");
    Ok(Json(CheckUpdateResponse::update_available(ReleaseWireInfo {
        version: release.version,
        bundle_url: release.bundle_url,
        bundle_size: release.bundle_size,
        bundle_hash: release.bundle_hash,
        release_id: release.id,
        release_notes: release.release_notes,
    })))
}

async fn resolve_channel(
    state: &AppState,
    app_id: uuid::Uuid,
    channel_name: &str,
) -> Result<Option<bundlenudge_domain_models::Channel>, ApiError> {
    if let Some(cached) = state.channel_cache.get(app_id, channel_name) {
        return Ok(Some(cached));
    }

    let channel = if channel_name == "production" {
        match state.channels.get_by_app_and_name(app_id, channel_name).await? {
            Some(channel) => Some(channel),
            None => state.channels.get_default_for_app(app_id).await?,
        }
    } else {
        state.channels.get_by_app_and_name(app_id, channel_name).await?
    };

    if let Some(channel) = &channel {
        state.channel_cache.put(app_id, channel_name, channel.clone());
    }
    Ok(channel)
}

/// `device_info` es un blob libre; la única clave que este control
/// plane conoce hoy es `osVersion`, la misma que escribe el agente en
/// `check_for_update` (§4.1 C3 regla 5). Cualquier otra clave se ignora.
fn extract_os_version(device_info: &Option<serde_json::Value>) -> Option<String> {
    device_info.as_ref()?.get("osVersion")?.as_str().map(str::to_string)
}

/// Si el dispositivo queda por debajo del `min_app_version` de la
/// release, el shell nativo necesita pasar por la tienda antes de que
/// un bundle OTA pueda instalarse (§4.1); en cualquier otro caso de
/// inelegibilidad, simplemente no hay actualización disponible.
fn eligibility_response(
    release: &bundlenudge_domain_models::Release,
    device_app_version: &str,
    _ineligible: bundlenudge_core_targeting::Ineligible,
) -> CheckUpdateResponse {
    if let Some(min) = &release.targeting_rules.min_app_version {
        if compare_versions(device_app_version, min) < 0 {
            return CheckUpdateResponse::requires_store_update(format!(
                "app version {device_app_version} is below the minimum supported version {min}"
            ));
        }
    }
    CheckUpdateResponse::no_update()
}

// [apps/orchestrator/src/handlers/releases.rs]
/*!
 * APARATO: SUPERFICIE ADMINISTRATIVA DE RELEASES (C9, §12)
 * RESPONSABILIDAD: CREACIÓN Y TRANSICIONES MANUALES DE LA FSM DE
 *    RELEASES PARA OPERADORES (NO DISPOSITIVOS)
 *
 * Estas rutas no llevan `device_auth_guard` — se asumen detrás de un
 * perímetro de autenticación de operador gestionado fuera de este
 * núcleo (API gateway / panel interno), igual que en el resto del
 * stack de control-plane de origen.
 */

use axum::{
    extract::{Path, State},
    Json,
};
use bundlenudge_domain_models::wire::CreateReleaseRequest;
use bundlenudge_domain_models::{DomainError, Release, RollbackReason};
use tracing::instrument;
use uuid::Uuid;

use crate::handlers::error::ApiError;
use crate::services::lifecycle::LifecycleService;
use crate::state::AppState;

#[instrument(skip(state, payload), fields(app_id = %app_id, version = %payload.version))]
pub async fn create_release(
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
    Json(payload): Json<CreateReleaseRequest>,
) -> Result<Json<Release>, ApiError> {
    let channel_name = payload.channel_name.as_deref().unwrap_or("production");
    let channel = match state.channels.get_by_app_and_name(app_id, channel_name).await? {
        Some(channel) => channel,
        None => state
            .channels
            .get_default_for_app(app_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("no channel named '{channel_name}' for app {app_id}")))?,
    };

    let release = state
        .releases
        .create_pending(
            app_id,
            Some(channel.id),
            &payload.version,
            &payload.bundle_url,
            payload.bundle_size,
            &payload.bundle_hash,
            payload.rollout_percentage.unwrap_or(100),
            &payload.targeting_rules,
            payload.release_notes.as_deref(),
        )
        .await?;

    Ok(Json(release))
}

#[instrument(skip(state))]
pub async fn list_releases(State(state): State<AppState>, Path(app_id): Path<Uuid>) -> Result<Json<Vec<Release>>, ApiError> {
    Ok(Json(state.releases.list_for_app(app_id).await?))
}

#[instrument(skip(state))]
pub async fn process_release(State(state): State<AppState>, Path(release_id): Path<Uuid>) -> Result<Json<Release>, ApiError> {
    let lifecycle = LifecycleService::new(state.releases.clone(), state.channels.clone(), "orchestrator-admin-api");
    let release = lifecycle.process_pending(release_id, state.clock.as_ref()).await?;

    if let Some(channel_id) = release.channel_id {
        state.channel_cache.invalidate(release.app_id, &channel_name_hint(&state, release.app_id, channel_id).await);
    }
    Ok(Json(release))
}

#[instrument(skip(state))]
pub async fn cancel_release(State(state): State<AppState>, Path(release_id): Path<Uuid>) -> Result<Json<()>, ApiError> {
    let lifecycle = LifecycleService::new(state.releases.clone(), state.channels.clone(), "orchestrator-admin-api");
    lifecycle.cancel(release_id).await?;
    Ok(Json(()))
}

#[instrument(skip(state))]
pub async fn rollback_release(State(state): State<AppState>, Path(release_id): Path<Uuid>) -> Result<Json<()>, ApiError> {
    let lifecycle = LifecycleService::new(state.releases.clone(), state.channels.clone(), "orchestrator-admin-api");
    lifecycle.rollback(release_id, RollbackReason::Manual).await?;

    if let Some(release) = state.releases.get_by_id(release_id).await? {
        if let Some(channel_id) = release.channel_id {
            state
                .channel_cache
                .invalidate(release.app_id, &channel_name_hint(&state, release.app_id, channel_id).await);
        }
    }
    Ok(Json(()))
}

/// El caché de canal está keyed por nombre, no por id; una invalidación
/// disparada por una transición de release necesita resolver el
/// nombre primero. Best-effort: si la consulta falla, el caché
/// simplemente expira por TTL en vez de invalidarse de inmediato.
async fn channel_name_hint(state: &AppState, app_id: uuid::Uuid, channel_id: uuid::Uuid) -> String {
    match state.channels.get_by_id(channel_id).await {
        Ok(Some(channel)) => channel.name,
        _ => {
            let _ = app_id;
            String::new()
        }
    }
}

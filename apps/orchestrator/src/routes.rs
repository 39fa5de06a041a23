// [apps/orchestrator/src/routes.rs]
/*!
 * APARATO: TOPOLOGÍA DE RUTAS
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ENSAMBLA EL ROUTER DE AXUM BAJO `/v1` (§6)
 *
 * `devices/register` y `updates/check` quedan deliberadamente fuera de
 * `device_auth_guard`: el primero es donde el token se emite, el
 * segundo debe seguir respondiendo aunque el dispositivo no tenga un
 * token válido todavía (§4.5 paso 1, "unauthenticated checks allowed
 * but subject to stricter rate limits"). Todo lo demás del lado del
 * dispositivo exige el bearer token emitido en el registro; la
 * superficie administrativa (C9) se asume detrás de un perímetro de
 * autenticación de operador gestionado fuera de este núcleo.
 */

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{devices, health, releases, telemetry, updates};
use crate::middleware::{device_auth_guard, device_rate_limit_guard, unauthenticated_rate_limit_guard};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public = Router::new()
        .route("/devices/register", post(devices::register_device))
        .route("/updates/check", post(updates::check_update))
        .route_layer(middleware::from_fn_with_state(state.clone(), unauthenticated_rate_limit_guard));

    let device_authenticated = Router::new()
        .route("/apps/:appId/health-config", get(health::get_health_config))
        .route("/health/failure", post(health::report_health_failure))
        .route("/telemetry", post(telemetry::ingest_telemetry))
        .route("/telemetry/batch", post(telemetry::ingest_telemetry_batch))
        .route("/telemetry/crash", post(telemetry::ingest_crash))
        .route_layer(middleware::from_fn_with_state(state.clone(), device_rate_limit_guard))
        .route_layer(middleware::from_fn_with_state(state.clone(), device_auth_guard));

    let admin = Router::new()
        .route("/apps/:appId/releases", post(releases::create_release).get(releases::list_releases))
        .route("/releases/:releaseId/process", post(releases::process_release))
        .route("/releases/:releaseId/cancel", post(releases::cancel_release))
        .route("/releases/:releaseId/rollback", post(releases::rollback_release));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/v1", Router::new().merge(public).merge(device_authenticated).merge(admin))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// [apps/orchestrator/src/middleware.rs]
/*!
 * APARATO: GUARDIANES DE PETICIÓN (AUTENTICACIÓN Y TASA)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: VALIDAR EL BEARER TOKEN HS256 EMITIDO EN EL REGISTRO
 *    DEL DISPOSITIVO, INYECTAR SU IDENTIDAD EN LA PETICIÓN, Y ACOTAR EL
 *    CAUDAL DE LLAMADAS TANTO ANÓNIMAS COMO AUTENTICADAS
 *
 * `/v1/devices/register` es la única ruta que no pasa por `device_auth_guard`
 * — es justamente donde el token se emite. Todas las demás rutas bajo
 * `/v1` lo exigen. Distingue `INVALID_TOKEN` de `TOKEN_EXPIRED` (§7)
 * porque el agente de dispositivo reacciona distinto a cada uno: un
 * token expirado dispara un re-registro silencioso, uno inválido es
 * un error de configuración que amerita alerta.
 */

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use bundlenudge_core_clock_ids::TokenError;
use bundlenudge_domain_models::wire::ErrorResponse;
use tracing::warn;

use crate::state::AppState;

/// Identidad del dispositivo autenticado, inyectada como extensión de
/// la petición para que los handlers la recuperen sin volver a
/// verificar el token.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub device_id: uuid::Uuid,
}

pub async fn device_auth_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let bearer_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(bearer_token) = bearer_token else {
        warn!("❌ [AUTH]: missing bearer token");
        return invalid_token_response();
    };

    match state.token_codec.verify(state.clock.as_ref(), bearer_token) {
        Ok(claims) => {
            req.extensions_mut().insert(DeviceIdentity { device_id: claims.device_id });
            next.run(req).await
        }
        Err(TokenError::Expired { .. }) => {
            warn!("⏰ [AUTH]: device token expired");
            token_expired_response()
        }
        Err(other) => {
            warn!(error = %other, "❌ [AUTH]: device token rejected");
            invalid_token_response()
        }
    }
}

/// Limita las rutas públicas (`register`, `check`) por IP de origen
/// (§4.5 paso 1, §12). Se apoya en `ConnectInfo`, que solo está
/// disponible cuando el servidor se sirve con
/// `into_make_service_with_connect_info` (ver `kernel::serve`).
pub async fn unauthenticated_rate_limit_guard(
    State(state): State<AppState>,
    ConnectInfo(peer_address): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let key = peer_address.ip().to_string();
    if state.unauthenticated_rate_limiter.check(&key) {
        next.run(req).await
    } else {
        warn!(client_ip = %key, "🚦 [RATE_LIMIT]: unauthenticated caller throttled");
        rate_limited_response()
    }
}

/// Limita las rutas autenticadas por el valor crudo del bearer token
/// — más holgado que el límite anónimo, ya que el token ya demostró
/// posesión pero aún puede ser abusado por un dispositivo desbocado.
pub async fn device_rate_limit_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let bearer_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    if state.device_rate_limiter.check(&bearer_token) {
        next.run(req).await
    } else {
        warn!("🚦 [RATE_LIMIT]: authenticated device throttled");
        rate_limited_response()
    }
}

fn rate_limited_response() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse {
            kind: "RATE_LIMITED".to_string(),
            message: "too many requests, back off and retry later".to_string(),
        }),
    )
        .into_response()
}

fn invalid_token_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            kind: "INVALID_TOKEN".to_string(),
            message: "the device token is malformed or its signature does not match".to_string(),
        }),
    )
        .into_response()
}

fn token_expired_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            kind: "TOKEN_EXPIRED".to_string(),
            message: "the device token has expired, re-register to obtain a fresh one".to_string(),
        }),
    )
        .into_response()
}

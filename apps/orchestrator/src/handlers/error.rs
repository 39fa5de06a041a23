// [apps/orchestrator/src/handlers/error.rs]
/*!
 * APARATO: TRADUCCIÓN DE ERRORES A RESPUESTAS HTTP (§7)
 * RESPONSABILIDAD: MAPEAR `ErrorKind` A CÓDIGOS DE ESTADO CONCRETOS
 *
 * Único punto de traducción kind -> status en todo el control-plane;
 * los handlers devuelven `Result<_, ApiError>` y dejan que
 * `IntoResponse` decida el código exacto.
 */

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use bundlenudge_domain_models::{DomainError, ErrorKind};
use bundlenudge_domain_models::wire::ErrorResponse;

use crate::services::lifecycle::LifecycleError;

pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self(error)
    }
}

impl From<bundlenudge_infra_db::DbError> for ApiError {
    fn from(error: bundlenudge_infra_db::DbError) -> Self {
        Self(DomainError::new(error.to_error_kind(), error.to_string()))
    }
}

impl From<LifecycleError> for ApiError {
    fn from(error: LifecycleError) -> Self {
        match error {
            LifecycleError::Db(db_error) => db_error.into(),
            other => Self(DomainError::new(ErrorKind::InvalidInput, other.to_string())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidToken | ErrorKind::TokenExpired => StatusCode::UNAUTHORIZED,
            ErrorKind::InvalidBundle => StatusCode::BAD_REQUEST,
            ErrorKind::VersionMismatch => StatusCode::CONFLICT,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NetworkError => StatusCode::BAD_GATEWAY,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

// [libs/domain/models/src/errors.rs]
/*!
 * APARATO: TAXONOMÍA DE ERRORES DEL NÚCLEO (CROSS-CUTTING)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: KINDS COMPARTIDOS ENTRE SERVIDOR Y AGENTE
 *
 * Estos son "kinds", no nombres de tipo: cada crate del workspace que
 * necesita superficie de error propia (infra-db, infra-device-client,
 * device-agent) define su propio enum `thiserror` y mapea a uno de
 * estos kinds en el límite, en vez de depender directamente de este
 * enum como su tipo de error interno.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InvalidToken,
    TokenExpired,
    InvalidBundle,
    VersionMismatch,
    RateLimited,
    Conflict,
    NetworkError,
    InternalError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::InvalidToken => "INVALID_TOKEN",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::InvalidBundle => "INVALID_BUNDLE",
            ErrorKind::VersionMismatch => "VERSION_MISMATCH",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("[{kind}]: {message}")]
pub struct DomainError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}

// [libs/device-agent/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DEL AGENTE (§4.7)
 * RESPONSABILIDAD: TAXONOMÍA CROSS-CUTTING MAPEADA A `ErrorKind`
 */

use bundlenudge_domain_models::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("STORAGE_READ_FAULT: {0}")]
    StorageRead(String),

    #[error("STORAGE_WRITE_FAULT: {0}")]
    StorageWrite(String),

    #[error("BRIDGE_FAULT: {0}")]
    Bridge(String),

    #[error("INVALID_BUNDLE: hash mismatch, expected {expected} got {actual}")]
    InvalidBundle { expected: String, actual: String },

    #[error("NETWORK_ERROR: {0}")]
    Network(#[from] bundlenudge_infra_device_client::DeviceClientError),

    #[error("PRELOAD_BLOCKED: {0}")]
    PreloadBlocked(String),
}

impl AgentError {
    pub fn to_error_kind(&self) -> ErrorKind {
        match self {
            AgentError::StorageRead(_) | AgentError::StorageWrite(_) | AgentError::Bridge(_) => {
                ErrorKind::InternalError
            }
            AgentError::InvalidBundle { .. } => ErrorKind::InvalidBundle,
            AgentError::Network(_) => ErrorKind::NetworkError,
            AgentError::PreloadBlocked(_) => ErrorKind::InvalidInput,
        }
    }
}

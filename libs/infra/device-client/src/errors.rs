// [libs/infra/device-client/src/errors.rs]
/*!
 * APARATO: DEVICE CLIENT ERRORS
 * RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE COMUNICACIÓN DISPOSITIVO -> CONTROL PLANE
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceClientError {
    #[error("NETWORK_UNREACHABLE: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("IO_FAULT: {0}")]
    IoFault(#[from] std::io::Error),

    #[error("DECODING_FAULT: {0}")]
    DecodingFault(#[from] serde_json::Error),

    #[error("SERVER_REJECTION: status {status} body {body}")]
    ServerRejection { status: u16, body: String },

    #[error("UNAUTHORIZED: access token missing or rejected")]
    Unauthorized,

    #[error("INTEGRITY_FAULT: downloaded bundle hash {actual} does not match expected {expected}")]
    IntegrityFault { expected: String, actual: String },
}

// [libs/infra/db/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DE PERSISTENCIA (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS, MAPEABLE A LOS
 *    KINDS CROSS-CUTTING DE `bundlenudge-domain-models::ErrorKind` (§7).
 */

use bundlenudge_domain_models::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("[L3_DB_NET_FAULT]: database uplink severed -> {0}")]
    ConnectionError(String),

    #[error("[L3_DB_CONFIG_FAULT]: configuration void -> {0}")]
    ConfigurationError(String),

    #[error("[L3_DB_QUERY_FAULT]: query rejected -> {0}")]
    QueryError(#[from] libsql::Error),

    #[error("[L3_DB_MAPPING_FAULT]: row mapping violation -> {0}")]
    MappingError(String),

    #[error("[L3_NOT_FOUND]: {0}")]
    NotFound(String),

    #[error("[L3_CONFLICT]: {0}")]
    Conflict(String),

    #[error("[L3_DB_FAULT]: transaction collapse -> {0}")]
    TransactionError(String),
}

impl DbError {
    pub fn to_error_kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound(_) => ErrorKind::NotFound,
            DbError::Conflict(_) => ErrorKind::Conflict,
            DbError::ConnectionError(_)
            | DbError::ConfigurationError(_)
            | DbError::QueryError(_)
            | DbError::MappingError(_)
            | DbError::TransactionError(_) => ErrorKind::InternalError,
        }
    }
}

// [libs/infra/db/src/lib.rs]
/*!
 * APARATO: INFRA-DB ROOT
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUNTO DE ENTRADA DE LA CAPA DE PERSISTENCIA SOBRE
 *    LIBSQL — CONEXIÓN, ESQUEMA Y REPOSITORIOS POR AGREGADO
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{
    AppRepository, ChannelRepository, DeviceRepository, HealthRepository, ReleaseRepository, RollbackRepository,
};

// [libs/domain/models/src/lib.rs]
/*!
 * APARATO: DOMAIN MODELS ROOT
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: RE-EXPORTACIÓN CENTRALIZADA DE ENTIDADES Y DTOS
 */

pub mod app;
pub mod channel;
pub mod constraints;
pub mod device;
pub mod errors;
pub mod health;
pub mod release;
pub mod wire;

pub use app::{App, Platform};
pub use channel::Channel;
pub use constraints::Constraints;
pub use device::{Device, DeviceMetadata, PersistedAppVersionInfo, VerificationState};
pub use errors::{DomainError, ErrorKind};
pub use health::{HealthConfig, HealthReport, HealthReportKind, RollbackRecord, RollbackReason};
pub use release::{Release, ReleaseStatus};

// [libs/domain/models/src/release.rs]
/*!
 * APARATO: RELEASE ENTITY Y FSM DE ESTADOS
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO SOBERANO DE UN BUNDLE INMUTABLE
 *
 * # Mathematical Proof (Hash Immutability):
 * `bundle_hash` nunca se reescribe tras la creación del registro; el
 * invariante "una vez `active`, los bytes en `bundle_url` hashean a
 * `bundle_hash`" se cumple al rechazar cualquier actualización de este
 * campo en la capa de persistencia (ver `bundlenudge-infra-db`).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constraints::Constraints;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    Pending,
    Processing,
    Active,
    Superseded,
    RolledBack,
    Rejected,
}

impl ReleaseStatus {
    /// `rejected` y `rolled_back` son terminales para el id de release dado.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReleaseStatus::Rejected | ReleaseStatus::RolledBack)
    }

    /// Releases `superseded` permanecen legibles para que descargas en
    /// curso puedan completarse; `rolled_back`/`rejected` dejan de servirse.
    pub fn is_servable(&self) -> bool {
        matches!(
            self,
            ReleaseStatus::Active | ReleaseStatus::Superseded | ReleaseStatus::Processing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackReason {
    CrashDetected,
    HealthTimeout,
    Manual,
    NativeUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: Uuid,
    pub app_id: Uuid,
    pub channel_id: Option<Uuid>,
    pub version: String,
    pub bundle_url: String,
    pub bundle_size: u64,
    /// Hex-encoded SHA-256, minúsculas, sin prefijo de algoritmo.
    pub bundle_hash: String,
    pub rollout_percentage: u8,
    pub targeting_rules: Constraints,
    pub status: ReleaseStatus,
    pub rollback_reason: Option<RollbackReason>,
    pub release_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Release {
    pub fn is_active(&self) -> bool {
        matches!(self.status, ReleaseStatus::Active)
    }
}

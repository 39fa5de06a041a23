// [libs/domain/models/src/channel.rs]
/*!
 * APARATO: CHANNEL ENTITY
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: TARGET DE ROLLOUT NOMBRADO DENTRO DE UNA APP
 *
 * Invariante: un canal apunta a lo sumo a un release activo en todo
 * instante; las transiciones son atómicas (ver `bundlenudge-infra-db`).
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constraints::Constraints;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    pub app_id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub rollout_percentage: u8,
    pub targeting_rules: Constraints,
    pub active_release_id: Option<Uuid>,
}

impl Channel {
    pub fn has_active_release(&self) -> bool {
        self.active_release_id.is_some()
    }
}

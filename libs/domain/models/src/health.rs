// [libs/domain/models/src/health.rs]
/*!
 * APARATO: HEALTH ENTITIES
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE REPORTE Y CONFIGURACIÓN DE SALUD
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::release::RollbackReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthReportKind {
    Success,
    Failure,
}

/// Los reportes de éxito **no** se emiten nunca (ver §5); esta entidad
/// solo materializa fallas reportadas por el dispositivo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub release_id: Uuid,
    pub device_id: Uuid,
    pub kind: HealthReportKind,
    pub missing_events: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub id: Uuid,
    pub release_id: Uuid,
    pub device_id: Option<Uuid>,
    pub reason: RollbackReason,
    pub previous_version: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Un evento crítico que el host debe emitir dentro de la ventana.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEventSpec {
    pub name: String,
    pub required: bool,
    pub timeout_ms: u64,
}

/// Un probe HTTP que el dispositivo ejecuta tras actualizar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEndpointSpec {
    pub method: String,
    pub url: String,
    pub expected_status: Vec<u16>,
    pub required: bool,
}

/// Configuración de salud por app (§3). Default vacío = fail-open: el
/// agente no arma ningún monitor y nunca reporta fallas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default)]
    pub events: Vec<HealthEventSpec>,
    #[serde(default)]
    pub endpoints: Vec<HealthEndpointSpec>,
}

impl HealthConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.endpoints.is_empty()
    }
}

/// Fuente de verdad de la ventana/muestreo del agregador de salud (C6),
/// por app. Cuando no existe fila para una app, `infra-db` aplica estos
/// mismos valores como default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthAggregatorConfig {
    pub window_seconds: u64,
    pub min_sample: u32,
    pub failure_threshold: f64,
    pub sweep_interval_seconds: u64,
}

impl Default for HealthAggregatorConfig {
    fn default() -> Self {
        Self {
            window_seconds: 15 * 60,
            min_sample: 50,
            failure_threshold: 0.05,
            sweep_interval_seconds: 10,
        }
    }
}

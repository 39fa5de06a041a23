// [libs/domain/models/src/device.rs]
/*!
 * APARATO: DEVICE ENTITY Y METADATA PERSISTIDA ON-DEVICE
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: VISTA MATERIALIZADA DEL SERVIDOR + RECORD SEMÁNTICO
 *    QUE EL PROPIO DISPOSITIVO POSEE EN EXCLUSIVA.
 *
 * El servidor nunca muta el estado on-device; su fila `Device` es una
 * vista materializada del último check-in y puede ir rezagada.
 */

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::Platform;

/// Fila del servidor: el mínimo necesario para resolución y agregación
/// de salud. Los ids de dispositivo no son enumerables por el dueño de
/// la app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: Uuid,
    pub app_id: Uuid,
    pub platform: Platform,
    pub current_bundle_version: Option<String>,
    pub current_bundle_hash: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub crash_count: u32,
}

/// Información de versión nativa tal como la reporta el `PlatformBridge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAppVersionInfo {
    pub app_version: String,
    pub build_number: String,
    pub recorded_at: DateTime<Utc>,
}

/// Estado de la ventana de verificación post-instalación.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationState {
    pub app_ready: bool,
    pub health_passed: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

/// El registro semántico único persistido atómicamente por el agente de
/// dispositivo (clave `@bundlenudge:metadata` en el almacén host).
///
/// Invariante: a lo sumo uno de `current_version`, `previous_version`,
/// `pending_version` describe la "versión evaluada en la ventana de
/// verificación" en un instante dado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub device_id: Uuid,
    pub access_token: Option<String>,
    pub current_version: Option<String>,
    pub current_version_hash: Option<String>,
    pub previous_version: Option<String>,
    pub pending_version: Option<String>,
    pub pending_update_flag: bool,
    pub crash_count: u32,
    pub last_crash_time: Option<DateTime<Utc>>,
    pub verification_state: VerificationState,
    pub app_version_info: Option<PersistedAppVersionInfo>,
    pub bundle_hashes: BTreeMap<String, String>,
}

impl DeviceMetadata {
    /// Esquema por defecto generado cuando no existe registro previo o la
    /// lectura falla validación (ver §4.6.1 paso 1 del protocolo de arranque).
    pub fn default_with_fresh_id() -> Self {
        Self {
            device_id: Uuid::new_v4(),
            access_token: None,
            current_version: None,
            current_version_hash: None,
            previous_version: None,
            pending_version: None,
            pending_update_flag: false,
            crash_count: 0,
            last_crash_time: None,
            verification_state: VerificationState::default(),
            app_version_info: None,
            bundle_hashes: BTreeMap::new(),
        }
    }

    /// Validación de esquema del §4.6.1 paso 1: campos requeridos presentes,
    /// tipos correctos, `crash_count` en `[0,100]`, `device_id` no vacío.
    pub fn is_schema_valid(&self) -> bool {
        self.device_id != Uuid::nil() && self.crash_count <= 100
    }
}

// [libs/domain/models/src/app.rs]
/*!
 * APARATO: APP ENTITY
 * RESPONSABILIDAD: IDENTIDAD SOBERANA DE UNA APLICACIÓN CLIENTE
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plataforma nativa de destino. Un `Constraints::platforms` vacío significa
/// "cualquiera"; este enum nunca incluye una variante "any" propia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

/// Registro soberano de una aplicación. El `id` es estable durante toda la
/// vida de cualquier Release que lo referencie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: Uuid,
    pub platform: Platform,
    /// Puntero opaco al propietario (cuenta/equipo); la gestión de cuentas
    /// propiamente dicha queda fuera de este núcleo.
    pub owner_ref: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl App {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

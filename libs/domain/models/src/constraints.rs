// [libs/domain/models/src/constraints.rs]
/*!
 * APARATO: CONSTRAINTS VALUE OBJECT
 * RESPONSABILIDAD: REGLAS DE ELEGIBILIDAD DE UN RELEASE
 */

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::app::Platform;

/// Objeto de valor inmutable. Un `platforms` vacío significa "cualquier
/// plataforma" — el default documentado, no una variante implícita.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub platforms: BTreeSet<Platform>,
    pub min_app_version: Option<String>,
    pub max_app_version: Option<String>,
    pub min_os_version: Option<String>,
    /// Mapa de reglas adicionales, opaco a este núcleo.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Constraints {
    pub fn any_platform() -> Self {
        Self::default()
    }
}

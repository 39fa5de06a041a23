// [apps/device-simulator/src/last_offer.rs]
/*!
 * APARATO: ÚLTIMA OFERTA DE ACTUALIZACIÓN
 * RESPONSABILIDAD: PUENTEA `check` Y `apply` A TRAVÉS DE INVOCACIONES
 *    SEPARADAS DEL CLI — EL PROTOCOLO REAL (§4.6.2) ASUME UN SOLO
 *    PROCESO DE LARGA DURACIÓN; EL SIMULADOR PERSISTE EL `UpdateInfo`
 *    RESUELTO POR `check` PARA QUE `apply` PUEDA EJECUTARSE COMO UN
 *    COMANDO SEPARADO
 */

use std::path::{Path, PathBuf};

use bundlenudge_device_agent::UpdateInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastOffer {
    pub version: String,
    pub bundle_url: String,
    pub bundle_size: u64,
    pub bundle_hash: String,
    pub release_id: Uuid,
}

impl From<&LastOffer> for UpdateInfo {
    fn from(offer: &LastOffer) -> Self {
        UpdateInfo {
            version: offer.version.clone(),
            bundle_url: offer.bundle_url.clone(),
            bundle_size: offer.bundle_size,
            bundle_hash: offer.bundle_hash.clone(),
            release_id: offer.release_id,
        }
    }
}

impl LastOffer {
    fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("last_offer.json")
    }

    pub fn save(data_dir: &Path, offer: &LastOffer) -> std::io::Result<()> {
        let serialized = serde_json::to_string_pretty(offer)?;
        let path = Self::path(data_dir);
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, serialized)?;
        std::fs::rename(&temp_path, &path)
    }

    pub fn load(data_dir: &Path) -> std::io::Result<Option<LastOffer>> {
        match std::fs::read_to_string(Self::path(data_dir)) {
            Ok(raw) => Ok(serde_json::from_str(&raw).ok()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}

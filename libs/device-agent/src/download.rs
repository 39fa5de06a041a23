// [libs/device-agent/src/download.rs]
/*!
 * APARATO: DESCARGA E INSTALACIÓN DE BUNDLES (§4.6.2)
 * RESPONSABILIDAD: FETCH + VERIFICACIÓN DE INTEGRIDAD + PERSISTENCIA ATÓMICA
 *
 * La verificación de hash ocurre aquí, sobre los bytes ya recibidos
 * completos — el contrato solo exige que el total se hashee una vez,
 * no que el streaming a disco sea incremental.
 */

use bundlenudge_infra_device_client::{verify_bundle_integrity, DeviceControlPlaneClient};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::bridge::PlatformBridge;
use crate::callbacks::AgentCallbacks;
use crate::errors::AgentError;

/// Metadata de la actualización resuelta por el servidor (espejo de
/// `ReleaseWireInfo`, desacoplado del DTO de alambre para que este
/// módulo no dependa de su forma JSON exacta).
#[derive(Debug, Clone)]
pub struct UpdateInfo {
    pub version: String,
    pub bundle_url: String,
    pub bundle_size: u64,
    pub bundle_hash: String,
    pub release_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub version: String,
    pub bundle_hash: String,
}

/// Ejecuta los pasos 1-3 de §4.6.2: fetch, verificación de integridad,
/// persistencia atómica vía el bridge. No muta la metadata del
/// dispositivo — eso es responsabilidad del llamador, que decide
/// `pending_version`/`pending_update_flag` tras un resultado exitoso.
#[instrument(skip(client, bridge, callbacks, update))]
pub async fn download_and_install(
    client: &DeviceControlPlaneClient,
    bridge: &dyn PlatformBridge,
    callbacks: &dyn AgentCallbacks,
    update: &UpdateInfo,
) -> Result<DownloadOutcome, AgentError> {
    let bytes = client.download_bundle_bytes(&update.bundle_url).await?;
    callbacks.on_download_progress(bytes.len() as u64, update.bundle_size);

    if let Err(error) = verify_bundle_integrity(&bytes, &update.bundle_hash) {
        warn!(version = %update.version, "🚫 [DOWNLOAD]: integrity check failed, bundle not persisted");
        return Err(match error {
            bundlenudge_infra_device_client::DeviceClientError::IntegrityFault { expected, actual } => {
                AgentError::InvalidBundle { expected, actual }
            }
            other => AgentError::Network(other),
        });
    }

    bridge.save_bundle_atomic(&update.version, &bytes)?;
    info!(version = %update.version, bytes = bytes.len(), "📦 [DOWNLOAD]: bundle installed atomically");

    Ok(DownloadOutcome { version: update.version.clone(), bundle_hash: update.bundle_hash.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::InMemoryBridge;
    use crate::callbacks::NoopCallbacks;
    use sha2::{Digest, Sha256};

    #[test]
    fn integrity_mismatch_is_rejected_before_persistence_would_happen() {
        let bridge = InMemoryBridge::new("1.0.0", "100");
        let bytes = b"bundle-bytes".to_vec();
        let wrong_hash = "0".repeat(64);

        let error = bundlenudge_infra_device_client::verify_bundle_integrity(&bytes, &wrong_hash).unwrap_err();
        assert!(matches!(
            error,
            bundlenudge_infra_device_client::DeviceClientError::IntegrityFault { .. }
        ));
        assert!(!bridge.has_bundle("5.0.0"));
        let _ = NoopCallbacks;
    }

    #[test]
    fn matching_hash_verifies_cleanly() {
        let bytes = b"another-bundle".to_vec();
        let hash = hex::encode(Sha256::digest(&bytes));
        assert!(bundlenudge_infra_device_client::verify_bundle_integrity(&bytes, &hash).is_ok());
    }
}

// [apps/orchestrator/src/services/lifecycle.rs]
/*!
 * APARATO: SERVICIO DE CICLO DE VIDA DE RELEASES (C5)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTA LAS TRANSICIONES DE `bundlenudge-infra-db`
 *    EN EL ORDEN DEL DIAGRAMA DE ESTADOS (§4.3), CON REINTENTO
 *    EXPONENCIAL SOBRE FALLAS TRANSITORIAS DE PERSISTENCIA
 *
 * Este servicio no conoce la cola de trabajos de build (Metro/Hermes);
 * asume que un release `pending` ya tiene sus bytes en el object store
 * (interfaz externa) y que `bundle_hash`/`bundle_size` ya fueron
 * calculados por quien sube el release. Su trabajo es exclusivamente
 * mover el release a través de la FSM.
 */

use std::time::Duration;

use bundlenudge_domain_models::{Release, RollbackReason};
use bundlenudge_infra_db::{ChannelRepository, DbError, ReleaseRepository};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const MAX_PERSIST_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("release {0} carries a malformed bundle_hash, rejecting")]
    MalformedHash(Uuid),
    #[error("release {0} has no target channel assigned, cannot activate")]
    NoTargetChannel(Uuid),
    #[error(transparent)]
    Db(#[from] DbError),
}

pub struct LifecycleService {
    releases: std::sync::Arc<ReleaseRepository>,
    channels: std::sync::Arc<ChannelRepository>,
    lease_owner: String,
}

impl LifecycleService {
    pub fn new(
        releases: std::sync::Arc<ReleaseRepository>,
        channels: std::sync::Arc<ChannelRepository>,
        lease_owner: impl Into<String>,
    ) -> Self {
        Self { releases, channels, lease_owner: lease_owner.into() }
    }

    /// `pending -> processing -> {active | rejected}` (§4.3). La
    /// verificación en este núcleo es de forma, no de contenido: el
    /// bundle mismo vive en un object store externo fuera de alcance;
    /// aquí solo se certifica que el `bundle_hash` tiene la forma de un
    /// SHA-256 hex antes de exponer el release a tráfico de dispositivos.
    #[instrument(skip(self))]
    pub async fn process_pending(
        &self,
        release_id: Uuid,
        clock: &dyn bundlenudge_core_clock_ids::Clock,
    ) -> Result<Release, LifecycleError> {
        let release = with_retry(|| {
            self.releases.acquire_processing_lease(
                release_id,
                &self.lease_owner,
                chrono::Duration::minutes(5),
                clock.now(),
            )
        })
        .await?;

        if !is_well_formed_sha256_hex(&release.bundle_hash) {
            warn!(release_id = %release_id, "🚫 [LIFECYCLE]: malformed bundle_hash, rejecting");
            with_retry(|| self.releases.mark_rejected(release_id)).await?;
            return Err(LifecycleError::MalformedHash(release_id));
        }

        let channel_id = release.channel_id.ok_or(LifecycleError::NoTargetChannel(release_id))?;

        with_retry(|| self.releases.activate(release_id, channel_id, &self.channels)).await?;
        self.channels.get_by_id(channel_id).await?;

        info!(release_id = %release_id, channel_id = %channel_id, "🚀 [LIFECYCLE]: release activated");
        self.releases
            .get_by_id(release_id)
            .await?
            .ok_or_else(|| LifecycleError::Db(DbError::NotFound(format!("release {release_id} vanished post-activation"))))
    }

    /// `pending -> rejected` directamente, sin pasar por `processing`.
    #[instrument(skip(self))]
    pub async fn cancel(&self, release_id: Uuid) -> Result<(), LifecycleError> {
        with_retry(|| self.releases.cancel(release_id)).await?;
        Ok(())
    }

    /// Rollback manual (operador) o disparado por el agregador de salud
    /// (`HealthTimeout`). Terminal: el release nunca se reactiva — un
    /// nuevo release (nuevo id) es el único camino hacia adelante.
    #[instrument(skip(self))]
    pub async fn rollback(&self, release_id: Uuid, reason: RollbackReason) -> Result<(), LifecycleError> {
        with_retry(|| self.releases.rollback(release_id, reason, &self.channels)).await?;
        warn!(release_id = %release_id, reason = ?reason, "⏪ [LIFECYCLE]: release rolled back");
        Ok(())
    }
}

/// Reintenta hasta `MAX_PERSIST_RETRIES` veces con backoff exponencial
/// (§4.3 "any transition that cannot be persisted is retried up to N
/// times"). No reintenta `DbError::Conflict`/`NotFound` — esos son
/// resultados de negocio definitivos, no fallas transitorias de
/// persistencia.
async fn with_retry<T, F, Fut>(mut attempt: F) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, DbError>>,
{
    let mut backoff = BASE_BACKOFF;
    for retry_number in 0..MAX_PERSIST_RETRIES {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(DbError::Conflict(message)) => return Err(DbError::Conflict(message)),
            Err(DbError::NotFound(message)) => return Err(DbError::NotFound(message)),
            Err(transient) if retry_number + 1 < MAX_PERSIST_RETRIES => {
                warn!(attempt = retry_number + 1, error = %transient, "🔁 [LIFECYCLE]: transient persistence fault, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(terminal) => return Err(terminal),
        }
    }
    unreachable!("loop always returns within MAX_PERSIST_RETRIES iterations")
}

fn is_well_formed_sha256_hex(candidate: &str) -> bool {
    candidate.len() == 64 && candidate.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_hash() {
        assert!(!is_well_formed_sha256_hex("abc123"));
    }

    #[test]
    fn rejects_non_hex_characters() {
        assert!(!is_well_formed_sha256_hex(&"z".repeat(64)));
    }

    #[test]
    fn accepts_well_formed_hash() {
        assert!(is_well_formed_sha256_hex(&"a".repeat(64)));
    }
}

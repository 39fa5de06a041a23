// [apps/orchestrator/src/services/health_sweep.rs]
/*!
 * APARATO: DEMONIO DE BARRIDO DEL AGREGADOR DE SALUD (C6)
 * CLASIFICACIÓN: BACKGROUND WORKER (ESTRATO L3)
 * RESPONSABILIDAD: EVALUAR PERIÓDICAMENTE SI ALGÚN RELEASE `active`
 *    CRUZA EL UMBRAL DE AUTO-ROLLBACK Y DISPARAR LA TRANSICIÓN
 *
 * Itera solo sobre releases con señal reciente (`releases_with_recent_
 * signal`) en vez de sobre el catálogo completo — el costo del barrido
 * escala con el tráfico, no con el número histórico de releases (§5).
 * Coalescencia: si dos vueltas del barrido observan el mismo release
 * ya disparado (porque el rollback aún no llegó a persistirse), la
 * segunda vuelta simplemente vuelve a encontrarlo en estado distinto de
 * `active` vía `ReleaseStatus::is_terminal` y lo ignora — no hay doble
 * rollback.
 */

use std::sync::Arc;
use std::time::Duration;

use bundlenudge_domain_health::evaluate_rollback_trigger;
use bundlenudge_domain_models::{ReleaseStatus, RollbackReason};
use bundlenudge_infra_db::{ChannelRepository, HealthRepository, ReleaseRepository};
use tracing::{error, info, instrument, warn};

use super::lifecycle::LifecycleService;
use crate::state::channel_cache::ChannelCache;

pub struct HealthSweepDaemon {
    releases: Arc<ReleaseRepository>,
    health: Arc<HealthRepository>,
    lifecycle: Arc<LifecycleService>,
    clock: Arc<dyn bundlenudge_core_clock_ids::Clock>,
    channels: Arc<ChannelRepository>,
    channel_cache: Arc<ChannelCache>,
}

impl HealthSweepDaemon {
    pub fn new(
        releases: Arc<ReleaseRepository>,
        health: Arc<HealthRepository>,
        lifecycle: Arc<LifecycleService>,
        clock: Arc<dyn bundlenudge_core_clock_ids::Clock>,
        channels: Arc<ChannelRepository>,
        channel_cache: Arc<ChannelCache>,
    ) -> Self {
        Self { releases, health, lifecycle, clock, channels, channel_cache }
    }

    /// Bucle infinito destinado a correr como una tarea de tokio de
    /// fondo; nunca retorna salvo que el proceso se esté apagando.
    /// El intervalo entre vueltas es el default global
    /// (`HealthAggregatorConfig::default().sweep_interval_seconds`) —
    /// cada release individualmente puede tener su propio
    /// `window`/`min_sample`/`failure_threshold` vía overrides por app,
    /// pero el reloj del barrido en sí es uno solo por proceso.
    pub async fn run_forever(self, default_sweep_interval_seconds: u64) -> ! {
        let mut ticker = tokio::time::interval(Duration::from_secs(default_sweep_interval_seconds.max(1)));
        loop {
            ticker.tick().await;
            if let Err(error) = self.sweep_once().await {
                error!(error = %error, "💥 [HEALTH_SWEEP]: sweep iteration failed, will retry next tick");
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn sweep_once(&self) -> Result<(), bundlenudge_infra_db::DbError> {
        let now = self.clock.now();
        // La ventana de descubrimiento usa el default global: un release
        // con override de `window_seconds` más largo que el default
        // podría perder señal vieja aquí, pero seguirá siendo redescubierto
        // mientras continúe recibiendo activaciones/fallas.
        let default_window = bundlenudge_domain_models::health::HealthAggregatorConfig::default().window_seconds;
        let candidate_release_ids = self.health.releases_with_recent_signal(default_window, now).await?;

        for release_id in candidate_release_ids {
            if let Err(error) = self.evaluate_one(release_id, now).await {
                warn!(release_id = %release_id, error = %error, "⚠️ [HEALTH_SWEEP]: skipping release after error");
            }
        }
        Ok(())
    }

    async fn evaluate_one(
        &self,
        release_id: uuid::Uuid,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), bundlenudge_infra_db::DbError> {
        let Some(release) = self.releases.get_by_id(release_id).await? else {
            return Ok(());
        };

        if release.status != ReleaseStatus::Active {
            return Ok(());
        }

        let aggregator_config = self
            .health
            .get_aggregator_config(release.app_id)
            .await?
            .unwrap_or_default();

        let counters = self
            .health
            .windowed_counters(release_id, aggregator_config.window_seconds, now)
            .await?;

        if evaluate_rollback_trigger(counters, &aggregator_config) {
            warn!(
                release_id = %release_id,
                failures = counters.failures,
                activations = counters.activations,
                "⏰ [HEALTH_SWEEP]: auto-rollback threshold crossed"
            );
            self.health
                .record_rollback(release_id, None, RollbackReason::HealthTimeout, None)
                .await?;
            if let Err(error) = self.lifecycle.rollback(release_id, RollbackReason::HealthTimeout).await {
                error!(release_id = %release_id, error = %error, "💀 [HEALTH_SWEEP]: failed to persist rollback transition");
            } else {
                info!(release_id = %release_id, "✅ [HEALTH_SWEEP]: auto-rollback committed");
                if let Some(channel_id) = release.channel_id {
                    self.channel_cache.invalidate(release.app_id, &self.channel_name_hint(channel_id).await);
                }
            }
        }
        Ok(())
    }

    /// El caché de canal está keyed por nombre, no por id; un rollback
    /// disparado por este demonio solo conoce el id del canal. Best-effort:
    /// si la consulta falla, el caché simplemente expira por TTL.
    async fn channel_name_hint(&self, channel_id: uuid::Uuid) -> String {
        match self.channels.get_by_id(channel_id).await {
            Ok(Some(channel)) => channel.name,
            _ => String::new(),
        }
    }
}

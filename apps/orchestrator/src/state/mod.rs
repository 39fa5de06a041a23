// [apps/orchestrator/src/state/mod.rs]
/*!
 * APARATO: ESTADO COMPARTIDO DEL ORQUESTADOR
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: COMPOSICIÓN DE REPOSITORIOS, CACHÉ DE CANAL Y
 *    DEPENDENCIAS TRANSVERSALES (RELOJ, CODEC DE TOKEN, DEDUP)
 *
 * Única porción de estado mutable compartido del lado servidor fuera
 * de la base de datos misma (§5): el caché `(app_id, channel_name) ->
 * Channel`, el deduplicador de reportes de salud, y los dos
 * limitadores de tasa. Todos son best-effort y nunca son la fuente de
 * verdad — se reinician limpios en cada redeploy.
 */

pub mod channel_cache;
pub mod rate_limiter;

use std::sync::Arc;

use bundlenudge_core_clock_ids::{Clock, DeviceTokenCodec, SystemClock};
use bundlenudge_domain_health::ReportDeduplicator;
use bundlenudge_infra_db::{
    AppRepository, ChannelRepository, DbClient, DeviceRepository, HealthRepository, ReleaseRepository,
    RollbackRepository,
};

use crate::services::telemetry_queue::TelemetryQueue;
use channel_cache::ChannelCache;
use rate_limiter::RateLimiter;

/// Segundos de vida del caché de canal (§4.5 paso 2, default 5s).
pub const DEFAULT_CHANNEL_CACHE_TTL_SECONDS: u64 = 5;

/// Presupuesto para llamadas sin autenticar (`register`, `check`),
/// por IP de origen — más estricto porque no hay identidad verificada
/// detrás de la llamada (§4.5 paso 1, §12).
pub const UNAUTHENTICATED_RATE_LIMIT_MAX_REQUESTS: u32 = 30;
pub const UNAUTHENTICATED_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

/// Presupuesto para llamadas autenticadas por dispositivo, por token
/// — más holgado porque el dispositivo ya demostró posesión de un
/// token válido.
pub const DEVICE_RATE_LIMIT_MAX_REQUESTS: u32 = 120;
pub const DEVICE_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

#[derive(Clone)]
pub struct AppState {
    pub apps: Arc<AppRepository>,
    pub channels: Arc<ChannelRepository>,
    pub releases: Arc<ReleaseRepository>,
    pub devices: Arc<DeviceRepository>,
    pub health: Arc<HealthRepository>,
    pub rollbacks: Arc<RollbackRepository>,

    pub channel_cache: Arc<ChannelCache>,
    pub health_dedup: Arc<ReportDeduplicator>,
    pub telemetry: Arc<TelemetryQueue>,

    pub clock: Arc<dyn Clock>,
    pub token_codec: Arc<DeviceTokenCodec>,

    pub unauthenticated_rate_limiter: Arc<RateLimiter>,
    pub device_rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(database_client: DbClient, device_token_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            apps: Arc::new(AppRepository::new(database_client.clone())),
            channels: Arc::new(ChannelRepository::new(database_client.clone())),
            releases: Arc::new(ReleaseRepository::new(database_client.clone())),
            devices: Arc::new(DeviceRepository::new(database_client.clone())),
            health: Arc::new(HealthRepository::new(database_client.clone())),
            rollbacks: Arc::new(RollbackRepository::new(database_client)),
            channel_cache: Arc::new(ChannelCache::new(DEFAULT_CHANNEL_CACHE_TTL_SECONDS)),
            health_dedup: Arc::new(ReportDeduplicator::with_default_window()),
            telemetry: Arc::new(TelemetryQueue::new(4096)),
            clock: Arc::new(SystemClock),
            token_codec: Arc::new(DeviceTokenCodec::new(device_token_secret)),
            unauthenticated_rate_limiter: Arc::new(RateLimiter::new(
                UNAUTHENTICATED_RATE_LIMIT_MAX_REQUESTS,
                UNAUTHENTICATED_RATE_LIMIT_WINDOW_SECONDS,
            )),
            device_rate_limiter: Arc::new(RateLimiter::new(
                DEVICE_RATE_LIMIT_MAX_REQUESTS,
                DEVICE_RATE_LIMIT_WINDOW_SECONDS,
            )),
        }
    }
}

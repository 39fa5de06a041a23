// [apps/orchestrator/src/kernel.rs]
/*!
 * APARATO: KERNEL DEL ORQUESTADOR
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: CONECTA LA BASE DE DATOS, ARMA `AppState`, LEVANTA
 *    LOS DEMONIOS DE FONDO (C6, DRENADO DE TELEMETRÍA) Y SIRVE EL
 *    ROUTER DE AXUM
 */

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use bundlenudge_domain_models::health::HealthAggregatorConfig;
use bundlenudge_infra_db::DbClient;
use tracing::{error, info, instrument};

use crate::bootstrap::verify_readiness;
use crate::routes::build_router;
use crate::services::health_sweep::HealthSweepDaemon;
use crate::services::lifecycle::LifecycleService;
use crate::state::AppState;

pub struct OrchestratorKernel {
    listening_port: u16,
    state: AppState,
}

impl OrchestratorKernel {
    #[instrument(skip(database_access_token, device_token_secret))]
    pub async fn ignite(
        database_connection_url: &str,
        database_access_token: Option<String>,
        device_token_secret: Vec<u8>,
        listening_port: u16,
    ) -> Self {
        let database_client = DbClient::connect(database_connection_url, database_access_token)
            .await
            .expect("FATAL: could not establish the database connection, aborting ignition");

        verify_readiness(&database_client)
            .await
            .expect("FATAL: database connection does not serve queries, aborting ignition");

        Self {
            listening_port,
            state: AppState::new(database_client, device_token_secret),
        }
    }

    pub async fn serve(self) {
        let state = self.state;

        let lifecycle = Arc::new(LifecycleService::new(
            state.releases.clone(),
            state.channels.clone(),
            "orchestrator-health-sweep",
        ));
        let sweep_daemon = HealthSweepDaemon::new(
            state.releases.clone(),
            state.health.clone(),
            lifecycle,
            state.clock.clone(),
            state.channels.clone(),
            state.channel_cache.clone(),
        );
        tokio::spawn(sweep_daemon.run_forever(HealthAggregatorConfig::default().sweep_interval_seconds));

        // El sink de analítica downstream queda fuera de alcance; este
        // worker solo garantiza que la cola en memoria nunca crezca sin
        // límite entre llamadas a `push`.
        let telemetry = state.telemetry.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(5));
            loop {
                ticker.tick().await;
                let drained = telemetry.drain(1024);
                if !drained.is_empty() {
                    info!(count = drained.len(), "📡 [TELEMETRY_DRAIN]: batch drained from in-memory queue");
                }
            }
        });

        let router = build_router(state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.listening_port);

        info!(address = %bind_address, "🚀 [KERNEL_ONLINE]: orchestrator listening");
        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("FATAL: failed to bind the HTTP listener");

        // `with_connect_info` expone la IP del llamante a
        // `unauthenticated_rate_limit_guard` vía `ConnectInfo`.
        let server = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(await_shutdown_signal());

        if let Err(server_error) = server.await {
            error!(error = %server_error, "💀 [KERNEL_COLLAPSE]: HTTP server terminated");
            std::process::exit(1);
        }
        info!("🛑 [KERNEL_OFFLINE]: orchestrator drained its in-flight requests and stopped");
    }
}

/// Espera `SIGINT` (Ctrl+C) o, en Unix, `SIGTERM` — la misma señal que
/// un orquestador de contenedores manda antes de matar el proceso.
async fn await_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("FATAL: failed to install the Ctrl+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("FATAL: failed to install the SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("📨 [KERNEL_SHUTDOWN]: termination signal received, draining in-flight requests");
}

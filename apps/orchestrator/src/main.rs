// [apps/orchestrator/src/main.rs]
/*!
 * APARATO: PUNTO DE ENTRADA DEL ORQUESTADOR
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: CARGA DE ENTORNO, OBSERVABILIDAD E IGNICIÓN DEL KERNEL
 */

use bundlenudge_orchestrator::prelude::OrchestratorKernel;
use bundlenudge_tracing_init::init_tracing;
use dotenvy::dotenv;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("bundlenudge_orchestrator");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let database_connection_url =
            std::env::var("DATABASE_URL").expect("FATAL: DATABASE_URL not set in the runtime environment");
        let database_access_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let device_token_secret = std::env::var("DEVICE_TOKEN_SECRET")
            .expect("FATAL: DEVICE_TOKEN_SECRET not set in the runtime environment")
            .into_bytes();
        let listening_port: u16 = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().unwrap_or(3000);

        info!("🛰️ [BUNDLENUDGE]: ignition sequence starting...");
        let kernel =
            OrchestratorKernel::ignite(&database_connection_url, database_access_token, device_token_secret, listening_port)
                .await;

        kernel.serve().await;
        Ok(())
    })
}

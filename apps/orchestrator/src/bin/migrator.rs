// [apps/orchestrator/src/bin/migrator.rs]
/*!
 * APARATO: CLI DE MIGRACIÓN DE ESQUEMA
 * CLASIFICACIÓN: OPS INFRASTRUCTURE
 * RESPONSABILIDAD: APLICA EL ESQUEMA IDEMPOTENTE FUERA DE LA IGNICIÓN
 *    NORMAL DEL SERVIDOR (DESPLIEGUES, CI)
 *
 * `DbClient::connect` ya aplica el esquema al conectar; este binario
 * existe para poder migrar sin levantar el servidor HTTP entero, p.ej.
 * como un paso previo de un pipeline de despliegue.
 */

use bundlenudge_infra_db::DbClient;
use dotenvy::dotenv;
use bundlenudge_tracing_init::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing("bundlenudge_migrator");

    let database_connection_url =
        std::env::var("DATABASE_URL").expect("FATAL: DATABASE_URL not set in the runtime environment");
    let database_access_token = std::env::var("TURSO_AUTH_TOKEN").ok();

    info!("🚀 [MIGRATOR]: applying schema...");
    DbClient::connect(&database_connection_url, database_access_token).await?;
    info!("✅ [MIGRATOR]: schema up to date");
    Ok(())
}

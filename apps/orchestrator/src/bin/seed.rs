// [apps/orchestrator/src/bin/seed.rs]
/*!
 * APARATO: SEMBRADOR DE DATOS DE DESARROLLO
 * CLASIFICACIÓN: INFRASTRUCTURE UTILITY
 * RESPONSABILIDAD: CREA UNA APP, UN CANAL `production` POR DEFECTO Y UN
 *    RELEASE ACTIVO DE MUESTRA PARA PROBAR EL FLUJO LOCALMENTE
 */

use bundlenudge_domain_models::{Constraints, Platform};
use bundlenudge_infra_db::{AppRepository, ChannelRepository, DbClient, ReleaseRepository};
use dotenvy::dotenv;
use sha2::{Digest, Sha256};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info,bundlenudge_infra_db=debug").with_target(false).init();

    let database_connection_url =
        std::env::var("DATABASE_URL").expect("FATAL: DATABASE_URL not set in the runtime environment");
    let database_access_token = std::env::var("TURSO_AUTH_TOKEN").ok();

    let database_client = DbClient::connect(&database_connection_url, database_access_token).await?;

    let apps = AppRepository::new(database_client.clone());
    let channels = ChannelRepository::new(database_client.clone());
    let releases = ReleaseRepository::new(database_client);

    info!("💠 [SEED]: creating sample app...");
    let app = apps.create(Platform::Ios, "dev-team").await?;

    info!("💠 [SEED]: creating default production channel...");
    let channel = channels.create(app.id, "production", true, 100, &Constraints::any_platform()).await?;

    let bundle_bytes = b"console.log('hello from bundlenudge seed data')";
    let bundle_hash = hex::encode(Sha256::digest(bundle_bytes));

    info!("💠 [SEED]: creating a pending release...");
    let release = releases
        .create_pending(
            app.id,
            Some(channel.id),
            "1.0.0",
            "https://example.invalid/bundles/1.0.0.js",
            bundle_bytes.len() as u64,
            &bundle_hash,
            100,
            &Constraints::any_platform(),
            Some("initial seed release"),
        )
        .await?;

    info!(app_id = %app.id, channel_id = %channel.id, release_id = %release.id, "✅ [SEED_COMPLETE]: ready for local testing");
    Ok(())
}

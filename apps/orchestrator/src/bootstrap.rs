// [apps/orchestrator/src/bootstrap.rs]
/*!
 * APARATO: VERIFICACIÓN DE ARRANQUE
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CERTIFICAR QUE LA CONEXIÓN A BASE DE DATOS RESPONDE
 *    ANTES DE ACEPTAR TRÁFICO
 *
 * El esquema en sí se aplica dentro de `DbClient::connect` (idempotente,
 * `CREATE TABLE IF NOT EXISTS`); este módulo solo certifica que la
 * conexión resultante efectivamente sirve consultas antes de que
 * `kernel` empiece a enlazar el socket HTTP.
 */

use bundlenudge_infra_db::DbClient;
use tracing::info;

pub async fn verify_readiness(database_client: &DbClient) -> anyhow::Result<()> {
    let connection = database_client.get_connection()?;
    let mut rows = connection.query("SELECT 1", ()).await?;
    rows.next().await?;
    info!("✅ [BOOTSTRAP]: database connection verified, accepting traffic");
    Ok(())
}

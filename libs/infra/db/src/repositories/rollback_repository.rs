// [libs/infra/db/src/repositories/rollback_repository.rs]
/*!
 * APARATO: ROLLBACK REPOSITORY
 * RESPONSABILIDAD: LECTURA DEL HISTORIAL DE ROLLBACKS PARA AUDITORÍA
 *
 * La escritura vive en `HealthRepository::record_rollback`, invocada
 * en la misma transacción lógica que el disparo de rollback (§4.5);
 * este repositorio cubre el lado de lectura para la superficie admin.
 */

use bundlenudge_domain_models::{RollbackRecord, RollbackReason};
use libsql::{params, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::client::DbClient;
use crate::errors::DbError;
use crate::repositories::app_repository::{parse_timestamp, parse_uuid};

pub struct RollbackRepository {
    database_client: DbClient,
}

impl RollbackRepository {
    pub fn new(database_client: DbClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self))]
    pub async fn list_for_release(&self, release_id: Uuid) -> Result<Vec<RollbackRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, release_id, device_id, reason, previous_version, timestamp
                 FROM rollback_records WHERE release_id = ?1 ORDER BY timestamp DESC",
                params![release_id.to_string()],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(map_row_to_record(&row)?);
        }
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn list_for_app(&self, app_id: Uuid, limit: u32) -> Result<Vec<RollbackRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT r.id, r.release_id, r.device_id, r.reason, r.previous_version, r.timestamp
                 FROM rollback_records r
                 JOIN releases rel ON rel.id = r.release_id
                 WHERE rel.app_id = ?1
                 ORDER BY r.timestamp DESC
                 LIMIT ?2",
                params![app_id.to_string(), i64::from(limit)],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(map_row_to_record(&row)?);
        }
        Ok(records)
    }
}

fn map_row_to_record(row: &Row) -> Result<RollbackRecord, DbError> {
    let id: String = row.get(0)?;
    let release_id: String = row.get(1)?;
    let device_id: Option<String> = row.get(2)?;
    let reason: String = row.get(3)?;
    let previous_version: Option<String> = row.get(4)?;
    let timestamp: String = row.get(5)?;

    Ok(RollbackRecord {
        id: parse_uuid(&id)?,
        release_id: parse_uuid(&release_id)?,
        device_id: device_id.map(|value| parse_uuid(&value)).transpose()?,
        reason: parse_reason(&reason)?,
        previous_version,
        timestamp: parse_timestamp(&timestamp)?,
    })
}

fn parse_reason(raw: &str) -> Result<RollbackReason, DbError> {
    match raw {
        "crash_detected" => Ok(RollbackReason::CrashDetected),
        "health_timeout" => Ok(RollbackReason::HealthTimeout),
        "manual" => Ok(RollbackReason::Manual),
        "native_update" => Ok(RollbackReason::NativeUpdate),
        other => Err(DbError::MappingError(format!("unknown rollback reason {other}"))),
    }
}

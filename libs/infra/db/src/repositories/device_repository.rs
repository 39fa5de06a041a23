// [libs/infra/db/src/repositories/device_repository.rs]
/*!
 * APARATO: DEVICE REPOSITORY
 * RESPONSABILIDAD: VISTA MATERIALIZADA DEL ÚLTIMO CHECK-IN (§3)
 *
 * El servidor nunca muta el estado on-device; esta fila puede ir
 * rezagada respecto al estado real del dispositivo.
 */

use bundlenudge_domain_models::{Device, Platform};
use libsql::{params, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::client::DbClient;
use crate::errors::DbError;
use crate::repositories::app_repository::{parse_platform, parse_timestamp, parse_uuid};

pub struct DeviceRepository {
    database_client: DbClient,
}

impl DeviceRepository {
    pub fn new(database_client: DbClient) -> Self {
        Self { database_client }
    }

    /// Upsert de check-in: crea la fila si es la primera vez que este
    /// dispositivo se ve, o actualiza `current_bundle_*`/`last_seen_at`.
    #[instrument(skip(self))]
    pub async fn upsert_checkin(
        &self,
        device_id: Uuid,
        app_id: Uuid,
        platform: Platform,
        current_bundle_version: Option<&str>,
        current_bundle_hash: Option<&str>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO devices (device_id, app_id, platform, current_bundle_version, current_bundle_hash, last_seen_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP)
                 ON CONFLICT(device_id) DO UPDATE SET
                    current_bundle_version = excluded.current_bundle_version,
                    current_bundle_hash = excluded.current_bundle_hash,
                    last_seen_at = CURRENT_TIMESTAMP",
                params![
                    device_id.to_string(),
                    app_id.to_string(),
                    platform.to_string(),
                    current_bundle_version,
                    current_bundle_hash
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, device_id: Uuid) -> Result<Option<Device>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT device_id, app_id, platform, current_bundle_version, current_bundle_hash, last_seen_at, crash_count
                 FROM devices WHERE device_id = ?1",
                params![device_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_device(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn increment_crash_count(&self, device_id: Uuid) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE devices SET crash_count = crash_count + 1 WHERE device_id = ?1",
                params![device_id.to_string()],
            )
            .await?;
        Ok(())
    }
}

fn map_row_to_device(row: &Row) -> Result<Device, DbError> {
    let device_id: String = row.get(0)?;
    let app_id: String = row.get(1)?;
    let platform: String = row.get(2)?;
    let current_bundle_version: Option<String> = row.get(3)?;
    let current_bundle_hash: Option<String> = row.get(4)?;
    let last_seen_at: String = row.get(5)?;
    let crash_count: i64 = row.get(6)?;

    Ok(Device {
        device_id: parse_uuid(&device_id)?,
        app_id: parse_uuid(&app_id)?,
        platform: parse_platform(&platform)?,
        current_bundle_version,
        current_bundle_hash,
        last_seen_at: parse_timestamp(&last_seen_at)?,
        crash_count: crash_count as u32,
    })
}

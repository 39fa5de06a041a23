// [libs/infra/db/src/repositories/app_repository.rs]
/*!
 * APARATO: APP REPOSITORY
 * RESPONSABILIDAD: PERSISTENCIA DE IDENTIDAD DE APLICACIONES CLIENTE
 */

use bundlenudge_domain_models::{App, Platform};
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::client::DbClient;
use crate::errors::DbError;

pub struct AppRepository {
    database_client: DbClient,
}

impl AppRepository {
    pub fn new(database_client: DbClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, platform: Platform, owner_ref: &str) -> Result<App, DbError> {
        let connection = self.database_client.get_connection()?;
        let id = Uuid::new_v4();
        connection
            .execute(
                "INSERT INTO apps (id, platform, owner_ref) VALUES (?1, ?2, ?3)",
                params![id.to_string(), platform.to_string(), owner_ref],
            )
            .await?;

        self.get_by_id(id).await?.ok_or_else(|| DbError::NotFound(format!("app {id} vanished after insert")))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, app_id: Uuid) -> Result<Option<App>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT id, platform, owner_ref, deleted_at, created_at FROM apps WHERE id = ?1", params![app_id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_app(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn soft_delete(&self, app_id: Uuid) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE apps SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?1 AND deleted_at IS NULL",
                params![app_id.to_string()],
            )
            .await?;

        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("app {app_id} not found or already deleted")));
        }
        Ok(())
    }
}

fn map_row_to_app(row: &Row) -> Result<App, DbError> {
    let id: String = row.get(0)?;
    let platform_label: String = row.get(1)?;
    let owner_ref: String = row.get(2)?;
    let deleted_at: Option<String> = row.get(3)?;
    let created_at: String = row.get(4)?;

    Ok(App {
        id: parse_uuid(&id)?,
        platform: parse_platform(&platform_label)?,
        owner_ref,
        deleted_at: deleted_at.map(|value| parse_timestamp(&value)).transpose()?,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|error| DbError::MappingError(format!("invalid uuid {raw}: {error}")))
}

pub(crate) fn parse_platform(raw: &str) -> Result<Platform, DbError> {
    match raw {
        "ios" => Ok(Platform::Ios),
        "android" => Ok(Platform::Android),
        other => Err(DbError::MappingError(format!("unknown platform {other}"))),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        })
        .map_err(|error| DbError::MappingError(format!("invalid timestamp {raw}: {error}")))
}

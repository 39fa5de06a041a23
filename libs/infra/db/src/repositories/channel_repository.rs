// [libs/infra/db/src/repositories/channel_repository.rs]
/*!
 * APARATO: CHANNEL REPOSITORY
 * RESPONSABILIDAD: PERSISTENCIA DE CANALES Y ACTIVACIÓN ATÓMICA (C5)
 *
 * La activación de un release en un canal usa CAS optimista sobre la
 * columna `active_release_id`, keyed por su valor previo — el mismo
 * patrón que este código usa para impedir el robo de misiones entre
 * workers concurrentes.
 */

use bundlenudge_domain_models::{Channel, Constraints};
use libsql::{params, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::client::DbClient;
use crate::errors::DbError;
use crate::repositories::app_repository::parse_uuid;

pub struct ChannelRepository {
    database_client: DbClient,
}

impl ChannelRepository {
    pub fn new(database_client: DbClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self, targeting_rules))]
    pub async fn create(
        &self,
        app_id: Uuid,
        name: &str,
        is_default: bool,
        rollout_percentage: u8,
        targeting_rules: &Constraints,
    ) -> Result<Channel, DbError> {
        let connection = self.database_client.get_connection()?;
        let id = Uuid::new_v4();
        let targeting_json = serde_json::to_string(targeting_rules)
            .map_err(|error| DbError::MappingError(format!("constraints serialization failed: {error}")))?;

        connection
            .execute(
                "INSERT INTO channels (id, app_id, name, is_default, rollout_percentage, targeting_rules)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_string(),
                    app_id.to_string(),
                    name,
                    is_default as i64,
                    i64::from(rollout_percentage),
                    targeting_json
                ],
            )
            .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("channel {id} vanished after insert")))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, channel_id: Uuid) -> Result<Option<Channel>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, app_id, name, is_default, rollout_percentage, targeting_rules, active_release_id
                 FROM channels WHERE id = ?1",
                params![channel_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_channel(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_by_app_and_name(&self, app_id: Uuid, name: &str) -> Result<Option<Channel>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, app_id, name, is_default, rollout_percentage, targeting_rules, active_release_id
                 FROM channels WHERE app_id = ?1 AND name = ?2",
                params![app_id.to_string(), name],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_channel(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_default_for_app(&self, app_id: Uuid) -> Result<Option<Channel>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, app_id, name, is_default, rollout_percentage, targeting_rules, active_release_id
                 FROM channels WHERE app_id = ?1 AND is_default = 1",
                params![app_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_channel(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_for_app(&self, app_id: Uuid) -> Result<Vec<Channel>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, app_id, name, is_default, rollout_percentage, targeting_rules, active_release_id
                 FROM channels WHERE app_id = ?1 ORDER BY name ASC",
                params![app_id.to_string()],
            )
            .await?;

        let mut channels = Vec::new();
        while let Some(row) = rows.next().await? {
            channels.push(map_row_to_channel(&row)?);
        }
        Ok(channels)
    }

    /// Punto de extensión de completitud (§13 decisión 3): el auto-rollback
    /// nunca invoca este método; solo un operador administrativo lo haría.
    #[instrument(skip(self))]
    pub async fn set_rollout_percentage(&self, channel_id: Uuid, rollout_percentage: u8) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE channels SET rollout_percentage = ?2 WHERE id = ?1",
                params![channel_id.to_string(), i64::from(rollout_percentage)],
            )
            .await?;

        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("channel {channel_id} not found")));
        }
        Ok(())
    }
}

fn map_row_to_channel(row: &Row) -> Result<Channel, DbError> {
    let id: String = row.get(0)?;
    let app_id: String = row.get(1)?;
    let name: String = row.get(2)?;
    let is_default: i64 = row.get(3)?;
    let rollout_percentage: i64 = row.get(4)?;
    let targeting_rules_json: String = row.get(5)?;
    let active_release_id: Option<String> = row.get(6)?;

    Ok(Channel {
        id: parse_uuid(&id)?,
        app_id: parse_uuid(&app_id)?,
        name,
        is_default: is_default != 0,
        rollout_percentage: rollout_percentage as u8,
        targeting_rules: serde_json::from_str(&targeting_rules_json)
            .map_err(|error| DbError::MappingError(format!("constraints deserialization failed: {error}")))?,
        active_release_id: active_release_id.map(|value| parse_uuid(&value)).transpose()?,
    })
}

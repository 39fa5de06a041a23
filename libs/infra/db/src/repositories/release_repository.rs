// [libs/infra/db/src/repositories/release_repository.rs]
/*!
 * APARATO: RELEASE REPOSITORY — LIFECYCLE FSM SOBERANO (C5)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE LA MÁQUINA DE ESTADOS DEL RELEASE
 *
 * # Mathematical Proof (State Machine Determinism):
 * Cada transición exige un predicado de estado previo excluyente en la
 * cláusula WHERE; una fila que no cumple la condición nunca se
 * actualiza, de modo que dos llamadas concurrentes a la misma
 * transición resuelven en exactamente una ganadora (`rows_affected == 1`)
 * y una perdedora (`rows_affected == 0` -> `DbError::Conflict` o
 * `InvalidState` según el diagnóstico posterior).
 */

use bundlenudge_domain_models::{Constraints, Release, ReleaseStatus, RollbackReason};
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::client::DbClient;
use crate::errors::DbError;
use crate::repositories::app_repository::{parse_timestamp, parse_uuid};
use crate::repositories::channel_repository::ChannelRepository;

pub struct ReleaseRepository {
    database_client: DbClient,
}

impl ReleaseRepository {
    pub fn new(database_client: DbClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self, bundle_hash, targeting_rules))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create_pending(
        &self,
        app_id: Uuid,
        channel_id: Option<Uuid>,
        version: &str,
        bundle_url: &str,
        bundle_size: u64,
        bundle_hash: &str,
        rollout_percentage: u8,
        targeting_rules: &Constraints,
        release_notes: Option<&str>,
    ) -> Result<Release, DbError> {
        let connection = self.database_client.get_connection()?;
        let id = Uuid::new_v4();
        let targeting_json = serde_json::to_string(targeting_rules)
            .map_err(|error| DbError::MappingError(format!("constraints serialization failed: {error}")))?;

        connection
            .execute(
                "INSERT INTO releases
                    (id, app_id, channel_id, version, bundle_url, bundle_size, bundle_hash,
                     rollout_percentage, targeting_rules, status, release_notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10)",
                params![
                    id.to_string(),
                    app_id.to_string(),
                    channel_id.map(|c| c.to_string()),
                    version,
                    bundle_url,
                    bundle_size as i64,
                    bundle_hash,
                    i64::from(rollout_percentage),
                    targeting_json,
                    release_notes
                ],
            )
            .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("release {id} vanished after insert")))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, release_id: Uuid) -> Result<Option<Release>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query(SELECT_RELEASE_COLUMNS, params![release_id.to_string()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_release(&row)?)),
            None => Ok(None),
        }
    }

    /// Entrada a `processing`: exige arrendamiento exclusivo. Un
    /// arrendamiento vencido permite re-pickup (§4.3).
    #[instrument(skip(self, lease_owner))]
    pub async fn acquire_processing_lease(
        &self,
        release_id: Uuid,
        lease_owner: &str,
        lease_ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<Release, DbError> {
        let connection = self.database_client.get_connection()?;
        let lease_expires_at = (now + lease_ttl).to_rfc3339();

        let rows_affected = connection
            .execute(
                "UPDATE releases
                 SET status = 'processing', lease_owner = ?2, lease_expires_at = ?3, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1
                   AND (status = 'pending' OR (status = 'processing' AND lease_expires_at < ?4))",
                params![release_id.to_string(), lease_owner, lease_expires_at.clone(), now.to_rfc3339()],
            )
            .await?;

        if rows_affected == 0 {
            return self.diagnose_lease_failure(release_id).await;
        }

        info!("🔒 [LEASE_ACQUIRED]: release {} leased by {}", release_id, lease_owner);
        self.get_by_id(release_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("release {release_id} vanished mid-lease")))
    }

    async fn diagnose_lease_failure(&self, release_id: Uuid) -> Result<Release, DbError> {
        match self.get_by_id(release_id).await? {
            Some(release) if release.status == ReleaseStatus::Pending => {
                Err(DbError::Conflict(format!("release {release_id} lease race lost")))
            }
            Some(_) => Err(DbError::Conflict(format!("release {release_id} already leased or past pending"))),
            None => Err(DbError::NotFound(format!("release {release_id} not found"))),
        }
    }

    /// Transición `processing -> rejected` cuando la verificación falla.
    #[instrument(skip(self))]
    pub async fn mark_rejected(&self, release_id: Uuid) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE releases SET status = 'rejected', updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1 AND status IN ('processing', 'pending')",
                params![release_id.to_string()],
            )
            .await?;

        if rows_affected == 0 {
            return Err(DbError::Conflict(format!("release {release_id} not in a rejectable state")));
        }
        Ok(())
    }

    /// `cancel`: `pending -> rejected` directamente, sin pasar por
    /// `processing` (§4.3 diagrama).
    #[instrument(skip(self))]
    pub async fn cancel(&self, release_id: Uuid) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE releases SET status = 'rejected', updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1 AND status = 'pending'",
                params![release_id.to_string()],
            )
            .await?;

        if rows_affected == 0 {
            return Err(DbError::Conflict(format!("release {release_id} not pending")));
        }
        Ok(())
    }

    /// Activación atómica (§4.3): transiciona este release a `active`,
    /// apunta el canal hacia él, y transiciona el release previamente
    /// activo (si existe) a `superseded` — todo en una única
    /// transacción SQL. Re-activar un release ya activo es un no-op
    /// idempotente (§8 "round-trip / idempotence laws").
    #[instrument(skip(self, channel_repository))]
    pub async fn activate(
        &self,
        release_id: Uuid,
        channel_id: Uuid,
        channel_repository: &ChannelRepository,
    ) -> Result<(), DbError> {
        let release = self
            .get_by_id(release_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("release {release_id} not found")))?;

        if release.status == ReleaseStatus::Active {
            return Ok(());
        }
        if release.status != ReleaseStatus::Processing {
            return Err(DbError::Conflict(format!(
                "release {release_id} must be processing to activate, was {:?}",
                release.status
            )));
        }

        let channel = channel_repository
            .get_by_id(channel_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("channel {channel_id} not found")))?;
        let previously_active = channel.active_release_id;

        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|error| DbError::TransactionError(error.to_string()))?;

        if let Some(previous_release_id) = previously_active {
            transaction
                .execute(
                    "UPDATE releases SET status = 'superseded', updated_at = CURRENT_TIMESTAMP
                     WHERE id = ?1 AND status = 'active'",
                    params![previous_release_id.to_string()],
                )
                .await?;
        }

        let rows_affected = transaction
            .execute(
                "UPDATE releases SET status = 'active', channel_id = ?2, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1 AND status = 'processing'",
                params![release_id.to_string(), channel_id.to_string()],
            )
            .await?;

        if rows_affected == 0 {
            transaction
                .rollback()
                .await
                .map_err(|error| DbError::TransactionError(error.to_string()))?;
            return Err(DbError::Conflict(format!("release {release_id} changed state concurrently")));
        }

        let cas_rows = transaction
            .execute(
                "UPDATE channels SET active_release_id = ?2
                 WHERE id = ?1 AND (active_release_id = ?3 OR (?3 IS NULL AND active_release_id IS NULL))",
                params![
                    channel_id.to_string(),
                    release_id.to_string(),
                    previously_active.map(|id| id.to_string())
                ],
            )
            .await?;

        if cas_rows == 0 {
            transaction
                .rollback()
                .await
                .map_err(|error| DbError::TransactionError(error.to_string()))?;
            warn!("⚠️ [CAS_REJECTED]: channel {} activation lost the race", channel_id);
            return Err(DbError::Conflict(format!("channel {channel_id} activation conflict")));
        }

        transaction
            .commit()
            .await
            .map_err(|error| DbError::TransactionError(error.to_string()))?;

        info!("🚀 [ACTIVATED]: release {} is now active on channel {}", release_id, channel_id);
        Ok(())
    }

    /// `active -> rolled_back`. Terminal; nunca se re-activa
    /// automáticamente (§4.3). No toca `rollout_percentage` (§13
    /// decisión 3). Si el canal todavía apunta al release que se está
    /// revirtiendo, lo repunta en la misma transacción hacia el
    /// release `superseded` más reciente de ese canal (o a `NULL` si
    /// no hay predecesor) — de lo contrario el canal seguiría sirviendo
    /// un release que acaba de dejar de ser servible (§4.3, escenario
    /// S2).
    #[instrument(skip(self, channel_repository))]
    pub async fn rollback(
        &self,
        release_id: Uuid,
        reason: RollbackReason,
        channel_repository: &ChannelRepository,
    ) -> Result<(), DbError> {
        let release = self
            .get_by_id(release_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("release {release_id} not found")))?;

        let reason_label = rollback_reason_label(reason);
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|error| DbError::TransactionError(error.to_string()))?;

        let rows_affected = transaction
            .execute(
                "UPDATE releases SET status = 'rolled_back', rollback_reason = ?2, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1 AND status IN ('active', 'superseded')",
                params![release_id.to_string(), reason_label],
            )
            .await?;

        if rows_affected == 0 {
            transaction
                .rollback()
                .await
                .map_err(|error| DbError::TransactionError(error.to_string()))?;
            return Err(DbError::Conflict(format!("release {release_id} not active or superseded")));
        }

        if let Some(channel_id) = release.channel_id {
            let channel = channel_repository.get_by_id(channel_id).await?;
            let channel_still_points_here = channel.map(|c| c.active_release_id) == Some(Some(release_id));

            if channel_still_points_here {
                let mut predecessor_rows = transaction
                    .query(
                        "SELECT id FROM releases
                         WHERE channel_id = ?1 AND status = 'superseded' AND id != ?2
                         ORDER BY updated_at DESC LIMIT 1",
                        params![channel_id.to_string(), release_id.to_string()],
                    )
                    .await?;
                let predecessor_id: Option<String> = match predecessor_rows.next().await? {
                    Some(row) => {
                        let id: String = row.get(0)?;
                        Some(id)
                    }
                    None => None,
                };

                let cas_rows = transaction
                    .execute(
                        "UPDATE channels SET active_release_id = ?2
                         WHERE id = ?1 AND active_release_id = ?3",
                        params![channel_id.to_string(), predecessor_id.clone(), release_id.to_string()],
                    )
                    .await?;

                if cas_rows == 0 {
                    transaction
                        .rollback()
                        .await
                        .map_err(|error| DbError::TransactionError(error.to_string()))?;
                    warn!("⚠️ [CAS_REJECTED]: channel {} repoint after rollback lost the race", channel_id);
                    return Err(DbError::Conflict(format!("channel {channel_id} rollback repoint conflict")));
                }

                info!(
                    "↩️ [CHANNEL_REPOINTED]: channel {} now points to {:?} after rollback of {}",
                    channel_id, predecessor_id, release_id
                );
            }
        }

        transaction
            .commit()
            .await
            .map_err(|error| DbError::TransactionError(error.to_string()))?;

        info!("⏪ [ROLLED_BACK]: release {} reason={}", release_id, reason_label);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_for_app(&self, app_id: Uuid) -> Result<Vec<Release>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(SELECT_RELEASE_COLUMNS_BY_APP, params![app_id.to_string()])
            .await?;

        let mut releases = Vec::new();
        while let Some(row) = rows.next().await? {
            releases.push(map_row_to_release(&row)?);
        }
        Ok(releases)
    }
}

const SELECT_RELEASE_COLUMNS: &str = "
    SELECT id, app_id, channel_id, version, bundle_url, bundle_size, bundle_hash,
           rollout_percentage, targeting_rules, status, rollback_reason, release_notes,
           created_at, updated_at
    FROM releases WHERE id = ?1
";

const SELECT_RELEASE_COLUMNS_BY_APP: &str = "
    SELECT id, app_id, channel_id, version, bundle_url, bundle_size, bundle_hash,
           rollout_percentage, targeting_rules, status, rollback_reason, release_notes,
           created_at, updated_at
    FROM releases WHERE app_id = ?1 ORDER BY created_at DESC
";

fn rollback_reason_label(reason: RollbackReason) -> &'static str {
    match reason {
        RollbackReason::CrashDetected => "crash_detected",
        RollbackReason::HealthTimeout => "health_timeout",
        RollbackReason::Manual => "manual",
        RollbackReason::NativeUpdate => "native_update",
    }
}

fn parse_rollback_reason(raw: &str) -> Result<RollbackReason, DbError> {
    match raw {
        "crash_detected" => Ok(RollbackReason::CrashDetected),
        "health_timeout" => Ok(RollbackReason::HealthTimeout),
        "manual" => Ok(RollbackReason::Manual),
        "native_update" => Ok(RollbackReason::NativeUpdate),
        other => Err(DbError::MappingError(format!("unknown rollback reason {other}"))),
    }
}

fn parse_status(raw: &str) -> Result<ReleaseStatus, DbError> {
    match raw {
        "pending" => Ok(ReleaseStatus::Pending),
        "processing" => Ok(ReleaseStatus::Processing),
        "active" => Ok(ReleaseStatus::Active),
        "superseded" => Ok(ReleaseStatus::Superseded),
        "rolled_back" => Ok(ReleaseStatus::RolledBack),
        "rejected" => Ok(ReleaseStatus::Rejected),
        other => Err(DbError::MappingError(format!("unknown release status {other}"))),
    }
}

fn map_row_to_release(row: &Row) -> Result<Release, DbError> {
    let id: String = row.get(0)?;
    let app_id: String = row.get(1)?;
    let channel_id: Option<String> = row.get(2)?;
    let version: String = row.get(3)?;
    let bundle_url: String = row.get(4)?;
    let bundle_size: i64 = row.get(5)?;
    let bundle_hash: String = row.get(6)?;
    let rollout_percentage: i64 = row.get(7)?;
    let targeting_rules_json: String = row.get(8)?;
    let status: String = row.get(9)?;
    let rollback_reason: Option<String> = row.get(10)?;
    let release_notes: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    Ok(Release {
        id: parse_uuid(&id)?,
        app_id: parse_uuid(&app_id)?,
        channel_id: channel_id.map(|value| parse_uuid(&value)).transpose()?,
        version,
        bundle_url,
        bundle_size: bundle_size as u64,
        bundle_hash,
        rollout_percentage: rollout_percentage as u8,
        targeting_rules: serde_json::from_str::<Constraints>(&targeting_rules_json)
            .map_err(|error| DbError::MappingError(format!("constraints deserialization failed: {error}")))?,
        status: parse_status(&status)?,
        rollback_reason: rollback_reason.map(|value| parse_rollback_reason(&value)).transpose()?,
        release_notes,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

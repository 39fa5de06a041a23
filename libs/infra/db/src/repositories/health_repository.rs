// [libs/infra/db/src/repositories/health_repository.rs]
/*!
 * APARATO: HEALTH REPOSITORY (C6)
 * RESPONSABILIDAD: PERSISTENCIA DE REPORTES, ACTIVACIONES Y CONFIG
 *    DE SALUD, Y EL CÓMPUTO DE CONTADORES VENTANEADOS POR SQL
 *
 * Postura fail-open: los métodos de escritura de este repositorio se
 * consideran best-effort desde el punto de vista del llamador — el
 * handler de `/v1/health/failure` acepta con 200 incluso si la
 * escritura aquí falla (§7 propagation policy).
 */

use bundlenudge_domain_models::health::HealthAggregatorConfig;
use bundlenudge_domain_models::{HealthConfig, RollbackReason};
use bundlenudge_domain_health::HealthCounters;
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::instrument;
use uuid::Uuid;

use crate::client::DbClient;
use crate::errors::DbError;

pub struct HealthRepository {
    database_client: DbClient,
}

impl HealthRepository {
    pub fn new(database_client: DbClient) -> Self {
        Self { database_client }
    }

    /// Inserta o actualiza un reporte de falla. `missing_events` se
    /// sobreescribe en duplicados dentro de la ventana de
    /// deduplicación (decidido por la capa que llama, vía
    /// `ReportDeduplicator`); este método en sí no decide frescura.
    #[instrument(skip(self, missing_events))]
    pub async fn record_failure(
        &self,
        release_id: Uuid,
        device_id: Uuid,
        missing_events: &[String],
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let missing_events_json = serde_json::to_string(missing_events)
            .map_err(|error| DbError::MappingError(format!("missing_events serialization failed: {error}")))?;

        connection
            .execute(
                "INSERT INTO health_reports (release_id, device_id, kind, missing_events, created_at)
                 VALUES (?1, ?2, 'failure', ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(release_id, device_id) DO UPDATE SET
                    missing_events = excluded.missing_events,
                    created_at = CURRENT_TIMESTAMP",
                params![release_id.to_string(), device_id.to_string(), missing_events_json],
            )
            .await?;
        Ok(())
    }

    /// Registra que un dispositivo transicionó `current_version` a este
    /// release, vía `/updates/check` (§4.4: `activations` es este conteo).
    #[instrument(skip(self))]
    pub async fn record_activation(&self, release_id: Uuid, device_id: Uuid) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO health_activations (release_id, device_id, activated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(release_id, device_id) DO NOTHING",
                params![release_id.to_string(), device_id.to_string()],
            )
            .await?;
        Ok(())
    }

    /// Cuenta fallas/activaciones dentro de una ventana deslizante
    /// terminando en `now` (§4.4, §5).
    #[instrument(skip(self))]
    pub async fn windowed_counters(
        &self,
        release_id: Uuid,
        window_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<HealthCounters, DbError> {
        let connection = self.database_client.get_connection()?;
        let window_start = (now - chrono::Duration::seconds(window_seconds as i64)).to_rfc3339();

        let mut failure_rows = connection
            .query(
                "SELECT COUNT(*) FROM health_reports WHERE release_id = ?1 AND kind = 'failure' AND created_at >= ?2",
                params![release_id.to_string(), window_start.clone()],
            )
            .await?;
        let failures: i64 = failure_rows
            .next()
            .await?
            .ok_or_else(|| DbError::MappingError("COUNT(*) returned no rows".into()))?
            .get(0)?;

        let mut activation_rows = connection
            .query(
                "SELECT COUNT(*) FROM health_activations WHERE release_id = ?1 AND activated_at >= ?2",
                params![release_id.to_string(), window_start],
            )
            .await?;
        let activations: i64 = activation_rows
            .next()
            .await?
            .ok_or_else(|| DbError::MappingError("COUNT(*) returned no rows".into()))?
            .get(0)?;

        Ok(HealthCounters {
            failures: failures as u64,
            activations: activations as u64,
        })
    }

    /// Todos los ids de release con al menos una activación o falla
    /// dentro de la ventana — el barrido periódico itera sobre esto en
    /// lugar de sobre todas las releases (§5).
    #[instrument(skip(self))]
    pub async fn releases_with_recent_signal(
        &self,
        window_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, DbError> {
        let connection = self.database_client.get_connection()?;
        let window_start = (now - chrono::Duration::seconds(window_seconds as i64)).to_rfc3339();

        let mut rows = connection
            .query(
                "SELECT DISTINCT release_id FROM (
                    SELECT release_id, activated_at AS ts FROM health_activations WHERE activated_at >= ?1
                    UNION
                    SELECT release_id, created_at AS ts FROM health_reports WHERE created_at >= ?1
                 )",
                params![window_start],
            )
            .await?;

        let mut release_ids = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            release_ids.push(crate::repositories::app_repository::parse_uuid(&raw)?);
        }
        Ok(release_ids)
    }

    #[instrument(skip(self))]
    pub async fn record_rollback(
        &self,
        release_id: Uuid,
        device_id: Option<Uuid>,
        reason: RollbackReason,
        previous_version: Option<&str>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let id = Uuid::new_v4();
        let reason_label = match reason {
            RollbackReason::CrashDetected => "crash_detected",
            RollbackReason::HealthTimeout => "health_timeout",
            RollbackReason::Manual => "manual",
            RollbackReason::NativeUpdate => "native_update",
        };

        connection
            .execute(
                "INSERT INTO rollback_records (id, release_id, device_id, reason, previous_version)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    release_id.to_string(),
                    device_id.map(|d| d.to_string()),
                    reason_label,
                    previous_version
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_config(&self, app_id: Uuid) -> Result<Option<HealthConfig>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT events_json, endpoints_json FROM health_configs WHERE app_id = ?1",
                params![app_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let events_json: String = row.get(0)?;
                let endpoints_json: String = row.get(1)?;
                Ok(Some(HealthConfig {
                    events: serde_json::from_str(&events_json)
                        .map_err(|error| DbError::MappingError(format!("events deserialization failed: {error}")))?,
                    endpoints: serde_json::from_str(&endpoints_json)
                        .map_err(|error| DbError::MappingError(format!("endpoints deserialization failed: {error}")))?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Fuente de verdad de §13 decisión 2: una fila presente en
    /// `health_configs` gana sobre los defaults hard-coded de
    /// `bundlenudge-domain-health`.
    #[instrument(skip(self))]
    pub async fn get_aggregator_config(&self, app_id: Uuid) -> Result<Option<HealthAggregatorConfig>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT window_seconds, min_sample, failure_threshold, sweep_interval_seconds
                 FROM health_configs WHERE app_id = ?1",
                params![app_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let window_seconds: Option<i64> = row.get(0)?;
                let min_sample: Option<i64> = row.get(1)?;
                let failure_threshold: Option<f64> = row.get(2)?;
                let sweep_interval_seconds: Option<i64> = row.get(3)?;

                let defaults = HealthAggregatorConfig::default();
                Ok(Some(HealthAggregatorConfig {
                    window_seconds: window_seconds.map(|v| v as u64).unwrap_or(defaults.window_seconds),
                    min_sample: min_sample.map(|v| v as u32).unwrap_or(defaults.min_sample),
                    failure_threshold: failure_threshold.unwrap_or(defaults.failure_threshold),
                    sweep_interval_seconds: sweep_interval_seconds
                        .map(|v| v as u64)
                        .unwrap_or(defaults.sweep_interval_seconds),
                }))
            }
            None => Ok(None),
        }
    }
}

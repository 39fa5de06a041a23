// [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Tres estratos: solidificación de tablas base, evolución por columnas
 * añadidas (tolerante a "duplicate column name" en migraciones en
 * caliente), endurecimiento por índices de aceleración.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_APPS", r#"
        CREATE TABLE IF NOT EXISTS apps (
            id TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            owner_ref TEXT NOT NULL,
            deleted_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_CHANNELS", r#"
        CREATE TABLE IF NOT EXISTS channels (
            id TEXT PRIMARY KEY,
            app_id TEXT NOT NULL,
            name TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            rollout_percentage INTEGER NOT NULL DEFAULT 100,
            targeting_rules TEXT NOT NULL DEFAULT '{}',
            active_release_id TEXT,
            UNIQUE(app_id, name)
        );
    "#),
    ("TABLE_RELEASES", r#"
        CREATE TABLE IF NOT EXISTS releases (
            id TEXT PRIMARY KEY,
            app_id TEXT NOT NULL,
            channel_id TEXT,
            version TEXT NOT NULL,
            bundle_url TEXT NOT NULL,
            bundle_size INTEGER NOT NULL,
            bundle_hash TEXT NOT NULL,
            rollout_percentage INTEGER NOT NULL DEFAULT 100,
            targeting_rules TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'pending',
            rollback_reason TEXT,
            release_notes TEXT,
            lease_owner TEXT,
            lease_expires_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_DEVICES", r#"
        CREATE TABLE IF NOT EXISTS devices (
            device_id TEXT PRIMARY KEY,
            app_id TEXT NOT NULL,
            platform TEXT NOT NULL,
            current_bundle_version TEXT,
            current_bundle_hash TEXT,
            last_seen_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            crash_count INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_HEALTH_REPORTS", r#"
        CREATE TABLE IF NOT EXISTS health_reports (
            release_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            missing_events TEXT NOT NULL DEFAULT '[]',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY(release_id, device_id)
        );
    "#),
    ("TABLE_HEALTH_ACTIVATIONS", r#"
        CREATE TABLE IF NOT EXISTS health_activations (
            release_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            activated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY(release_id, device_id)
        );
    "#),
    ("TABLE_ROLLBACK_RECORDS", r#"
        CREATE TABLE IF NOT EXISTS rollback_records (
            id TEXT PRIMARY KEY,
            release_id TEXT NOT NULL,
            device_id TEXT,
            reason TEXT NOT NULL,
            previous_version TEXT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_HEALTH_CONFIGS", r#"
        CREATE TABLE IF NOT EXISTS health_configs (
            app_id TEXT PRIMARY KEY,
            events_json TEXT NOT NULL DEFAULT '[]',
            endpoints_json TEXT NOT NULL DEFAULT '[]',
            window_seconds INTEGER,
            min_sample INTEGER,
            failure_threshold REAL,
            sweep_interval_seconds INTEGER
        );
    "#),
];

const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("RELEASE_LEASE_OWNER", "ALTER TABLE releases ADD COLUMN lease_owner TEXT"),
    ("RELEASE_LEASE_EXPIRES", "ALTER TABLE releases ADD COLUMN lease_expires_at DATETIME"),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_CHANNELS_APP", "CREATE INDEX IF NOT EXISTS idx_channels_app ON channels(app_id);"),
    ("IDX_RELEASES_CHANNEL", "CREATE INDEX IF NOT EXISTS idx_releases_channel ON releases(channel_id, status);"),
    ("IDX_RELEASES_APP", "CREATE INDEX IF NOT EXISTS idx_releases_app ON releases(app_id);"),
    ("IDX_DEVICES_APP", "CREATE INDEX IF NOT EXISTS idx_devices_app ON devices(app_id);"),
    ("IDX_HEALTH_REPORTS_RELEASE", "CREATE INDEX IF NOT EXISTS idx_health_reports_release ON health_reports(release_id, created_at);"),
    ("IDX_HEALTH_ACTIVATIONS_RELEASE", "CREATE INDEX IF NOT EXISTS idx_health_activations_release ON health_activations(release_id, activated_at);"),
    ("IDX_ROLLBACK_RELEASE", "CREATE INDEX IF NOT EXISTS idx_rollback_release ON rollback_records(release_id);"),
];

#[instrument(skip(database_connection))]
pub async fn apply_full_sovereign_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Tactical ledger level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {identifier}"))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(error) => {
                let message = error.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(sql, ())
            .await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {identifier}"))?;
    }
    Ok(())
}

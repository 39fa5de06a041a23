// [libs/device-agent/src/startup.rs]
/*!
 * APARATO: SECUENCIA DE ARRANQUE (§4.6.1)
 * RESPONSABILIDAD: PASOS 1-5, PUROS Y SINCRÓNICOS — SOLO TOCAN EL
 *    `PlatformBridge` (también sincrónico); LOS PASOS 6-7 (REGISTRO,
 *    AUTO-CHECK) SON DE RED Y VIVEN EN `agent.rs`.
 *
 * Mantener esta parte pura permite probar cada rama del protocolo de
 * arranque sin un cliente HTTP ni un reloj real.
 */

use bundlenudge_domain_models::{DeviceMetadata, PersistedAppVersionInfo};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::bridge::PlatformBridge;
use crate::callbacks::AgentCallbacks;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedBundle {
    /// The bundle shipped inside the native app binary.
    Embedded,
    Version(String),
}

#[derive(Debug, Clone)]
pub struct StartupResult {
    pub metadata: DeviceMetadata,
    pub bundle_to_load: LoadedBundle,
    /// True when this launch should arm the post-install verification window (step 5).
    pub start_verification: bool,
    pub native_update_detected: bool,
}

/// Runs steps 1 through 5 against whatever was loaded from storage.
/// `now` is injected so rollback/verification bookkeeping is testable
/// without a real clock.
pub fn run_startup_sequence(
    loaded: Option<DeviceMetadata>,
    bridge: &dyn PlatformBridge,
    callbacks: &dyn AgentCallbacks,
    now: DateTime<Utc>,
) -> StartupResult {
    // Step 1: load + validate, with promotion of a pending install scheduled by the previous launch.
    let mut metadata = match loaded {
        Some(candidate) if candidate.is_schema_valid() => candidate,
        Some(_) => {
            warn!("🧯 [STARTUP]: persisted metadata failed schema validation, resetting to defaults");
            DeviceMetadata::default_with_fresh_id()
        }
        None => DeviceMetadata::default_with_fresh_id(),
    };

    if metadata.pending_update_flag {
        metadata.previous_version = metadata.current_version.take();
        metadata.current_version = metadata.pending_version.take();
        metadata.current_version_hash =
            metadata.current_version.as_ref().and_then(|v| metadata.bundle_hashes.get(v).cloned());
        metadata.pending_update_flag = false;
        info!("⬆️ [STARTUP]: promoted pending install to current for this launch");
    }

    // Step 2: native-update version guard.
    let native = bridge.native_version_info();
    let version_changed = match &metadata.app_version_info {
        None => true,
        Some(persisted) => {
            persisted.app_version != native.app_version || persisted.build_number != native.build_number
        }
    };

    if version_changed {
        for version in metadata.bundle_hashes.keys().cloned().collect::<Vec<_>>() {
            if let Err(error) = bridge.remove_bundle(&version) {
                warn!(%error, version, "🧹 [STARTUP]: failed to remove stale bundle during native-update reset");
            }
        }
        metadata.bundle_hashes.clear();
        metadata.current_version = None;
        metadata.current_version_hash = None;
        metadata.previous_version = None;
        metadata.pending_version = None;
        metadata.pending_update_flag = false;
        metadata.crash_count = 0;
        metadata.last_crash_time = None;
        metadata.app_version_info = Some(PersistedAppVersionInfo {
            app_version: native.app_version.clone(),
            build_number: native.build_number.clone(),
            recorded_at: now,
        });

        callbacks.on_native_update_detected();
        info!("📱 [STARTUP]: native app version changed, all OTA bundles cleared");

        // Step 4 is skipped this launch per the startup contract.
        return StartupResult {
            metadata,
            bundle_to_load: LoadedBundle::Embedded,
            start_verification: false,
            native_update_detected: true,
        };
    }

    // Step 3: crash recovery, inherited from a previous launch that never confirmed.
    if metadata.previous_version.is_some() && metadata.crash_count > 0 {
        metadata.crash_count += 1;
        let rolled_back_version = metadata.previous_version.take();
        metadata.current_version = rolled_back_version.clone();
        metadata.current_version_hash =
            rolled_back_version.as_ref().and_then(|v| metadata.bundle_hashes.get(v).cloned());
        metadata.pending_version = None;
        metadata.pending_update_flag = false;
        metadata.crash_count = 0;
        metadata.last_crash_time = Some(now);

        warn!("💥 [STARTUP]: prior launch never confirmed readiness, rolled back to previous version");

        return StartupResult {
            metadata,
            bundle_to_load: rolled_back_version.map(LoadedBundle::Version).unwrap_or(LoadedBundle::Embedded),
            start_verification: false,
            native_update_detected: false,
        };
    }

    // Step 4: bundle validation against the on-disk hash.
    let mut bundle_to_load =
        metadata.current_version.clone().map(LoadedBundle::Version).unwrap_or(LoadedBundle::Embedded);

    if let LoadedBundle::Version(version) = bundle_to_load.clone() {
        if let Some(stored_hash) = metadata.bundle_hashes.get(&version).cloned() {
            let validation_failed = match bridge.read_bundle_bytes(&version) {
                Ok(bytes) => {
                    let actual_hash = hex::encode(Sha256::digest(&bytes));
                    !actual_hash.eq_ignore_ascii_case(&stored_hash)
                }
                Err(_) => true,
            };

            if validation_failed {
                let _ = bridge.remove_bundle(&version);
                metadata.bundle_hashes.remove(&version);
                metadata.current_version = None;
                metadata.current_version_hash = None;
                bundle_to_load = LoadedBundle::Embedded;
                callbacks.on_validation_failed(&version);
                warn!(version, "🚫 [STARTUP]: on-disk bundle failed hash validation, falling back to embedded");
            }
        }
        // A bundle with no stored hash (legacy) is accepted as-is.
    }

    // Step 5: arm the post-install verification window if this launch is evaluating a fresh install.
    let start_verification = metadata.previous_version.is_some();
    if start_verification {
        metadata.crash_count += 1;
        info!("⏱️ [STARTUP]: starting post-install verification window");
    }

    StartupResult { metadata, bundle_to_load, start_verification, native_update_detected: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::InMemoryBridge;
    use crate::callbacks::NoopCallbacks;
    use std::collections::BTreeMap;

    fn base_metadata() -> DeviceMetadata {
        DeviceMetadata::default_with_fresh_id()
    }

    #[test]
    fn first_launch_ever_detects_native_update_and_skips_validation() {
        let bridge = InMemoryBridge::new("1.0.0", "100");
        let result = run_startup_sequence(None, &bridge, &NoopCallbacks, Utc::now());

        assert!(result.native_update_detected);
        assert_eq!(result.bundle_to_load, LoadedBundle::Embedded);
        assert!(!result.start_verification);
        assert_eq!(result.metadata.app_version_info.unwrap().app_version, "1.0.0");
    }

    #[test]
    fn native_version_bump_clears_ota_state() {
        let bridge = InMemoryBridge::new("2.0.0", "200");
        let mut metadata = base_metadata();
        metadata.app_version_info = Some(PersistedAppVersionInfo {
            app_version: "1.0.0".into(),
            build_number: "100".into(),
            recorded_at: Utc::now(),
        });
        metadata.current_version = Some("1.2.0".into());
        metadata.bundle_hashes.insert("1.2.0".into(), "a".repeat(64));
        metadata.crash_count = 3;

        let result = run_startup_sequence(Some(metadata), &bridge, &NoopCallbacks, Utc::now());

        assert!(result.native_update_detected);
        assert!(result.metadata.bundle_hashes.is_empty());
        assert_eq!(result.metadata.current_version, None);
        assert_eq!(result.metadata.crash_count, 0);
    }

    #[test]
    fn unconfirmed_previous_launch_triggers_rollback() {
        let bridge = InMemoryBridge::new("1.0.0", "100");
        let mut metadata = base_metadata();
        metadata.app_version_info =
            Some(PersistedAppVersionInfo { app_version: "1.0.0".into(), build_number: "100".into(), recorded_at: Utc::now() });
        metadata.current_version = Some("1.3.0".into());
        metadata.previous_version = Some("1.2.0".into());
        metadata.crash_count = 1;
        metadata.bundle_hashes.insert("1.2.0".into(), "b".repeat(64));

        let result = run_startup_sequence(Some(metadata), &bridge, &NoopCallbacks, Utc::now());

        assert!(!result.native_update_detected);
        assert_eq!(result.bundle_to_load, LoadedBundle::Version("1.2.0".into()));
        assert_eq!(result.metadata.current_version, Some("1.2.0".into()));
        assert_eq!(result.metadata.previous_version, None);
        assert_eq!(result.metadata.crash_count, 0);
        assert!(!result.start_verification);
    }

    #[test]
    fn hash_mismatch_falls_back_to_embedded_and_invokes_callback() {
        let bridge = InMemoryBridge::new("1.0.0", "100");
        bridge.save_bundle_atomic("1.2.0", b"tampered-bytes").unwrap();

        let mut metadata = base_metadata();
        metadata.app_version_info =
            Some(PersistedAppVersionInfo { app_version: "1.0.0".into(), build_number: "100".into(), recorded_at: Utc::now() });
        metadata.current_version = Some("1.2.0".into());
        metadata.bundle_hashes.insert("1.2.0".into(), "0".repeat(64));

        let result = run_startup_sequence(Some(metadata), &bridge, &NoopCallbacks, Utc::now());

        assert_eq!(result.bundle_to_load, LoadedBundle::Embedded);
        assert_eq!(result.metadata.current_version, None);
        assert!(!result.metadata.bundle_hashes.contains_key("1.2.0"));
    }

    #[test]
    fn legacy_bundle_without_stored_hash_is_accepted() {
        let bridge = InMemoryBridge::new("1.0.0", "100");
        let mut metadata = base_metadata();
        metadata.app_version_info =
            Some(PersistedAppVersionInfo { app_version: "1.0.0".into(), build_number: "100".into(), recorded_at: Utc::now() });
        metadata.current_version = Some("0.9.0".into());
        metadata.bundle_hashes = BTreeMap::new();

        let result = run_startup_sequence(Some(metadata), &bridge, &NoopCallbacks, Utc::now());

        assert_eq!(result.bundle_to_load, LoadedBundle::Version("0.9.0".into()));
    }

    #[test]
    fn fresh_install_arms_verification_and_marks_launch_unconfirmed() {
        let bridge = InMemoryBridge::new("1.0.0", "100");
        bridge.save_bundle_atomic("1.3.0", b"good-bytes").unwrap();
        let hash = hex::encode(Sha256::digest(b"good-bytes"));

        let mut metadata = base_metadata();
        metadata.app_version_info =
            Some(PersistedAppVersionInfo { app_version: "1.0.0".into(), build_number: "100".into(), recorded_at: Utc::now() });
        metadata.current_version = Some("1.3.0".into());
        metadata.previous_version = Some("1.2.0".into());
        metadata.bundle_hashes.insert("1.3.0".into(), hash);
        metadata.crash_count = 0;

        let result = run_startup_sequence(Some(metadata), &bridge, &NoopCallbacks, Utc::now());

        assert!(result.start_verification);
        assert_eq!(result.metadata.crash_count, 1);
        assert_eq!(result.bundle_to_load, LoadedBundle::Version("1.3.0".into()));
    }

    #[test]
    fn corrupt_schema_resets_to_defaults() {
        let bridge = InMemoryBridge::new("1.0.0", "100");
        let mut metadata = base_metadata();
        metadata.crash_count = 255; // outside [0,100], invalid schema

        let result = run_startup_sequence(Some(metadata), &bridge, &NoopCallbacks, Utc::now());
        assert!(result.native_update_detected);
    }
}

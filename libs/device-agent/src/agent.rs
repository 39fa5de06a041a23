// [libs/device-agent/src/agent.rs]
/*!
 * APARATO: HANDLE DEL AGENTE DE DISPOSITIVO (§9)
 * RESPONSABILIDAD: ORQUESTAR STORAGE + BRIDGE + CLIENTE DE RED + LOS
 *    TEMPORIZADORES DE SALUD Y VERIFICACIÓN DETRÁS DE UNA SOLA API
 *
 * No es un singleton de módulo: se construye una vez al arranque del
 * host y se comparte como `Arc<DeviceAgent<_, _>>`. La inicialización
 * es idempotente en el sentido de que repetir los pasos 1-5 sobre el
 * mismo estado persistido produce el mismo resultado — no hay
 * contadores de "primera vez" fuera de la metadata misma.
 */

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bundlenudge_core_clock_ids::Clock;
use bundlenudge_domain_models::wire::{
    CheckUpdateRequest, CheckUpdateResponse, RegisterDeviceRequest, TelemetryEvent,
};
use bundlenudge_domain_models::{DeviceMetadata, Platform};
use bundlenudge_infra_device_client::DeviceControlPlaneClient;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::bridge::PlatformBridge;
use crate::callbacks::AgentCallbacks;
use crate::crash_window::{VerificationWindow, DEFAULT_VERIFICATION_WINDOW};
use crate::download::{download_and_install, UpdateInfo};
use crate::errors::AgentError;
use crate::health_monitor::HealthMonitor;
use crate::preload::{check_preload_gates, PreloadConfig};
use crate::reporter::{TelemetryReporter, DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_CAPACITY};
use crate::startup::run_startup_sequence;
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Takes effect on the next launch (default).
    Deferred,
    /// Restarts the app immediately after a successful download.
    Immediate,
}

#[derive(Debug, Clone)]
pub struct DeviceAgentConfig {
    pub platform: Platform,
    pub health_window: Duration,
    pub verification_window: Duration,
    pub install_mode: InstallMode,
    pub preload: PreloadConfig,
    pub telemetry_capacity: usize,
    pub telemetry_flush_interval: Duration,
}

impl DeviceAgentConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            health_window: crate::health_monitor::DEFAULT_HEALTH_WINDOW,
            verification_window: DEFAULT_VERIFICATION_WINDOW,
            install_mode: InstallMode::Deferred,
            preload: PreloadConfig::default(),
            telemetry_capacity: DEFAULT_QUEUE_CAPACITY,
            telemetry_flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

pub struct DeviceAgent<S, B>
where
    S: Storage + Send + Sync + 'static,
    B: PlatformBridge + Send + Sync + 'static,
{
    storage: S,
    bridge: B,
    client: DeviceControlPlaneClient,
    clock: Arc<dyn Clock>,
    callbacks: Arc<dyn AgentCallbacks>,
    app_id: Uuid,
    metadata: Mutex<DeviceMetadata>,
    health_monitor: Arc<HealthMonitor>,
    verification_window: Arc<VerificationWindow>,
    reporter: Arc<TelemetryReporter>,
    config: DeviceAgentConfig,
}

impl<S, B> DeviceAgent<S, B>
where
    S: Storage + Send + Sync + 'static,
    B: PlatformBridge + Send + Sync + 'static,
{
    /// Runs the startup sequence (§4.6.1 steps 1-5), persists the
    /// result, and — if no access token is present — kicks off
    /// registration in the background (step 6). Step 7 (auto-check) is
    /// left to the caller via [`DeviceAgent::check_for_update`].
    #[instrument(skip_all)]
    pub async fn initialize(
        storage: S,
        bridge: B,
        client: DeviceControlPlaneClient,
        clock: Arc<dyn Clock>,
        callbacks: Arc<dyn AgentCallbacks>,
        app_id: Uuid,
        config: DeviceAgentConfig,
    ) -> Result<Arc<Self>, AgentError> {
        let loaded = storage.load()?;
        let now = clock.now();
        let startup_result = run_startup_sequence(loaded, &bridge, callbacks.as_ref(), now);
        storage.save(&startup_result.metadata)?;

        info!(
            bundle = ?startup_result.bundle_to_load,
            native_update = startup_result.native_update_detected,
            "🚀 [DEVICE_AGENT]: startup sequence complete"
        );

        let agent = Arc::new(Self {
            storage,
            bridge,
            client,
            clock,
            callbacks,
            app_id,
            metadata: Mutex::new(startup_result.metadata),
            health_monitor: HealthMonitor::new(),
            verification_window: VerificationWindow::new(),
            reporter: TelemetryReporter::new(config.telemetry_capacity),
            config,
        });

        if startup_result.start_verification {
            agent.arm_verification_window();
        }

        if agent.access_token().is_none() {
            Arc::clone(&agent).register_with_backoff();
        }

        Ok(agent)
    }

    pub fn device_id(&self) -> Uuid {
        self.metadata.lock().expect("metadata mutex poisoned").device_id
    }

    fn access_token(&self) -> Option<String> {
        self.metadata.lock().expect("metadata mutex poisoned").access_token.clone()
    }

    fn snapshot_metadata(&self) -> DeviceMetadata {
        self.metadata.lock().expect("metadata mutex poisoned").clone()
    }

    fn persist(&self, metadata: &DeviceMetadata) {
        if let Err(error) = self.storage.save(metadata) {
            self.callbacks.on_error(&error);
        }
    }

    fn arm_verification_window(self: &Arc<Self>) {
        let window = self.config.verification_window;
        let agent = Arc::clone(self);
        self.verification_window.arm(window, Arc::new(move || agent.mark_verified()));
    }

    /// Called by the timer on expiry, or immediately by
    /// [`DeviceAgent::notify_app_ready`]; either path fires at most once.
    fn mark_verified(&self) {
        let mut metadata = self.metadata.lock().expect("metadata mutex poisoned");
        metadata.previous_version = None;
        metadata.crash_count = 0;
        metadata.last_crash_time = None;
        metadata.verification_state.app_ready = true;
        metadata.verification_state.verified_at = Some(self.clock.now());
        let snapshot = metadata.clone();
        drop(metadata);

        self.persist(&snapshot);
        info!("✅ [DEVICE_AGENT]: verification window closed, install confirmed healthy");
    }

    /// Host-facing confirmation hook (the `app_ready`-equivalent signal
    /// referenced in §4.6.1 step 5).
    pub fn notify_app_ready(&self) {
        self.verification_window.notify_app_ready();
    }

    /// §4.6.3: arms the health monitor for the given release with the
    /// events fetched from `/v1/apps/{appId}/health-config`. The window
    /// used is the largest `timeout_ms` across configured events,
    /// falling back to the default when none is specified.
    #[instrument(skip(self))]
    pub async fn start_health_monitoring(&self, release_id: Uuid) -> Result<(), AgentError> {
        let token = self.access_token();
        let Some(token) = token else {
            warn!("🩺 [DEVICE_AGENT]: cannot fetch health config without an access token, skipping");
            return Ok(());
        };

        let config = self.client.fetch_health_config(self.app_id, &token).await?;
        let events: BTreeSet<String> = config.events.iter().map(|spec| spec.name.clone()).collect();
        let window = config
            .events
            .iter()
            .map(|spec| Duration::from_millis(spec.timeout_ms))
            .max()
            .unwrap_or(self.config.health_window);

        let native = self.bridge.native_version_info();
        self.health_monitor.start_monitoring(
            Arc::new(HealthReporterAdapter {
                client: self.client.clone(),
                access_token: token,
            }),
            events,
            window,
            release_id,
            self.device_id(),
            native.app_version,
            None,
        );
        Ok(())
    }

    pub fn report_health_event(&self, name: &str) {
        self.health_monitor.report_event(name);
    }

    /// §4.5 client side: asks the control plane whether an update is
    /// available, enqueues a fire-and-forget `check` telemetry event,
    /// and — on `UpdateAvailable` — leaves the decision of whether to
    /// download to the caller (foreground vs. background preload path).
    #[instrument(skip(self))]
    pub async fn check_for_update(&self) -> Result<CheckUpdateResponse, AgentError> {
        let metadata = self.snapshot_metadata();
        let native = self.bridge.native_version_info();

        let request = CheckUpdateRequest {
            app_id: self.app_id,
            device_id: metadata.device_id,
            platform: self.config.platform,
            app_version: native.app_version,
            current_bundle_version: metadata.current_version.clone(),
            current_bundle_hash: metadata.current_version_hash.clone(),
            channel_hint: None,
            device_info: Some(json!({ "osVersion": self.bridge.os_version() })),
        };

        let token = metadata.access_token.clone().unwrap_or_default();
        let response = self.client.check_update(&request, &token).await?;

        self.reporter.enqueue(TelemetryEvent {
            device_id: metadata.device_id,
            app_id: self.app_id,
            event_name: "check".to_string(),
            properties: json!({ "updateAvailable": response.update_available }),
        });

        Ok(response)
    }

    /// §4.6.2: downloads, verifies, and atomically installs the given
    /// update, then marks it pending for the next launch (or restarts
    /// immediately under [`InstallMode::Immediate`]).
    #[instrument(skip(self, update))]
    pub async fn download_and_apply_update(&self, update: &UpdateInfo) -> Result<(), AgentError> {
        let outcome = download_and_install(&self.client, &self.bridge, self.callbacks.as_ref(), update).await?;

        let mut metadata = self.metadata.lock().expect("metadata mutex poisoned");
        metadata.bundle_hashes.insert(outcome.version.clone(), outcome.bundle_hash);
        metadata.pending_version = Some(outcome.version.clone());
        metadata.pending_update_flag = true;
        let snapshot = metadata.clone();
        let device_id = metadata.device_id;
        drop(metadata);

        self.persist(&snapshot);

        self.reporter.enqueue(TelemetryEvent {
            device_id,
            app_id: self.app_id,
            event_name: "update_downloaded".to_string(),
            properties: json!({ "version": outcome.version, "releaseId": update.release_id }),
        });

        if self.config.install_mode == InstallMode::Immediate {
            self.bridge.restart_app();
        }

        Ok(())
    }

    /// §4.6.5: background preload, gated on device conditions, checked
    /// once at the start of the call.
    pub fn preload_is_permitted(&self) -> Result<(), AgentError> {
        check_preload_gates(&self.bridge, &self.config.preload).map_err(AgentError::PreloadBlocked)
    }

    /// Starts the periodic telemetry drain loop; intended to be called
    /// once by the host after [`DeviceAgent::initialize`].
    pub fn spawn_telemetry_drain(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let agent = Arc::clone(self);
        let client = self.client.clone();
        let interval = self.config.telemetry_flush_interval;
        Arc::clone(&self.reporter).spawn_drain_loop(
            Arc::new(client),
            Arc::new(move || agent.access_token()),
            interval,
        )
    }

    fn register_with_backoff(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut backoff = Duration::from_secs(1);
            const MAX_BACKOFF: Duration = Duration::from_secs(60);

            loop {
                let native = self.bridge.native_version_info();
                let device_id = self.device_id();
                let request = RegisterDeviceRequest {
                    app_id: self.app_id,
                    device_id,
                    platform: self.config.platform,
                    app_version: native.app_version,
                };

                match self.client.register_device(&request).await {
                    Ok(response) => {
                        let mut metadata = self.metadata.lock().expect("metadata mutex poisoned");
                        metadata.access_token = Some(response.access_token);
                        let snapshot = metadata.clone();
                        drop(metadata);
                        self.persist(&snapshot);
                        info!("🔑 [DEVICE_AGENT]: device registered with control plane");
                        return;
                    }
                    Err(error) => {
                        warn!(%error, backoff_secs = backoff.as_secs(), "🔁 [DEVICE_AGENT]: registration failed, retrying with backoff");
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        });
    }
}

/// Bridges [`HealthMonitor`]'s non-async reporting slot to the async
/// HTTP client — the timeout fires from within a spawned task and must
/// not block on the network itself (§4.6.3: "a network error ... is
/// silent, the monitor does not retry").
struct HealthReporterAdapter {
    client: DeviceControlPlaneClient,
    access_token: String,
}

impl crate::health_monitor::HealthReporter for HealthReporterAdapter {
    fn report_failure(&self, request: bundlenudge_domain_models::wire::HealthFailureRequest) {
        let client = self.client.clone();
        let token = self.access_token.clone();
        tokio::spawn(async move {
            if let Err(error) = client.report_health_failure(&request, &token).await {
                warn!(%error, "📉 [DEVICE_AGENT]: health failure report did not reach the control plane, not retrying");
            }
        });
    }
}

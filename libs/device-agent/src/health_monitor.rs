// [libs/device-agent/src/health_monitor.rs]
/*!
 * APARATO: PROTOCOLO DE VERIFICACIÓN DE SALUD (§4.6.3)
 * CLASIFICACIÓN: DEVICE AGENT (ESTRATO L4 — ON-DEVICE)
 * RESPONSABILIDAD: EL INVARIANTE DE MAYOR VALOR DEL SISTEMA COMPLETO
 *
 * "El sistema está diseñado para que el caso abrumadoramente común —
 * un release funciona — no le cueste nada al servidor. Solo los fallos
 * llaman a casa" (§4.6.3). Esta estructura garantiza, por construcción,
 * que la ruta sana nunca produce una llamada de red: el temporizador
 * que reportaría la falla se aborta (`JoinHandle::abort`) en cuanto
 * todos los eventos configurados se reportan, antes de que pueda
 * disparar.
 */

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bundlenudge_domain_models::wire::HealthFailureRequest;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Receptor del reporte de falla única (§4.6.3: "exactamente una POST").
/// No-async deliberadamente: la implementación de red encola el envío
/// en una tarea de fondo y nunca reintenta (§4.6.3 "silent", "does not
/// retry") — ver `bundlenudge_infra_device_client`.
pub trait HealthReporter: Send + Sync {
    fn report_failure(&self, request: HealthFailureRequest);
}

/// Doble de pruebas: colecciona cada reporte enviado, para verificar
/// la propiedad "cero tráfico si todo sano" / "exactamente un reporte".
#[derive(Default)]
pub struct RecordingHealthReporter {
    pub reports: Mutex<Vec<HealthFailureRequest>>,
}

impl RecordingHealthReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.reports.lock().expect("recorder mutex poisoned").len()
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn report_failure(&self, request: HealthFailureRequest) {
        self.reports.lock().expect("recorder mutex poisoned").push(request);
    }
}

struct Armed {
    events: BTreeSet<String>,
    fired: BTreeSet<String>,
    release_id: Uuid,
    device_id: Uuid,
    app_version: String,
    os_version: Option<String>,
    timer: tokio::task::JoinHandle<()>,
}

pub const DEFAULT_HEALTH_WINDOW: Duration = Duration::from_secs(30);

/// Estado mutable único del monitor. Se construye una vez por
/// instancia del agente (no un singleton de módulo, §9) y se comparte
/// como `Arc<HealthMonitor>` con su propia tarea de temporizador.
pub struct HealthMonitor {
    state: Mutex<Option<Armed>>,
}

impl HealthMonitor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { state: Mutex::new(None) })
    }

    /// Arma el monitor con `events` y un deadline `window` desde ahora.
    /// Reemplazar un monitor ya armado cancela el temporizador previo y
    /// descarta su estado (§4.6.3). Si `events` está vacío, el monitor
    /// se detiene de inmediato y jamás se produce una llamada de red.
    #[instrument(skip(self, reporter))]
    pub fn start_monitoring(
        self: &Arc<Self>,
        reporter: Arc<dyn HealthReporter>,
        events: BTreeSet<String>,
        window: Duration,
        release_id: Uuid,
        device_id: Uuid,
        app_version: String,
        os_version: Option<String>,
    ) {
        let mut guard = self.state.lock().expect("health monitor mutex poisoned");
        if let Some(previous) = guard.take() {
            previous.timer.abort();
        }

        if events.is_empty() {
            info!("🩺 [HEALTH_MONITOR]: armed with zero events — stopping immediately, no network call ever");
            return;
        }

        let monitor = Arc::clone(self);
        let reporter_for_timer = Arc::clone(&reporter);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            monitor.fire_timeout(reporter_for_timer);
        });

        info!(event_count = events.len(), window_ms = window.as_millis() as u64, "🩺 [HEALTH_MONITOR]: armed");

        *guard = Some(Armed {
            events,
            fired: BTreeSet::new(),
            release_id,
            device_id,
            app_version,
            os_version,
            timer,
        });
    }

    /// Inserta `name` en el conjunto de disparados si pertenece a
    /// `events`. Nombres desconocidos y duplicados se ignoran
    /// silenciosamente (semántica de conjunto). Si todos los eventos
    /// configurados ya se reportaron, el monitor se detiene sin jamás
    /// haber hecho una llamada de red.
    #[instrument(skip(self))]
    pub fn report_event(&self, name: &str) {
        let mut guard = self.state.lock().expect("health monitor mutex poisoned");
        let Some(armed) = guard.as_mut() else {
            return;
        };
        if !armed.events.contains(name) {
            return;
        }
        armed.fired.insert(name.to_string());

        if armed.fired == armed.events {
            let completed = guard.take().expect("armed state just matched above");
            completed.timer.abort();
            info!("✅ [HEALTH_MONITOR]: all events fired before deadline — zero outbound calls");
        }
    }

    /// Invocado por la propia tarea de temporizador al expirar. Si el
    /// monitor sigue armado (no fue cancelado por `report_event` ni
    /// reemplazado por una nueva llamada a `start_monitoring`), emite
    /// exactamente un reporte de falla y se detiene.
    fn fire_timeout(&self, reporter: Arc<dyn HealthReporter>) {
        let mut guard = self.state.lock().expect("health monitor mutex poisoned");
        let Some(armed) = guard.take() else {
            return;
        };
        drop(guard);

        let missing_events: Vec<String> = armed.events.difference(&armed.fired).cloned().collect();
        warn!(
            release_id = %armed.release_id,
            missing = ?missing_events,
            "⏰ [HEALTH_MONITOR]: deadline elapsed with missing events — sending exactly one failure report"
        );

        reporter.report_failure(HealthFailureRequest {
            release_id: armed.release_id,
            device_id: armed.device_id,
            missing_events,
            app_version: Some(armed.app_version),
            os_version: armed.os_version,
        });
    }

    /// Expuesto para pruebas e inspección: `true` mientras el monitor
    /// está armado esperando eventos o el deadline.
    pub fn is_armed(&self) -> bool {
        self.state.lock().expect("health monitor mutex poisoned").is_some()
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self { state: Mutex::new(None) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn all_events_fired_before_deadline_makes_zero_network_calls() {
        let monitor = HealthMonitor::new();
        let reporter = Arc::new(RecordingHealthReporter::new());
        monitor.start_monitoring(
            reporter.clone(),
            events(&["app_ready", "home_loaded"]),
            Duration::from_secs(30),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "1.0.0".into(),
            None,
        );

        monitor.report_event("app_ready");
        monitor.report_event("home_loaded");
        assert!(!monitor.is_armed());

        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;

        assert_eq!(reporter.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_event_at_deadline_sends_exactly_one_report() {
        let monitor = HealthMonitor::new();
        let reporter = Arc::new(RecordingHealthReporter::new());
        let release_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();

        monitor.start_monitoring(
            reporter.clone(),
            events(&["app_ready", "home_loaded"]),
            Duration::from_secs(30),
            release_id,
            device_id,
            "1.0.0".into(),
            Some("17.0".into()),
        );
        monitor.report_event("app_ready");

        tokio::time::advance(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        assert_eq!(reporter.call_count(), 1);
        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports[0].release_id, release_id);
        assert_eq!(reports[0].device_id, device_id);
        assert_eq!(reports[0].missing_events, vec!["home_loaded".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_event_set_never_arms_and_never_calls_out() {
        let monitor = HealthMonitor::new();
        let reporter = Arc::new(RecordingHealthReporter::new());
        monitor.start_monitoring(
            reporter.clone(),
            BTreeSet::new(),
            Duration::from_secs(30),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "1.0.0".into(),
            None,
        );

        assert!(!monitor.is_armed());
        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert_eq!(reporter.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_an_armed_monitor_cancels_the_previous_timer() {
        let monitor = HealthMonitor::new();
        let reporter = Arc::new(RecordingHealthReporter::new());

        monitor.start_monitoring(
            reporter.clone(),
            events(&["first"]),
            Duration::from_secs(10),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "1.0.0".into(),
            None,
        );

        tokio::time::advance(Duration::from_secs(5)).await;

        // Re-arming before the first deadline discards the old state entirely.
        monitor.start_monitoring(
            reporter.clone(),
            events(&["second"]),
            Duration::from_secs(10),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "1.0.0".into(),
            None,
        );
        monitor.report_event("second");

        tokio::time::advance(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(reporter.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_event_names_are_ignored() {
        let monitor = HealthMonitor::new();
        let reporter = Arc::new(RecordingHealthReporter::new());
        monitor.start_monitoring(
            reporter.clone(),
            events(&["app_ready"]),
            Duration::from_secs(30),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "1.0.0".into(),
            None,
        );

        monitor.report_event("totally_unknown_event");
        assert!(monitor.is_armed());
    }
}

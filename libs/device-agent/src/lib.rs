// [libs/device-agent/src/lib.rs]
/*!
 * APARATO: NÚCLEO DEL AGENTE DE DISPOSITIVO (C8)
 * CLASIFICACIÓN: DEVICE AGENT (ESTRATO L4 — PORTABLE, ON-DEVICE)
 * RESPONSABILIDAD: EL MOTOR DE AUTO-SANACIÓN — ARRANQUE, DESCARGA E
 *    INSTALACIÓN, VERIFICACIÓN DE SALUD, DETECCIÓN DE CAÍDAS Y
 *    PRECARGA CONDICIONADA POR EL ESTADO DEL DISPOSITIVO.
 *
 * Este crate es deliberadamente independiente del transporte HTTP del
 * control-plane: solo conoce `bundlenudge-infra-device-client` como su
 * uplink de red, y un `PlatformBridge`/`Storage` abstractos para todo
 * lo que depende del host nativo.
 */

pub mod agent;
pub mod bridge;
pub mod callbacks;
pub mod crash_window;
pub mod download;
pub mod errors;
pub mod health_monitor;
pub mod preload;
pub mod reporter;
pub mod startup;
pub mod storage;

pub use agent::{DeviceAgent, DeviceAgentConfig, InstallMode};
pub use bridge::{InMemoryBridge, NativeVersionInfo, PlatformBridge};
pub use callbacks::{AgentCallbacks, NoopCallbacks};
pub use crash_window::VerificationWindow;
pub use download::{DownloadOutcome, UpdateInfo};
pub use errors::AgentError;
pub use health_monitor::{HealthMonitor, HealthReporter, RecordingHealthReporter};
pub use preload::{check_preload_gates, PreloadConfig};
pub use reporter::TelemetryReporter;
pub use startup::{run_startup_sequence, LoadedBundle, StartupResult};
pub use storage::{FileStorage, InMemoryStorage, Storage};

// [apps/device-simulator/src/main.rs]
/*!
 * APARATO: SIMULATOR DE DISPOSITIVO (V1.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4 — CLI)
 * RESPONSABILIDAD: EJERCITAR `bundlenudge-device-agent` CONTRA UN
 *    CONTROL-PLANE REAL DESDE LA LÍNEA DE COMANDOS, UN COMANDO POR
 *    INVOCACIÓN DE PROCESO — CADA UNO RECONSTRUYE EL AGENTE DESDE EL
 *    ESTADO PERSISTIDO BAJO `--data-dir`, IGUAL QUE UN RELANZAMIENTO
 *    DE LA APP NATIVA REINICIARÍA EL PROCESO DEL HOST (§4.6.1)
 *
 * No es un singleton de módulo (§9): `build_agent` construye un handle
 * fresco en cada invocación y lo pasa explícitamente a cada comando;
 * nada vive detrás de un puntero global.
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bundlenudge_core_clock_ids::{Clock, SystemClock};
use bundlenudge_device_agent::{DeviceAgent, DeviceAgentConfig, FileStorage, UpdateInfo};
use bundlenudge_domain_models::Platform;
use bundlenudge_infra_device_client::DeviceControlPlaneClient;
use bundlenudge_device_simulator_lib::{DiskBridge, LastOffer, PrintingCallbacks};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Host de referencia del agente de auto-sanación on-device de BundleNudge."
)]
struct CliArguments {
    /// Directorio donde persisten la metadata del agente, los bundles
    /// descargados y las condiciones simuladas del dispositivo.
    #[arg(long, env = "SIMULATOR_DATA_DIR", default_value = "./device-simulator-data")]
    data_dir: PathBuf,

    /// Identificador de la app registrada en el control-plane.
    #[arg(long, env = "SIMULATOR_APP_ID")]
    app_id: Uuid,

    /// Endpoint base del control-plane (sin el sufijo `/v1`).
    #[arg(long, env = "CONTROL_PLANE_URL", default_value = "http://localhost:3000")]
    control_plane_url: String,

    /// Plataforma nativa simulada.
    #[arg(long, value_enum, default_value_t = CliPlatform::Ios)]
    platform: CliPlatform,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CliPlatform {
    Ios,
    Android,
}

impl From<CliPlatform> for Platform {
    fn from(value: CliPlatform) -> Self {
        match value {
            CliPlatform::Ios => Platform::Ios,
            CliPlatform::Android => Platform::Android,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the startup sequence (§4.6.1 steps 1-5) and registers with
    /// the control plane if no access token is held yet.
    Init,
    /// Calls `/v1/updates/check` and persists the offered release, if
    /// any, so a subsequent `apply` can pick it up.
    Check,
    /// Downloads, verifies, and atomically installs the release last
    /// offered by `check` (§4.6.2).
    Apply,
    /// Signals that the app is ready, closing the verification window
    /// immediately instead of waiting for the timer (§4.6.1 step 5).
    Ready,
    /// Arms the health monitor for a release and blocks until either
    /// every named event fires or the deadline elapses (§4.6.3).
    HealthWatch {
        #[arg(long)]
        release_id: Uuid,
        /// Events to report immediately after arming, in order.
        #[arg(long = "fire")]
        fire: Vec<String>,
        /// Seconds to wait for the deadline before exiting, beyond
        /// firing the given events. Only matters if events remain missing.
        #[arg(long, default_value_t = 35)]
        observe_seconds: u64,
    },
    /// Prints guidance about the crash-recovery branch without
    /// mutating any state: exiting here without calling `ready` first
    /// is what actually simulates a crash — the next `init` call will
    /// observe the unconfirmed launch and roll back (§4.6.1 step 3).
    Crash,
    /// Overwrites the bridge's native version sidecar, simulating a
    /// native app upgrade observed on the next `init` (§4.6.1 step 2).
    SetNativeVersion {
        #[arg(long)]
        app_version: String,
        #[arg(long)]
        build_number: String,
    },
    /// Adjusts the device conditions gating background preload (§4.6.5).
    SetConditions {
        #[arg(long)]
        battery_percent: Option<u8>,
        #[arg(long)]
        wifi: Option<bool>,
        #[arg(long)]
        low_power_mode: Option<bool>,
    },
    /// Evaluates the preload gates against the current conditions.
    Preload,
    /// Prints the persisted metadata and bridge conditions.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info,bundlenudge_device_agent=debug").with_target(false).init();

    let arguments = CliArguments::parse();
    std::fs::create_dir_all(&arguments.data_dir).context("creating the simulator data directory")?;

    match &arguments.command {
        Command::SetNativeVersion { app_version, build_number } => {
            let bridge = DiskBridge::at(&arguments.data_dir)?;
            bridge.update_conditions(|c| {
                c.app_version = app_version.clone();
                c.build_number = build_number.clone();
            })?;
            info!(app_version, build_number, "📱 [SIMULATOR]: native version sidecar updated");
            return Ok(());
        }
        Command::SetConditions { battery_percent, wifi, low_power_mode } => {
            let bridge = DiskBridge::at(&arguments.data_dir)?;
            let updated = bridge.update_conditions(|c| {
                if let Some(battery_percent) = battery_percent {
                    c.battery_percent = *battery_percent;
                }
                if let Some(wifi) = wifi {
                    c.wifi = *wifi;
                }
                if let Some(low_power_mode) = low_power_mode {
                    c.low_power_mode = *low_power_mode;
                }
            })?;
            info!(?updated, "🔋 [SIMULATOR]: device conditions updated");
            return Ok(());
        }
        Command::Crash => {
            info!(
                "💥 [SIMULATOR]: exiting now without calling `ready` simulates an abnormal exit — \
                 the next `init` will observe the unconfirmed launch and roll back if a verification \
                 window is currently open (§4.6.1 step 3)"
            );
            return Ok(());
        }
        _ => {}
    }

    let agent = build_agent(&arguments).await?;

    match arguments.command {
        Command::Init => {
            print_status(&agent, &arguments.data_dir).await;
        }
        Command::Check => {
            let response = agent.check_for_update().await.context("checking for an update")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if let Some(release) = response.release {
                LastOffer::save(
                    &arguments.data_dir,
                    &LastOffer {
                        version: release.version,
                        bundle_url: release.bundle_url,
                        bundle_size: release.bundle_size,
                        bundle_hash: release.bundle_hash,
                        release_id: release.release_id,
                    },
                )?;
            }
        }
        Command::Apply => {
            let offer = LastOffer::load(&arguments.data_dir)?
                .context("no update has been offered yet — run `check` first")?;
            let update_info: UpdateInfo = (&offer).into();
            agent.download_and_apply_update(&update_info).await.context("downloading and installing the update")?;
            info!(version = %update_info.version, "✅ [SIMULATOR]: update installed, takes effect on next `init`");
        }
        Command::Ready => {
            agent.notify_app_ready();
            info!("✅ [SIMULATOR]: app_ready signaled, verification window closed immediately");
        }
        Command::HealthWatch { release_id, fire, observe_seconds } => {
            agent.start_health_monitoring(release_id).await.context("arming the health monitor")?;
            for event_name in &fire {
                agent.report_health_event(event_name);
            }
            info!(observe_seconds, "🩺 [SIMULATOR]: waiting to observe whether a failure report fires");
            tokio::time::sleep(Duration::from_secs(observe_seconds)).await;
            info!("🩺 [SIMULATOR]: observation window elapsed");
        }
        Command::Preload => match agent.preload_is_permitted() {
            Ok(()) => info!("✅ [SIMULATOR]: preload gates pass, background download would proceed"),
            Err(error) => info!(%error, "🚫 [SIMULATOR]: preload blocked"),
        },
        Command::Status => {
            print_status(&agent, &arguments.data_dir).await;
        }
        Command::SetNativeVersion { .. } | Command::SetConditions { .. } | Command::Crash => {
            unreachable!("handled before agent construction")
        }
    }

    Ok(())
}

async fn build_agent(
    arguments: &CliArguments,
) -> Result<Arc<DeviceAgent<FileStorage, DiskBridge>>> {
    let storage = FileStorage::at(arguments.data_dir.join("metadata.json"));
    let bridge = DiskBridge::at(&arguments.data_dir)?;
    let client = DeviceControlPlaneClient::new(arguments.control_plane_url.clone());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let callbacks = Arc::new(PrintingCallbacks);
    let config = DeviceAgentConfig::new(arguments.platform.into());

    DeviceAgent::initialize(storage, bridge, client, clock, callbacks, arguments.app_id, config)
        .await
        .context("running the device agent startup sequence")
}

async fn print_status(agent: &Arc<DeviceAgent<FileStorage, DiskBridge>>, data_dir: &std::path::Path) {
    println!("device_id: {}", agent.device_id());
    let bridge = DiskBridge::at(data_dir).expect("data dir already exists at this point");
    println!("bridge_conditions: {:?}", bridge.conditions());
}

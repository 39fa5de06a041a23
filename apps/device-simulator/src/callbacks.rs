// [apps/device-simulator/src/callbacks.rs]
/*!
 * APARATO: CALLBACKS DEL HOST CLI
 * RESPONSABILIDAD: IMPLEMENTACIÓN DE `AgentCallbacks` QUE IMPRIME CADA
 *    GANCHO DE OBSERVACIÓN A STDERR VÍA `tracing` (§9 "callbacks for
 *    side effects")
 */

use bundlenudge_device_agent::{AgentCallbacks, AgentError};
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct PrintingCallbacks;

impl AgentCallbacks for PrintingCallbacks {
    fn on_native_update_detected(&self) {
        info!("📱 [SIMULATOR]: native app update detected, OTA state cleared");
    }

    fn on_validation_failed(&self, version: &str) {
        warn!(version, "🚫 [SIMULATOR]: on-disk bundle failed validation, falling back to embedded");
    }

    fn on_error(&self, error: &AgentError) {
        warn!(%error, "⚠️ [SIMULATOR]: agent reported an error");
    }

    fn on_download_progress(&self, received: u64, total: u64) {
        info!(received, total, "⬇️ [SIMULATOR]: download progress");
    }
}

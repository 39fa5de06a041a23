// [libs/device-agent/src/callbacks.rs]
/*!
 * APARATO: GANCHOS DE OBSERVACIÓN DEL AGENTE (§9)
 * RESPONSABILIDAD: SLOTS DE CALLBACK PARA EFECTOS SECUNDARIOS
 *
 * Contrato (§9 "Callbacks for side effects"): pueden invocarse cero o
 * más veces desde el propio contexto de ejecución del agente; los
 * receptores no deben "lanzar" de vuelta hacia el agente. En Rust esto
 * se traduce en un trait de métodos infalibles (sin `Result`) con
 * implementaciones por defecto vacías — un handle explícito construido
 * en el arranque, no un puntero global de módulo (§9 "Singleton device
 * agent").
 */

use crate::errors::AgentError;

pub trait AgentCallbacks: Send + Sync {
    /// §4.6.1 paso 2: la versión nativa del host cambió desde el último arranque.
    fn on_native_update_detected(&self) {}

    /// §4.6.1 paso 4: el hash on-disk de un bundle no coincidió con el persistido.
    fn on_validation_failed(&self, version: &str) {
        let _ = version;
    }

    /// Observación genérica de fallo; nunca dicta control de flujo (§7, §9).
    fn on_error(&self, error: &AgentError) {
        let _ = error;
    }

    /// §4.6.2 paso 1: progreso de descarga, `received` y `total` en bytes.
    fn on_download_progress(&self, received: u64, total: u64) {
        let _ = (received, total);
    }
}

/// Implementación silenciosa por defecto, para llamadores que no
/// necesitan observar nada.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl AgentCallbacks for NoopCallbacks {}

// [libs/device-agent/src/crash_window.rs]
/*!
 * APARATO: VENTANA DE VERIFICACIÓN POST-INSTALACIÓN (§4.6.1 paso 5, §4.6.4)
 * RESPONSABILIDAD: DETECCIÓN DE CAÍDAS INDEPENDIENTE DE LOS EVENTOS DE SALUD
 *
 * Mismo patrón de cancelación que `health_monitor`: un `JoinHandle`
 * guardado tras un mutex, abortado en cuanto la confirmación llega por
 * el otro camino posible. Aquí los dos caminos son "el temporizador
 * expira sin que la app se haya caído" y "la app llama
 * `notifyAppReady` explícitamente" — ambos producen el mismo efecto
 * ("verified"), una sola vez.
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Armed {
    timer: tokio::task::JoinHandle<()>,
    on_verified: Arc<dyn Fn() + Send + Sync>,
}

pub const DEFAULT_VERIFICATION_WINDOW: Duration = Duration::from_secs(60);

/// Un único temporizador de confirmación por instancia de agente. No es
/// un singleton de módulo (§9): se construye explícitamente junto con
/// el resto del estado del agente.
pub struct VerificationWindow {
    state: Mutex<Option<Armed>>,
}

impl VerificationWindow {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { state: Mutex::new(None) })
    }

    /// Arma la ventana. Si ya había una ventana armada, su temporizador
    /// se cancela y se descarta sin invocar su callback — solo la
    /// ventana activa en el momento de la confirmación (temporizador o
    /// `notify_app_ready`) llega a dispararse.
    pub fn arm(self: &Arc<Self>, window: Duration, on_verified: Arc<dyn Fn() + Send + Sync>) {
        let mut guard = self.state.lock().expect("verification window mutex poisoned");
        if let Some(previous) = guard.take() {
            previous.timer.abort();
        }

        let keep_alive = Arc::clone(self);
        let callback_for_timer = Arc::clone(&on_verified);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            keep_alive.fire(callback_for_timer);
        });

        *guard = Some(Armed { timer, on_verified });
    }

    /// Confirmación explícita desde el host (`app_ready`-equivalent).
    /// Cancela el temporizador pendiente y ejecuta el mismo efecto de
    /// verificación de inmediato, exactamente una vez.
    pub fn notify_app_ready(&self) {
        let mut guard = self.state.lock().expect("verification window mutex poisoned");
        if let Some(armed) = guard.take() {
            armed.timer.abort();
            (armed.on_verified)();
        }
    }

    fn fire(&self, on_verified: Arc<dyn Fn() + Send + Sync>) {
        let mut guard = self.state.lock().expect("verification window mutex poisoned");
        if guard.take().is_some() {
            drop(guard);
            on_verified();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().expect("verification window mutex poisoned").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn timer_fires_verification_exactly_once_when_not_confirmed() {
        let window = VerificationWindow::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        window.arm(Duration::from_secs(60), Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!window.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn notify_app_ready_cancels_timer_and_fires_immediately() {
        let window = VerificationWindow::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        window.arm(Duration::from_secs(60), Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        window.notify_app_ready();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!window.is_armed());

        // The timer task, though cancelled, must never fire the callback again.
        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_discards_the_previous_window_without_firing_it() {
        let window = VerificationWindow::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first_calls = Arc::clone(&calls);
        window.arm(Duration::from_secs(60), Arc::new(move || {
            first_calls.fetch_add(1, Ordering::SeqCst);
        }));

        let second_calls = Arc::clone(&calls);
        window.arm(Duration::from_secs(60), Arc::new(move || {
            second_calls.fetch_add(10, Ordering::SeqCst);
        }));

        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }
}

// [apps/orchestrator/src/state/rate_limiter.rs]
/*!
 * APARATO: LIMITADOR DE TASA EN MEMORIA (§7 `RATE_LIMITED`, §12)
 * RESPONSABILIDAD: VENTANA DESLIZANTE POR CLAVE (IP O DEVICE ID),
 *    GUARDADA DETRÁS DE UN `Mutex` — EL MISMO PATRÓN QUE
 *    `state::channel_cache` PARA ESTADO COMPARTIDO BEST-EFFORT
 *
 * No es un reemplazo de un limitador distribuido (Redis/Envoy); es el
 * guardián de última línea contra un cliente individual desbocado,
 * igual que este código base contiene sus contadores de heartbeat
 * tras un `Mutex` en vez de una dependencia externa. Las entradas
 * vencidas se purgan perezosamente en cada `check`, nunca por un
 * barrido de fondo separado — el costo escala con las claves activas.
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Window {
    count: u32,
    started_at: Instant,
}

pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_seconds.max(1)),
        }
    }

    /// `true` if `key` is still within budget for the current window;
    /// as a side effect, records this call against the budget.
    pub fn check(&self, key: &str) -> bool {
        let mut guard = self.windows.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();

        match guard.get_mut(key) {
            Some(entry) if now.duration_since(entry.started_at) < self.window => {
                if entry.count >= self.max_requests {
                    false
                } else {
                    entry.count += 1;
                    true
                }
            }
            _ => {
                guard.insert(key.to_string(), Window { count: 1, started_at: now });
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_configured_budget() {
        let limiter = RateLimiter::new(3, 60);
        assert!(limiter.check("device-a"));
        assert!(limiter.check("device-a"));
        assert!(limiter.check("device-a"));
        assert!(!limiter.check("device-a"));
    }

    #[test]
    fn distinct_keys_have_independent_budgets() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check("device-a"));
        assert!(limiter.check("device-b"));
        assert!(!limiter.check("device-a"));
    }

    #[test]
    fn window_reset_restores_budget() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.check("device-a"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.check("device-a"));
    }
}

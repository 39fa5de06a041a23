// [libs/core/clock-ids/src/clock.rs]
/*!
 * APARATO: ABSTRACCIÓN DE RELOJ (C1)
 * RESPONSABILIDAD: DESACOPLAR `now()` DEL RELOJ DE PARED PARA
 *    PERMITIR PRUEBAS DETERMINISTAS DE EXPIRACIÓN DE TOKENS Y
 *    VENTANAS DE SALUD/VERIFICACIÓN.
 */

use chrono::{DateTime, Utc};

/// Fuente de tiempo inyectable. La implementación de producción delega
/// en el reloj de pared del sistema operativo; las pruebas sustituyen
/// un reloj fijo o programable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Disponible bajo el feature `test-util` para que otros crates del
/// workspace (device-agent, infra-db) puedan inyectar tiempo
/// determinista en sus propias pruebas sin recompilar este crate con
/// `cfg(test)`.
#[cfg(any(test, feature = "test-util"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Reloj fijo, avanzable manualmente, para pruebas de expiración.
    pub struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        pub fn new(at: DateTime<Utc>) -> Self {
            Self(Mutex::new(at))
        }

        pub fn advance(&self, delta: chrono::Duration) {
            let mut guard = self.0.lock().expect("clock mutex poisoned");
            *guard = *guard + delta;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock mutex poisoned")
        }
    }
}

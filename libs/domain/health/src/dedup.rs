// [libs/domain/health/src/dedup.rs]
/*!
 * APARATO: DEDUPLICADOR DE REPORTES DE SALUD (C6)
 * RESPONSABILIDAD: IDEMPOTENCIA DE `report_failure` SOBRE
 *    `(release_id, device_id)` DENTRO DE UNA VENTANA DE DEDUPLICACIÓN
 *
 * Reportes duplicados dentro de la ventana actualizan `missing_events`
 * pero no incrementan el contador de fallas dos veces (§4.4, §6).
 */

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_DEDUP_WINDOW_SECONDS: i64 = 10 * 60;

/// Mapa concurrente `(release_id, device_id) -> último timestamp visto`.
/// Un reporte es "nuevo" (cuenta para el contador de fallas) solo si no
/// hay entrada, o la entrada es anterior al inicio de la ventana.
pub struct ReportDeduplicator {
    window_seconds: i64,
    seen: Mutex<HashMap<(Uuid, Uuid), DateTime<Utc>>>,
}

impl ReportDeduplicator {
    pub fn new(window_seconds: i64) -> Self {
        Self {
            window_seconds,
            seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_window() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW_SECONDS)
    }

    /// Registra el reporte en `now`. Retorna `true` si este reporte debe
    /// contarse (primera vez, o fuera de la ventana de deduplicación de
    /// la última vez visto); `false` si es un duplicado dentro de ventana.
    pub fn observe(&self, release_id: Uuid, device_id: Uuid, now: DateTime<Utc>) -> bool {
        let mut seen = self.seen.lock().expect("dedup mutex poisoned");
        let key = (release_id, device_id);
        let is_fresh = match seen.get(&key) {
            Some(last_seen) => (now - *last_seen).num_seconds() >= self.window_seconds,
            None => true,
        };
        seen.insert(key, now);
        is_fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_report_is_always_fresh() {
        let dedup = ReportDeduplicator::new(600);
        assert!(dedup.observe(Uuid::new_v4(), Uuid::new_v4(), Utc::now()));
    }

    #[test]
    fn duplicate_within_window_is_not_fresh() {
        let dedup = ReportDeduplicator::new(600);
        let release_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();
        let now = Utc::now();
        assert!(dedup.observe(release_id, device_id, now));
        assert!(!dedup.observe(release_id, device_id, now + chrono::Duration::seconds(60)));
    }

    #[test]
    fn report_after_window_elapses_is_fresh_again() {
        let dedup = ReportDeduplicator::new(600);
        let release_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();
        let now = Utc::now();
        assert!(dedup.observe(release_id, device_id, now));
        assert!(dedup.observe(release_id, device_id, now + chrono::Duration::seconds(601)));
    }

    #[test]
    fn distinct_devices_do_not_dedup_against_each_other() {
        let dedup = ReportDeduplicator::new(600);
        let release_id = Uuid::new_v4();
        let now = Utc::now();
        assert!(dedup.observe(release_id, Uuid::new_v4(), now));
        assert!(dedup.observe(release_id, Uuid::new_v4(), now));
    }
}

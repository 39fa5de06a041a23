// [apps/orchestrator/src/services/telemetry_queue.rs]
/*!
 * APARATO: COLA DE TELEMETRÍA FIRE-AND-FORGET (§4.5, §9)
 * RESPONSABILIDAD: ENCOLAR EVENTOS "CHECK" Y DE TELEMETRÍA SIN BLOQUEAR
 *    LA RUTA CALIENTE, CON POLÍTICA DE DESBORDE "DROP OLDEST"
 *
 * El camino caliente (`/v1/updates/check`) nunca espera a que este
 * encolado se drene; `push` es una operación de memoria pura. Un
 * worker de fondo drena la cola a intervalos regulares. Si la cola se
 * llena antes de que el worker drene, el evento más viejo se descarta
 * — perder una señal de telemetría nunca es una falla de corrección
 * (§9 "Fire-and-forget requests").
 */

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};

pub struct TelemetryQueue {
    capacity: usize,
    events: Mutex<VecDeque<Value>>,
}

impl TelemetryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Nunca bloquea en I/O; solo toma el mutex en memoria y retorna.
    pub fn push(&self, event: Value) {
        let mut guard = self.events.lock().expect("telemetry queue mutex poisoned");
        if guard.len() >= self.capacity {
            guard.pop_front();
            warn!("📉 [TELEMETRY_QUEUE]: capacity reached, dropped oldest event");
        }
        guard.push_back(event);
    }

    /// Drena hasta `max_items` eventos para el worker de fondo. Devuelve
    /// un vector vacío si no hay nada pendiente; nunca bloquea esperando
    /// a que llegue trabajo.
    pub fn drain(&self, max_items: usize) -> Vec<Value> {
        let mut guard = self.events.lock().expect("telemetry queue mutex poisoned");
        let drained = guard.drain(..guard.len().min(max_items)).collect::<Vec<_>>();
        if !drained.is_empty() {
            debug!(count = drained.len(), "📤 [TELEMETRY_QUEUE]: drained batch");
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("telemetry queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_then_drain_round_trips() {
        let queue = TelemetryQueue::new(10);
        queue.push(json!({"event": "check", "release_id": "r1"}));
        let drained = queue.drain(10);
        assert_eq!(drained.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let queue = TelemetryQueue::new(2);
        queue.push(json!({"seq": 1}));
        queue.push(json!({"seq": 2}));
        queue.push(json!({"seq": 3}));

        let drained = queue.drain(10);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0]["seq"], 2);
        assert_eq!(drained[1]["seq"], 3);
    }
}

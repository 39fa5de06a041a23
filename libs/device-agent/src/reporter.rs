// [libs/device-agent/src/reporter.rs]
/*!
 * APARATO: COLA DE TELEMETRÍA EN SEGUNDO PLANO (§4.6.2 paso 5, §5)
 * RESPONSABILIDAD: NUNCA BLOQUEAR LA RUTA PRINCIPAL POR TELEMETRÍA
 *
 * Anillo acotado con política "descarta el más antiguo": un emisor
 * rápido nunca se bloquea y nunca falla por presión de la cola, a
 * costa de perder eventos viejos si el drenado se atrasa.
 */

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bundlenudge_domain_models::wire::TelemetryEvent;
use bundlenudge_infra_device_client::DeviceControlPlaneClient;
use tracing::{info, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(15);

pub struct TelemetryReporter {
    queue: Mutex<VecDeque<TelemetryEvent>>,
    capacity: usize,
}

impl TelemetryReporter {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self { queue: Mutex::new(VecDeque::with_capacity(capacity)), capacity })
    }

    /// Nunca bloquea y nunca retorna error: el peor caso es descartar
    /// el evento más antiguo en cola.
    pub fn enqueue(&self, event: TelemetryEvent) {
        let mut queue = self.queue.lock().expect("telemetry queue mutex poisoned");
        if queue.len() >= self.capacity {
            queue.pop_front();
            warn!("📉 [TELEMETRY_REPORTER]: queue at capacity ({}), dropped oldest event", self.capacity);
        }
        queue.push_back(event);
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().expect("telemetry queue mutex poisoned").len()
    }

    fn drain_batch(&self) -> Vec<TelemetryEvent> {
        self.queue.lock().expect("telemetry queue mutex poisoned").drain(..).collect()
    }

    /// Arranca el drenado periódico en segundo plano. `access_token` se
    /// resuelve en cada tick porque el token no existe hasta que el
    /// registro del dispositivo (§4.6.1 paso 6) completa; mientras no
    /// haya token el lote se re-encola íntegro para el siguiente tick.
    pub fn spawn_drain_loop(
        self: Arc<Self>,
        client: Arc<DeviceControlPlaneClient>,
        access_token: Arc<dyn Fn() -> Option<String> + Send + Sync>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let batch = self.drain_batch();
                if batch.is_empty() {
                    continue;
                }

                let Some(token) = access_token() else {
                    for event in batch {
                        self.enqueue(event);
                    }
                    continue;
                };

                match client.send_telemetry_batch(batch, &token).await {
                    Ok(_) => info!("📡 [TELEMETRY_REPORTER]: batch flushed"),
                    Err(error) => warn!(%error, "📉 [TELEMETRY_REPORTER]: batch flush failed, events dropped silently"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_event() -> TelemetryEvent {
        TelemetryEvent {
            device_id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            event_name: "update_downloaded".into(),
            properties: json!({}),
        }
    }

    #[test]
    fn overflow_drops_oldest_event() {
        let reporter = TelemetryReporter::new(2);
        reporter.enqueue(sample_event());
        reporter.enqueue(sample_event());
        reporter.enqueue(sample_event());
        assert_eq!(reporter.pending_count(), 2);
    }

    #[test]
    fn drain_batch_empties_the_queue() {
        let reporter = TelemetryReporter::new(10);
        reporter.enqueue(sample_event());
        reporter.enqueue(sample_event());
        assert_eq!(reporter.drain_batch().len(), 2);
        assert_eq!(reporter.pending_count(), 0);
    }
}

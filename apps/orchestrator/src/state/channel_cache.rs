// [apps/orchestrator/src/state/channel_cache.rs]
/*!
 * APARATO: CACHÉ DE CANAL (§4.5 PASO 2, §5)
 * RESPONSABILIDAD: `(app_id, channel_name) -> Channel` CON TTL ACOTADO
 *
 * Best-effort: una entrada vencida simplemente provoca una relectura
 * de base de datos, nunca un error. Las rutas de escritura (activación
 * de release) deben poder saltarse el caché explícitamente vía
 * `invalidate`; este módulo no se suscribe a eventos de escritura por
 * sí mismo — el llamador decide cuándo invalidar.
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bundlenudge_domain_models::Channel;
use uuid::Uuid;

struct CachedEntry {
    channel: Channel,
    inserted_at: Instant,
}

pub struct ChannelCache {
    ttl: Duration,
    entries: Mutex<HashMap<(Uuid, String), CachedEntry>>,
}

impl ChannelCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, app_id: Uuid, channel_name: &str) -> Option<Channel> {
        let key = (app_id, channel_name.to_string());
        let guard = self.entries.lock().expect("channel cache mutex poisoned");
        let entry = guard.get(&key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.channel.clone())
    }

    pub fn put(&self, app_id: Uuid, channel_name: &str, channel: Channel) {
        let key = (app_id, channel_name.to_string());
        let mut guard = self.entries.lock().expect("channel cache mutex poisoned");
        guard.insert(key, CachedEntry { channel, inserted_at: Instant::now() });
    }

    /// Usado por las rutas de escritura (activación, cambio de rollout)
    /// para garantizar que la siguiente lectura vea el estado fresco en
    /// vez de esperar a que el TTL expire por sí solo.
    pub fn invalidate(&self, app_id: Uuid, channel_name: &str) {
        let key = (app_id, channel_name.to_string());
        self.entries.lock().expect("channel cache mutex poisoned").remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlenudge_domain_models::Constraints;

    fn sample_channel(app_id: Uuid) -> Channel {
        Channel {
            id: Uuid::new_v4(),
            app_id,
            name: "production".to_string(),
            is_default: true,
            rollout_percentage: 100,
            targeting_rules: Constraints::any_platform(),
            active_release_id: None,
        }
    }

    #[test]
    fn miss_when_absent() {
        let cache = ChannelCache::new(5);
        assert!(cache.get(Uuid::new_v4(), "production").is_none());
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ChannelCache::new(5);
        let app_id = Uuid::new_v4();
        cache.put(app_id, "production", sample_channel(app_id));
        assert!(cache.get(app_id, "production").is_some());
    }

    #[test]
    fn invalidate_forces_a_miss() {
        let cache = ChannelCache::new(5);
        let app_id = Uuid::new_v4();
        cache.put(app_id, "production", sample_channel(app_id));
        cache.invalidate(app_id, "production");
        assert!(cache.get(app_id, "production").is_none());
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss() {
        let cache = ChannelCache::new(0);
        let app_id = Uuid::new_v4();
        cache.put(app_id, "production", sample_channel(app_id));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(app_id, "production").is_none());
    }
}

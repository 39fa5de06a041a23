// [libs/device-agent/src/bridge.rs]
/*!
 * APARATO: CONTRATO DEL PUENTE DE PLATAFORMA (§4.6)
 * RESPONSABILIDAD: ABSTRAER LAS LLAMADAS NATIVAS QUE EL AGENTE
 *    NECESITA DEL HOST: VERSIÓN NATIVA, CONDICIONES DE DISPOSITIVO,
 *    PERSISTENCIA DE BUNDLES Y REINICIO DE LA APP
 */

use crate::errors::AgentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeVersionInfo {
    pub app_version: String,
    pub build_number: String,
}

pub trait PlatformBridge {
    fn native_version_info(&self) -> NativeVersionInfo;

    /// Versión del sistema operativo host (p.ej. `"17.4"`), evaluada
    /// contra `min_os_version` (§4.1 C3 regla 5).
    fn os_version(&self) -> String;

    /// Persiste `bytes` como el bundle `version`. La implementación debe
    /// escribir a una ruta temporal y renombrar (§4.6.2 paso 3); en
    /// cualquier error antes del rename, la ruta temporal se elimina.
    fn save_bundle_atomic(&self, version: &str, bytes: &[u8]) -> Result<(), AgentError>;

    fn read_bundle_bytes(&self, version: &str) -> Result<Vec<u8>, AgentError>;

    fn remove_bundle(&self, version: &str) -> Result<(), AgentError>;

    fn restart_app(&self);

    fn battery_percent(&self) -> u8;

    fn is_wifi(&self) -> bool;

    fn is_low_power_mode(&self) -> bool;
}

/// Doble de pruebas: bundles viven en un mapa en memoria; condiciones
/// de dispositivo son configurables por el test.
pub struct InMemoryBridge {
    version_info: std::sync::Mutex<NativeVersionInfo>,
    os_version: std::sync::Mutex<String>,
    bundles: std::sync::Mutex<std::collections::BTreeMap<String, Vec<u8>>>,
    pub battery_percent: std::sync::atomic::AtomicU8,
    pub wifi: std::sync::atomic::AtomicBool,
    pub low_power_mode: std::sync::atomic::AtomicBool,
    pub restart_count: std::sync::atomic::AtomicU32,
}

impl InMemoryBridge {
    pub fn new(app_version: impl Into<String>, build_number: impl Into<String>) -> Self {
        Self {
            version_info: std::sync::Mutex::new(NativeVersionInfo {
                app_version: app_version.into(),
                build_number: build_number.into(),
            }),
            os_version: std::sync::Mutex::new("17.0".to_string()),
            bundles: std::sync::Mutex::new(std::collections::BTreeMap::new()),
            battery_percent: std::sync::atomic::AtomicU8::new(100),
            wifi: std::sync::atomic::AtomicBool::new(true),
            low_power_mode: std::sync::atomic::AtomicBool::new(false),
            restart_count: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn set_native_version(&self, app_version: impl Into<String>, build_number: impl Into<String>) {
        *self.version_info.lock().expect("bridge mutex poisoned") =
            NativeVersionInfo { app_version: app_version.into(), build_number: build_number.into() };
    }

    pub fn set_os_version(&self, os_version: impl Into<String>) {
        *self.os_version.lock().expect("bridge mutex poisoned") = os_version.into();
    }

    pub fn has_bundle(&self, version: &str) -> bool {
        self.bundles.lock().expect("bridge mutex poisoned").contains_key(version)
    }
}

impl PlatformBridge for InMemoryBridge {
    fn native_version_info(&self) -> NativeVersionInfo {
        self.version_info.lock().expect("bridge mutex poisoned").clone()
    }

    fn os_version(&self) -> String {
        self.os_version.lock().expect("bridge mutex poisoned").clone()
    }

    fn save_bundle_atomic(&self, version: &str, bytes: &[u8]) -> Result<(), AgentError> {
        self.bundles.lock().expect("bridge mutex poisoned").insert(version.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read_bundle_bytes(&self, version: &str) -> Result<Vec<u8>, AgentError> {
        self.bundles
            .lock()
            .expect("bridge mutex poisoned")
            .get(version)
            .cloned()
            .ok_or_else(|| AgentError::Bridge(format!("bundle {version} not found")))
    }

    fn remove_bundle(&self, version: &str) -> Result<(), AgentError> {
        self.bundles.lock().expect("bridge mutex poisoned").remove(version);
        Ok(())
    }

    fn restart_app(&self) {
        self.restart_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn battery_percent(&self) -> u8 {
        self.battery_percent.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn is_wifi(&self) -> bool {
        self.wifi.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn is_low_power_mode(&self) -> bool {
        self.low_power_mode.load(std::sync::atomic::Ordering::SeqCst)
    }
}

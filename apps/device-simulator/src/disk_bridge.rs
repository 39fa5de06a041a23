// [apps/device-simulator/src/disk_bridge.rs]
/*!
 * APARATO: PUENTE DE PLATAFORMA SOBRE DISCO
 * CLASIFICACIÓN: REFERENCE HOST (ESTRATO L4 — CLI)
 * RESPONSABILIDAD: IMPLEMENTA `PlatformBridge` PERSISTIENDO BUNDLES Y
 *    CONDICIONES DE DISPOSITIVO EN ARCHIVOS, PARA QUE INVOCACIONES
 *    SUCESIVAS DEL CLI (PROCESOS SEPARADOS) COMPARTAN EL MISMO ESTADO
 *    QUE UN RUNTIME NATIVO CONSERVARÍA EN MEMORIA ENTRE LANZAMIENTOS
 *
 * `save_bundle_atomic` sigue la misma disciplina temp-then-rename que
 * `bundlenudge_device_agent::storage::FileStorage` (§4.6.2 paso 3): el
 * paso de rename es lo último que puede voltear "qué bundle cargar",
 * nunca un estado a medio escribir.
 */

use std::fs;
use std::path::{Path, PathBuf};

use bundlenudge_device_agent::{AgentError, NativeVersionInfo, PlatformBridge};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConditions {
    pub app_version: String,
    pub build_number: String,
    #[serde(default = "default_os_version")]
    pub os_version: String,
    pub battery_percent: u8,
    pub wifi: bool,
    pub low_power_mode: bool,
}

fn default_os_version() -> String {
    "17.0".to_string()
}

impl Default for DeviceConditions {
    fn default() -> Self {
        Self {
            app_version: "1.0.0".to_string(),
            build_number: "1".to_string(),
            os_version: default_os_version(),
            battery_percent: 100,
            wifi: true,
            low_power_mode: false,
        }
    }
}

pub struct DiskBridge {
    bundles_dir: PathBuf,
    conditions_path: PathBuf,
    restart_count: std::sync::atomic::AtomicU32,
}

impl DiskBridge {
    pub fn at(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_dir = data_dir.as_ref();
        let bundles_dir = data_dir.join("bundles");
        fs::create_dir_all(&bundles_dir)?;

        let conditions_path = data_dir.join("conditions.json");
        if !conditions_path.exists() {
            write_conditions(&conditions_path, &DeviceConditions::default())?;
        }

        Ok(Self { bundles_dir, conditions_path, restart_count: std::sync::atomic::AtomicU32::new(0) })
    }

    pub fn conditions(&self) -> DeviceConditions {
        read_conditions(&self.conditions_path).unwrap_or_default()
    }

    pub fn update_conditions(&self, update: impl FnOnce(&mut DeviceConditions)) -> std::io::Result<DeviceConditions> {
        let mut conditions = self.conditions();
        update(&mut conditions);
        write_conditions(&self.conditions_path, &conditions)?;
        Ok(conditions)
    }

    fn bundle_path(&self, version: &str) -> PathBuf {
        self.bundles_dir.join(format!("{version}.bundle"))
    }

    pub fn restart_count(&self) -> u32 {
        self.restart_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

fn read_conditions(path: &Path) -> Option<DeviceConditions> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_conditions(path: &Path, conditions: &DeviceConditions) -> std::io::Result<()> {
    let serialized = serde_json::to_string_pretty(conditions)?;
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, serialized)?;
    fs::rename(&temp_path, path)
}

impl PlatformBridge for DiskBridge {
    fn native_version_info(&self) -> NativeVersionInfo {
        let conditions = self.conditions();
        NativeVersionInfo { app_version: conditions.app_version, build_number: conditions.build_number }
    }

    fn os_version(&self) -> String {
        self.conditions().os_version
    }

    fn save_bundle_atomic(&self, version: &str, bytes: &[u8]) -> Result<(), AgentError> {
        let final_path = self.bundle_path(version);
        let temp_path = final_path.with_extension("bundle.tmp");

        if let Err(error) = fs::write(&temp_path, bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(AgentError::Bridge(format!("failed to stage bundle {version}: {error}")));
        }
        fs::rename(&temp_path, &final_path).map_err(|error| {
            let _ = fs::remove_file(&temp_path);
            AgentError::Bridge(format!("failed to commit bundle {version}: {error}"))
        })
    }

    fn read_bundle_bytes(&self, version: &str) -> Result<Vec<u8>, AgentError> {
        fs::read(self.bundle_path(version))
            .map_err(|error| AgentError::Bridge(format!("bundle {version} unreadable: {error}")))
    }

    fn remove_bundle(&self, version: &str) -> Result<(), AgentError> {
        match fs::remove_file(self.bundle_path(version)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AgentError::Bridge(format!("failed to remove bundle {version}: {error}"))),
        }
    }

    fn restart_app(&self) {
        self.restart_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn battery_percent(&self) -> u8 {
        self.conditions().battery_percent
    }

    fn is_wifi(&self) -> bool {
        self.conditions().wifi
    }

    fn is_low_power_mode(&self) -> bool {
        self.conditions().low_power_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_round_trips_through_atomic_rename() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = DiskBridge::at(dir.path()).unwrap();

        bridge.save_bundle_atomic("1.2.0", b"hello-bundle").unwrap();
        assert_eq!(bridge.read_bundle_bytes("1.2.0").unwrap(), b"hello-bundle");

        bridge.remove_bundle("1.2.0").unwrap();
        assert!(bridge.read_bundle_bytes("1.2.0").is_err());
    }

    #[test]
    fn conditions_default_to_a_healthy_device() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = DiskBridge::at(dir.path()).unwrap();

        assert_eq!(bridge.battery_percent(), 100);
        assert!(bridge.is_wifi());
        assert!(!bridge.is_low_power_mode());
        assert_eq!(bridge.os_version(), "17.0");
    }

    #[test]
    fn update_conditions_persists_across_bridge_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let bridge = DiskBridge::at(dir.path()).unwrap();
            bridge.update_conditions(|c| c.app_version = "2.0.0".to_string()).unwrap();
        }
        let reopened = DiskBridge::at(dir.path()).unwrap();
        assert_eq!(reopened.native_version_info().app_version, "2.0.0");
    }

    #[test]
    fn os_version_persists_across_bridge_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let bridge = DiskBridge::at(dir.path()).unwrap();
            bridge.update_conditions(|c| c.os_version = "18.1".to_string()).unwrap();
        }
        let reopened = DiskBridge::at(dir.path()).unwrap();
        assert_eq!(reopened.os_version(), "18.1");
    }
}

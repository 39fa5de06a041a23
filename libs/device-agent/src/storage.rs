// [libs/device-agent/src/storage.rs]
/*!
 * APARATO: CONTRATO DE ALMACENAMIENTO SEMÁNTICO (§3, §4.6.1 paso 1)
 * RESPONSABILIDAD: LECTURA/ESCRITURA ATÓMICA DEL REGISTRO ÚNICO DE
 *    METADATA QUE EL DISPOSITIVO POSEE EN EXCLUSIVA
 *
 * La implementación mantiene una copia en memoria y escribe el
 * snapshot completo en cada mutación (§5): un fallo de escritura se
 * expone al llamador sin mutar la copia en memoria.
 */

use bundlenudge_domain_models::DeviceMetadata;

use crate::errors::AgentError;

pub trait Storage {
    /// Errores de lectura caen a defaults en el llamador (§4.6.1 paso 1);
    /// este método solo reporta el fallo, no decide la recuperación.
    fn load(&self) -> Result<Option<DeviceMetadata>, AgentError>;

    /// Errores de escritura son fatales para la inicialización.
    fn save(&self, metadata: &DeviceMetadata) -> Result<(), AgentError>;
}

/// Doble de pruebas: vive enteramente en memoria de proceso.
pub struct InMemoryStorage {
    slot: std::sync::Mutex<Option<DeviceMetadata>>,
}

impl InMemoryStorage {
    pub fn empty() -> Self {
        Self { slot: std::sync::Mutex::new(None) }
    }

    pub fn seeded(metadata: DeviceMetadata) -> Self {
        Self { slot: std::sync::Mutex::new(Some(metadata)) }
    }
}

impl Storage for InMemoryStorage {
    fn load(&self) -> Result<Option<DeviceMetadata>, AgentError> {
        Ok(self.slot.lock().expect("storage mutex poisoned").clone())
    }

    fn save(&self, metadata: &DeviceMetadata) -> Result<(), AgentError> {
        *self.slot.lock().expect("storage mutex poisoned") = Some(metadata.clone());
        Ok(())
    }
}

/// Implementación de referencia para el host de escritorio/CLI
/// (`device-simulator`): persiste un único archivo JSON en disco,
/// escrito completo en cada `save` (ver invariante de §5).
pub struct FileStorage {
    path: std::path::PathBuf,
}

impl FileStorage {
    pub fn at(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<DeviceMetadata>, AgentError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|error| AgentError::StorageRead(error.to_string())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AgentError::StorageRead(error.to_string())),
        }
    }

    fn save(&self, metadata: &DeviceMetadata) -> Result<(), AgentError> {
        let serialized =
            serde_json::to_string_pretty(metadata).map_err(|error| AgentError::StorageWrite(error.to_string()))?;
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, serialized).map_err(|error| AgentError::StorageWrite(error.to_string()))?;
        std::fs::rename(&temp_path, &self.path).map_err(|error| AgentError::StorageWrite(error.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_metadata() -> DeviceMetadata {
        let mut metadata = DeviceMetadata::default_with_fresh_id();
        metadata.device_id = Uuid::new_v4();
        metadata
    }

    #[test]
    fn in_memory_storage_round_trips() {
        let storage = InMemoryStorage::empty();
        assert!(storage.load().unwrap().is_none());

        let metadata = sample_metadata();
        storage.save(&metadata).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().device_id, metadata.device_id);
    }

    #[test]
    fn file_storage_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::at(dir.path().join("metadata.json"));
        assert!(storage.load().unwrap().is_none());

        let metadata = sample_metadata();
        storage.save(&metadata).unwrap();

        let reloaded = storage.load().unwrap().unwrap();
        assert_eq!(reloaded.device_id, metadata.device_id);
    }
}

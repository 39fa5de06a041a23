// [libs/infra/device-client/src/downloader.rs]
/*!
 * APARATO: BUNDLE INTEGRITY VERIFIER
 * RESPONSABILIDAD: CERTIFICACIÓN SHA-256 DE UN BUNDLE DESCARGADO (§4.6.2)
 *
 * Separado de `client.rs` para poder ejercitarse con bytes en memoria,
 * sin depender de un servidor HTTP real.
 */

use sha2::{Digest, Sha256};

use crate::errors::DeviceClientError;

/// Certifica que `bytes` hashea a `expected_hash_hex` (hex minúsculas,
/// sin prefijo de algoritmo). Falla cerrado: cualquier discrepancia
/// rechaza el bundle completo (§4.6.2, "never install a verified-corrupt bundle").
pub fn verify_bundle_integrity(bytes: &[u8], expected_hash_hex: &str) -> Result<(), DeviceClientError> {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let actual_hash_hex = hex::encode(hasher.finalize());

    if actual_hash_hex != expected_hash_hex.to_lowercase() {
        return Err(DeviceClientError::IntegrityFault {
            expected: expected_hash_hex.to_string(),
            actual: actual_hash_hex,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_hash_passes() {
        let bytes = b"console.log('hello bundle')";
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = hex::encode(hasher.finalize());

        assert!(verify_bundle_integrity(bytes, &hash).is_ok());
    }

    #[test]
    fn mismatched_hash_is_rejected() {
        let bytes = b"console.log('hello bundle')";
        let wrong_hash = "0".repeat(64);

        let result = verify_bundle_integrity(bytes, &wrong_hash);
        assert!(matches!(result, Err(DeviceClientError::IntegrityFault { .. })));
    }

    #[test]
    fn hash_comparison_is_case_insensitive() {
        let bytes = b"case insensitivity check";
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash_upper = hex::encode(hasher.finalize()).to_uppercase();

        assert!(verify_bundle_integrity(bytes, &hash_upper).is_ok());
    }
}

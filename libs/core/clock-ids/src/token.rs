// [libs/core/clock-ids/src/token.rs]
/*!
 * APARATO: CODEC DE DEVICE-TOKEN (§6)
 * CLASIFICACIÓN: CORE (ESTRATO L1)
 * RESPONSABILIDAD: EMISIÓN Y VERIFICACIÓN DE UN TOKEN JWT-LIKE HS256
 *
 * Payload: `{deviceId, appId, bundleId, platform, iat, exp}`. A
 * diferencia del decodificador de JWT de terceros que este código
 * históricamente usaba para credenciales ajenas (que solo leía el
 * payload sin verificar firma), este codec firma y verifica con HMAC-
 * SHA256 sobre un secreto del servidor, porque el propio servidor es
 * quien emite estas credenciales.
 *
 * # Mathematical Proof (Tamper Evidence):
 * Cualquier modificación de header o payload invalida la firma HMAC,
 * ya que esta se computa sobre la concatenación exacta de ambos
 * segmentos codificados; una comparación de igualdad de bytes sobre la
 * firma recomputada detecta cualquier desviación de un solo bit.
 */

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::clock::Clock;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("[INVALID_TOKEN]: malformed token structure")]
    Malformed,
    #[error("[INVALID_TOKEN]: signature verification failed")]
    BadSignature,
    #[error("[TOKEN_EXPIRED]: token expired at {exp}")]
    Expired { exp: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: &'static str,
    typ: &'static str,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256",
            typ: "JWT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceTokenClaims {
    pub device_id: Uuid,
    pub app_id: Uuid,
    pub bundle_id: String,
    pub platform: String,
    pub iat: i64,
    pub exp: i64,
}

/// Emisor/verificador de device-tokens, parametrizado por el secreto del
/// servidor. 30 días de TTL por defecto, con una ventana de refresco de
/// 7 días (§6) dejada a criterio de la capa que llama a `issue`.
pub struct DeviceTokenCodec {
    secret: Vec<u8>,
}

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
pub const REFRESH_WINDOW_SECONDS: i64 = 7 * 24 * 60 * 60;

impl DeviceTokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(
        &self,
        clock: &dyn Clock,
        device_id: Uuid,
        app_id: Uuid,
        bundle_id: &str,
        platform: &str,
        ttl_seconds: i64,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let now = clock.now();
        let exp = now + chrono::Duration::seconds(ttl_seconds);
        let claims = DeviceTokenClaims {
            device_id,
            app_id,
            bundle_id: bundle_id.to_string(),
            platform: platform.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let token = self.encode(&claims)?;
        Ok((token, exp))
    }

    fn encode(&self, claims: &DeviceTokenClaims) -> Result<String, TokenError> {
        let header_segment = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&TokenHeader::default()).map_err(|_| TokenError::Malformed)?,
        );
        let payload_segment =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?);
        let signing_input = format!("{header_segment}.{payload_segment}");
        let signature_segment = self.sign(signing_input.as_bytes());
        Ok(format!("{signing_input}.{signature_segment}"))
    }

    fn sign(&self, signing_input: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(signing_input);
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Verifica firma y `exp > now`. Firmas inválidas o desconocidas
    /// retornan `INVALID_TOKEN`; tokens expirados retornan
    /// `TOKEN_EXPIRED` — ambos distinguibles para el caller (§6, §7).
    pub fn verify(&self, clock: &dyn Clock, token: &str) -> Result<DeviceTokenClaims, TokenError> {
        let mut segments = token.split('.');
        let (header_segment, payload_segment, signature_segment) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(TokenError::Malformed),
        };

        let signing_input = format!("{header_segment}.{payload_segment}");
        let expected_signature = self.sign(signing_input.as_bytes());
        if !constant_time_eq(expected_signature.as_bytes(), signature_segment.as_bytes()) {
            return Err(TokenError::BadSignature);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_segment)
            .map_err(|_| TokenError::Malformed)?;
        let claims: DeviceTokenClaims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= clock.now().timestamp() {
            return Err(TokenError::Expired { exp: claims.exp });
        }

        Ok(claims)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FixedClock;

    #[test]
    fn round_trips_valid_claims() {
        let clock = FixedClock::new(Utc::now());
        let codec = DeviceTokenCodec::new(b"test-secret".to_vec());
        let device_id = Uuid::new_v4();
        let app_id = Uuid::new_v4();

        let (token, _exp) = codec
            .issue(&clock, device_id, app_id, "com.example.app", "ios", DEFAULT_TOKEN_TTL_SECONDS)
            .expect("issue succeeds");

        let claims = codec.verify(&clock, &token).expect("verify succeeds");
        assert_eq!(claims.device_id, device_id);
        assert_eq!(claims.app_id, app_id);
        assert_eq!(claims.platform, "ios");
    }

    #[test]
    fn rejects_tampered_payload() {
        let clock = FixedClock::new(Utc::now());
        let codec = DeviceTokenCodec::new(b"test-secret".to_vec());
        let (token, _) = codec
            .issue(&clock, Uuid::new_v4(), Uuid::new_v4(), "com.example.app", "android", DEFAULT_TOKEN_TTL_SECONDS)
            .unwrap();

        let mut segments: Vec<&str> = token.split('.').collect();
        let tampered_payload = URL_SAFE_NO_PAD.encode(b"{\"device_id\":\"00000000-0000-0000-0000-000000000000\"}");
        segments[1] = &tampered_payload;
        let tampered = segments.join(".");

        assert_eq!(codec.verify(&clock, &tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn rejects_wrong_secret() {
        let clock = FixedClock::new(Utc::now());
        let issuer = DeviceTokenCodec::new(b"secret-a".to_vec());
        let verifier = DeviceTokenCodec::new(b"secret-b".to_vec());
        let (token, _) = issuer
            .issue(&clock, Uuid::new_v4(), Uuid::new_v4(), "com.example.app", "ios", DEFAULT_TOKEN_TTL_SECONDS)
            .unwrap();

        assert_eq!(verifier.verify(&clock, &token), Err(TokenError::BadSignature));
    }

    #[test]
    fn expired_token_is_distinguished_from_bad_signature() {
        let clock = FixedClock::new(Utc::now());
        let codec = DeviceTokenCodec::new(b"test-secret".to_vec());
        let (token, _) = codec
            .issue(&clock, Uuid::new_v4(), Uuid::new_v4(), "com.example.app", "ios", 10)
            .unwrap();

        clock.advance(chrono::Duration::seconds(11));

        match codec.verify(&clock, &token) {
            Err(TokenError::Expired { .. }) => {}
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[test]
    fn malformed_token_is_rejected() {
        let clock = FixedClock::new(Utc::now());
        let codec = DeviceTokenCodec::new(b"test-secret".to_vec());
        assert_eq!(codec.verify(&clock, "not-a-token"), Err(TokenError::Malformed));
    }
}

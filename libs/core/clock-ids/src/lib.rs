// [libs/core/clock-ids/src/lib.rs]
/*!
 * APARATO: RELOJ, IDENTIDAD Y DEVICE-TOKEN (C1)
 * CLASIFICACIÓN: CORE (ESTRATO L1)
 * RESPONSABILIDAD: ABSTRACCIÓN TEMPORAL, ACUÑACIÓN DE IDS OPACOS Y
 *    CODIFICACIÓN/VERIFICACIÓN DEL TOKEN DE DISPOSITIVO
 */

pub mod clock;
pub mod ids;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use ids::mint_opaque_id;
pub use token::{DeviceTokenClaims, DeviceTokenCodec, TokenError};

#[cfg(any(test, feature = "test-util"))]
pub use clock::test_support;

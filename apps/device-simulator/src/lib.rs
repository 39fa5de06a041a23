// [apps/device-simulator/src/lib.rs]
/*!
 * APARATO: LIBRERÍA DEL SIMULADOR DE DISPOSITIVO
 * CLASIFICACIÓN: REFERENCE HOST (ESTRATO L4 — CLI)
 * RESPONSABILIDAD: EXPONE EL PUENTE DE PLATAFORMA Y LOS CALLBACKS QUE
 *    `src/main.rs` ENSAMBLA SOBRE `bundlenudge-device-agent`, PARA QUE
 *    AMBOS SEAN AUDITABLES SIN PASAR POR EL SHELL DE CLI (§9)
 */

pub mod callbacks;
pub mod disk_bridge;
pub mod last_offer;

pub use callbacks::PrintingCallbacks;
pub use disk_bridge::{DeviceConditions, DiskBridge};
pub use last_offer::LastOffer;

// [apps/orchestrator/src/handlers/mod.rs]
/*!
 * APARATO: ADAPTADORES HTTP DEL CONTROL-PLANE
 * RESPONSABILIDAD: AGRUPA LOS HANDLERS DE AXUM POR SUPERFICIE
 */

pub mod devices;
pub mod error;
pub mod health;
pub mod releases;
pub mod telemetry;
pub mod updates;

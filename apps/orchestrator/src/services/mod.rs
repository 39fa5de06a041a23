// [apps/orchestrator/src/services/mod.rs]
/*!
 * APARATO: CAPA DE SERVICIOS DE APLICACIÓN
 * RESPONSABILIDAD: AGRUPA LA LÓGICA QUE ORQUESTA REPOSITORIOS A TRAVÉS
 *    DE MÁS DE UNA LLAMADA, FUERA DE LOS HANDLERS HTTP
 */

pub mod health_sweep;
pub mod lifecycle;
pub mod telemetry_queue;

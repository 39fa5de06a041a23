// [libs/domain/health/src/lib.rs]
/*!
 * APARATO: AGREGADOR DE SALUD — LÓGICA PURA (C6)
 * CLASIFICACIÓN: DOMAIN (ESTRATO L2)
 * RESPONSABILIDAD: CONTADORES VENTANEADOS Y DISPARADOR DE AUTO-ROLLBACK,
 *    DESACOPLADOS DE LA PERSISTENCIA (la capa `infra-db` mantiene las
 *    filas; este crate decide qué significan los números).
 *
 * Postura fail-open: si el agregador no está disponible, los reportes
 * del dispositivo se pierden en lugar de reintentarse indefinidamente;
 * un reporte futuro re-establece los contadores (§4.4). Esta crate
 * nunca bloquea ni reintenta — solo computa.
 */

pub mod dedup;
pub mod trigger;

pub use dedup::ReportDeduplicator;
pub use trigger::{evaluate_rollback_trigger, HealthCounters};

pub use bundlenudge_domain_models::health::HealthAggregatorConfig;

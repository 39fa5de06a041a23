// [apps/orchestrator/src/lib.rs]
/*!
 * APARATO: ORCHESTRATOR LIBRARY ROOT
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL CONTROL-PLANE
 *    (RESOLUCIÓN DE ACTUALIZACIONES, FSM DE RELEASES, AGREGADOR DE
 *    SALUD) Y PRELUDIO PARA LA IGNICIÓN DESDE `main.rs`
 */

/// Conexión a base de datos, migración de esquema y verificación de
/// arranque (§5, §8).
pub mod bootstrap;
/// Adaptadores de entrada HTTP: dispositivos, actualizaciones, salud,
/// telemetría y superficie administrativa de releases (C9).
pub mod handlers;
/// Ignición del servidor: construye `AppState`, levanta los demonios
/// de fondo (C6, drenado de telemetría) y sirve el router de axum.
pub mod kernel;
/// Guardianes perimetrales: autenticación por token de dispositivo y
/// compuerta de mantenimiento.
pub mod middleware;
/// Topología de rutas bajo `/v1`.
pub mod routes;
/// Servicios de aplicación: ciclo de vida de releases (C5), barrido
/// del agregador de salud (C6) y cola de telemetría.
pub mod services;
/// Estado compartido del proceso: repositorios, caché de canal,
/// deduplicador de salud, reloj y codec de token.
pub mod state;

pub mod prelude {
    pub use crate::kernel::OrchestratorKernel;
    pub use crate::state::AppState;
}

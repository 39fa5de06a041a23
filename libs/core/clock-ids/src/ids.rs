// [libs/core/clock-ids/src/ids.rs]
/*!
 * APARATO: ACUÑACIÓN DE IDENTIDADES OPACAS (C1)
 * RESPONSABILIDAD: GENERACIÓN DE UUIDS V4 PARA APPS, CHANNELS, RELEASES
 */

use uuid::Uuid;

/// Acuña un nuevo id opaco (UUID v4). Centralizado en un solo punto para
/// que la estrategia de generación pueda endurecerse sin tocar cada
/// sitio de llamada.
pub fn mint_opaque_id() -> Uuid {
    Uuid::new_v4()
}

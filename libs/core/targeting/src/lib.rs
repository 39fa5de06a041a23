// [libs/core/targeting/src/lib.rs]
/*!
 * APARATO: EVALUADOR DE TARGETING (C3)
 * CLASIFICACIÓN: CORE (ESTRATO L1)
 * RESPONSABILIDAD: FUNCIÓN PURA `evaluate(constraints, device_ctx)`
 *
 * Sin I/O, sin estado compartido: dada la misma entrada, produce
 * siempre el mismo veredicto. Las reglas se evalúan en el orden
 * documentado; la primera que falla fija el motivo de inelegibilidad.
 */

use bundlenudge_domain_models::{Constraints, Platform};

pub mod version;

pub use version::compare_versions;

/// Contexto mínimo del dispositivo requerido para evaluar elegibilidad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    pub app_version: String,
    pub os_version: Option<String>,
    pub platform: Platform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ineligible {
    pub reason: String,
}

pub type EvaluationResult = Result<(), Ineligible>;

/// Evalúa las reglas de elegibilidad en el orden fijo descrito en §4.1.
/// Retorna `Ok(())` si el dispositivo es elegible, o `Err(Ineligible)`
/// con la razón de la primera regla que falla.
pub fn evaluate(constraints: &Constraints, device_ctx: &DeviceContext) -> EvaluationResult {
    // Regla 1: plataformas explícitas excluyen todo lo demás.
    if !constraints.platforms.is_empty() && !constraints.platforms.contains(&device_ctx.platform) {
        return Err(Ineligible {
            reason: format!("not available for {}", device_ctx.platform),
        });
    }

    // Regla 2: intervalo cerrado [min, max] cuando ambos límites están fijados.
    if let (Some(min), Some(max)) = (&constraints.min_app_version, &constraints.max_app_version) {
        if compare_versions(&device_ctx.app_version, min) < 0
            || compare_versions(&device_ctx.app_version, max) > 0
        {
            return Err(Ineligible {
                reason: format!(
                    "app version {} outside required range [{}, {}]",
                    device_ctx.app_version, min, max
                ),
            });
        }
        return Ok(());
    }

    // Regla 3: solo mínimo fijado.
    if let Some(min) = &constraints.min_app_version {
        if compare_versions(&device_ctx.app_version, min) < 0 {
            return Err(Ineligible {
                reason: format!("app version {} below minimum {}", device_ctx.app_version, min),
            });
        }
    }

    // Regla 4: solo máximo fijado.
    if let Some(max) = &constraints.max_app_version {
        if compare_versions(&device_ctx.app_version, max) > 0 {
            return Err(Ineligible {
                reason: format!("app version {} above maximum {}", device_ctx.app_version, max),
            });
        }
    }

    // Regla 5: versión mínima de SO.
    if let Some(min_os) = &constraints.min_os_version {
        let device_os = device_ctx.os_version.as_deref().unwrap_or("0");
        if compare_versions(device_os, min_os) < 0 {
            return Err(Ineligible {
                reason: format!("os version {device_os} below minimum {min_os}"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ctx(app_version: &str, platform: Platform) -> DeviceContext {
        DeviceContext {
            app_version: app_version.to_string(),
            os_version: None,
            platform,
        }
    }

    #[test]
    fn empty_constraints_are_always_eligible() {
        let constraints = Constraints::any_platform();
        assert!(evaluate(&constraints, &ctx("1.0.0", Platform::Ios)).is_ok());
    }

    #[test]
    fn platform_mismatch_is_ineligible() {
        let mut constraints = Constraints::any_platform();
        constraints.platforms = BTreeSet::from([Platform::Android]);
        let result = evaluate(&constraints, &ctx("1.0.0", Platform::Ios));
        assert!(result.is_err());
    }

    #[test]
    fn below_minimum_requires_store_update_reason() {
        let mut constraints = Constraints::any_platform();
        constraints.min_app_version = Some("3.0.0".to_string());
        let result = evaluate(&constraints, &ctx("2.5.0", Platform::Ios));
        assert!(result.is_err());
    }

    #[test]
    fn within_closed_interval_is_eligible() {
        let mut constraints = Constraints::any_platform();
        constraints.min_app_version = Some("1.0.0".to_string());
        constraints.max_app_version = Some("2.0.0".to_string());
        assert!(evaluate(&constraints, &ctx("1.5.0", Platform::Ios)).is_ok());
    }

    #[test]
    fn above_maximum_is_ineligible() {
        let mut constraints = Constraints::any_platform();
        constraints.min_app_version = Some("1.0.0".to_string());
        constraints.max_app_version = Some("2.0.0".to_string());
        assert!(evaluate(&constraints, &ctx("2.5.0", Platform::Ios)).is_err());
    }

    #[test]
    fn os_version_below_minimum_is_ineligible() {
        let mut constraints = Constraints::any_platform();
        constraints.min_os_version = Some("14.0".to_string());
        let mut device = ctx("1.0.0", Platform::Ios);
        device.os_version = Some("13.0".to_string());
        assert!(evaluate(&constraints, &device).is_err());
    }
}

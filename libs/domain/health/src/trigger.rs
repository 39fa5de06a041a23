// [libs/domain/health/src/trigger.rs]
/*!
 * APARATO: DISPARADOR DE AUTO-ROLLBACK (C6)
 * RESPONSABILIDAD: FUNCIÓN PURA QUE DECIDE SI UN RELEASE DEBE CAER
 *
 * Disparo: `activations >= min_sample` **y**
 * `failures / activations >= failure_threshold` (§4.4). Ambas
 * condiciones deben cumplirse; un release con pocas activaciones nunca
 * dispara aunque su tasa de fallas sea del 100%.
 */

use bundlenudge_domain_models::health::HealthAggregatorConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthCounters {
    pub failures: u64,
    pub activations: u64,
}

impl HealthCounters {
    pub fn failure_rate(&self) -> f64 {
        if self.activations == 0 {
            return 0.0;
        }
        self.failures as f64 / self.activations as f64
    }
}

/// Evalúa si el release debe transicionar a `rolled_back` con razón
/// `health_timeout`. Disparos simultáneos para el mismo release deben
/// coalescerse por el llamador (idempotencia de la transición FSM, no
/// de esta función).
pub fn evaluate_rollback_trigger(counters: HealthCounters, config: &HealthAggregatorConfig) -> bool {
    if counters.activations < u64::from(config.min_sample) {
        return false;
    }
    counters.failure_rate() >= config.failure_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HealthAggregatorConfig {
        HealthAggregatorConfig::default()
    }

    #[test]
    fn below_minimum_sample_never_triggers() {
        let counters = HealthCounters {
            failures: 49,
            activations: 49,
        };
        assert!(!evaluate_rollback_trigger(counters, &config()));
    }

    #[test]
    fn at_threshold_with_sufficient_sample_triggers() {
        let counters = HealthCounters {
            failures: 3,
            activations: 50,
        };
        assert!(evaluate_rollback_trigger(counters, &config()));
    }

    #[test]
    fn below_threshold_does_not_trigger() {
        let counters = HealthCounters {
            failures: 1,
            activations: 50,
        };
        assert!(!evaluate_rollback_trigger(counters, &config()));
    }

    #[test]
    fn zero_activations_never_triggers() {
        let counters = HealthCounters {
            failures: 0,
            activations: 0,
        };
        assert!(!evaluate_rollback_trigger(counters, &config()));
    }
}

// [libs/core/targeting/tests/evaluate_properties.rs]
//! Propiedad de totalidad del evaluador (§8 propiedad 3): para
//! cualquier combinación de restricciones y contexto de dispositivo,
//! `evaluate` termina y nunca entra en pánico.

use std::collections::BTreeSet;

use bundlenudge_core_targeting::{evaluate, DeviceContext};
use bundlenudge_domain_models::{Constraints, Platform};
use proptest::prelude::*;

fn arb_platform() -> impl Strategy<Value = Platform> {
    prop_oneof![Just(Platform::Ios), Just(Platform::Android)]
}

fn arb_version_component() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..50).prop_map(|n| n.to_string()),
        Just("beta".to_string()),
        Just("rc1".to_string()),
    ]
}

fn arb_version() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_version_component(), 1..4).prop_map(|parts| parts.join("."))
}

proptest! {
    #[test]
    fn evaluate_is_total_and_never_panics(
        platform in arb_platform(),
        device_version in arb_version(),
        min_version in proptest::option::of(arb_version()),
        max_version in proptest::option::of(arb_version()),
        restrict_platform in proptest::bool::ANY,
    ) {
        let mut constraints = Constraints::any_platform();
        if restrict_platform {
            constraints.platforms = BTreeSet::from([Platform::Ios]);
        }
        constraints.min_app_version = min_version;
        constraints.max_app_version = max_version;

        let device = DeviceContext {
            app_version: device_version,
            os_version: None,
            platform,
        };

        // The only property we need: it returns, it doesn't panic.
        let _ = evaluate(&constraints, &device);
    }

    #[test]
    fn platform_rule_is_always_checked_first(
        device_version in arb_version(),
    ) {
        let mut constraints = Constraints::any_platform();
        constraints.platforms = BTreeSet::from([Platform::Android]);
        constraints.min_app_version = Some("0.0.0".to_string());

        let device = DeviceContext {
            app_version: device_version,
            os_version: None,
            platform: Platform::Ios,
        };

        let outcome = evaluate(&constraints, &device);
        prop_assert!(outcome.is_err());
        prop_assert!(outcome.unwrap_err().reason.contains("not available for"));
    }
}

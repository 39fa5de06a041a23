// [libs/core/rollout/tests/uniformity.rs]
//! Propiedad de estabilidad/uniformidad del rollout (§8 propiedad 2):
//! sobre una muestra uniforme de ids de dispositivo de tamaño >= 10000,
//! la tasa de inclusión observada está dentro de ±1% del porcentaje
//! configurado.

use bundlenudge_core_rollout::is_included;
use uuid::Uuid;

#[test]
fn inclusion_rate_is_within_one_percent_over_ten_thousand_devices() {
    let release_id = Uuid::new_v4();
    let sample_size = 10_000;
    let rollout_percentage = 30u8;

    let included_count = (0..sample_size)
        .filter(|_| is_included(rollout_percentage, release_id, Uuid::new_v4()))
        .count();

    let observed_rate = included_count as f64 / sample_size as f64;
    let expected_rate = f64::from(rollout_percentage) / 100.0;

    assert!(
        (observed_rate - expected_rate).abs() <= 0.01,
        "observed {observed_rate}, expected {expected_rate}"
    );
}

#[test]
fn decision_is_stable_under_repeated_evaluation() {
    let release_id = Uuid::new_v4();
    let device_id = Uuid::new_v4();
    let first = is_included(42, release_id, device_id);
    for _ in 0..500 {
        assert_eq!(is_included(42, release_id, device_id), first);
    }
}

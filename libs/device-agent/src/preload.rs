// [libs/device-agent/src/preload.rs]
/*!
 * APARATO: COMPUERTAS DE PRECARGA EN SEGUNDO PLANO (§4.6.5)
 * RESPONSABILIDAD: DECIDIR SI LA DESCARGA ANTICIPADA DEBE EJECUTARSE
 *
 * Las compuertas se evalúan una sola vez al inicio de la precarga;
 * un cambio de condición a mitad de descarga no interrumpe nada
 * (explícitamente no requerido).
 */

use crate::bridge::PlatformBridge;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreloadConfig {
    pub wifi_only: bool,
    pub min_battery_percent: u8,
    pub respect_low_power_mode: bool,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            wifi_only: true,
            min_battery_percent: 20,
            respect_low_power_mode: true,
        }
    }
}

/// `Err` carries a human-readable reason; preload is then a no-op.
pub fn check_preload_gates(bridge: &dyn PlatformBridge, config: &PreloadConfig) -> Result<(), String> {
    if config.wifi_only && !bridge.is_wifi() {
        return Err("preload requires wifi, device is on a metered connection".to_string());
    }

    let battery = bridge.battery_percent();
    if battery < config.min_battery_percent {
        return Err(format!(
            "battery at {battery}% is below the minimum {}% required for preload",
            config.min_battery_percent
        ));
    }

    if config.respect_low_power_mode && bridge.is_low_power_mode() {
        return Err("device is in low-power mode".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::InMemoryBridge;
    use std::sync::atomic::Ordering;

    #[test]
    fn defaults_allow_preload_on_a_healthy_device() {
        let bridge = InMemoryBridge::new("1.0.0", "1");
        assert!(check_preload_gates(&bridge, &PreloadConfig::default()).is_ok());
    }

    #[test]
    fn cellular_connection_blocks_wifi_only_preload() {
        let bridge = InMemoryBridge::new("1.0.0", "1");
        bridge.wifi.store(false, Ordering::SeqCst);
        assert!(check_preload_gates(&bridge, &PreloadConfig::default()).is_err());
    }

    #[test]
    fn low_battery_blocks_preload() {
        let bridge = InMemoryBridge::new("1.0.0", "1");
        bridge.battery_percent.store(5, Ordering::SeqCst);
        assert!(check_preload_gates(&bridge, &PreloadConfig::default()).is_err());
    }

    #[test]
    fn low_power_mode_blocks_preload_when_respected() {
        let bridge = InMemoryBridge::new("1.0.0", "1");
        bridge.low_power_mode.store(true, Ordering::SeqCst);
        assert!(check_preload_gates(&bridge, &PreloadConfig::default()).is_err());

        let config = PreloadConfig { respect_low_power_mode: false, ..PreloadConfig::default() };
        assert!(check_preload_gates(&bridge, &config).is_ok());
    }
}

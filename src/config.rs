//! Connection and configuration blocks.
//!
//! These are plain serde-deserializable structs so call sites can keep
//! instrument settings in TOML alongside the rest of an experiment
//! configuration.

use serde::{Deserialize, Serialize};

use crate::types::PowerUnit;

/// Options passed to the driver when opening a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Query and verify the device identity during open.
    pub id_query: bool,
    /// Reset the device to its power-on defaults during open.
    pub reset: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            id_query: true,
            reset: true,
        }
    }
}

/// A block of optional settings applied to a connected meter in one call.
///
/// Unset fields leave the corresponding device setting untouched. See
/// [`crate::PowerMeter::apply_settings`] for the application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterSettings {
    /// Communication timeout in milliseconds. Must exceed the averaging
    /// time with some margin, or the driver itself times out during long
    /// measurements.
    pub timeout_ms: Option<u32>,
    /// Unit for power readings.
    pub power_unit: Option<PowerUnit>,
    /// Enable or disable automatic power ranging.
    pub auto_range: Option<bool>,
    /// Manual power range, in watts.
    pub power_range_w: Option<f64>,
    /// Correction wavelength, in nanometers.
    pub wavelength_nm: Option<f64>,
    /// Averaging time per reading, in seconds.
    pub average_time_s: Option<f64>,
    /// Reference value for relative power measurements.
    pub power_reference: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_default() {
        let options = ConnectOptions::default();
        assert!(options.id_query);
        assert!(options.reset);
    }

    #[test]
    fn test_meter_settings_from_toml() {
        let settings: MeterSettings = toml::from_str(
            r#"
            timeout_ms = 5000
            power_unit = "dbm"
            auto_range = false
            power_range_w = 1e-3
            wavelength_nm = 780.0
            average_time_s = 0.1
            "#,
        )
        .expect("settings block should deserialize");

        assert_eq!(settings.timeout_ms, Some(5000));
        assert_eq!(settings.power_unit, Some(PowerUnit::Dbm));
        assert_eq!(settings.auto_range, Some(false));
        assert_eq!(settings.wavelength_nm, Some(780.0));
        assert_eq!(settings.power_reference, None);
    }

    #[test]
    fn test_meter_settings_empty_block() {
        let settings: MeterSettings = toml::from_str("").expect("empty block is valid");
        assert_eq!(settings, MeterSettings::default());
    }
}

//! Value types shared across the power meter interface.
//!
//! Everything here is an immutable snapshot or a plain enum whose numeric
//! values are fixed by the driver ABI. None of these types hold a reference
//! back to the device; staleness is tied to the call that produced them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Selector for configuration getters that can report the current,
/// minimum, maximum or default value of a setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i16)]
pub enum Attribute {
    /// The currently configured value.
    #[default]
    Current = 0,
    /// The smallest value the device accepts.
    Minimum = 1,
    /// The largest value the device accepts.
    Maximum = 2,
    /// The device's power-on default.
    Default = 3,
}

impl Attribute {
    /// Raw selector value passed to the driver.
    pub fn as_raw(self) -> i16 {
        self as i16
    }
}

/// Unit in which power readings are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum PowerUnit {
    /// Watts.
    #[default]
    Watt = 0,
    /// Decibel-milliwatts.
    Dbm = 1,
}

impl PowerUnit {
    /// Convert from the raw driver value, falling back to watts for
    /// values outside the documented set.
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            1 => PowerUnit::Dbm,
            _ => PowerUnit::Watt,
        }
    }

    /// Raw value passed to the driver.
    pub fn as_raw(self) -> i16 {
        self as i16
    }

    /// Display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUnit::Watt => "W",
            PowerUnit::Dbm => "dBm",
        }
    }
}

/// Detector technology of the attached sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum SensorType {
    /// No sensor attached.
    None = 0,
    /// Photodiode detector.
    Photodiode = 1,
    /// Thermopile detector.
    Thermal = 2,
    /// Pyroelectric detector.
    Pyroelectric = 3,
}

impl SensorType {
    /// Convert from the raw driver value, falling back to `None` for
    /// values outside the documented set.
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            1 => SensorType::Photodiode,
            2 => SensorType::Thermal,
            3 => SensorType::Pyroelectric,
            _ => SensorType::None,
        }
    }

    /// Raw value as used by the driver.
    pub fn as_raw(self) -> i16 {
        self as i16
    }
}

/// Mechanical/optical variant of the attached sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum SensorSubtype {
    /// No subtype reported.
    None = 0,
    /// Adapter for a customer-supplied detector.
    Adapter = 1,
    /// Standard sensor head.
    Standard = 2,
    /// Standard head with integrated filter.
    FilterStd = 3,
    /// Standard head with integrated temperature sensor.
    StandardT = 0x12,
}

impl SensorSubtype {
    /// Convert from the raw driver value, falling back to `None` for
    /// values outside the documented set.
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            1 => SensorSubtype::Adapter,
            2 => SensorSubtype::Standard,
            3 => SensorSubtype::FilterStd,
            0x12 => SensorSubtype::StandardT,
            _ => SensorSubtype::None,
        }
    }

    /// Raw value as used by the driver.
    pub fn as_raw(self) -> i16 {
        self as i16
    }
}

bitflags! {
    /// Capability flags reported for the attached sensor.
    ///
    /// Numeric values are fixed by the driver ABI.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SensorFlags: u16 {
        /// Sensor measures optical power.
        const IS_POWER = 0x0001;
        /// Sensor measures pulse energy.
        const IS_ENERGY = 0x0002;
        /// Responsivity can be set by the user.
        const RESPONSIVITY_SETTABLE = 0x0010;
        /// Correction wavelength can be set by the user.
        const WAVELENGTH_SETTABLE = 0x0020;
        /// Time constant tau can be set by the user.
        const TAU_SETTABLE = 0x0040;
        /// Sensor head carries a temperature sensor.
        const HAS_TEMPERATURE_SENSOR = 0x0100;
    }
}

/// State of the driver-internal dark adjustment procedure.
///
/// Completion is observed only by polling; the driver offers no push
/// notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum DarkAdjustState {
    /// No adjustment in progress.
    Idle = 0,
    /// Adjustment running; poll again later.
    Running = 1,
}

impl DarkAdjustState {
    /// Convert from the raw driver value; any nonzero value counts as
    /// running.
    pub fn from_raw(raw: i16) -> Self {
        if raw == 0 {
            DarkAdjustState::Idle
        } else {
            DarkAdjustState::Running
        }
    }

    /// True once the procedure has finished or was cancelled.
    pub fn is_idle(self) -> bool {
        self == DarkAdjustState::Idle
    }
}

/// Snapshot of one discovered device at enumeration time.
///
/// Produced by [`crate::TlpmLibrary::resource_info`]; stale once resources
/// are enumerated again.
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    /// Device model name.
    pub model_name: String,
    /// Device serial number.
    pub serial_number: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Whether the device is free to be opened.
    pub available: bool,
}

/// Identity and capability descriptor of the attached sensor.
#[derive(Debug, Clone)]
pub struct SensorInfo {
    /// Sensor head name.
    pub name: String,
    /// Sensor serial number.
    pub serial_number: String,
    /// Calibration message stored on the sensor.
    pub calibration_message: String,
    /// Detector technology.
    pub sensor_type: SensorType,
    /// Mechanical/optical variant.
    pub subtype: SensorSubtype,
    /// Capability flags.
    pub flags: SensorFlags,
}

impl SensorInfo {
    /// Whether the sensor measures optical power.
    pub fn is_power_sensor(&self) -> bool {
        self.flags.contains(SensorFlags::IS_POWER)
    }

    /// Whether the sensor measures pulse energy.
    ///
    /// Dark adjustment is not supported on energy sensors; the driver
    /// reports a failure when it is started on one.
    pub fn is_energy_sensor(&self) -> bool {
        self.flags.contains(SensorFlags::IS_ENERGY)
    }

    /// Whether the sensor head carries a temperature sensor.
    pub fn has_temperature_sensor(&self) -> bool {
        self.flags.contains(SensorFlags::HAS_TEMPERATURE_SENSOR)
    }
}

/// Header metadata for one power calibration slot (slots 1..=5).
#[derive(Debug, Clone)]
pub struct PowerCalibrationInfo {
    /// Serial number the calibration was recorded for.
    pub serial_number: String,
    /// Calibration date as stored in the device firmware.
    pub calibration_date: String,
    /// Number of wavelength/correction-factor pairs in the slot.
    pub point_count: u16,
    /// Author of the calibration.
    pub author: String,
    /// Sensor switch position code the calibration applies to.
    pub sensor_position: u16,
}

/// Wavelength/correction-factor pairs of one calibration slot.
///
/// The two vectors are parallel, in the order stored by the device, with
/// length equal to the point count obtained from the matching
/// [`PowerCalibrationInfo`] query.
#[derive(Debug, Clone)]
pub struct PowerCalibrationPoints {
    /// Wavelengths in nanometers.
    pub wavelengths_nm: Vec<f64>,
    /// Correction factor for each wavelength.
    pub correction_factors: Vec<f64>,
}

impl PowerCalibrationPoints {
    /// Number of calibration points.
    pub fn len(&self) -> usize {
        self.wavelengths_nm.len()
    }

    /// True when the slot holds no points.
    pub fn is_empty(&self) -> bool {
        self.wavelengths_nm.is_empty()
    }

    /// Iterate over `(wavelength_nm, correction_factor)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths_nm
            .iter()
            .copied()
            .zip(self.correction_factors.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_raw_values() {
        assert_eq!(Attribute::Current.as_raw(), 0);
        assert_eq!(Attribute::Minimum.as_raw(), 1);
        assert_eq!(Attribute::Maximum.as_raw(), 2);
        assert_eq!(Attribute::Default.as_raw(), 3);
    }

    #[test]
    fn test_power_unit_round_trip() {
        assert_eq!(PowerUnit::from_raw(0), PowerUnit::Watt);
        assert_eq!(PowerUnit::from_raw(1), PowerUnit::Dbm);
        assert_eq!(PowerUnit::from_raw(99), PowerUnit::Watt);
        assert_eq!(PowerUnit::Dbm.as_raw(), 1);
    }

    #[test]
    fn test_sensor_type_round_trip() {
        for t in [
            SensorType::None,
            SensorType::Photodiode,
            SensorType::Thermal,
            SensorType::Pyroelectric,
        ] {
            assert_eq!(SensorType::from_raw(t.as_raw()), t);
        }
        assert_eq!(SensorType::from_raw(42), SensorType::None);
    }

    #[test]
    fn test_sensor_subtype_standard_t_value() {
        assert_eq!(SensorSubtype::StandardT.as_raw(), 0x12);
        assert_eq!(SensorSubtype::from_raw(0x12), SensorSubtype::StandardT);
    }

    #[test]
    fn test_sensor_flags_values() {
        assert_eq!(SensorFlags::IS_POWER.bits(), 0x0001);
        assert_eq!(SensorFlags::IS_ENERGY.bits(), 0x0002);
        assert_eq!(SensorFlags::RESPONSIVITY_SETTABLE.bits(), 0x0010);
        assert_eq!(SensorFlags::WAVELENGTH_SETTABLE.bits(), 0x0020);
        assert_eq!(SensorFlags::TAU_SETTABLE.bits(), 0x0040);
        assert_eq!(SensorFlags::HAS_TEMPERATURE_SENSOR.bits(), 0x0100);
    }

    #[test]
    fn test_dark_adjust_state() {
        assert_eq!(DarkAdjustState::from_raw(0), DarkAdjustState::Idle);
        assert_eq!(DarkAdjustState::from_raw(1), DarkAdjustState::Running);
        assert!(DarkAdjustState::Idle.is_idle());
        assert!(!DarkAdjustState::Running.is_idle());
    }

    #[test]
    fn test_calibration_points_pairing() {
        let points = PowerCalibrationPoints {
            wavelengths_nm: vec![450.0, 532.0, 633.0],
            correction_factors: vec![0.98, 1.0, 1.02],
        };
        assert_eq!(points.len(), 3);
        let pairs: Vec<_> = points.points().collect();
        assert_eq!(pairs[1], (532.0, 1.0));
    }
}

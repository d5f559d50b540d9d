//! Simulated driver for tests and demos.
//!
//! [`SimDriver`] implements [`RawDriver`] over an in-memory device farm:
//! the same status-code and buffer semantics as the vendor library, but
//! deterministic and hardware-free. The wrapper layer above it cannot tell
//! the difference, so every marshaling and error-conversion path can be
//! exercised in CI.
//!
//! The simulator also counts close calls and live sessions so tests can
//! verify that the scoped-acquisition helper never leaks a handle.

use std::collections::HashMap;
use std::ffi::CStr;

use parking_lot::Mutex;

use crate::driver::{ErrorBuffer, RawDriver, StringBuffer};
use crate::types::{SensorFlags, SensorSubtype, SensorType};

/// Status: session handle is unknown to the simulator.
pub const ERR_INVALID_SESSION: i32 = -101;
/// Status: resource index past the last enumeration.
pub const ERR_INVALID_INDEX: i32 = -102;
/// Status: no resource with the given name.
pub const ERR_RESOURCE_NOT_FOUND: i32 = -103;
/// Status: resource already opened or marked unavailable.
pub const ERR_RESOURCE_BUSY: i32 = -104;
/// Status: the attached sensor does not support the function.
pub const ERR_NOT_SUPPORTED: i32 = -105;
/// Status: a parameter value is outside the accepted domain.
pub const ERR_INVALID_PARAMETER: i32 = -106;
/// Status: calibration slot index outside 1..=5.
pub const ERR_INVALID_SLOT: i32 = -107;

/// One stored power calibration slot of a simulated device.
#[derive(Debug, Clone)]
pub struct SimCalibrationSlot {
    /// Serial number recorded with the calibration.
    pub serial_number: String,
    /// Calibration date string.
    pub calibration_date: String,
    /// Calibration author.
    pub author: String,
    /// Sensor switch position code.
    pub sensor_position: u16,
    /// `(wavelength_nm, correction_factor)` pairs.
    pub points: Vec<(f64, f64)>,
}

/// Static description of one simulated device.
#[derive(Debug, Clone)]
pub struct SimResource {
    /// VISA-style resource name.
    pub name: String,
    /// Device serial number.
    pub serial_number: String,
    /// Manufacturer string.
    pub manufacturer: String,
    /// Whether the device can be opened.
    pub available: bool,
    /// Sensor head name.
    pub sensor_name: String,
    /// Sensor serial number.
    pub sensor_serial: String,
    /// Calibration message stored on the sensor.
    pub calibration_message: String,
    /// Detector technology.
    pub sensor_type: SensorType,
    /// Sensor variant.
    pub sensor_subtype: SensorSubtype,
    /// Capability flags.
    pub sensor_flags: SensorFlags,
    /// How many state polls a dark adjustment takes before it completes.
    pub dark_adjust_polls: u32,
    /// Optical power the simulated detector sees, in watts.
    pub power_w: f64,
    /// Stored calibration slots (at most 5).
    pub calibration_slots: Vec<SimCalibrationSlot>,
}

impl SimResource {
    /// A power meter with a standard photodiode head.
    pub fn photodiode(name: impl Into<String>, serial_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial_number: serial_number.into(),
            manufacturer: "Thorlabs".to_string(),
            available: true,
            sensor_name: "S121C".to_string(),
            sensor_serial: "190115xx".to_string(),
            calibration_message: "CAL 2025-01-15".to_string(),
            sensor_type: SensorType::Photodiode,
            sensor_subtype: SensorSubtype::Standard,
            sensor_flags: SensorFlags::IS_POWER
                | SensorFlags::WAVELENGTH_SETTABLE
                | SensorFlags::RESPONSIVITY_SETTABLE,
            dark_adjust_polls: 3,
            power_w: 1.23e-3,
            calibration_slots: Vec::new(),
        }
    }

    /// A power meter with a pyroelectric energy head attached.
    ///
    /// Dark adjustment fails on this device, as it does on real hardware.
    pub fn energy_sensor(name: impl Into<String>, serial_number: impl Into<String>) -> Self {
        Self {
            sensor_name: "ES111C".to_string(),
            sensor_type: SensorType::Pyroelectric,
            sensor_flags: SensorFlags::IS_ENERGY | SensorFlags::WAVELENGTH_SETTABLE,
            ..Self::photodiode(name, serial_number)
        }
    }

    /// Mark the device as in use by another process.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Set the number of polls a dark adjustment takes to complete.
    pub fn with_dark_adjust_polls(mut self, polls: u32) -> Self {
        self.dark_adjust_polls = polls;
        self
    }

    /// Set the optical power seen by the simulated detector.
    pub fn with_power(mut self, watts: f64) -> Self {
        self.power_w = watts;
        self
    }

    /// Append a calibration slot (first call fills slot 1, and so on).
    pub fn with_calibration_slot(mut self, slot: SimCalibrationSlot) -> Self {
        self.calibration_slots.push(slot);
        self
    }
}

/// A settable value with driver-style current/min/max/default attributes.
#[derive(Debug, Clone, Copy)]
struct Setting {
    current: f64,
    min: f64,
    max: f64,
    default: f64,
}

impl Setting {
    fn new(default: f64, min: f64, max: f64) -> Self {
        Self {
            current: default,
            min,
            max,
            default,
        }
    }

    fn get(&self, attribute: i16) -> Option<f64> {
        match attribute {
            0 => Some(self.current),
            1 => Some(self.min),
            2 => Some(self.max),
            3 => Some(self.default),
            _ => None,
        }
    }

    fn set_clamped(&mut self, value: f64) {
        self.current = value.clamp(self.min, self.max);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DarkAdjust {
    Idle,
    Running { polls_remaining: u32 },
}

/// Mutable per-device state, persistent across open/close cycles.
#[derive(Debug, Clone)]
struct DeviceState {
    open_session: Option<u32>,
    average_time_s: Setting,
    wavelength_nm: Setting,
    power_range_w: Setting,
    power_reference: Setting,
    auto_range: bool,
    unit: i16,
    timeout_ms: u32,
    dark: DarkAdjust,
    dark_offset_w: f64,
}

impl DeviceState {
    fn for_resource(resource: &SimResource) -> Self {
        let wavelength = match resource.sensor_type {
            SensorType::Thermal | SensorType::Pyroelectric => Setting::new(1064.0, 250.0, 10600.0),
            _ => Setting::new(633.0, 400.0, 1100.0),
        };
        Self {
            open_session: None,
            average_time_s: Setting::new(1e-3, 1e-4, 10.0),
            wavelength_nm: wavelength,
            power_range_w: Setting::new(1e-3, 1e-6, 1.0),
            power_reference: Setting::new(0.0, -1.0, 1.0),
            auto_range: true,
            unit: 0,
            timeout_ms: 1000,
            dark: DarkAdjust::Idle,
            dark_offset_w: 0.0,
        }
    }
}

struct SimState {
    resources: Vec<SimResource>,
    devices: Vec<DeviceState>,
    sessions: HashMap<u32, usize>,
    next_session: u32,
    close_calls: usize,
}

/// In-memory implementation of the driver entry points.
pub struct SimDriver {
    state: Mutex<SimState>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// An empty simulator with no attached devices.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                resources: Vec::new(),
                devices: Vec::new(),
                sessions: HashMap::new(),
                next_session: 1,
                close_calls: 0,
            }),
        }
    }

    /// A simulator with one calibrated photodiode power meter attached.
    pub fn with_default_meter() -> Self {
        Self::new().with_resource(
            SimResource::photodiode("USB0::0x1313::0x8078::P0012345::INSTR", "P0012345")
                .with_calibration_slot(SimCalibrationSlot {
                    serial_number: "P0012345".to_string(),
                    calibration_date: "2025-01-15".to_string(),
                    author: "factory".to_string(),
                    sensor_position: 1,
                    points: vec![
                        (450.0, 0.97),
                        (532.0, 0.99),
                        (633.0, 1.00),
                        (780.0, 1.02),
                        (1064.0, 1.05),
                    ],
                }),
        )
    }

    /// Attach a device to the simulator.
    pub fn with_resource(self, resource: SimResource) -> Self {
        {
            let mut state = self.state.lock();
            let device = DeviceState::for_resource(&resource);
            state.resources.push(resource);
            state.devices.push(device);
        }
        self
    }

    /// Number of sessions currently open.
    pub fn open_session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Total number of close calls the simulator has seen.
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    /// Message text for a simulator status code.
    pub fn error_text(code: i32) -> &'static str {
        match code {
            0 => "No error",
            ERR_INVALID_SESSION => "Invalid session handle",
            ERR_INVALID_INDEX => "Resource index out of range",
            ERR_RESOURCE_NOT_FOUND => "Resource not found",
            ERR_RESOURCE_BUSY => "Resource is in use",
            ERR_NOT_SUPPORTED => "Function not supported by the attached sensor",
            ERR_INVALID_PARAMETER => "Parameter value out of range",
            ERR_INVALID_SLOT => "Calibration slot index out of range",
            _ => "Unknown status code",
        }
    }
}

/// Write `text` into a fixed driver buffer: zero-fill, copy, always leave
/// a terminating NUL.
fn write_str(buf: &mut [u8], text: &str) {
    buf.fill(0);
    let n = text.len().min(buf.len().saturating_sub(1));
    buf[..n].copy_from_slice(&text.as_bytes()[..n]);
}

/// Round a requested range up to the next decade, the way real range
/// hardware quantizes, then clamp into the supported span.
fn quantize_range(value: f64, min: f64, max: f64) -> f64 {
    let value = value.clamp(min, max);
    let decade = 10f64.powi(value.log10().ceil() as i32);
    decade.clamp(min, max)
}

impl SimState {
    fn device_for(&mut self, session: u32) -> Option<usize> {
        self.sessions.get(&session).copied()
    }
}

impl RawDriver for SimDriver {
    fn find_rsrc(&self, _session: u32, count: &mut u32) -> i32 {
        *count = self.state.lock().resources.len() as u32;
        0
    }

    fn get_rsrc_name(&self, _session: u32, index: u32, name: &mut StringBuffer) -> i32 {
        let state = self.state.lock();
        match state.resources.get(index as usize) {
            Some(resource) => {
                write_str(name, &resource.name);
                0
            }
            None => ERR_INVALID_INDEX,
        }
    }

    fn get_rsrc_info(
        &self,
        _session: u32,
        index: u32,
        model_name: &mut StringBuffer,
        serial_number: &mut StringBuffer,
        manufacturer: &mut StringBuffer,
        available: &mut bool,
    ) -> i32 {
        let state = self.state.lock();
        match state.resources.get(index as usize) {
            Some(resource) => {
                write_str(model_name, "PM100D");
                write_str(serial_number, &resource.serial_number);
                write_str(manufacturer, &resource.manufacturer);
                *available = resource.available;
                0
            }
            None => ERR_INVALID_INDEX,
        }
    }

    fn init(&self, resource: &CStr, _id_query: bool, reset: bool, session: &mut u32) -> i32 {
        let name = resource.to_string_lossy();
        let mut state = self.state.lock();
        let Some(index) = state.resources.iter().position(|r| r.name == name) else {
            return ERR_RESOURCE_NOT_FOUND;
        };
        if !state.resources[index].available || state.devices[index].open_session.is_some() {
            return ERR_RESOURCE_BUSY;
        }
        if reset {
            let resource = state.resources[index].clone();
            state.devices[index] = DeviceState::for_resource(&resource);
        }
        let handle = state.next_session;
        state.next_session += 1;
        state.devices[index].open_session = Some(handle);
        state.sessions.insert(handle, index);
        *session = handle;
        0
    }

    fn close(&self, session: u32) -> i32 {
        let mut state = self.state.lock();
        state.close_calls += 1;
        match state.sessions.remove(&session) {
            Some(index) => {
                state.devices[index].open_session = None;
                0
            }
            None => ERR_INVALID_SESSION,
        }
    }

    fn error_message(&self, _session: u32, status: i32, description: &mut ErrorBuffer) -> i32 {
        write_str(description, Self::error_text(status));
        0
    }

    fn meas_power(&self, session: u32, power: &mut f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        let watts = state.resources[index].power_w - state.devices[index].dark_offset_w;
        *power = match state.devices[index].unit {
            1 => 10.0 * (watts / 1e-3).log10(),
            _ => watts,
        };
        0
    }

    fn set_avg_time(&self, session: u32, seconds: f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        state.devices[index].average_time_s.set_clamped(seconds);
        0
    }

    fn get_avg_time(&self, session: u32, attribute: i16, seconds: &mut f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        match state.devices[index].average_time_s.get(attribute) {
            Some(value) => {
                *seconds = value;
                0
            }
            None => ERR_INVALID_PARAMETER,
        }
    }

    fn set_wavelength(&self, session: u32, nanometers: f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        state.devices[index].wavelength_nm.set_clamped(nanometers);
        0
    }

    fn get_wavelength(&self, session: u32, attribute: i16, nanometers: &mut f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        match state.devices[index].wavelength_nm.get(attribute) {
            Some(value) => {
                *nanometers = value;
                0
            }
            None => ERR_INVALID_PARAMETER,
        }
    }

    fn set_power_range(&self, session: u32, watts: f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        if watts <= 0.0 {
            return ERR_INVALID_PARAMETER;
        }
        let range = &mut state.devices[index].power_range_w;
        range.current = quantize_range(watts, range.min, range.max);
        // Picking a manual range turns auto-ranging off, as on the device.
        state.devices[index].auto_range = false;
        0
    }

    fn get_power_range(&self, session: u32, attribute: i16, watts: &mut f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        match state.devices[index].power_range_w.get(attribute) {
            Some(value) => {
                *watts = value;
                0
            }
            None => ERR_INVALID_PARAMETER,
        }
    }

    fn set_power_auto_range(&self, session: u32, enabled: bool) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        state.devices[index].auto_range = enabled;
        0
    }

    fn get_power_auto_range(&self, session: u32, enabled: &mut bool) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        *enabled = state.devices[index].auto_range;
        0
    }

    fn set_power_unit(&self, session: u32, unit: i16) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        if !(0..=1).contains(&unit) {
            return ERR_INVALID_PARAMETER;
        }
        state.devices[index].unit = unit;
        0
    }

    fn get_power_unit(&self, session: u32, unit: &mut i16) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        *unit = state.devices[index].unit;
        0
    }

    fn set_power_ref(&self, session: u32, value: f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        state.devices[index].power_reference.set_clamped(value);
        0
    }

    fn get_power_ref(&self, session: u32, attribute: i16, value: &mut f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        match state.devices[index].power_reference.get(attribute) {
            Some(v) => {
                *value = v;
                0
            }
            None => ERR_INVALID_PARAMETER,
        }
    }

    fn start_dark_adjust(&self, session: u32) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        if state.resources[index]
            .sensor_flags
            .contains(SensorFlags::IS_ENERGY)
        {
            return ERR_NOT_SUPPORTED;
        }
        let polls = state.resources[index].dark_adjust_polls;
        let device = &mut state.devices[index];
        if polls == 0 {
            device.dark = DarkAdjust::Idle;
            device.dark_offset_w = 2.5e-9;
        } else {
            device.dark = DarkAdjust::Running {
                polls_remaining: polls,
            };
        }
        0
    }

    fn cancel_dark_adjust(&self, session: u32) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        state.devices[index].dark = DarkAdjust::Idle;
        0
    }

    fn get_dark_adjust_state(&self, session: u32, out: &mut i16) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        let device = &mut state.devices[index];
        if let DarkAdjust::Running { polls_remaining } = device.dark {
            let polls_remaining = polls_remaining.saturating_sub(1);
            if polls_remaining == 0 {
                device.dark = DarkAdjust::Idle;
                device.dark_offset_w = 2.5e-9;
            } else {
                device.dark = DarkAdjust::Running { polls_remaining };
            }
        }
        *out = match device.dark {
            DarkAdjust::Idle => 0,
            DarkAdjust::Running { .. } => 1,
        };
        0
    }

    fn get_dark_offset(&self, session: u32, offset: &mut f64) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        *offset = state.devices[index].dark_offset_w;
        0
    }

    fn get_calibration_msg(&self, session: u32, message: &mut StringBuffer) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        write_str(message, &state.resources[index].calibration_message);
        0
    }

    fn get_sensor_info(
        &self,
        session: u32,
        name: &mut StringBuffer,
        serial_number: &mut StringBuffer,
        message: &mut StringBuffer,
        sensor_type: &mut i16,
        subtype: &mut i16,
        flags: &mut i16,
    ) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        let resource = &state.resources[index];
        write_str(name, &resource.sensor_name);
        write_str(serial_number, &resource.sensor_serial);
        write_str(message, &resource.calibration_message);
        *sensor_type = resource.sensor_type.as_raw();
        *subtype = resource.sensor_subtype.as_raw();
        *flags = resource.sensor_flags.bits() as i16;
        0
    }

    fn set_timeout_value(&self, session: u32, milliseconds: u32) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        state.devices[index].timeout_ms = milliseconds;
        0
    }

    fn get_timeout_value(&self, session: u32, milliseconds: &mut u32) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        *milliseconds = state.devices[index].timeout_ms;
        0
    }

    fn reinit_sensor(&self, session: u32) -> i32 {
        // The real driver blocks ~2 s here; the simulator completes
        // immediately.
        let mut state = self.state.lock();
        if state.device_for(session).is_none() {
            return ERR_INVALID_SESSION;
        }
        0
    }

    fn get_power_calibration_info(
        &self,
        session: u32,
        slot: u16,
        serial_number: &mut StringBuffer,
        calibration_date: &mut StringBuffer,
        point_count: &mut u16,
        author: &mut StringBuffer,
        sensor_position: &mut u16,
    ) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        if !(1..=5).contains(&slot) {
            return ERR_INVALID_SLOT;
        }
        match state.resources[index]
            .calibration_slots
            .get(slot as usize - 1)
        {
            Some(calibration) => {
                write_str(serial_number, &calibration.serial_number);
                write_str(calibration_date, &calibration.calibration_date);
                write_str(author, &calibration.author);
                *point_count = calibration.points.len() as u16;
                *sensor_position = calibration.sensor_position;
                0
            }
            None => ERR_INVALID_SLOT,
        }
    }

    fn get_power_calibration_points(
        &self,
        session: u32,
        slot: u16,
        count: u16,
        wavelengths: &mut [f64],
        factors: &mut [f64],
    ) -> i32 {
        let mut state = self.state.lock();
        let Some(index) = state.device_for(session) else {
            return ERR_INVALID_SESSION;
        };
        if !(1..=5).contains(&slot) {
            return ERR_INVALID_SLOT;
        }
        match state.resources[index]
            .calibration_slots
            .get(slot as usize - 1)
        {
            Some(calibration) => {
                // A mismatched count truncates, as the real driver does;
                // it is not reported as an error.
                let n = (count as usize)
                    .min(calibration.points.len())
                    .min(wavelengths.len())
                    .min(factors.len());
                for (i, &(wavelength, factor)) in calibration.points.iter().take(n).enumerate() {
                    wavelengths[i] = wavelength;
                    factors[i] = factor;
                }
                0
            }
            None => ERR_INVALID_SLOT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(driver: &SimDriver, name: &str) -> u32 {
        let resource = std::ffi::CString::new(name).expect("valid resource name");
        let mut session = 0;
        assert_eq!(driver.init(&resource, true, true, &mut session), 0);
        session
    }

    #[test]
    fn test_enumeration_and_open() {
        let driver = SimDriver::with_default_meter();
        let mut count = 0;
        assert_eq!(driver.find_rsrc(0, &mut count), 0);
        assert_eq!(count, 1);

        let mut name = [0u8; crate::driver::STRING_BUFFER_SIZE];
        assert_eq!(driver.get_rsrc_name(0, 0, &mut name), 0);
        assert_eq!(driver.get_rsrc_name(0, 1, &mut name), ERR_INVALID_INDEX);

        let session = open(&driver, "USB0::0x1313::0x8078::P0012345::INSTR");
        assert_eq!(driver.open_session_count(), 1);
        assert_eq!(driver.close(session), 0);
        assert_eq!(driver.open_session_count(), 0);
    }

    #[test]
    fn test_second_open_is_busy() {
        let driver = SimDriver::with_default_meter();
        let _session = open(&driver, "USB0::0x1313::0x8078::P0012345::INSTR");
        let resource =
            std::ffi::CString::new("USB0::0x1313::0x8078::P0012345::INSTR").expect("valid name");
        let mut second = 0;
        assert_eq!(
            driver.init(&resource, true, true, &mut second),
            ERR_RESOURCE_BUSY
        );
    }

    #[test]
    fn test_dark_adjust_poll_countdown() {
        let driver = SimDriver::new()
            .with_resource(SimResource::photodiode("SIM::1::INSTR", "X").with_dark_adjust_polls(2));
        let session = open(&driver, "SIM::1::INSTR");

        assert_eq!(driver.start_dark_adjust(session), 0);
        let mut state = -1;
        assert_eq!(driver.get_dark_adjust_state(session, &mut state), 0);
        assert_eq!(state, 1);
        assert_eq!(driver.get_dark_adjust_state(session, &mut state), 0);
        assert_eq!(state, 0);

        let mut offset = 0.0;
        assert_eq!(driver.get_dark_offset(session, &mut offset), 0);
        assert!(offset > 0.0);
    }

    #[test]
    fn test_dark_adjust_rejected_on_energy_sensor() {
        let driver =
            SimDriver::new().with_resource(SimResource::energy_sensor("SIM::2::INSTR", "E"));
        let session = open(&driver, "SIM::2::INSTR");
        assert_eq!(driver.start_dark_adjust(session), ERR_NOT_SUPPORTED);
    }

    #[test]
    fn test_range_quantizes_to_decade() {
        let driver = SimDriver::with_default_meter();
        let session = open(&driver, "USB0::0x1313::0x8078::P0012345::INSTR");
        assert_eq!(driver.set_power_range(session, 5e-4), 0);
        let mut range = 0.0;
        assert_eq!(driver.get_power_range(session, 0, &mut range), 0);
        assert!((range - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_dbm_unit_conversion() {
        let driver = SimDriver::new()
            .with_resource(SimResource::photodiode("SIM::3::INSTR", "D").with_power(1e-3));
        let session = open(&driver, "SIM::3::INSTR");
        assert_eq!(driver.set_power_unit(session, 1), 0);
        let mut reading = 0.0;
        assert_eq!(driver.meas_power(session, &mut reading), 0);
        assert!(reading.abs() < 1e-6, "1 mW should read as 0 dBm");
    }

    #[test]
    fn test_write_str_truncates_and_terminates() {
        let mut buf = [0xFFu8; 8];
        write_str(&mut buf, "0123456789");
        assert_eq!(&buf[..7], b"0123456");
        assert_eq!(buf[7], 0);
    }
}

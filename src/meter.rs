//! Safe wrapper around the driver: discovery, connection lifecycle and
//! per-device operations.
//!
//! [`TlpmLibrary`] is the construction point. It owns the driver backend
//! (real library or a test double) and performs the session-less discovery
//! calls. [`PowerMeter`] owns one open session and maps every per-device
//! entry point onto a typed method.
//!
//! # Threading
//!
//! Nothing here is internally concurrent. `measure_power`,
//! `reinit_sensor` and the dark-adjustment workflow block the calling
//! thread for the native duration. Run each device on its own thread if
//! concurrency is needed, and do not share one `PowerMeter` across threads
//! without external mutual exclusion.

use std::ffi::CString;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ConnectOptions, MeterSettings};
use crate::driver::{buffer_to_string, ErrorBuffer, RawDriver, StringBuffer};
use crate::error::{DriverError, Result};
use crate::native::NativeDriver;
use crate::types::{
    Attribute, DarkAdjustState, PowerCalibrationInfo, PowerCalibrationPoints, PowerUnit,
    ResourceInfo, SensorFlags, SensorInfo, SensorSubtype, SensorType,
};

/// Session value of a handle that is not connected.
const UNCONNECTED: u32 = 0;

/// Convert a driver status into a result, looking up the message text for
/// nonzero codes.
///
/// This is the single choke point for error conversion: every operation in
/// this module funnels its status through here.
fn check(driver: &dyn RawDriver, session: u32, status: i32) -> Result<()> {
    if status == 0 {
        return Ok(());
    }
    let mut description: ErrorBuffer = [0; crate::driver::ERROR_MESSAGE_BUFFER_SIZE];
    let message = if driver.error_message(session, status, &mut description) == 0 {
        buffer_to_string(&description)
    } else {
        "unrecognized driver status".to_string()
    };
    Err(DriverError::new(status, message))
}

/// Entry point to the power meter driver.
///
/// Holds the driver backend and exposes the discovery and connection
/// calls. The backend is chosen at construction time, so a simulated
/// driver can stand in for the vendor library without any global state.
#[derive(Clone)]
pub struct TlpmLibrary {
    driver: Arc<dyn RawDriver>,
}

impl TlpmLibrary {
    /// Use the installed vendor library.
    ///
    /// Calls panic at runtime unless the crate was built with the
    /// `hardware` feature and the driver is installed.
    pub fn native() -> Self {
        Self::with_driver(Arc::new(NativeDriver::new()))
    }

    /// Use an explicit driver backend (e.g. [`crate::sim::SimDriver`]).
    pub fn with_driver(driver: Arc<dyn RawDriver>) -> Self {
        Self { driver }
    }

    /// Number of attached devices found by the driver.
    ///
    /// Resource indices passed to [`resource_name`](Self::resource_name)
    /// and [`resource_info`](Self::resource_info) refer to this
    /// enumeration and go stale when it is repeated.
    pub fn find_resources(&self) -> Result<u32> {
        let mut count = 0;
        let status = self.driver.find_rsrc(UNCONNECTED, &mut count);
        check(self.driver.as_ref(), UNCONNECTED, status)?;
        debug!(count, "enumerated power meter resources");
        Ok(count)
    }

    /// Resource name of device `index` from the last enumeration.
    ///
    /// Indices at or past the enumerated count are not validated here;
    /// whatever status the driver returns is surfaced.
    pub fn resource_name(&self, index: u32) -> Result<String> {
        let mut name: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let status = self.driver.get_rsrc_name(UNCONNECTED, index, &mut name);
        check(self.driver.as_ref(), UNCONNECTED, status)?;
        Ok(buffer_to_string(&name))
    }

    /// Descriptive information for device `index` from the last
    /// enumeration.
    pub fn resource_info(&self, index: u32) -> Result<ResourceInfo> {
        let mut model_name: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut serial_number: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut manufacturer: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut available = false;
        let status = self.driver.get_rsrc_info(
            UNCONNECTED,
            index,
            &mut model_name,
            &mut serial_number,
            &mut manufacturer,
            &mut available,
        );
        check(self.driver.as_ref(), UNCONNECTED, status)?;
        Ok(ResourceInfo {
            model_name: buffer_to_string(&model_name),
            serial_number: buffer_to_string(&serial_number),
            manufacturer: buffer_to_string(&manufacturer),
            available,
        })
    }

    /// Open the device with the given resource name.
    pub fn connect(&self, resource: &str, options: ConnectOptions) -> Result<PowerMeter> {
        let c_resource =
            CString::new(resource).map_err(|_| DriverError::invalid_resource_name(resource))?;
        let mut session = UNCONNECTED;
        let status = self.driver.init(
            &c_resource,
            options.id_query,
            options.reset,
            &mut session,
        );
        check(self.driver.as_ref(), UNCONNECTED, status)?;
        info!(resource, session, "connected to power meter");
        Ok(PowerMeter {
            driver: Arc::clone(&self.driver),
            session,
            resource: resource.to_string(),
        })
    }

    /// Connect, run `op`, and disconnect on every exit path.
    ///
    /// The session is closed exactly once whether `op` succeeds, fails, or
    /// panics (the panic path closes through `PowerMeter`'s drop). Prefer
    /// this over manual connect/disconnect pairing in new call sites.
    ///
    /// An error from `op` takes precedence over a close failure; a close
    /// failure after a successful `op` is returned.
    pub fn with_meter<T, F>(&self, resource: &str, options: ConnectOptions, op: F) -> Result<T>
    where
        F: FnOnce(&PowerMeter) -> Result<T>,
    {
        let meter = self.connect(resource, options)?;
        let outcome = op(&meter);
        let closed = meter.disconnect();
        match outcome {
            Ok(value) => closed.map(|()| value),
            Err(err) => {
                if let Err(close_err) = closed {
                    warn!(
                        code = close_err.code,
                        message = %close_err.message,
                        "disconnect failed while unwinding an operation error"
                    );
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for TlpmLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlpmLibrary").finish_non_exhaustive()
    }
}

/// One open power meter session.
///
/// The raw session handle is valid only between a successful connect and
/// the matching disconnect. `disconnect` consumes the value, so calls on a
/// closed handle are unrepresentable; dropping without disconnecting
/// closes the session on a best-effort basis.
pub struct PowerMeter {
    driver: Arc<dyn RawDriver>,
    session: u32,
    resource: String,
}

impl PowerMeter {
    /// Raw driver session handle.
    pub fn session(&self) -> u32 {
        self.session
    }

    /// Resource name this meter was opened with.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    fn check(&self, status: i32) -> Result<()> {
        check(self.driver.as_ref(), self.session, status)
    }

    /// Close the session.
    pub fn disconnect(mut self) -> Result<()> {
        let session = self.session;
        self.session = UNCONNECTED; // suppress the drop-path close
        let status = self.driver.close(session);
        debug!(resource = %self.resource, session, "disconnected power meter");
        check(self.driver.as_ref(), session, status)
    }

    /// Trigger one power measurement and return the reading in the
    /// configured unit.
    ///
    /// Blocks the calling thread for up to the configured averaging time;
    /// no additional timeout is imposed beyond the driver's own
    /// communication timeout.
    pub fn measure_power(&self) -> Result<f64> {
        let mut power = 0.0;
        self.check(self.driver.meas_power(self.session, &mut power))?;
        Ok(power)
    }

    /// Set the averaging time per reading, in seconds.
    ///
    /// Directly bounds the latency of [`measure_power`](Self::measure_power).
    pub fn set_average_time(&self, seconds: f64) -> Result<()> {
        self.check(self.driver.set_avg_time(self.session, seconds))
    }

    /// Query the averaging time, in seconds.
    pub fn average_time(&self, attribute: Attribute) -> Result<f64> {
        let mut seconds = 0.0;
        self.check(
            self.driver
                .get_avg_time(self.session, attribute.as_raw(), &mut seconds),
        )?;
        Ok(seconds)
    }

    /// Set the correction wavelength, in nanometers.
    pub fn set_wavelength(&self, nanometers: f64) -> Result<()> {
        self.check(self.driver.set_wavelength(self.session, nanometers))
    }

    /// Query the correction wavelength, in nanometers.
    pub fn wavelength(&self, attribute: Attribute) -> Result<f64> {
        let mut nanometers = 0.0;
        self.check(
            self.driver
                .get_wavelength(self.session, attribute.as_raw(), &mut nanometers),
        )?;
        Ok(nanometers)
    }

    /// Set the manual power range to the most positive signal level
    /// expected, in watts. The device quantizes to the nearest range it
    /// supports.
    pub fn set_power_range(&self, watts: f64) -> Result<()> {
        self.check(self.driver.set_power_range(self.session, watts))
    }

    /// Query the power range, in watts.
    pub fn power_range(&self, attribute: Attribute) -> Result<f64> {
        let mut watts = 0.0;
        self.check(
            self.driver
                .get_power_range(self.session, attribute.as_raw(), &mut watts),
        )?;
        Ok(watts)
    }

    /// Enable or disable automatic power ranging.
    pub fn set_power_auto_range(&self, enabled: bool) -> Result<()> {
        self.check(self.driver.set_power_auto_range(self.session, enabled))
    }

    /// Query the automatic power ranging mode.
    pub fn power_auto_range(&self) -> Result<bool> {
        let mut enabled = false;
        self.check(self.driver.get_power_auto_range(self.session, &mut enabled))?;
        Ok(enabled)
    }

    /// Set the unit for power readings.
    pub fn set_power_unit(&self, unit: PowerUnit) -> Result<()> {
        self.check(self.driver.set_power_unit(self.session, unit.as_raw()))
    }

    /// Query the unit for power readings.
    pub fn power_unit(&self) -> Result<PowerUnit> {
        let mut raw = 0;
        self.check(self.driver.get_power_unit(self.session, &mut raw))?;
        Ok(PowerUnit::from_raw(raw))
    }

    /// Set the reference value for relative power measurements.
    pub fn set_power_reference(&self, value: f64) -> Result<()> {
        self.check(self.driver.set_power_ref(self.session, value))
    }

    /// Query the power reference value.
    pub fn power_reference(&self, attribute: Attribute) -> Result<f64> {
        let mut value = 0.0;
        self.check(
            self.driver
                .get_power_ref(self.session, attribute.as_raw(), &mut value),
        )?;
        Ok(value)
    }

    /// Start the dark adjustment procedure.
    ///
    /// Returns immediately; observe completion by polling
    /// [`dark_adjust_state`](Self::dark_adjust_state). Not supported on
    /// energy sensors; the driver's failure code is surfaced verbatim.
    pub fn start_dark_adjust(&self) -> Result<()> {
        info!(resource = %self.resource, "starting dark adjustment");
        self.check(self.driver.start_dark_adjust(self.session))
    }

    /// Cancel a running dark adjustment. Never invoked automatically.
    pub fn cancel_dark_adjust(&self) -> Result<()> {
        info!(resource = %self.resource, "cancelling dark adjustment");
        self.check(self.driver.cancel_dark_adjust(self.session))
    }

    /// Query the dark adjustment state.
    pub fn dark_adjust_state(&self) -> Result<DarkAdjustState> {
        let mut raw = 0;
        self.check(self.driver.get_dark_adjust_state(self.session, &mut raw))?;
        Ok(DarkAdjustState::from_raw(raw))
    }

    /// Query the dark offset determined by the last adjustment.
    pub fn dark_offset(&self) -> Result<f64> {
        let mut offset = 0.0;
        self.check(self.driver.get_dark_offset(self.session, &mut offset))?;
        Ok(offset)
    }

    /// Calibration message of the attached sensor.
    pub fn calibration_message(&self) -> Result<String> {
        let mut message: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        self.check(self.driver.get_calibration_msg(self.session, &mut message))?;
        Ok(buffer_to_string(&message))
    }

    /// Identity and capabilities of the attached sensor.
    pub fn sensor_info(&self) -> Result<SensorInfo> {
        let mut name: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut serial_number: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut message: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut sensor_type = 0;
        let mut subtype = 0;
        let mut flags = 0;
        self.check(self.driver.get_sensor_info(
            self.session,
            &mut name,
            &mut serial_number,
            &mut message,
            &mut sensor_type,
            &mut subtype,
            &mut flags,
        ))?;
        Ok(SensorInfo {
            name: buffer_to_string(&name),
            serial_number: buffer_to_string(&serial_number),
            calibration_message: buffer_to_string(&message),
            sensor_type: SensorType::from_raw(sensor_type),
            subtype: SensorSubtype::from_raw(subtype),
            flags: SensorFlags::from_bits_retain(flags as u16),
        })
    }

    /// Set the communication timeout, in milliseconds.
    ///
    /// Must exceed the averaging time with some margin before long
    /// measurements, or the driver itself times out.
    pub fn set_timeout_ms(&self, milliseconds: u32) -> Result<()> {
        self.check(self.driver.set_timeout_value(self.session, milliseconds))
    }

    /// Query the communication timeout, in milliseconds.
    pub fn timeout_ms(&self) -> Result<u32> {
        let mut milliseconds = 0;
        self.check(self.driver.get_timeout_value(self.session, &mut milliseconds))?;
        Ok(milliseconds)
    }

    /// Reconnect the sensor. Blocks roughly two seconds on real hardware.
    pub fn reinit_sensor(&self) -> Result<()> {
        info!(resource = %self.resource, "reinitializing sensor");
        self.check(self.driver.reinit_sensor(self.session))
    }

    /// Header metadata of power calibration slot `slot` (1..=5).
    pub fn power_calibration_info(&self, slot: u16) -> Result<PowerCalibrationInfo> {
        let mut serial_number: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut calibration_date: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut author: StringBuffer = [0; crate::driver::STRING_BUFFER_SIZE];
        let mut point_count = 0;
        let mut sensor_position = 0;
        self.check(self.driver.get_power_calibration_info(
            self.session,
            slot,
            &mut serial_number,
            &mut calibration_date,
            &mut point_count,
            &mut author,
            &mut sensor_position,
        ))?;
        Ok(PowerCalibrationInfo {
            serial_number: buffer_to_string(&serial_number),
            calibration_date: buffer_to_string(&calibration_date),
            point_count,
            author: buffer_to_string(&author),
            sensor_position,
        })
    }

    /// Wavelength/correction-factor pairs of calibration slot `slot`.
    ///
    /// `count` must equal the point count from the matching
    /// [`power_calibration_info`](Self::power_calibration_info) call;
    /// mismatched counts yield truncated data at the driver level. Exactly
    /// `count` pairs are returned.
    pub fn power_calibration_points(&self, slot: u16, count: u16) -> Result<PowerCalibrationPoints> {
        let mut wavelengths = vec![0.0; count as usize];
        let mut factors = vec![0.0; count as usize];
        self.check(self.driver.get_power_calibration_points(
            self.session,
            slot,
            count,
            &mut wavelengths,
            &mut factors,
        ))?;
        Ok(PowerCalibrationPoints {
            wavelengths_nm: wavelengths,
            correction_factors: factors,
        })
    }

    /// Apply a settings block in one call.
    ///
    /// The timeout is applied first so a long averaging time never races a
    /// short communication timeout; the remaining fields follow in
    /// declaration order. Unset fields are skipped.
    pub fn apply_settings(&self, settings: &MeterSettings) -> Result<()> {
        if let Some(timeout_ms) = settings.timeout_ms {
            self.set_timeout_ms(timeout_ms)?;
        }
        if let Some(unit) = settings.power_unit {
            self.set_power_unit(unit)?;
        }
        if let Some(auto_range) = settings.auto_range {
            self.set_power_auto_range(auto_range)?;
        }
        if let Some(watts) = settings.power_range_w {
            self.set_power_range(watts)?;
        }
        if let Some(nanometers) = settings.wavelength_nm {
            self.set_wavelength(nanometers)?;
        }
        if let Some(seconds) = settings.average_time_s {
            self.set_average_time(seconds)?;
        }
        if let Some(reference) = settings.power_reference {
            self.set_power_reference(reference)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PowerMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerMeter")
            .field("resource", &self.resource)
            .field("session", &self.session)
            .finish()
    }
}

/// Best-effort close for sessions dropped without an explicit disconnect
/// (early returns, panics inside `with_meter`). Errors are logged, not
/// surfaced.
impl Drop for PowerMeter {
    fn drop(&mut self) {
        if self.session != UNCONNECTED {
            let status = self.driver.close(self.session);
            if status != 0 {
                warn!(
                    resource = %self.resource,
                    session = self.session,
                    status,
                    "error closing power meter session on drop"
                );
            }
            self.session = UNCONNECTED;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimDriver;

    const RESOURCE: &str = "USB0::0x1313::0x8078::P0012345::INSTR";

    fn sim_library() -> (Arc<SimDriver>, TlpmLibrary) {
        let sim = Arc::new(SimDriver::with_default_meter());
        let library = TlpmLibrary::with_driver(sim.clone());
        (sim, library)
    }

    #[test]
    fn test_connect_rejects_embedded_nul() {
        let (_sim, library) = sim_library();
        let err = library
            .connect("USB0::\0::INSTR", ConnectOptions::default())
            .expect_err("embedded NUL must be rejected");
        assert_eq!(err.code, crate::error::VI_ERROR_INV_RSRC_NAME);
    }

    #[test]
    fn test_drop_closes_session() {
        let (sim, library) = sim_library();
        {
            let _meter = library
                .connect(RESOURCE, ConnectOptions::default())
                .expect("connect");
            assert_eq!(sim.open_session_count(), 1);
        }
        assert_eq!(sim.open_session_count(), 0);
        assert_eq!(sim.close_calls(), 1);
    }

    #[test]
    fn test_disconnect_then_drop_closes_once() {
        let (sim, library) = sim_library();
        let meter = library
            .connect(RESOURCE, ConnectOptions::default())
            .expect("connect");
        meter.disconnect().expect("disconnect");
        assert_eq!(sim.close_calls(), 1);
        assert_eq!(sim.open_session_count(), 0);
    }

    #[test]
    fn test_error_carries_simulator_message() {
        let (_sim, library) = sim_library();
        let err = library
            .connect("USB0::nope::INSTR", ConnectOptions::default())
            .expect_err("unknown resource must fail");
        assert_eq!(err.message, SimDriver::error_text(err.code));
    }
}

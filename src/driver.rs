//! The driver entry points as a Rust seam.
//!
//! [`RawDriver`] mirrors the native TLPM calling convention one method per
//! entry point: an `i32` status return (zero on success), `&mut`
//! out-parameters, and fixed-capacity string buffers. Keeping the C
//! semantics at this seam means the safe layer above it centralizes all
//! marshaling and error conversion in one place, and a test double can
//! exercise exactly the same conversion paths as the real library.
//!
//! Implementations:
//! - [`crate::native::NativeDriver`] forwards to the vendor library via
//!   `tlpm-sys`.
//! - [`crate::sim::SimDriver`] is an in-memory device farm for tests and
//!   demos.

use std::ffi::CStr;

/// Capacity of every name/message output buffer, fixed by the driver ABI.
///
/// The driver fills caller-allocated buffers of exactly this size and
/// NUL-terminates the content; buffer sizes are not negotiated.
pub const STRING_BUFFER_SIZE: usize = 256;

/// Capacity of the error-description output buffer, fixed by the driver ABI.
pub const ERROR_MESSAGE_BUFFER_SIZE: usize = 512;

/// Zero-filled output buffer for name/message-producing calls.
pub type StringBuffer = [u8; STRING_BUFFER_SIZE];

/// Zero-filled output buffer for the error-message lookup call.
pub type ErrorBuffer = [u8; ERROR_MESSAGE_BUFFER_SIZE];

/// Convert a driver-filled buffer to an owned string, truncating at the
/// first NUL byte. Content after the first zero byte is discarded, per the
/// driver contract.
pub(crate) fn buffer_to_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// The raw TLPM driver entry points.
///
/// Every method maps one native call and preserves its status-code and
/// out-parameter semantics. Methods taking a `session` of `0` are the
/// session-less discovery and error-lookup calls; all others require a
/// session obtained from [`RawDriver::init`].
#[allow(clippy::too_many_arguments)]
pub trait RawDriver: Send + Sync {
    /// Enumerate attached devices; writes the count.
    fn find_rsrc(&self, session: u32, count: &mut u32) -> i32;

    /// Resource name of device `index` from the last enumeration.
    fn get_rsrc_name(&self, session: u32, index: u32, name: &mut StringBuffer) -> i32;

    /// Descriptive information for device `index` from the last enumeration.
    fn get_rsrc_info(
        &self,
        session: u32,
        index: u32,
        model_name: &mut StringBuffer,
        serial_number: &mut StringBuffer,
        manufacturer: &mut StringBuffer,
        available: &mut bool,
    ) -> i32;

    /// Open a device by resource name; writes the new session handle.
    fn init(&self, resource: &CStr, id_query: bool, reset: bool, session: &mut u32) -> i32;

    /// Close a session.
    fn close(&self, session: u32) -> i32;

    /// Look up the human-readable description of a status code.
    fn error_message(&self, session: u32, status: i32, description: &mut ErrorBuffer) -> i32;

    /// Trigger one power measurement; blocks for up to the configured
    /// averaging time.
    fn meas_power(&self, session: u32, power: &mut f64) -> i32;

    /// Set the averaging time in seconds.
    fn set_avg_time(&self, session: u32, seconds: f64) -> i32;

    /// Query the averaging time; `attribute` selects current/min/max/default.
    fn get_avg_time(&self, session: u32, attribute: i16, seconds: &mut f64) -> i32;

    /// Set the correction wavelength in nanometers.
    fn set_wavelength(&self, session: u32, nanometers: f64) -> i32;

    /// Query the correction wavelength.
    fn get_wavelength(&self, session: u32, attribute: i16, nanometers: &mut f64) -> i32;

    /// Set the manual power range (most positive signal level expected).
    fn set_power_range(&self, session: u32, watts: f64) -> i32;

    /// Query the power range.
    fn get_power_range(&self, session: u32, attribute: i16, watts: &mut f64) -> i32;

    /// Enable or disable automatic power ranging.
    fn set_power_auto_range(&self, session: u32, enabled: bool) -> i32;

    /// Query the automatic power ranging mode.
    fn get_power_auto_range(&self, session: u32, enabled: &mut bool) -> i32;

    /// Set the unit for power readings.
    fn set_power_unit(&self, session: u32, unit: i16) -> i32;

    /// Query the unit for power readings.
    fn get_power_unit(&self, session: u32, unit: &mut i16) -> i32;

    /// Set the reference value for relative power measurements.
    fn set_power_ref(&self, session: u32, value: f64) -> i32;

    /// Query the power reference value.
    fn get_power_ref(&self, session: u32, attribute: i16, value: &mut f64) -> i32;

    /// Start the dark adjustment procedure.
    fn start_dark_adjust(&self, session: u32) -> i32;

    /// Cancel a running dark adjustment.
    fn cancel_dark_adjust(&self, session: u32) -> i32;

    /// Query the dark adjustment state (0 idle, 1 running).
    fn get_dark_adjust_state(&self, session: u32, state: &mut i16) -> i32;

    /// Query the dark offset determined by the last adjustment.
    fn get_dark_offset(&self, session: u32, offset: &mut f64) -> i32;

    /// Query the calibration message of the attached sensor.
    fn get_calibration_msg(&self, session: u32, message: &mut StringBuffer) -> i32;

    /// Query identity and capabilities of the attached sensor.
    fn get_sensor_info(
        &self,
        session: u32,
        name: &mut StringBuffer,
        serial_number: &mut StringBuffer,
        message: &mut StringBuffer,
        sensor_type: &mut i16,
        subtype: &mut i16,
        flags: &mut i16,
    ) -> i32;

    /// Set the communication timeout in milliseconds.
    fn set_timeout_value(&self, session: u32, milliseconds: u32) -> i32;

    /// Query the communication timeout in milliseconds.
    fn get_timeout_value(&self, session: u32, milliseconds: &mut u32) -> i32;

    /// Reconnect the sensor; blocks roughly two seconds on real hardware.
    fn reinit_sensor(&self, session: u32) -> i32;

    /// Header metadata of power calibration slot `slot` (1..=5).
    fn get_power_calibration_info(
        &self,
        session: u32,
        slot: u16,
        serial_number: &mut StringBuffer,
        calibration_date: &mut StringBuffer,
        point_count: &mut u16,
        author: &mut StringBuffer,
        sensor_position: &mut u16,
    ) -> i32;

    /// Wavelength/correction-factor arrays of slot `slot`. `count` must
    /// equal the point count from the matching information query; the
    /// driver does not validate it and fills whatever it has.
    fn get_power_calibration_points(
        &self,
        session: u32,
        slot: u16,
        count: u16,
        wavelengths: &mut [f64],
        factors: &mut [f64],
    ) -> i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_to_string_truncates_at_nul() {
        let mut buf = [0u8; 16];
        buf[..5].copy_from_slice(b"PM100");
        buf[6] = b'X'; // garbage after the terminator is discarded
        assert_eq!(buffer_to_string(&buf), "PM100");
    }

    #[test]
    fn test_buffer_to_string_without_nul_takes_whole_buffer() {
        let buf = [b'a'; 8];
        assert_eq!(buffer_to_string(&buf), "aaaaaaaa");
    }
}

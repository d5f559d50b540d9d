//! [`RawDriver`] implementation backed by the vendor library.
//!
//! Every method is a direct forward to the corresponding `tlpm-sys` entry
//! point. Without the `hardware` feature the sys crate provides panicking
//! stubs, so this type compiles and links everywhere but must only be used
//! when the real driver is present.

use std::ffi::CStr;

use tlpm_sys::{ViBoolean, ViSession};

use crate::driver::{ErrorBuffer, RawDriver, StringBuffer};

/// The installed TLPM driver library.
///
/// Stateless: all state lives inside the vendor library, keyed by session
/// handle. The driver serializes per-session access internally only to the
/// extent the vendor documents; do not share one session across threads
/// without external mutual exclusion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDriver;

impl NativeDriver {
    /// Handle to the installed driver library.
    pub fn new() -> Self {
        Self
    }
}

impl RawDriver for NativeDriver {
    fn find_rsrc(&self, session: u32, count: &mut u32) -> i32 {
        // SAFETY: count is a valid out pointer for the device count.
        unsafe { tlpm_sys::TLPM_findRsrc(session, count) }
    }

    fn get_rsrc_name(&self, session: u32, index: u32, name: &mut StringBuffer) -> i32 {
        // SAFETY: name has the ABI-mandated capacity for resource names.
        unsafe { tlpm_sys::TLPM_getRsrcName(session, index, name.as_mut_ptr() as *mut _) }
    }

    fn get_rsrc_info(
        &self,
        session: u32,
        index: u32,
        model_name: &mut StringBuffer,
        serial_number: &mut StringBuffer,
        manufacturer: &mut StringBuffer,
        available: &mut bool,
    ) -> i32 {
        let mut raw_available: ViBoolean = 0;
        // SAFETY: all buffers have the ABI-mandated capacity and
        // raw_available is a valid out pointer.
        let status = unsafe {
            tlpm_sys::TLPM_getRsrcInfo(
                session,
                index,
                model_name.as_mut_ptr() as *mut _,
                serial_number.as_mut_ptr() as *mut _,
                manufacturer.as_mut_ptr() as *mut _,
                &mut raw_available,
            )
        };
        *available = raw_available != 0;
        status
    }

    fn init(&self, resource: &CStr, id_query: bool, reset: bool, session: &mut u32) -> i32 {
        let mut raw_session: ViSession = 0;
        // SAFETY: resource is NUL-terminated; raw_session is a valid out
        // pointer for the new handle.
        let status = unsafe {
            tlpm_sys::TLPM_init(
                resource.as_ptr() as *mut _,
                ViBoolean::from(id_query),
                ViBoolean::from(reset),
                &mut raw_session,
            )
        };
        *session = raw_session;
        status
    }

    fn close(&self, session: u32) -> i32 {
        // SAFETY: closing an arbitrary session value is defined by the
        // driver; invalid handles produce a status code.
        unsafe { tlpm_sys::TLPM_close(session) }
    }

    fn error_message(&self, session: u32, status: i32, description: &mut ErrorBuffer) -> i32 {
        // SAFETY: description has the ABI-mandated error buffer capacity.
        unsafe { tlpm_sys::TLPM_errorMessage(session, status, description.as_mut_ptr() as *mut _) }
    }

    fn meas_power(&self, session: u32, power: &mut f64) -> i32 {
        // SAFETY: power is a valid out pointer for the reading.
        unsafe { tlpm_sys::TLPM_measPower(session, power) }
    }

    fn set_avg_time(&self, session: u32, seconds: f64) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_setAvgTime(session, seconds) }
    }

    fn get_avg_time(&self, session: u32, attribute: i16, seconds: &mut f64) -> i32 {
        // SAFETY: seconds is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getAvgTime(session, attribute, seconds) }
    }

    fn set_wavelength(&self, session: u32, nanometers: f64) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_setWavelength(session, nanometers) }
    }

    fn get_wavelength(&self, session: u32, attribute: i16, nanometers: &mut f64) -> i32 {
        // SAFETY: nanometers is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getWavelength(session, attribute, nanometers) }
    }

    fn set_power_range(&self, session: u32, watts: f64) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_setPowerRange(session, watts) }
    }

    fn get_power_range(&self, session: u32, attribute: i16, watts: &mut f64) -> i32 {
        // SAFETY: watts is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getPowerRange(session, attribute, watts) }
    }

    fn set_power_auto_range(&self, session: u32, enabled: bool) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_setPowerAutoRange(session, ViBoolean::from(enabled)) }
    }

    fn get_power_auto_range(&self, session: u32, enabled: &mut bool) -> i32 {
        let mut raw: ViBoolean = 0;
        // SAFETY: raw is a valid out pointer.
        let status = unsafe { tlpm_sys::TLPM_getPowerAutorange(session, &mut raw) };
        *enabled = raw != 0;
        status
    }

    fn set_power_unit(&self, session: u32, unit: i16) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_setPowerUnit(session, unit) }
    }

    fn get_power_unit(&self, session: u32, unit: &mut i16) -> i32 {
        // SAFETY: unit is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getPowerUnit(session, unit) }
    }

    fn set_power_ref(&self, session: u32, value: f64) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_setPowerRef(session, value) }
    }

    fn get_power_ref(&self, session: u32, attribute: i16, value: &mut f64) -> i32 {
        // SAFETY: value is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getPowerRef(session, attribute, value) }
    }

    fn start_dark_adjust(&self, session: u32) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_startDarkAdjust(session) }
    }

    fn cancel_dark_adjust(&self, session: u32) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_cancelDarkAdjust(session) }
    }

    fn get_dark_adjust_state(&self, session: u32, state: &mut i16) -> i32 {
        // SAFETY: state is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getDarkAdjustState(session, state) }
    }

    fn get_dark_offset(&self, session: u32, offset: &mut f64) -> i32 {
        // SAFETY: offset is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getDarkOffset(session, offset) }
    }

    fn get_calibration_msg(&self, session: u32, message: &mut StringBuffer) -> i32 {
        // SAFETY: message has the ABI-mandated capacity.
        unsafe { tlpm_sys::TLPM_getCalibrationMsg(session, message.as_mut_ptr() as *mut _) }
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
        // SAFETY: all buffers have the ABI-mandated capacity and the i16
        // references are valid out pointers.
        unsafe {
            tlpm_sys::TLPM_getSensorInfo(
                session,
                name.as_mut_ptr() as *mut _,
                serial_number.as_mut_ptr() as *mut _,
                message.as_mut_ptr() as *mut _,
                sensor_type,
                subtype,
                flags,
            )
        }
    }

    fn set_timeout_value(&self, session: u32, milliseconds: u32) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_setTimeoutValue(session, milliseconds) }
    }

    fn get_timeout_value(&self, session: u32, milliseconds: &mut u32) -> i32 {
        // SAFETY: milliseconds is a valid out pointer.
        unsafe { tlpm_sys::TLPM_getTimeoutValue(session, milliseconds) }
    }

    fn reinit_sensor(&self, session: u32) -> i32 {
        // SAFETY: scalar-only call on a driver-validated session.
        unsafe { tlpm_sys::TLPM_reinitSensor(session) }
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
        // SAFETY: all buffers have the ABI-mandated capacity and the u16
        // references are valid out pointers.
        unsafe {
            tlpm_sys::TLPM_getPowerCalibrationPointsInformation(
                session,
                slot,
                serial_number.as_mut_ptr() as *mut _,
                calibration_date.as_mut_ptr() as *mut _,
                point_count,
                author.as_mut_ptr() as *mut _,
                sensor_position,
            )
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
        debug_assert!(wavelengths.len() >= count as usize);
        debug_assert!(factors.len() >= count as usize);
        // SAFETY: both slices hold at least `count` elements, which is all
        // the driver writes for this slot.
        unsafe {
            tlpm_sys::TLPM_getPowerCalibrationPoints(
                session,
                slot,
                count,
                wavelengths.as_mut_ptr(),
                factors.as_mut_ptr(),
            )
        }
    }
}

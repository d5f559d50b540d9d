//! Low-level FFI bindings for the Thorlabs TLPM power meter driver.
//!
//! This crate provides raw, unsafe bindings to the vendor-supplied TLPM
//! library (`TLPM_64.dll` on Windows, `libTLPM.so` on Linux), which
//! implements all instrument communication for the Thorlabs PM-series
//! optical power meters.
//!
//! # Safety
//!
//! All functions in this crate are `unsafe` as they are direct FFI
//! bindings. For a safe wrapper, use the `tlpm` crate instead.
//!
//! # Features
//!
//! - `tlpm-sdk`: Generate bindings from the installed driver headers and
//!   link the vendor library (requires `TLPM_SDK_DIR`). Without this
//!   feature, stub bindings are used that panic when called, so dependent
//!   crates build on machines without the driver.
//!
//! # Example (unsafe)
//!
//! ```no_run
//! use tlpm_sys::*;
//!
//! unsafe {
//!     let mut count: ViUInt32 = 0;
//!     if TLPM_findRsrc(0, &mut count) == 0 {
//!         println!("{} power meter(s) attached", count);
//!     }
//! }
//! ```

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]
#![allow(missing_docs)]
#![allow(clippy::all)]

// Include the generated bindings
include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_constants() {
        // Fixed by the driver ABI; the safe wrapper depends on these.
        assert_eq!(TLPM_BUFFER_SIZE, 256);
        assert_eq!(TLPM_ERR_DESCR_BUFFER_SIZE, 512);
    }

    #[test]
    fn test_attribute_selectors() {
        assert_eq!(TLPM_ATTR_SET_VAL, 0);
        assert_eq!(TLPM_ATTR_MIN_VAL, 1);
        assert_eq!(TLPM_ATTR_MAX_VAL, 2);
        assert_eq!(TLPM_ATTR_DFLT_VAL, 3);
    }

    #[test]
    fn test_sensor_constants() {
        assert_eq!(SENSOR_TYPE_PD_SINGLE, 1);
        assert_eq!(SENSOR_TYPE_THERMO, 2);
        assert_eq!(SENSOR_TYPE_PYRO, 3);
        assert_eq!(SENSOR_SUBTYPE_PD_SINGLE_STD_T, 0x12);
        assert_eq!(TLPM_SENS_FLAG_IS_POWER, 0x0001);
        assert_eq!(TLPM_SENS_FLAG_HAS_TEMP, 0x0100);
    }

    #[test]
    fn test_power_units() {
        assert_eq!(TLPM_POWER_UNIT_WATT, 0);
        assert_eq!(TLPM_POWER_UNIT_DBM, 1);
    }
}

//! Build script for tlpm-sys FFI bindings.
//!
//! Two modes, selected by the `tlpm-sdk` feature:
//!
//! 1. With `tlpm-sdk`: generates bindings from the installed TLPM driver
//!    headers with bindgen and emits the link directives for the vendor
//!    library.
//! 2. Without the feature: writes stub bindings (types, constants and
//!    panicking function definitions) so dependent crates compile and link
//!    on machines without the driver installed.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rerun-if-env-changed=TLPM_SDK_DIR");
    println!("cargo:rerun-if-env-changed=TLPM_LIB_DIR");

    #[cfg(feature = "tlpm-sdk")]
    generate_bindings();

    #[cfg(not(feature = "tlpm-sdk"))]
    generate_stub_bindings();
}

#[cfg(feature = "tlpm-sdk")]
fn generate_bindings() {
    let sdk_dir = env::var("TLPM_SDK_DIR").expect(
        "TLPM_SDK_DIR environment variable must be set when the `tlpm-sdk` feature is enabled.",
    );

    let sdk_include_path = PathBuf::from(&sdk_dir).join("include");

    // Allow TLPM_LIB_DIR to override the default lib path
    let sdk_lib_path = if let Ok(lib_dir) = env::var("TLPM_LIB_DIR") {
        PathBuf::from(lib_dir)
    } else {
        PathBuf::from(&sdk_dir).join("lib")
    };

    if !sdk_include_path.exists() {
        panic!(
            "TLPM driver include path does not exist: {:?}",
            sdk_include_path
        );
    }
    // The lib path may not exist if the library is installed globally.
    if !sdk_lib_path.exists() {
        eprintln!(
            "Warning: TLPM driver lib path does not exist: {:?}",
            sdk_lib_path
        );
    }

    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_arg(format!("-I{}", sdk_include_path.display()))
        // Every driver entry point starts with the TLPM_ prefix
        .allowlist_function("TLPM_.*")
        // VISA scalar typedefs used in the entry-point signatures
        .allowlist_type("Vi.*")
        // Driver constants: buffer sizes, attribute selectors, sensor
        // descriptors, power units
        .allowlist_var("TLPM_.*")
        .allowlist_var("SENSOR_.*")
        .allowlist_var("VI_.*")
        // Keep #define constants at the top level (matches stub bindings)
        .default_enum_style(bindgen::EnumVariation::Consts)
        .derive_debug(true)
        .derive_default(true)
        .derive_copy(true)
        .generate_comments(true)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .expect("Unable to generate TLPM bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Couldn't write bindings!");

    println!("cargo:rustc-link-search=native={}", sdk_lib_path.display());

    #[cfg(target_os = "windows")]
    {
        println!("cargo:rustc-link-lib=TLPM_64");
    }
    #[cfg(not(target_os = "windows"))]
    {
        println!("cargo:rustc-link-lib=TLPM");
    }
}

/// Generate stub bindings when the driver is not available.
///
/// The stubs mirror the real entry-point signatures but panic when called,
/// so accidental use without the `tlpm-sdk` feature fails loudly at runtime
/// while the crate still compiles and links everywhere.
#[cfg(not(feature = "tlpm-sdk"))]
fn generate_stub_bindings() {
    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    let stub = r#"
// Stub bindings - tlpm-sdk feature not enabled
//
// These placeholder types, constants and panicking functions allow the
// crate to compile without the TLPM driver headers. Enable the `tlpm-sdk`
// feature to generate real bindings and link the vendor library.

use std::os::raw::c_char;

// VISA scalar typedefs (visatype.h)
pub type ViStatus = i32;
pub type ViObject = u32;
pub type ViSession = ViObject;
pub type ViBoolean = u16;
pub type ViInt16 = i16;
pub type ViUInt16 = u16;
pub type ViInt32 = i32;
pub type ViUInt32 = u32;
pub type ViReal64 = f64;
pub type ViChar = c_char;
pub type ViRsrc = *mut ViChar;

pub const VI_SUCCESS: u32 = 0;
pub const VI_TRUE: u32 = 1;
pub const VI_FALSE: u32 = 0;

// String output buffer sizes fixed by the driver ABI
pub const TLPM_BUFFER_SIZE: u32 = 256;
pub const TLPM_ERR_DESCR_BUFFER_SIZE: u32 = 512;

// Attribute selectors for min/max/default-capable queries
pub const TLPM_ATTR_SET_VAL: u32 = 0;
pub const TLPM_ATTR_MIN_VAL: u32 = 1;
pub const TLPM_ATTR_MAX_VAL: u32 = 2;
pub const TLPM_ATTR_DFLT_VAL: u32 = 3;

// Power units
pub const TLPM_POWER_UNIT_WATT: u32 = 0;
pub const TLPM_POWER_UNIT_DBM: u32 = 1;

// Sensor types
pub const SENSOR_TYPE_NONE: u32 = 0x0;
pub const SENSOR_TYPE_PD_SINGLE: u32 = 0x1;
pub const SENSOR_TYPE_THERMO: u32 = 0x2;
pub const SENSOR_TYPE_PYRO: u32 = 0x3;

// Sensor subtypes
pub const SENSOR_SUBTYPE_NONE: u32 = 0x0;
pub const SENSOR_SUBTYPE_PD_ADAPTER: u32 = 0x01;
pub const SENSOR_SUBTYPE_PD_SINGLE_STD: u32 = 0x02;
pub const SENSOR_SUBTYPE_PD_SINGLE_FSR: u32 = 0x03;
pub const SENSOR_SUBTYPE_PD_SINGLE_STD_T: u32 = 0x12;

// Sensor capability flags
pub const TLPM_SENS_FLAG_IS_POWER: u32 = 0x0001;
pub const TLPM_SENS_FLAG_IS_ENERGY: u32 = 0x0002;
pub const TLPM_SENS_FLAG_IS_RESP_SET: u32 = 0x0010;
pub const TLPM_SENS_FLAG_IS_WAVEL_SET: u32 = 0x0020;
pub const TLPM_SENS_FLAG_IS_TAU_SET: u32 = 0x0040;
pub const TLPM_SENS_FLAG_HAS_TEMP: u32 = 0x0100;

// Panic stub implementations - these allow linking to succeed but will
// panic at runtime if called without the tlpm-sdk feature enabled.

const TLPM_SDK_PANIC_MSG: &str = "TLPM driver function called but the tlpm-sdk feature is not \
    enabled. Enable the tlpm-sdk feature (or `hardware` in the tlpm crate) to use the real driver.";

#[no_mangle]
pub unsafe extern "C" fn TLPM_findRsrc(_vi: ViSession, _resource_count: *mut ViUInt32) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getRsrcName(
    _vi: ViSession,
    _index: ViUInt32,
    _resource_name: *mut ViChar,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getRsrcInfo(
    _vi: ViSession,
    _index: ViUInt32,
    _model_name: *mut ViChar,
    _serial_number: *mut ViChar,
    _manufacturer: *mut ViChar,
    _device_available: *mut ViBoolean,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_init(
    _resource_name: ViRsrc,
    _id_query: ViBoolean,
    _reset_device: ViBoolean,
    _vi: *mut ViSession,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_close(_vi: ViSession) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_errorMessage(
    _vi: ViSession,
    _status_code: ViStatus,
    _description: *mut ViChar,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_measPower(_vi: ViSession, _power: *mut ViReal64) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_setAvgTime(_vi: ViSession, _avg_time: ViReal64) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getAvgTime(
    _vi: ViSession,
    _attribute: ViInt16,
    _avg_time: *mut ViReal64,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_setWavelength(_vi: ViSession, _wavelength: ViReal64) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getWavelength(
    _vi: ViSession,
    _attribute: ViInt16,
    _wavelength: *mut ViReal64,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_setPowerRange(_vi: ViSession, _power_to_measure: ViReal64) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getPowerRange(
    _vi: ViSession,
    _attribute: ViInt16,
    _power_value: *mut ViReal64,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_setPowerAutoRange(_vi: ViSession, _power_autorange_mode: ViBoolean) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getPowerAutorange(
    _vi: ViSession,
    _power_autorange_mode: *mut ViBoolean,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_setPowerUnit(_vi: ViSession, _power_unit: ViInt16) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getPowerUnit(_vi: ViSession, _power_unit: *mut ViInt16) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_setPowerRef(_vi: ViSession, _power_reference_value: ViReal64) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getPowerRef(
    _vi: ViSession,
    _attribute: ViInt16,
    _power_reference_value: *mut ViReal64,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_startDarkAdjust(_vi: ViSession) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_cancelDarkAdjust(_vi: ViSession) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getDarkAdjustState(_vi: ViSession, _state: *mut ViInt16) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getDarkOffset(_vi: ViSession, _dark_offset: *mut ViReal64) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getCalibrationMsg(_vi: ViSession, _message: *mut ViChar) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getSensorInfo(
    _vi: ViSession,
    _name: *mut ViChar,
    _snr: *mut ViChar,
    _message: *mut ViChar,
    _sensor_type: *mut ViInt16,
    _sensor_subtype: *mut ViInt16,
    _sensor_flags: *mut ViInt16,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_setTimeoutValue(_vi: ViSession, _value: ViUInt32) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getTimeoutValue(_vi: ViSession, _value: *mut ViUInt32) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_reinitSensor(_vi: ViSession) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getPowerCalibrationPointsInformation(
    _vi: ViSession,
    _index: ViUInt16,
    _serial_number: *mut ViChar,
    _calibration_date: *mut ViChar,
    _calibration_points_count: *mut ViUInt16,
    _author: *mut ViChar,
    _sensor_position: *mut ViUInt16,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn TLPM_getPowerCalibrationPoints(
    _vi: ViSession,
    _index: ViUInt16,
    _point_counts: ViUInt16,
    _wavelengths: *mut ViReal64,
    _power_correction_factors: *mut ViReal64,
) -> ViStatus {
    panic!("{}", TLPM_SDK_PANIC_MSG);
}
"#;

    std::fs::write(out_path.join("bindings.rs"), stub).expect("Couldn't write stub bindings!");
}

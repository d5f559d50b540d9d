//! Power meter hardware smoke test suite.
//!
//! Opt-in tests against a physically attached Thorlabs power meter.
//!
//! # Environment Variables
//!
//! Required:
//! - `TLPM_SMOKE_TEST=1` - Enable the test suite
//!
//! Optional:
//! - `TLPM_RESOURCE` - Resource name to open (default: first enumerated)
//!
//! # Quick Setup
//!
//! ```bash
//! export TLPM_SDK_DIR=/opt/thorlabs/tlpm
//! export TLPM_SMOKE_TEST=1
//! cargo test --features hardware_tests --test hardware_smoke
//! ```
//!
//! # Test Coverage
//!
//! | Test | Description |
//! |------|-------------|
//! | `device_discovery_test` | Enumerate resources, read names and info |
//! | `connect_and_identify_test` | Open, read sensor info, close |
//! | `single_measurement_test` | Configure averaging and take one reading |

#![cfg(feature = "hardware_tests")]

use std::env;

use tlpm::{Attribute, ConnectOptions, TlpmLibrary};

/// Check if the smoke test is enabled via environment variable
fn smoke_test_enabled() -> bool {
    env::var("TLPM_SMOKE_TEST")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Resource to open: explicit override or the first enumerated device
fn target_resource(library: &TlpmLibrary) -> tlpm::Result<String> {
    if let Ok(resource) = env::var("TLPM_RESOURCE") {
        return Ok(resource);
    }
    library.resource_name(0)
}

/// Skip test with message if the smoke test is not enabled
macro_rules! skip_if_disabled {
    () => {
        if !smoke_test_enabled() {
            println!("TLPM smoke test skipped (set TLPM_SMOKE_TEST=1 to enable)");
            return;
        }
    };
}

#[test]
fn device_discovery_test() {
    skip_if_disabled!();

    let library = TlpmLibrary::native();
    let count = library.find_resources().expect("enumeration");
    println!("Found {} power meter(s)", count);
    assert!(count > 0, "no power meter attached");

    for index in 0..count {
        let name = library.resource_name(index).expect("resource name");
        let info = library.resource_info(index).expect("resource info");
        println!(
            "  [{}] {} ({} {}, available: {})",
            index, name, info.manufacturer, info.model_name, info.available
        );
        assert!(!name.is_empty());
    }
}

#[test]
fn connect_and_identify_test() {
    skip_if_disabled!();

    let library = TlpmLibrary::native();
    library.find_resources().expect("enumeration");
    let resource = target_resource(&library).expect("target resource");

    library
        .with_meter(&resource, ConnectOptions::default(), |meter| {
            let sensor = meter.sensor_info()?;
            println!(
                "Sensor: {} (s/n {}), type {:?}, flags {:?}",
                sensor.name, sensor.serial_number, sensor.sensor_type, sensor.flags
            );
            println!("Calibration: {}", meter.calibration_message()?);
            Ok(())
        })
        .expect("identification");
}

#[test]
fn single_measurement_test() {
    skip_if_disabled!();

    let library = TlpmLibrary::native();
    library.find_resources().expect("enumeration");
    let resource = target_resource(&library).expect("target resource");

    let reading = library
        .with_meter(&resource, ConnectOptions::default(), |meter| {
            // Timeout must comfortably exceed the averaging time.
            meter.set_timeout_ms(5_000)?;
            meter.set_average_time(0.1)?;

            let min = meter.power_range(Attribute::Minimum)?;
            let max = meter.power_range(Attribute::Maximum)?;
            println!("Power range span: {:.3e} .. {:.3e} W", min, max);

            meter.measure_power()
        })
        .expect("measurement");

    println!("Reading: {:.6e}", reading);
    assert!(reading.is_finite());
}

//! Walk the whole facade against the simulated driver.
//!
//! Runs everywhere, no hardware or vendor library required:
//!
//! ```bash
//! cargo run --example simulated_power_sweep
//! ```

use std::sync::Arc;

use tlpm::{Attribute, ConnectOptions, PowerUnit, SimDriver, TlpmLibrary};

fn main() -> tlpm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let library = TlpmLibrary::with_driver(Arc::new(SimDriver::with_default_meter()));

    let count = library.find_resources()?;
    println!("Found {} device(s)", count);
    for index in 0..count {
        let name = library.resource_name(index)?;
        let info = library.resource_info(index)?;
        println!(
            "  [{}] {} ({} {}, s/n {})",
            index, name, info.manufacturer, info.model_name, info.serial_number
        );
    }

    let resource = library.resource_name(0)?;
    library.with_meter(&resource, ConnectOptions::default(), |meter| {
        let sensor = meter.sensor_info()?;
        println!(
            "Sensor: {} (s/n {}), {:?}/{:?}",
            sensor.name, sensor.serial_number, sensor.sensor_type, sensor.subtype
        );

        // Dark adjustment: start, poll to completion, read the offset.
        meter.start_dark_adjust()?;
        let mut polls = 0;
        while !meter.dark_adjust_state()?.is_idle() {
            polls += 1;
        }
        println!(
            "Dark adjustment finished after {} poll(s), offset {:.3e} W",
            polls,
            meter.dark_offset()?
        );

        // Sweep the correction wavelength against the factory calibration.
        meter.set_timeout_ms(5_000)?;
        meter.set_average_time(0.01)?;
        meter.set_power_unit(PowerUnit::Watt)?;

        let calibration = meter.power_calibration_info(1)?;
        let points = meter.power_calibration_points(1, calibration.point_count)?;
        println!(
            "Calibration slot 1 by {} on {}:",
            calibration.author, calibration.calibration_date
        );
        for (wavelength, factor) in points.points() {
            meter.set_wavelength(wavelength)?;
            let reading = meter.measure_power()?;
            println!(
                "  {:6.1} nm  factor {:.3}  reading {:.4e} W",
                wavelength, factor, reading
            );
        }

        println!(
            "Range: {:.1e} .. {:.1e} W (currently {:.1e} W)",
            meter.power_range(Attribute::Minimum)?,
            meter.power_range(Attribute::Maximum)?,
            meter.power_range(Attribute::Current)?,
        );
        Ok(())
    })
}

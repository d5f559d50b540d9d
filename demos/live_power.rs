//! Take readings from the first attached power meter.
//!
//! Requires the vendor driver:
//!
//! ```bash
//! TLPM_SDK_DIR=/opt/thorlabs/tlpm cargo run --example live_power --features hardware
//! ```

use tlpm::{ConnectOptions, TlpmLibrary};

fn main() -> tlpm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let library = TlpmLibrary::native();

    let count = library.find_resources()?;
    if count == 0 {
        eprintln!("No power meter attached");
        return Ok(());
    }
    let resource = library.resource_name(0)?;
    println!("Opening {}", resource);

    library.with_meter(&resource, ConnectOptions::default(), |meter| {
        meter.set_timeout_ms(5_000)?;
        meter.set_average_time(0.1)?;

        let sensor = meter.sensor_info()?;
        println!("Sensor {} (s/n {})", sensor.name, sensor.serial_number);

        for _ in 0..10 {
            println!("{:.6e} {}", meter.measure_power()?, meter.power_unit()?.as_str());
        }
        Ok(())
    })
}

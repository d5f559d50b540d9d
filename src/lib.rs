//! Safe Rust interface to the Thorlabs TLPM optical power meter driver.
//!
//! The vendor-supplied TLPM library implements all instrument
//! communication for the PM-series power meters; this crate is a typed
//! marshaling layer over its entry points. Every operation follows the
//! same shape: marshal arguments, invoke one driver call, unmarshal
//! results, and convert a nonzero status code into a [`DriverError`]
//! carrying the driver's own message text.
//!
//! # Architecture
//!
//! - [`driver::RawDriver`] mirrors the native entry points (status codes,
//!   out-parameters, fixed-capacity string buffers) as a Rust trait.
//! - [`native::NativeDriver`] forwards to the vendor library through the
//!   `tlpm-sys` crate.
//! - [`sim::SimDriver`] is an in-memory device farm so tests and downstream
//!   code run without hardware.
//! - [`TlpmLibrary`] / [`PowerMeter`] are the safe surface: discovery,
//!   connection lifecycle, measurement, configuration, dark adjustment and
//!   calibration retrieval.
//!
//! # Features
//!
//! - `hardware`: link against the installed driver (`TLPM_SDK_DIR`).
//!   Without it, [`TlpmLibrary::native`] panics when its calls reach the
//!   stubbed driver, while the simulated backend works everywhere.
//! - `hardware_tests`: opt-in smoke tests against a live instrument.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tlpm::{ConnectOptions, SimDriver, TlpmLibrary};
//!
//! # fn main() -> tlpm::Result<()> {
//! let library = TlpmLibrary::with_driver(Arc::new(SimDriver::with_default_meter()));
//!
//! let count = library.find_resources()?;
//! assert_eq!(count, 1);
//! let resource = library.resource_name(0)?;
//!
//! let reading = library.with_meter(&resource, ConnectOptions::default(), |meter| {
//!     meter.set_wavelength(633.0)?;
//!     meter.set_average_time(0.01)?;
//!     meter.measure_power()
//! })?;
//! assert!(reading > 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! On hardware the only change is the backend:
//!
//! ```no_run
//! let library = tlpm::TlpmLibrary::native();
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod meter;
pub mod native;
pub mod sim;
pub mod types;

pub use config::{ConnectOptions, MeterSettings};
pub use driver::{RawDriver, ERROR_MESSAGE_BUFFER_SIZE, STRING_BUFFER_SIZE};
pub use error::{DriverError, Result};
pub use meter::{PowerMeter, TlpmLibrary};
pub use native::NativeDriver;
pub use sim::{SimCalibrationSlot, SimDriver, SimResource};
pub use types::{
    Attribute, DarkAdjustState, PowerCalibrationInfo, PowerCalibrationPoints, PowerUnit,
    ResourceInfo, SensorFlags, SensorInfo, SensorSubtype, SensorType,
};

//! Facade contract tests over the simulated driver.
//!
//! The real behavior of every call lives in the closed-source vendor
//! library, so these tests pin down the wrapper's own contracts instead:
//! discovery snapshots, session lifecycle (no handle leaks), dark-adjust
//! state observation, range round-trips, calibration point counts, and
//! status-to-error conversion.

use std::sync::Arc;

use tlpm::{
    Attribute, ConnectOptions, DarkAdjustState, MeterSettings, PowerUnit, SimDriver, SimResource,
    TlpmLibrary,
};

const RESOURCE: &str = "USB0::0x1313::0x8078::P0012345::INSTR";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

fn sim_library() -> (Arc<SimDriver>, TlpmLibrary) {
    let sim = Arc::new(SimDriver::with_default_meter());
    let library = TlpmLibrary::with_driver(sim.clone());
    (sim, library)
}

#[test]
fn discovery_reports_nonempty_names_and_availability() {
    init_tracing();
    let sim = Arc::new(
        SimDriver::with_default_meter().with_resource(
            SimResource::photodiode("USB0::0x1313::0x8078::P0099999::INSTR", "P0099999")
                .unavailable(),
        ),
    );
    let library = TlpmLibrary::with_driver(sim);

    let count = library.find_resources().expect("enumeration succeeds");
    assert_eq!(count, 2);

    for index in 0..count {
        let name = library.resource_name(index).expect("name within count");
        assert!(!name.is_empty());
        let info = library.resource_info(index).expect("info within count");
        assert!(!info.serial_number.is_empty());
        assert_eq!(info.manufacturer, "Thorlabs");
    }

    assert!(library.resource_info(0).expect("first device").available);
    assert!(!library.resource_info(1).expect("second device").available);

    // Past-the-end indices surface the driver's own status.
    let err = library.resource_name(count).expect_err("index out of range");
    assert_eq!(err.message, SimDriver::error_text(err.code));
}

#[test]
fn scoped_acquisition_never_leaks_a_session() {
    init_tracing();
    let (sim, library) = sim_library();

    // Success path
    let reading = library
        .with_meter(RESOURCE, ConnectOptions::default(), |meter| {
            meter.measure_power()
        })
        .expect("measurement succeeds");
    assert!(reading > 0.0);
    assert_eq!(sim.open_session_count(), 0);
    assert_eq!(sim.close_calls(), 1);

    // Failure path: the operation's error propagates, the session is
    // still closed, and close happens exactly once.
    let err = library
        .with_meter(RESOURCE, ConnectOptions::default(), |meter| {
            meter.power_calibration_info(9).map(|_| ())
        })
        .expect_err("slot 9 is invalid");
    assert_eq!(err.message, SimDriver::error_text(err.code));
    assert_eq!(sim.open_session_count(), 0);
    assert_eq!(sim.close_calls(), 2);
}

#[test]
fn dark_adjust_state_machine_is_observable_by_polling() {
    let (_sim, library) = sim_library();

    library
        .with_meter(RESOURCE, ConnectOptions::default(), |meter| {
            meter.start_dark_adjust()?;

            // Immediately after start the state is running or already idle.
            let first = meter.dark_adjust_state()?;
            assert!(matches!(
                first,
                DarkAdjustState::Running | DarkAdjustState::Idle
            ));

            // Polling terminates in finitely many iterations.
            let mut polls = 0;
            while !meter.dark_adjust_state()?.is_idle() {
                polls += 1;
                assert!(polls < 100, "dark adjustment never completed");
            }

            assert!(meter.dark_offset()? > 0.0);
            Ok(())
        })
        .expect("dark adjustment workflow");
}

#[test]
fn cancel_forces_dark_adjust_back_to_idle() {
    let sim = Arc::new(SimDriver::new().with_resource(
        SimResource::photodiode("SIM::SLOW::INSTR", "S1").with_dark_adjust_polls(1_000),
    ));
    let library = TlpmLibrary::with_driver(sim);

    library
        .with_meter("SIM::SLOW::INSTR", ConnectOptions::default(), |meter| {
            meter.start_dark_adjust()?;
            assert_eq!(meter.dark_adjust_state()?, DarkAdjustState::Running);
            meter.cancel_dark_adjust()?;
            assert_eq!(meter.dark_adjust_state()?, DarkAdjustState::Idle);
            Ok(())
        })
        .expect("cancel workflow");
}

#[test]
fn dark_adjust_fails_verbatim_on_energy_sensor() {
    let sim = Arc::new(SimDriver::new().with_resource(SimResource::energy_sensor(
        "SIM::ENERGY::INSTR",
        "E1",
    )));
    let library = TlpmLibrary::with_driver(sim);

    library
        .with_meter("SIM::ENERGY::INSTR", ConnectOptions::default(), |meter| {
            let info = meter.sensor_info()?;
            assert!(info.is_energy_sensor());

            let err = meter.start_dark_adjust().expect_err("energy sensor");
            assert_eq!(err.message, SimDriver::error_text(err.code));
            Ok(())
        })
        .expect("energy sensor workflow");
}

#[test]
fn power_range_round_trip_stays_within_reported_bounds() {
    let (_sim, library) = sim_library();

    library
        .with_meter(RESOURCE, ConnectOptions::default(), |meter| {
            let minimum = meter.power_range(Attribute::Minimum)?;
            let maximum = meter.power_range(Attribute::Maximum)?;
            assert!(minimum < maximum);

            for requested in [2e-6, 5e-4, 0.2] {
                meter.set_power_range(requested)?;
                let accepted = meter.power_range(Attribute::Current)?;
                // Quantized, but never below the request and always in bounds.
                assert!(accepted >= requested || (accepted - maximum).abs() < f64::EPSILON);
                assert!((minimum..=maximum).contains(&accepted));
            }

            // Picking a manual range disables auto-ranging.
            assert!(!meter.power_auto_range()?);
            meter.set_power_auto_range(true)?;
            assert!(meter.power_auto_range()?);
            Ok(())
        })
        .expect("range workflow");
}

#[test]
fn calibration_points_match_reported_count() {
    let (_sim, library) = sim_library();

    library
        .with_meter(RESOURCE, ConnectOptions::default(), |meter| {
            let info = meter.power_calibration_info(1)?;
            assert_eq!(info.point_count, 5);
            assert_eq!(info.author, "factory");

            let points = meter.power_calibration_points(1, info.point_count)?;
            assert_eq!(points.len(), info.point_count as usize);
            for (wavelength, factor) in points.points() {
                assert!(wavelength > 0.0);
                assert!(factor > 0.0);
            }

            // Empty slots fail with the driver's own status.
            let err = meter.power_calibration_info(2).expect_err("empty slot");
            assert_eq!(err.message, SimDriver::error_text(err.code));
            Ok(())
        })
        .expect("calibration workflow");
}

#[test]
fn settings_block_from_toml_applies_to_device() {
    let (_sim, library) = sim_library();

    let settings: MeterSettings = toml::from_str(
        r#"
        timeout_ms = 5000
        power_unit = "dbm"
        auto_range = false
        wavelength_nm = 780.0
        average_time_s = 0.05
        "#,
    )
    .expect("settings parse");

    library
        .with_meter(RESOURCE, ConnectOptions::default(), |meter| {
            meter.apply_settings(&settings)?;

            assert_eq!(meter.timeout_ms()?, 5000);
            assert_eq!(meter.power_unit()?, PowerUnit::Dbm);
            assert!(!meter.power_auto_range()?);
            assert_eq!(meter.wavelength(Attribute::Current)?, 780.0);
            assert_eq!(meter.average_time(Attribute::Current)?, 0.05);

            // Unit affects the reading: with ~1.23 mW incident, dBm is ~0.9.
            let dbm = meter.measure_power()?;
            assert!((0.0..3.0).contains(&dbm));
            Ok(())
        })
        .expect("settings workflow");
}

#[test]
fn measurement_reflects_unit_selection() {
    let sim = Arc::new(
        SimDriver::new()
            .with_resource(SimResource::photodiode("SIM::UNIT::INSTR", "U1").with_power(1e-3)),
    );
    let library = TlpmLibrary::with_driver(sim);

    library
        .with_meter("SIM::UNIT::INSTR", ConnectOptions::default(), |meter| {
            assert_eq!(meter.power_unit()?, PowerUnit::Watt);
            let watts = meter.measure_power()?;
            assert!((watts - 1e-3).abs() < 1e-9);

            meter.set_power_unit(PowerUnit::Dbm)?;
            let dbm = meter.measure_power()?;
            assert!(dbm.abs() < 0.01, "1 mW is 0 dBm, got {dbm}");
            Ok(())
        })
        .expect("unit workflow");
}

#[test]
fn sensor_info_snapshot_is_complete() {
    let (_sim, library) = sim_library();

    library
        .with_meter(RESOURCE, ConnectOptions::default(), |meter| {
            let info = meter.sensor_info()?;
            assert_eq!(info.name, "S121C");
            assert!(info.is_power_sensor());
            assert!(!info.is_energy_sensor());
            assert!(!info.has_temperature_sensor());
            assert_eq!(info.calibration_message, meter.calibration_message()?);
            Ok(())
        })
        .expect("sensor info workflow");
}

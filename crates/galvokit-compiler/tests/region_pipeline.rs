use approx::assert_relative_eq;
use galvokit_compiler::beam_optics::{
    diameter_to_z_offset, focus_shift_micron, theoretical_rayleigh_length_micron,
    z_offset_to_diameter,
};
use galvokit_compiler::field_curvature::correction;
use galvokit_compiler::power::correct_power;
use galvokit_compiler::skywriting::resolve;
use galvokit_compiler::speed_profile::{select, Selection};
use galvokit_compiler::{compile, transform, BeamWarning, CliRegion};
use galvokit_core::{Point2D, Point3D, Polyline2D};
use galvokit_settings::{
    BeamOpticsConfig, FieldCurvatureConfig, FunctionSwitches, LaserCardConfig, PowerConfig,
    ScannerGeometryConfig, SpeedProfile, SpeedProfileSet,
};

fn beam() -> BeamOpticsConfig {
    BeamOpticsConfig {
        min_beam_diameter_micron: 48.141,
        rayleigh_length_micron: 1426.715,
        ..BeamOpticsConfig::default()
    }
}

fn profiles() -> SpeedProfileSet {
    let mut fast = SpeedProfile::at_speed(2000);
    fast.jump_delay = 300;
    fast.polygon_delay = 90;
    SpeedProfileSet::new(vec![
        SpeedProfile::at_speed(800),
        SpeedProfile::at_speed(1250),
        fast,
    ])
    .unwrap()
}

#[test]
fn test_diameter_round_trip() {
    let beam = beam();
    let mut target = 48.2;
    while target < 500.0 {
        let (z, warning) = diameter_to_z_offset(target, &beam);
        assert!(warning.is_none());
        assert_relative_eq!(z_offset_to_diameter(z, &beam), target, epsilon = 1e-6);
        target *= 1.37;
    }
}

#[test]
fn test_waist_maps_to_zero() {
    assert_eq!(diameter_to_z_offset(48.141, &beam()), (0.0, None));
}

#[test]
fn test_below_waist_warns_and_focuses() {
    let (z, warning) = diameter_to_z_offset(40.0, &beam());
    assert_eq!(z, 0.0);
    assert!(matches!(
        warning,
        Some(BeamWarning::ClampedBelowMinimum { requested, .. }) if requested == 40.0
    ));
}

#[test]
fn test_worked_example_80_micron() {
    let (z, _) = diameter_to_z_offset(80.0, &beam());
    assert!((z - 1.894).abs() < 0.001, "z = {}", z);
}

#[test]
fn test_theoretical_rayleigh_length() {
    let beam = BeamOpticsConfig {
        min_beam_diameter_micron: 50.0,
        wavelength_nano: 1000.0,
        m2: 1.0,
        ..beam()
    };
    // π·25²/1
    assert_relative_eq!(
        theoretical_rayleigh_length_micron(&beam),
        std::f64::consts::PI * 625.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_focus_shift_table() {
    let beam = BeamOpticsConfig {
        focus_shift_diameters_micron: vec![48.141, 60.0, 80.0],
        ..beam()
    };
    let at_80 = diameter_to_z_offset(80.0, &beam).0 * 1000.0;
    let at_60 = diameter_to_z_offset(60.0, &beam).0 * 1000.0;

    assert_eq!(focus_shift_micron(50.0, 400.0, &beam), 0.0);
    assert_relative_eq!(focus_shift_micron(200.0, 400.0, &beam), at_60, epsilon = 1e-9);
    assert_relative_eq!(
        focus_shift_micron(300.0, 400.0, &beam),
        (at_60 + at_80) / 2.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(focus_shift_micron(400.0, 400.0, &beam), at_80, epsilon = 1e-9);
}

#[test]
fn test_curvature_at_centre_is_c() {
    let curve = FieldCurvatureConfig {
        a_factor: 3.0e-5,
        b_factor: -1.0e-3,
        c_factor: 0.42,
    };
    assert_eq!(correction(0.0, 0.0, &curve), 0.42);
}

#[test]
fn test_power_identity_without_stages() {
    let power = PowerConfig {
        max_power_watts: 400.0,
        correction_table: vec![0.0, 90.0, 400.0],
        k_factor: 0.5,
        c_factor: 10.0,
    };
    let flags = FunctionSwitches {
        enable_power_correction: false,
        enable_power_offset: false,
        ..FunctionSwitches::default()
    };
    for requested in [0.0, 1.0, 133.3, 399.0, 400.0] {
        assert_eq!(correct_power(requested, &power, &flags).watts, requested);
    }
    assert_eq!(correct_power(-3.0, &power, &flags).watts, 0.0);
    assert_eq!(correct_power(900.0, &power, &flags).watts, 400.0);
}

#[test]
fn test_speed_selection() {
    let set = profiles();
    let pick = |speed| {
        let (profile, how) = select(speed, &set).unwrap();
        (profile.mark_speed, how)
    };
    assert_eq!(pick(1250), (1250, Selection::Exact));
    assert_eq!(pick(1500), (1250, Selection::NearestBelow));
    assert_eq!(pick(500), (800, Selection::FallbackSlowest));
    assert_eq!(pick(9000), (2000, Selection::NearestBelow));
}

#[test]
fn test_skywriting_zero_delays() {
    for profile in profiles().iter() {
        let timing = resolve(profile, true);
        assert_eq!(timing.jump_delay, 0);
        assert_eq!(timing.polygon_delay, 0);
    }
    let fast = profiles().get(2000).cloned().unwrap();
    assert_eq!(resolve(&fast, false).jump_delay, 300);
    assert_eq!(resolve(&fast, false).polygon_delay, 90);
}

#[test]
fn test_identity_transform() {
    let geometry = ScannerGeometryConfig::default();
    let curve = FieldCurvatureConfig::default();
    let p = transform(Point2D::new(-17.25, 88.5), 0.0, &geometry, &curve);
    assert_eq!(p, Point3D::new(-17.25, 88.5, 0.0));
}

#[test]
fn test_compiled_region_end_to_end() {
    let mut config = LaserCardConfig::default();
    config.profiles = profiles();
    config.curve.c_factor = 0.1;
    config.geometry.offset_z = -0.5;
    config.geometry.offset_x = 5.0;

    let region = CliRegion::new(
        "contour",
        vec![Polyline2D::from_flat(&[0.0, 0.0, 10.0, 0.0]).unwrap()],
    )
    .with_speed(2000.0)
    .with_power(125.0)
    .with_diameter(80.0)
    .with_skywriting(true);

    let compiled = compile(&region, &config).unwrap();
    let params = compiled.parameters;
    assert_eq!(params.mark_speed, 2000);
    assert_eq!(params.jump_speed, 5000);
    assert_eq!(params.jump_delay, 0);
    assert_eq!(params.polygon_delay, 0);
    assert_eq!(params.laser_power_percent, 25.0);

    let first = compiled.polylines[0].points[0];
    assert_eq!(first.x, 5.0);
    assert_eq!(first.y, 0.0);
    assert!((first.z - (1.894 + 0.1 - 0.5)).abs() < 0.001, "z = {}", first.z);
}

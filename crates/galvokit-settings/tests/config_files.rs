use galvokit_settings::{
    ConfigError, LaserCardConfig, ScanMode, SettingsError, SpeedProfile, SpeedProfileSet,
};
use tempfile::TempDir;

fn calibrated_config() -> LaserCardConfig {
    let mut config = LaserCardConfig::default();
    config.curve.a_factor = 1.2e-5;
    config.curve.c_factor = -0.05;
    config.power.k_factor = 0.02;
    config.geometry.rotate_angle_deg = 90.0;
    config.geometry.mode = ScanMode::TwoD;
    config.beam.focus_shift_diameters_micron = vec![48.141, 48.141, 52.0, 60.0];
    config.flags.enable_power_correction = true;

    let mut sky = SpeedProfile::at_speed(1250);
    sky.sw_enable = true;
    sky.laser_on_delay = -40.0;
    config.profiles = SpeedProfileSet::new(vec![
        SpeedProfile::at_speed(800),
        sky,
        SpeedProfile::at_speed(2000),
    ])
    .unwrap();
    config
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("card.json");

    let config = calibrated_config();
    config.save_to_file(&path).unwrap();

    let loaded = LaserCardConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("card.toml");

    let config = calibrated_config();
    config.save_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[[profiles]]"));
    assert!(content.contains("mode = \"2d\""));

    let loaded = LaserCardConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_rejects_duplicate_profiles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("card.json");
    std::fs::write(
        &path,
        r#"{ "profiles": [ { "mark_speed": 800 }, { "mark_speed": 800 } ] }"#,
    )
    .unwrap();

    let err = LaserCardConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::JsonError(_)));
    assert!(err.to_string().contains("Duplicate speed profile for mark speed 800"));
}

#[test]
fn test_load_rejects_short_correction_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("card.toml");
    std::fs::write(
        &path,
        "[power]\nmax_power_watts = 100.0\ncorrection_table = [100.0]\n",
    )
    .unwrap();

    let err = LaserCardConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::CorrectionTableTooShort { len: 1 })
    ));
}

#[test]
fn test_save_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("card.json");

    let mut config = LaserCardConfig::default();
    config.power.max_power_watts = 0.0;

    assert!(config.save_to_file(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = LaserCardConfig::load_from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SettingsError::LoadError(_)));
}

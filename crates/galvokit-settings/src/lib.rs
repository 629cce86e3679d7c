//! GalvoKit Settings Crate
//!
//! Typed laser card calibration: beam optics, field curvature, power
//! calibration, scanner geometry, speed profiles and function switches,
//! with validation and JSON/TOML persistence.

pub mod config;
pub mod error;
pub mod profiles;

pub use config::{
    BeamOpticsConfig, FieldCurvatureConfig, FunctionSwitches, LaserCardConfig, PowerConfig,
    ScanMode, ScanProtocol, ScannerGeometryConfig, RAYLEIGH_DEVIATION_LIMIT,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use profiles::{SpeedProfile, SpeedProfileSet, MAX_SCAN_SPEED, MIN_LASER_DELAY};

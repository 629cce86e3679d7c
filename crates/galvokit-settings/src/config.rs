//! Laser card configuration
//!
//! Calibration data for one scanner card, organized into logical sections:
//! - Beam optics (waist, Rayleigh length, focus shift)
//! - Field curvature polynomial
//! - Power calibration table and offset
//! - Scanner field geometry
//! - Per-speed process profiles
//! - Function switches
//!
//! Configuration files may be JSON or TOML; both are validated on load and
//! on save.

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use crate::profiles::SpeedProfileSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Relative deviation between configured and theoretical Rayleigh length
/// above which a warning is logged
pub const RAYLEIGH_DEVIATION_LIMIT: f64 = 0.5;

/// Gaussian beam optics calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamOpticsConfig {
    /// Beam waist diameter d₀ (µm)
    pub min_beam_diameter_micron: f64,
    /// Rayleigh length z_R (µm)
    pub rayleigh_length_micron: f64,
    /// Laser wavelength (nm)
    pub wavelength_nano: f64,
    /// Beam quality factor M²
    pub m2: f64,
    /// Focal length of the F-theta lens (mm)
    pub focal_length_mm: f64,
    /// Measured spot diameters (µm) at evenly spaced powers from 0 to the
    /// maximum power; empty disables focus-shift compensation
    pub focus_shift_diameters_micron: Vec<f64>,
}

impl Default for BeamOpticsConfig {
    fn default() -> Self {
        Self {
            min_beam_diameter_micron: 48.141,
            rayleigh_length_micron: 1426.715,
            wavelength_nano: 1070.0,
            m2: 1.127,
            focal_length_mm: 538.46,
            focus_shift_diameters_micron: Vec::new(),
        }
    }
}

impl BeamOpticsConfig {
    /// Rayleigh length implied by the waist, M² and wavelength (µm)
    ///
    /// z_R = π·(d₀/2)²·M²/λ
    pub fn theoretical_rayleigh_length_micron(&self) -> f64 {
        let radius = self.min_beam_diameter_micron / 2.0;
        let wavelength_micron = self.wavelength_nano / 1000.0;
        std::f64::consts::PI * radius * radius * self.m2 / wavelength_micron
    }

    /// Relative deviation of the configured z_R from the theoretical one
    pub fn rayleigh_deviation(&self) -> f64 {
        let theoretical = self.theoretical_rayleigh_length_micron();
        (self.rayleigh_length_micron - theoretical).abs() / theoretical
    }

    /// Validate beam parameters
    pub fn validate(&self) -> ConfigResult<()> {
        require_positive("beam.min_beam_diameter_micron", self.min_beam_diameter_micron)?;
        require_positive("beam.rayleigh_length_micron", self.rayleigh_length_micron)?;
        require_positive("beam.wavelength_nano", self.wavelength_nano)?;
        require_positive("beam.focal_length_mm", self.focal_length_mm)?;

        if !self.m2.is_finite() || self.m2 < 1.0 {
            return Err(ConfigError::invalid("beam.m2", self.m2, "must be >= 1.0"));
        }

        for (i, d) in self.focus_shift_diameters_micron.iter().enumerate() {
            require_positive(&format!("beam.focus_shift_diameters_micron[{}]", i), *d)?;
        }

        if !(5.0..=1000.0).contains(&self.min_beam_diameter_micron) {
            warn!(
                "Beam waist {} µm is outside the usual 5..1000 µm range",
                self.min_beam_diameter_micron
            );
        }
        if !(200.0..=11000.0).contains(&self.wavelength_nano) {
            warn!(
                "Wavelength {} nm is outside the usual 200..11000 nm range",
                self.wavelength_nano
            );
        }
        if !(50.0..=2000.0).contains(&self.focal_length_mm) {
            warn!(
                "Focal length {} mm is outside the usual 50..2000 mm range",
                self.focal_length_mm
            );
        }

        let deviation = self.rayleigh_deviation();
        if deviation > RAYLEIGH_DEVIATION_LIMIT {
            warn!(
                "Configured Rayleigh length {:.3} µm deviates {:.0}% from theoretical {:.3} µm",
                self.rayleigh_length_micron,
                deviation * 100.0,
                self.theoretical_rayleigh_length_micron()
            );
        }

        Ok(())
    }
}

/// Field curvature polynomial A·r² + B·r + C (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldCurvatureConfig {
    pub a_factor: f64,
    pub b_factor: f64,
    pub c_factor: f64,
}

impl FieldCurvatureConfig {
    /// Validate coefficients
    pub fn validate(&self) -> ConfigResult<()> {
        require_finite("curve.a_factor", self.a_factor)?;
        require_finite("curve.b_factor", self.b_factor)?;
        require_finite("curve.c_factor", self.c_factor)
    }
}

/// Laser power calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Rated maximum output (W)
    pub max_power_watts: f64,
    /// Measured output (W) at evenly spaced normalized setpoints 0..1
    pub correction_table: Vec<f64>,
    /// Proportional offset
    pub k_factor: f64,
    /// Constant offset (W)
    pub c_factor: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        let max_power_watts = 500.0;
        Self {
            max_power_watts,
            correction_table: (0..=10).map(|i| max_power_watts * i as f64 / 10.0).collect(),
            k_factor: 0.0,
            c_factor: 0.0,
        }
    }
}

impl PowerConfig {
    /// Validate power calibration
    pub fn validate(&self) -> ConfigResult<()> {
        require_positive("power.max_power_watts", self.max_power_watts)?;
        require_finite("power.k_factor", self.k_factor)?;
        require_finite("power.c_factor", self.c_factor)?;

        if self.correction_table.len() < 2 {
            return Err(ConfigError::CorrectionTableTooShort {
                len: self.correction_table.len(),
            });
        }

        for (i, value) in self.correction_table.iter().enumerate() {
            require_finite(&format!("power.correction_table[{}]", i), *value)?;
        }

        if let Some(index) = self
            .correction_table
            .windows(2)
            .position(|pair| pair[1] < pair[0])
        {
            return Err(ConfigError::CorrectionTableNotMonotonic { index: index + 1 });
        }

        Ok(())
    }
}

/// Scanner command protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanProtocol {
    Spi,
    Xy2_100,
    Sl2,
}

impl ScanProtocol {
    /// Protocol for a driver protocol code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Spi),
            1 => Some(Self::Xy2_100),
            2 => Some(Self::Sl2),
            _ => None,
        }
    }

    /// Driver protocol code
    pub fn code(self) -> u8 {
        match self {
            Self::Spi => 0,
            Self::Xy2_100 => 1,
            Self::Sl2 => 2,
        }
    }
}

impl fmt::Display for ScanProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi => write!(f, "SPI"),
            Self::Xy2_100 => write!(f, "XY2-100"),
            Self::Sl2 => write!(f, "SL2"),
        }
    }
}

/// Whether the card drives a Z axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanMode {
    #[serde(rename = "2d")]
    TwoD,
    #[default]
    #[serde(rename = "3d")]
    ThreeD,
}

impl ScanMode {
    /// Driver dimension flag
    pub fn is_3d(self) -> bool {
        matches!(self, Self::ThreeD)
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoD => write!(f, "2D"),
            Self::ThreeD => write!(f, "3D"),
        }
    }
}

/// Scanner field geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerGeometryConfig {
    /// Field width (mm)
    pub field_size_x: f64,
    /// Field height (mm)
    pub field_size_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub offset_z: f64,
    /// Field rotation (degrees, counter-clockwise)
    pub rotate_angle_deg: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Passed through to the driver; not used in Z composition
    pub scale_z: f64,
    /// 0 = SPI, 1 = XY2-100, 2 = SL2
    pub protocol_code: u8,
    pub mode: ScanMode,
}

impl Default for ScannerGeometryConfig {
    fn default() -> Self {
        Self {
            field_size_x: 400.0,
            field_size_y: 400.0,
            offset_x: 0.0,
            offset_y: 0.0,
            offset_z: 0.0,
            rotate_angle_deg: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            scale_z: 1.0,
            protocol_code: 1,
            mode: ScanMode::ThreeD,
        }
    }
}

impl ScannerGeometryConfig {
    /// Configured protocol
    pub fn protocol(&self) -> Option<ScanProtocol> {
        ScanProtocol::from_code(self.protocol_code)
    }

    /// Half field extents (mm)
    pub fn half_field(&self) -> (f64, f64) {
        (self.field_size_x / 2.0, self.field_size_y / 2.0)
    }

    /// Validate geometry
    pub fn validate(&self) -> ConfigResult<()> {
        require_positive("geometry.field_size_x", self.field_size_x)?;
        require_positive("geometry.field_size_y", self.field_size_y)?;
        require_finite("geometry.offset_x", self.offset_x)?;
        require_finite("geometry.offset_y", self.offset_y)?;
        require_finite("geometry.offset_z", self.offset_z)?;
        require_positive("geometry.scale_x", self.scale_x)?;
        require_positive("geometry.scale_y", self.scale_y)?;
        require_positive("geometry.scale_z", self.scale_z)?;

        if !self.rotate_angle_deg.is_finite() || self.rotate_angle_deg.abs() > 360.0 {
            return Err(ConfigError::invalid(
                "geometry.rotate_angle_deg",
                self.rotate_angle_deg,
                "must be within -360..=360",
            ));
        }

        if self.protocol().is_none() {
            return Err(ConfigError::invalid(
                "geometry.protocol_code",
                self.protocol_code as f64,
                "must be 0 (SPI), 1 (XY2-100) or 2 (SL2)",
            ));
        }

        if self.field_size_x > 2000.0 || self.field_size_y > 2000.0 {
            warn!(
                "Field size {}x{} mm exceeds 2000 mm",
                self.field_size_x, self.field_size_y
            );
        }

        Ok(())
    }
}

/// Feature switches consulted by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionSwitches {
    /// Linearize power through the correction table
    pub enable_power_correction: bool,
    /// Apply the k/c power offset
    pub enable_power_offset: bool,
    /// Convert requested beam diameters into Z defocus
    pub enable_diameter_change: bool,
    /// Compensate power-dependent focus shift
    pub enable_focus_shift_compensation: bool,
}

impl Default for FunctionSwitches {
    fn default() -> Self {
        Self {
            enable_power_correction: false,
            enable_power_offset: false,
            enable_diameter_change: true,
            enable_focus_shift_compensation: false,
        }
    }
}

/// Complete calibration of one laser card
///
/// Immutable during a compile job and shared read-only across threads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserCardConfig {
    /// Beam optics
    pub beam: BeamOpticsConfig,
    /// Field curvature
    pub curve: FieldCurvatureConfig,
    /// Power calibration
    pub power: PowerConfig,
    /// Field geometry
    pub geometry: ScannerGeometryConfig,
    /// Speed profiles
    pub profiles: SpeedProfileSet,
    /// Function switches
    pub flags: FunctionSwitches,
}

impl LaserCardConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location for a card's configuration file
    ///
    /// `<config dir>/galvokit/card_<index>.json`, or `None` when the platform
    /// has no configuration directory.
    pub fn default_path(card_index: u32) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join("galvokit")
                .join(format!("card_{}.json", card_index))
        })
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(content: &str) -> SettingsResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded laser card config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;

        debug!("Saved laser card config to {}", path.display());
        Ok(())
    }

    /// Validate all sections
    pub fn validate(&self) -> ConfigResult<()> {
        self.beam.validate()?;
        self.curve.validate()?;
        self.power.validate()?;
        self.geometry.validate()?;
        self.profiles.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

fn require_finite(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "must be finite"))
    }
}

fn require_positive(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "must be finite and > 0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LaserCardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.profiles.speeds(), vec![500, 1000, 2000]);
        assert_eq!(config.geometry.protocol(), Some(ScanProtocol::Xy2_100));
        assert!(config.geometry.mode.is_3d());
    }

    #[test]
    fn test_theoretical_rayleigh_length() {
        let beam = BeamOpticsConfig::default();
        let z_r = beam.theoretical_rayleigh_length_micron();
        assert!((z_r - 1917.2).abs() < 1.0, "z_R = {}", z_r);
        assert!(beam.rayleigh_deviation() < RAYLEIGH_DEVIATION_LIMIT);
    }

    #[test]
    fn test_rayleigh_deviation_only_warns() {
        let beam = BeamOpticsConfig {
            min_beam_diameter_micron: 63.0,
            ..BeamOpticsConfig::default()
        };
        assert!(beam.rayleigh_deviation() > RAYLEIGH_DEVIATION_LIMIT);
        assert!(beam.validate().is_ok());
    }

    #[test]
    fn test_invalid_beam() {
        let beam = BeamOpticsConfig {
            min_beam_diameter_micron: 0.0,
            ..BeamOpticsConfig::default()
        };
        assert!(matches!(
            beam.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "beam.min_beam_diameter_micron"
        ));

        let beam = BeamOpticsConfig {
            m2: 0.9,
            ..BeamOpticsConfig::default()
        };
        assert!(beam.validate().is_err());
    }

    #[test]
    fn test_correction_table_rules() {
        let mut power = PowerConfig {
            correction_table: vec![0.0],
            ..PowerConfig::default()
        };
        assert_eq!(
            power.validate(),
            Err(ConfigError::CorrectionTableTooShort { len: 1 })
        );

        power.correction_table = vec![0.0, 300.0, 250.0, 500.0];
        assert_eq!(
            power.validate(),
            Err(ConfigError::CorrectionTableNotMonotonic { index: 2 })
        );

        power.correction_table = vec![0.0, f64::NAN];
        assert!(power.validate().is_err());

        power.correction_table = vec![0.0, 0.0, 500.0];
        assert!(power.validate().is_ok());
    }

    #[test]
    fn test_geometry_rules() {
        let mut geometry = ScannerGeometryConfig::default();
        geometry.protocol_code = 3;
        assert!(geometry.validate().is_err());

        geometry.protocol_code = 0;
        geometry.scale_x = 0.0;
        assert!(geometry.validate().is_err());

        geometry.scale_x = 1.0;
        geometry.rotate_angle_deg = 400.0;
        assert!(geometry.validate().is_err());

        geometry.rotate_angle_deg = -90.0;
        assert!(geometry.validate().is_ok());
        assert_eq!(geometry.half_field(), (200.0, 200.0));
    }

    #[test]
    fn test_scan_mode_serde() {
        assert_eq!(serde_json::to_string(&ScanMode::TwoD).unwrap(), "\"2d\"");
        let mode: ScanMode = serde_json::from_str("\"3d\"").unwrap();
        assert_eq!(mode, ScanMode::ThreeD);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "power": { "max_power_watts": 200.0, "correction_table": [0.0, 100.0, 200.0] },
            "profiles": [ { "mark_speed": 800 }, { "mark_speed": 1250 } ]
        }"#;
        let config = LaserCardConfig::from_json_str(json).unwrap();
        assert_eq!(config.power.max_power_watts, 200.0);
        assert_eq!(config.profiles.speeds(), vec![800, 1250]);
        assert_eq!(config.beam, BeamOpticsConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let config = LaserCardConfig::default();
        let err = config.save_to_file(Path::new("card.yaml")).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(ref ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_default_path() {
        if let Some(path) = LaserCardConfig::default_path(1) {
            assert!(path.ends_with("galvokit/card_1.json"));
        }
    }
}

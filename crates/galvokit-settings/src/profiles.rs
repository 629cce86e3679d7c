//! Per-speed process profiles
//!
//! A scanner is calibrated at a handful of mark speeds; each calibration
//! point carries its own delays. Profiles are keyed by mark speed and kept
//! ordered so that nearest-speed lookups are a range query.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Highest mark or jump speed the scanner card accepts (mm/s)
pub const MAX_SCAN_SPEED: u32 = 50_000;

/// Most negative laser on/off delay the hardware accepts (µs)
pub const MIN_LASER_DELAY: f32 = -320.0;

/// Timing and speed parameters calibrated for one mark speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProfile {
    /// Mark speed this profile was calibrated at (mm/s); unique key
    pub mark_speed: u32,
    /// Jump speed (mm/s)
    pub jump_speed: u32,
    /// Mark delay (µs)
    pub mark_delay: u32,
    /// Jump delay (µs)
    pub jump_delay: u32,
    /// Polygon (corner) delay (µs)
    pub polygon_delay: u32,
    /// Laser on delay (µs), may be negative
    pub laser_on_delay: f32,
    /// Laser off delay (µs), may be negative
    pub laser_off_delay: f32,
    /// Laser on delay used when SkyWriting is active (µs)
    pub laser_on_delay_for_sky_writing: f32,
    /// Laser off delay used when SkyWriting is active (µs)
    pub laser_off_delay_for_sky_writing: f32,
    /// Minimum jump delay (µs)
    pub min_jump_delay: u32,
    /// Jumps longer than this use the full jump delay (mm)
    pub jump_max_length_limit_mm: f64,
    /// Whether SkyWriting is available at this speed
    pub sw_enable: bool,
    /// SkyWriting acceleration limit
    pub umax: f64,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            mark_speed: 1000,
            jump_speed: 5000,
            mark_delay: 100,
            jump_delay: 150,
            polygon_delay: 50,
            laser_on_delay: 110.0,
            laser_off_delay: 120.0,
            laser_on_delay_for_sky_writing: 600.0,
            laser_off_delay_for_sky_writing: 730.0,
            min_jump_delay: 10,
            jump_max_length_limit_mm: 10.0,
            sw_enable: false,
            umax: 0.1,
        }
    }
}

impl SpeedProfile {
    /// Default profile calibrated at `mark_speed`
    pub fn at_speed(mark_speed: u32) -> Self {
        Self {
            mark_speed,
            ..Self::default()
        }
    }

    /// Validate profile ranges
    pub fn validate(&self) -> ConfigResult<()> {
        let key = |field: &str| format!("profiles[{}].{}", self.mark_speed, field);

        if self.mark_speed == 0 || self.mark_speed > MAX_SCAN_SPEED {
            return Err(ConfigError::invalid(
                key("mark_speed"),
                self.mark_speed as f64,
                format!("must be in 1..={}", MAX_SCAN_SPEED),
            ));
        }
        if self.jump_speed > MAX_SCAN_SPEED {
            return Err(ConfigError::invalid(
                key("jump_speed"),
                self.jump_speed as f64,
                format!("must be <= {}", MAX_SCAN_SPEED),
            ));
        }

        let delays = [
            ("laser_on_delay", self.laser_on_delay),
            ("laser_off_delay", self.laser_off_delay),
            (
                "laser_on_delay_for_sky_writing",
                self.laser_on_delay_for_sky_writing,
            ),
            (
                "laser_off_delay_for_sky_writing",
                self.laser_off_delay_for_sky_writing,
            ),
        ];
        for (name, value) in delays {
            if !value.is_finite() || value < MIN_LASER_DELAY {
                return Err(ConfigError::invalid(
                    key(name),
                    value as f64,
                    format!("must be finite and >= {}", MIN_LASER_DELAY),
                ));
            }
        }

        if !self.jump_max_length_limit_mm.is_finite() || self.jump_max_length_limit_mm < 0.0 {
            return Err(ConfigError::invalid(
                key("jump_max_length_limit_mm"),
                self.jump_max_length_limit_mm,
                "must be finite and >= 0",
            ));
        }
        if !self.umax.is_finite() || self.umax < 0.0 {
            return Err(ConfigError::invalid(
                key("umax"),
                self.umax,
                "must be finite and >= 0",
            ));
        }

        Ok(())
    }
}

/// Non-empty set of speed profiles with unique mark speeds
///
/// Serialized as a plain list; an empty list or a repeated mark speed is
/// rejected on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SpeedProfile>", into = "Vec<SpeedProfile>")]
pub struct SpeedProfileSet {
    profiles: BTreeMap<u32, SpeedProfile>,
}

impl SpeedProfileSet {
    /// Build a set from a list of profiles
    pub fn new(profiles: Vec<SpeedProfile>) -> ConfigResult<Self> {
        if profiles.is_empty() {
            return Err(ConfigError::NoSpeedProfiles);
        }

        let mut map = BTreeMap::new();
        for profile in profiles {
            let mark_speed = profile.mark_speed;
            if map.insert(mark_speed, profile).is_some() {
                return Err(ConfigError::DuplicateSpeedProfile { mark_speed });
            }
        }

        Ok(Self { profiles: map })
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True when no profiles are configured
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profile calibrated at exactly `mark_speed`
    pub fn get(&self, mark_speed: u32) -> Option<&SpeedProfile> {
        self.profiles.get(&mark_speed)
    }

    /// Profile with the greatest mark speed not above `mark_speed`
    pub fn at_or_below(&self, mark_speed: u32) -> Option<&SpeedProfile> {
        self.profiles
            .range(..=mark_speed)
            .next_back()
            .map(|(_, profile)| profile)
    }

    /// Profile with the lowest mark speed
    pub fn slowest(&self) -> Option<&SpeedProfile> {
        self.profiles.values().next()
    }

    /// Profiles in ascending mark speed order
    pub fn iter(&self) -> btree_map::Values<'_, u32, SpeedProfile> {
        self.profiles.values()
    }

    /// Calibrated mark speeds, ascending
    pub fn speeds(&self) -> Vec<u32> {
        self.profiles.keys().copied().collect()
    }

    /// Validate every profile
    pub fn validate(&self) -> ConfigResult<()> {
        if self.profiles.is_empty() {
            return Err(ConfigError::NoSpeedProfiles);
        }
        self.iter().try_for_each(SpeedProfile::validate)
    }
}

impl Default for SpeedProfileSet {
    fn default() -> Self {
        let profiles = [500, 1000, 2000]
            .into_iter()
            .map(|speed| (speed, SpeedProfile::at_speed(speed)))
            .collect();
        Self { profiles }
    }
}

impl TryFrom<Vec<SpeedProfile>> for SpeedProfileSet {
    type Error = ConfigError;

    fn try_from(profiles: Vec<SpeedProfile>) -> ConfigResult<Self> {
        Self::new(profiles)
    }
}

impl From<SpeedProfileSet> for Vec<SpeedProfile> {
    fn from(set: SpeedProfileSet) -> Self {
        set.profiles.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a SpeedProfileSet {
    type Item = &'a SpeedProfile;
    type IntoIter = btree_map::Values<'a, u32, SpeedProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Region compilation
//!
//! A region is one homogeneous chunk of slicer output: a set of polylines
//! sharing speed, power, spot size and SkyWriting mode. Compiling it yields
//! one layer parameter block and the transformed 3D polylines.

use crate::beam_optics::{self, BeamWarning};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{ParameterError, RegionError, RegionResult};
use crate::power::{self, CorrectedPower};
use crate::skywriting;
use crate::speed_profile::{self, Selection};
use crate::transform::CoordinateTransformer;
use galvokit_core::{micron_to_mm, GeometryError, Polyline2D, Polyline3D};
use galvokit_settings::{LaserCardConfig, MIN_LASER_DELAY};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A toolpath region as delivered by the slicer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliRegion {
    pub name: String,
    #[serde(default)]
    pub skywriting_enabled: bool,
    /// Requested mark speed (mm/s)
    pub mark_speed: f64,
    /// Requested laser power (W)
    pub laser_power_watts: f64,
    /// Requested spot diameter (µm); zero means focus
    #[serde(default)]
    pub beam_diameter_micron: f64,
    /// Polylines in scan-plane millimetres
    pub polylines: Vec<Polyline2D>,
    /// Laser card this region belongs to on multi-card systems
    #[serde(default)]
    pub laser_index: Option<u32>,
}

impl CliRegion {
    pub fn new(name: impl Into<String>, polylines: Vec<Polyline2D>) -> Self {
        Self {
            name: name.into(),
            skywriting_enabled: false,
            mark_speed: 1000.0,
            laser_power_watts: 0.0,
            beam_diameter_micron: 0.0,
            polylines,
            laser_index: None,
        }
    }

    pub fn with_speed(mut self, mark_speed: f64) -> Self {
        self.mark_speed = mark_speed;
        self
    }

    pub fn with_power(mut self, laser_power_watts: f64) -> Self {
        self.laser_power_watts = laser_power_watts;
        self
    }

    pub fn with_diameter(mut self, beam_diameter_micron: f64) -> Self {
        self.beam_diameter_micron = beam_diameter_micron;
        self
    }

    pub fn with_skywriting(mut self, enabled: bool) -> Self {
        self.skywriting_enabled = enabled;
        self
    }

    pub fn with_laser(mut self, laser_index: u32) -> Self {
        self.laser_index = Some(laser_index);
        self
    }

    /// Card index, defaulting to the first card
    pub fn card(&self) -> u32 {
        self.laser_index.unwrap_or(0)
    }

    /// Total number of points over all polylines
    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Polyline2D::len).sum()
    }
}

/// Parameter block for one marking layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerParameters {
    /// Mark speed (mm/s)
    pub mark_speed: u32,
    /// Jump speed (mm/s)
    pub jump_speed: u32,
    /// Mark delay (µs)
    pub mark_delay: u32,
    /// Jump delay (µs)
    pub jump_delay: u32,
    /// Polygon delay (µs)
    pub polygon_delay: u32,
    /// Laser on delay (µs)
    pub laser_on_delay: f32,
    /// Laser off delay (µs)
    pub laser_off_delay: f32,
    /// Commanded power as a share of maximum (0..=100)
    pub laser_power_percent: f32,
    /// Number of passes
    pub mark_count: u32,
    /// SkyWriting active for this layer
    pub sky_writing: bool,
}

impl LayerParameters {
    /// Check hardware limits
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(0.0..=100.0).contains(&self.laser_power_percent) {
            return Err(out_of_range(
                "laser_power_percent",
                self.laser_power_percent,
                0.0,
                100.0,
            ));
        }
        for (name, value) in [
            ("laser_on_delay", self.laser_on_delay),
            ("laser_off_delay", self.laser_off_delay),
        ] {
            if !value.is_finite() || value < MIN_LASER_DELAY {
                return Err(out_of_range(name, value, MIN_LASER_DELAY, f32::MAX));
            }
        }
        Ok(())
    }
}

fn out_of_range(name: &str, value: f32, min: f32, max: f32) -> ParameterError {
    ParameterError::OutOfRange {
        name: name.to_string(),
        value: value as f64,
        min: min as f64,
        max: max as f64,
    }
}

/// Result of compiling one region
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRegion {
    /// Source region name
    pub name: String,
    pub parameters: LayerParameters,
    /// Transformed polylines in input order, empty ones dropped
    pub polylines: Vec<Polyline3D>,
    /// Mark speed of the selected profile
    pub profile_speed: u32,
    /// How the profile was selected
    pub selection: Selection,
    /// Power after correction
    pub power: CorrectedPower,
    /// Defocus from the requested beam diameter, after focus-shift
    /// compensation (mm)
    pub z_diameter_mm: f64,
    /// Non-fatal diagnostics raised while compiling
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledRegion {
    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Polyline3D::len).sum()
    }
}

/// Compiles regions against one laser card configuration
#[derive(Debug, Clone, Copy)]
pub struct RegionCompiler<'a> {
    config: &'a LaserCardConfig,
}

impl<'a> RegionCompiler<'a> {
    /// The configuration is expected to have been validated.
    pub fn new(config: &'a LaserCardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a LaserCardConfig {
        self.config
    }

    /// Compile one region
    pub fn compile(&self, region: &CliRegion) -> RegionResult<CompiledRegion> {
        let cfg = self.config;
        let (requested_speed, polylines) = check_region(region)?;

        let (profile, selection) = speed_profile::select(requested_speed, &cfg.profiles)
            .ok_or_else(|| RegionError::NoSpeedProfile {
                region: region.name.clone(),
            })?;
        let timing = skywriting::resolve(profile, region.skywriting_enabled);
        let power = power::correct_power(region.laser_power_watts, &cfg.power, &cfg.flags);

        let mut diagnostics = Vec::new();
        let mut z_diameter_mm = 0.0;

        if cfg.flags.enable_diameter_change && region.beam_diameter_micron > 0.0 {
            let (z, warning) =
                beam_optics::diameter_to_z_offset(region.beam_diameter_micron, &cfg.beam);
            z_diameter_mm = z;

            if let Some(BeamWarning::ClampedBelowMinimum { requested, minimum }) = warning {
                diagnostics.push(Diagnostic::new(
                    region.name.clone(),
                    DiagnosticKind::BeamGeometry {
                        requested_micron: requested,
                        minimum_micron: minimum,
                    },
                ));
            }
            if beam_optics::is_strong_defocus(region.beam_diameter_micron, &cfg.beam) {
                diagnostics.push(Diagnostic::new(
                    region.name.clone(),
                    DiagnosticKind::StrongDefocus {
                        requested_micron: region.beam_diameter_micron,
                        relative_intensity: beam_optics::relative_intensity(
                            region.beam_diameter_micron,
                            &cfg.beam,
                        ),
                    },
                ));
            }
        }

        if cfg.flags.enable_focus_shift_compensation {
            let shift = beam_optics::focus_shift_micron(
                region.laser_power_watts,
                cfg.power.max_power_watts,
                &cfg.beam,
            );
            z_diameter_mm -= micron_to_mm(shift);
        }

        let transformer = CoordinateTransformer::new(&cfg.geometry, &cfg.curve);
        let polylines: Vec<Polyline3D> = polylines
            .into_iter()
            .map(|line| transformer.apply_polyline(line, z_diameter_mm))
            .collect();

        let parameters = LayerParameters {
            mark_speed: requested_speed,
            jump_speed: profile.jump_speed,
            mark_delay: timing.mark_delay,
            jump_delay: timing.jump_delay,
            polygon_delay: timing.polygon_delay,
            laser_on_delay: timing.laser_on_delay,
            laser_off_delay: timing.laser_off_delay,
            laser_power_percent: power.percent as f32,
            mark_count: 1,
            sky_writing: region.skywriting_enabled,
        };

        debug!(
            "Compiled region '{}': {} polylines, profile {} mm/s ({}), power {:.1}%, z {:.4} mm",
            region.name,
            polylines.len(),
            profile.mark_speed,
            selection,
            power.percent,
            z_diameter_mm
        );

        Ok(CompiledRegion {
            name: region.name.clone(),
            parameters,
            polylines,
            profile_speed: profile.mark_speed,
            selection,
            power,
            z_diameter_mm,
            diagnostics,
        })
    }
}

/// Compile `region` against `config`
pub fn compile(region: &CliRegion, config: &LaserCardConfig) -> RegionResult<CompiledRegion> {
    RegionCompiler::new(config).compile(region)
}

/// Validate inputs and return the rounded mark speed and the non-empty
/// polylines
fn check_region(region: &CliRegion) -> RegionResult<(u32, Vec<&Polyline2D>)> {
    let name = || region.name.clone();

    let mark_speed = region.mark_speed.round();
    if !mark_speed.is_finite() || mark_speed < 1.0 || mark_speed > u32::MAX as f64 {
        return Err(RegionError::InvalidMarkSpeed {
            region: name(),
            value: region.mark_speed,
        });
    }
    if !region.laser_power_watts.is_finite() || region.laser_power_watts < 0.0 {
        return Err(RegionError::InvalidPower {
            region: name(),
            value: region.laser_power_watts,
        });
    }
    if !region.beam_diameter_micron.is_finite() || region.beam_diameter_micron < 0.0 {
        return Err(RegionError::InvalidBeamDiameter {
            region: name(),
            value: region.beam_diameter_micron,
        });
    }

    for (polyline, line) in region.polylines.iter().enumerate() {
        if let Some(point) = line.first_non_finite() {
            return Err(RegionError::Geometry {
                region: name(),
                source: GeometryError::NonFiniteCoordinate { polyline, point },
            });
        }
    }

    let lines: Vec<&Polyline2D> = region.polylines.iter().filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return Err(RegionError::EmptyGeometry { region: name() });
    }

    Ok((mark_speed as u32, lines))
}

//! Marking documents and the scanner driver seam
//!
//! A [`MarkingDocument`] is the finished job for one laser card: protocol
//! metadata plus ordered parameter blocks, each with its polylines. It is
//! flattened into a closed [`MarkingCommand`] stream and replayed into any
//! [`ScannerDriver`].

use crate::error::CompileError;
use crate::region::LayerParameters;
use galvokit_core::{Point3D, Polyline3D};
use galvokit_settings::{ScanMode, ScanProtocol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// One parameter block and the polylines marked with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingLayer {
    /// Driver layer index
    pub layer_index: u32,
    pub parameters: LayerParameters,
    pub polylines: Vec<Polyline3D>,
    /// Regions that contributed geometry, in input order
    pub regions: Vec<String>,
}

impl MarkingLayer {
    pub fn new(layer_index: u32, parameters: LayerParameters) -> Self {
        Self {
            layer_index,
            parameters,
            polylines: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Polyline3D::len).sum()
    }

    /// Marked path length (mm)
    pub fn mark_length(&self) -> f64 {
        self.polylines.iter().map(Polyline3D::length).sum()
    }
}

/// Summary figures for a document
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Parameter blocks
    pub blocks: usize,
    /// Distinct driver layer indices
    pub layers: usize,
    pub polylines: usize,
    pub points: usize,
    /// Total marked length (mm)
    pub mark_length_mm: f64,
    /// Total jump length between polylines (mm)
    pub jump_length_mm: f64,
    /// Estimated marking plus jump time (s)
    pub estimated_time_s: f64,
}

/// A finished marking job for one laser card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingDocument {
    /// 0 = SPI, 1 = XY2-100, 2 = SL2
    pub protocol_code: u8,
    pub mode: ScanMode,
    pub layers: Vec<MarkingLayer>,
}

impl MarkingDocument {
    pub fn new(protocol_code: u8, mode: ScanMode) -> Self {
        Self {
            protocol_code,
            mode,
            layers: Vec::new(),
        }
    }

    pub fn protocol(&self) -> Option<ScanProtocol> {
        ScanProtocol::from_code(self.protocol_code)
    }

    /// Append a parameter block
    pub fn push_layer(&mut self, layer: MarkingLayer) {
        self.layers.push(layer);
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Number of distinct driver layer indices
    pub fn layer_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.layer_index)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Flatten into driver commands
    ///
    /// Protocol first, then each block's parameters followed by its
    /// polylines, then a jump back to the origin.
    pub fn commands(&self) -> Vec<MarkingCommand<'_>> {
        let mut commands = vec![MarkingCommand::SetProtocol {
            protocol_code: self.protocol_code,
            mode: self.mode,
        }];

        for layer in &self.layers {
            commands.push(MarkingCommand::SetLayerParameters {
                layer_index: layer.layer_index,
                parameters: &layer.parameters,
            });
            commands.extend(layer.polylines.iter().map(|polyline| {
                MarkingCommand::AddPolyline3D {
                    layer_index: layer.layer_index,
                    polyline,
                }
            }));
        }

        commands.push(MarkingCommand::Jump(Point3D::origin()));
        commands
    }

    /// Replay the command stream into `driver`
    pub fn emit<D: ScannerDriver>(&self, driver: &mut D) -> Result<(), D::Error> {
        for command in self.commands() {
            match command {
                MarkingCommand::SetProtocol {
                    protocol_code,
                    mode,
                } => driver.set_protocol(protocol_code, mode)?,
                MarkingCommand::SetLayerParameters {
                    layer_index,
                    parameters,
                } => driver.set_layer_parameters(layer_index, parameters)?,
                MarkingCommand::AddPolyline3D {
                    layer_index,
                    polyline,
                } => driver.add_polyline_3d(layer_index, polyline)?,
                MarkingCommand::Jump(target) => driver.jump(target)?,
            }
        }
        Ok(())
    }

    /// Counts, lengths and a time estimate
    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats {
            blocks: self.layers.len(),
            layers: self.layer_count(),
            ..DocumentStats::default()
        };

        let mut position = Point3D::origin();
        for layer in &self.layers {
            let mark_length = layer.mark_length();
            stats.polylines += layer.polylines.len();
            stats.points += layer.point_count();
            stats.mark_length_mm += mark_length;

            let mut jump_length = 0.0;
            for polyline in &layer.polylines {
                if let (Some(start), Some(end)) = (polyline.start(), polyline.end()) {
                    jump_length += position.xy().distance_to(&start.xy());
                    position = *end;
                }
            }
            stats.jump_length_mm += jump_length;

            let params = &layer.parameters;
            if params.mark_speed > 0 {
                stats.estimated_time_s +=
                    mark_length / params.mark_speed as f64 * params.mark_count as f64;
            }
            if params.jump_speed > 0 {
                stats.estimated_time_s += jump_length / params.jump_speed as f64;
            }
        }

        stats
    }
}

/// A single driver instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkingCommand<'a> {
    SetProtocol {
        protocol_code: u8,
        mode: ScanMode,
    },
    SetLayerParameters {
        layer_index: u32,
        parameters: &'a LayerParameters,
    },
    AddPolyline3D {
        layer_index: u32,
        polyline: &'a Polyline3D,
    },
    Jump(Point3D),
}

/// Scanner card driver interface
///
/// Implemented by vendor driver bindings; the compiler only calls these
/// methods in command stream order.
pub trait ScannerDriver {
    type Error;

    /// Select the command protocol and 2D/3D mode
    fn set_protocol(&mut self, protocol_code: u8, mode: ScanMode) -> Result<(), Self::Error>;

    /// Define the parameters for the following polylines
    fn set_layer_parameters(
        &mut self,
        layer_index: u32,
        parameters: &LayerParameters,
    ) -> Result<(), Self::Error>;

    /// Queue a 3D polyline on a layer
    fn add_polyline_3d(&mut self, layer_index: u32, polyline: &Polyline3D)
        -> Result<(), Self::Error>;

    /// Move without marking
    fn jump(&mut self, target: Point3D) -> Result<(), Self::Error>;

    /// Write the job to disk
    fn save_to_file(&mut self, path: &Path) -> Result<(), Self::Error>;
}

/// Driver that renders commands as a readable text log
///
/// Used for dry runs and for inspecting what a real driver would receive.
#[derive(Debug, Clone, Default)]
pub struct CommandLogDriver {
    log: String,
    commands: usize,
}

impl CommandLogDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log text so far
    pub fn log(&self) -> &str {
        &self.log
    }

    /// Number of commands received
    pub fn command_count(&self) -> usize {
        self.commands
    }

    fn line(&mut self, text: String) {
        self.log.push_str(&text);
        self.log.push('\n');
        self.commands += 1;
    }
}

impl ScannerDriver for CommandLogDriver {
    type Error = CompileError;

    fn set_protocol(&mut self, protocol_code: u8, mode: ScanMode) -> Result<(), Self::Error> {
        let name = ScanProtocol::from_code(protocol_code)
            .map(|p| p.to_string())
            .unwrap_or_else(|| format!("code {}", protocol_code));
        self.line(format!("PROTOCOL {} {}", name, mode));
        Ok(())
    }

    fn set_layer_parameters(
        &mut self,
        layer_index: u32,
        p: &LayerParameters,
    ) -> Result<(), Self::Error> {
        p.validate()?;
        self.line(format!(
            "LAYER {} SPEED {} JUMP {} POWER {:.2}% MARK_DELAY {} JUMP_DELAY {} POLYGON_DELAY {} LASER_ON {:.1} LASER_OFF {:.1} COUNT {} SKYWRITING {}",
            layer_index,
            p.mark_speed,
            p.jump_speed,
            p.laser_power_percent,
            p.mark_delay,
            p.jump_delay,
            p.polygon_delay,
            p.laser_on_delay,
            p.laser_off_delay,
            p.mark_count,
            if p.sky_writing { "ON" } else { "OFF" }
        ));
        Ok(())
    }

    fn add_polyline_3d(
        &mut self,
        layer_index: u32,
        polyline: &Polyline3D,
    ) -> Result<(), Self::Error> {
        let mut text = format!("POLYLINE {} {} points", layer_index, polyline.len());
        for point in &polyline.points {
            text.push_str(&format!(" [{}]", point));
        }
        self.line(text);
        Ok(())
    }

    fn jump(&mut self, target: Point3D) -> Result<(), Self::Error> {
        self.line(format!("JUMP {}", target));
        Ok(())
    }

    fn save_to_file(&mut self, path: &Path) -> Result<(), Self::Error> {
        std::fs::write(path, &self.log)?;
        Ok(())
    }
}

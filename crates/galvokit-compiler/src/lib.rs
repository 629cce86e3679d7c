//! # GalvoKit Compiler
//!
//! Turns sliced toolpath regions into marking instructions for a
//! galvanometer laser scanner.
//!
//! ## Pipeline
//!
//! - **Beam optics**: requested spot diameter to Z defocus (Gaussian beam)
//! - **Field curvature**: radial Z correction of the focal surface
//! - **Power**: calibration table, offset and clamping
//! - **Speed profiles**: nearest-speed timing selection
//! - **SkyWriting**: timing switch for SkyWriting layers
//! - **Transform**: scale, rotate, translate and Z composition
//! - **Region compiler**: one region to one parameter block plus 3D polylines
//! - **Aggregator**: batches of regions to a layered marking document
//! - **Document**: command stream and the scanner driver seam

pub mod aggregator;
pub mod beam_optics;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod field_curvature;
pub mod power;
pub mod region;
pub mod skywriting;
pub mod speed_profile;
pub mod transform;
pub mod validator;

pub use aggregator::{aggregate, aggregate_by_laser, BatchOutput, LayerAggregator, LayerPolicy};
pub use beam_optics::{diameter_to_z_offset, z_offset_to_diameter, BeamWarning};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use document::{
    CommandLogDriver, DocumentStats, MarkingCommand, MarkingDocument, MarkingLayer, ScannerDriver,
};
pub use error::{CompileError, CompileResult, ParameterError, RegionError, RegionResult};
pub use power::{correct_power, CorrectedPower};
pub use region::{compile, CliRegion, CompiledRegion, LayerParameters, RegionCompiler};
pub use skywriting::TimingParams;
pub use speed_profile::Selection;
pub use transform::{transform, CoordinateTransformer};

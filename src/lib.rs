//! # GalvoKit
//!
//! Compiles sliced toolpath regions into marking instructions for
//! galvanometer laser scanners.
//!
//! ## Architecture
//!
//! GalvoKit is organized as a workspace with multiple crates:
//!
//! 1. **galvokit-core** - Geometry primitives, unit helpers, shared errors
//! 2. **galvokit-settings** - Laser card calibration, validation, JSON/TOML files
//! 3. **galvokit-compiler** - Beam optics, power correction, transforms, layer aggregation
//! 4. **galvokit** - This facade, re-exporting the above plus logging setup
//!
//! ## Features
//!
//! - **Beam diameter control**: Gaussian-beam defocus with focus-shift compensation
//! - **Field correction**: curvature polynomial, scale, rotation and offsets
//! - **Power linearization**: calibration table plus proportional/constant offset
//! - **Layer policies**: single layer, separate layers, or grouped by parameters
//! - **Multi-card jobs**: batches split by laser index, each card with its own calibration
//! - **Driver seam**: closed command stream replayed into any scanner driver

use std::path::Path;

pub use galvokit_compiler as compiler;
pub use galvokit_core::{data, units};
pub use galvokit_settings as settings;

pub use galvokit_core::{Error, Point2D, Point3D, Polyline2D, Polyline3D, Result};

pub use galvokit_settings::{
    BeamOpticsConfig, ConfigError, FieldCurvatureConfig, FunctionSwitches, LaserCardConfig,
    PowerConfig, ScanMode, ScanProtocol, ScannerGeometryConfig, SettingsError, SpeedProfile,
    SpeedProfileSet,
};

pub use galvokit_compiler::{
    aggregate, aggregate_by_laser, compile, BatchOutput, CliRegion, CommandLogDriver,
    CompileError, CompiledRegion, Diagnostic, DiagnosticKind, DocumentStats, LayerAggregator,
    LayerParameters, LayerPolicy, MarkingCommand, MarkingDocument, MarkingLayer, RegionCompiler,
    RegionError, ScannerDriver, Severity,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load a laser card configuration and compile a batch against it
pub fn compile_with_config_file(
    config_path: &Path,
    regions: &[CliRegion],
    policy: LayerPolicy,
) -> anyhow::Result<BatchOutput> {
    use anyhow::Context;

    let config = LaserCardConfig::load_from_file(config_path)
        .with_context(|| format!("loading laser card config {}", config_path.display()))?;
    let output = aggregate(regions, &config, policy)?;
    Ok(output)
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(())
}

/// Initialize logging as newline-delimited JSON, for batch runs whose logs
/// are collected by another process
pub fn init_json_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(())
}

//! Layer aggregation
//!
//! Compiles a batch of regions and arranges the results into a
//! [`MarkingDocument`] according to a [`LayerPolicy`]. Regions are compiled
//! in parallel; results are assembled in input order so the output does not
//! depend on scheduling.

use crate::diagnostics::Diagnostic;
use crate::document::{MarkingDocument, MarkingLayer};
use crate::error::{CompileResult, RegionError, RegionResult};
use crate::region::{CliRegion, CompiledRegion, RegionCompiler};
use crate::validator;
use galvokit_settings::{LaserCardConfig, ScannerGeometryConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{info, warn};

/// How compiled regions map onto driver layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerPolicy {
    /// Every region on layer 0, one parameter block per region
    #[default]
    SingleLayer,
    /// One layer per successfully compiled region
    SeparateLayers,
    /// Regions with identical process inputs share a layer
    GroupedByParams,
}

impl fmt::Display for LayerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleLayer => write!(f, "single layer"),
            Self::SeparateLayers => write!(f, "separate layers"),
            Self::GroupedByParams => write!(f, "grouped by parameters"),
        }
    }
}

/// A compiled batch with everything that went wrong along the way
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    pub document: MarkingDocument,
    /// Diagnostics in region input order
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchOutput {
    /// Regions that were skipped
    pub fn failures(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_failure())
    }

    /// Non-fatal diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_failure())
    }
}

/// Regions with equal keys share a layer under [`LayerPolicy::GroupedByParams`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GroupKey {
    skywriting: bool,
    mark_speed: u64,
    power: u64,
    diameter: u64,
}

impl GroupKey {
    fn of(region: &CliRegion) -> Self {
        // + 0.0 folds -0.0 into 0.0
        Self {
            skywriting: region.skywriting_enabled,
            mark_speed: (region.mark_speed + 0.0).to_bits(),
            power: (region.laser_power_watts + 0.0).to_bits(),
            diameter: (region.beam_diameter_micron + 0.0).to_bits(),
        }
    }
}

/// Compiles batches of regions into marking documents
#[derive(Debug, Clone, Copy)]
pub struct LayerAggregator<'a> {
    config: &'a LaserCardConfig,
    policy: LayerPolicy,
    parallel: bool,
}

impl<'a> LayerAggregator<'a> {
    /// Validate `config` and build an aggregator
    pub fn new(config: &'a LaserCardConfig, policy: LayerPolicy) -> CompileResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            policy,
            parallel: true,
        })
    }

    /// Compile regions on the rayon pool (default) or on the calling thread
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn policy(&self) -> LayerPolicy {
        self.policy
    }

    /// Compile and aggregate a batch
    pub fn aggregate(&self, regions: &[CliRegion]) -> BatchOutput {
        let refs: Vec<&CliRegion> = regions.iter().collect();
        self.aggregate_refs(&refs)
    }

    fn compile_all(&self, regions: &[&CliRegion]) -> Vec<RegionResult<CompiledRegion>> {
        let compiler = RegionCompiler::new(self.config);
        if self.parallel {
            regions.par_iter().map(|r| compiler.compile(r)).collect()
        } else {
            regions.iter().map(|r| compiler.compile(r)).collect()
        }
    }

    fn aggregate_refs(&self, regions: &[&CliRegion]) -> BatchOutput {
        let geometry = &self.config.geometry;
        let results = self.compile_all(regions);

        let mut document = MarkingDocument::new(geometry.protocol_code, geometry.mode);
        let mut diagnostics = Vec::new();
        let mut groups: HashMap<GroupKey, usize> = HashMap::new();
        let mut next_layer: u32 = 0;
        let mut compiled_count = 0;

        for (region, result) in regions.iter().zip(results) {
            let mut compiled = match result {
                Ok(compiled) => compiled,
                Err(error) => {
                    diagnostics.push(Diagnostic::failure(error));
                    continue;
                }
            };
            compiled_count += 1;

            diagnostics.append(&mut compiled.diagnostics);
            diagnostics.extend(validator::validate_region(&compiled, geometry));

            match self.policy {
                LayerPolicy::SingleLayer => document.push_layer(into_layer(0, compiled)),
                LayerPolicy::SeparateLayers => {
                    document.push_layer(into_layer(next_layer, compiled));
                    next_layer += 1;
                }
                LayerPolicy::GroupedByParams => {
                    let key = GroupKey::of(region);
                    match groups.get(&key) {
                        Some(&index) => {
                            let layer = &mut document.layers[index];
                            layer.polylines.extend(compiled.polylines);
                            layer.regions.push(compiled.name);
                        }
                        None => {
                            groups.insert(key, document.layers.len());
                            document.push_layer(into_layer(next_layer, compiled));
                            next_layer += 1;
                        }
                    }
                }
            }
        }

        log_diagnostics(&diagnostics);
        info!(
            "Compiled {} of {} regions into {} layers ({} parameter blocks, {})",
            compiled_count,
            regions.len(),
            document.layer_count(),
            document.layers.len(),
            self.policy
        );

        BatchOutput {
            document,
            diagnostics,
        }
    }
}

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!("{}", diagnostic);
    }
}

fn into_layer(layer_index: u32, compiled: CompiledRegion) -> MarkingLayer {
    MarkingLayer {
        layer_index,
        parameters: compiled.parameters,
        polylines: compiled.polylines,
        regions: vec![compiled.name],
    }
}

/// Validate `config` and aggregate `regions` with `policy`
pub fn aggregate(
    regions: &[CliRegion],
    config: &LaserCardConfig,
    policy: LayerPolicy,
) -> CompileResult<BatchOutput> {
    Ok(LayerAggregator::new(config, policy)?.aggregate(regions))
}

/// Split a batch by laser card and aggregate each part against that card's
/// configuration
///
/// Regions without a laser index go to card 0. Every configuration is
/// validated first. Regions whose card has no configuration fail with
/// [`RegionError::UnknownLaserCard`] in that card's output, which carries an
/// empty document.
pub fn aggregate_by_laser(
    regions: &[CliRegion],
    configs: &BTreeMap<u32, LaserCardConfig>,
    policy: LayerPolicy,
) -> CompileResult<BTreeMap<u32, BatchOutput>> {
    let aggregators = configs
        .iter()
        .map(|(card, config)| Ok((*card, LayerAggregator::new(config, policy)?)))
        .collect::<CompileResult<BTreeMap<u32, LayerAggregator<'_>>>>()?;

    let mut cards: BTreeMap<u32, Vec<&CliRegion>> = BTreeMap::new();
    for region in regions {
        cards.entry(region.card()).or_default().push(region);
    }

    Ok(cards
        .into_iter()
        .map(|(card, regions)| {
            info!("Laser card {}: {} regions", card, regions.len());
            let output = match aggregators.get(&card) {
                Some(aggregator) => aggregator.aggregate_refs(&regions),
                None => unknown_card(card, &regions),
            };
            (card, output)
        })
        .collect())
}

fn unknown_card(card: u32, regions: &[&CliRegion]) -> BatchOutput {
    let geometry = ScannerGeometryConfig::default();
    let diagnostics: Vec<Diagnostic> = regions
        .iter()
        .map(|region| {
            Diagnostic::failure(RegionError::UnknownLaserCard {
                region: region.name.clone(),
                card,
            })
        })
        .collect();
    log_diagnostics(&diagnostics);

    BatchOutput {
        document: MarkingDocument::new(geometry.protocol_code, geometry.mode),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use galvokit_core::Polyline2D;

    fn line(x: f32) -> Polyline2D {
        Polyline2D::from_flat(&[x, 0.0, x, 5.0]).unwrap()
    }

    fn regions() -> Vec<CliRegion> {
        vec![
            CliRegion::new("a", vec![line(0.0)]).with_power(100.0),
            CliRegion::new("b", vec![line(1.0)]).with_power(200.0),
            CliRegion::new("c", vec![line(2.0)]).with_power(100.0),
        ]
    }

    #[test]
    fn test_single_layer() {
        let config = LaserCardConfig::default();
        let out = aggregate(&regions(), &config, LayerPolicy::SingleLayer).unwrap();
        assert_eq!(out.document.layers.len(), 3);
        assert_eq!(out.document.layer_count(), 1);
        assert!(out.document.layers.iter().all(|l| l.layer_index == 0));
        let names: Vec<&str> = out
            .document
            .layers
            .iter()
            .map(|l| l.regions[0].as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_separate_layers() {
        let config = LaserCardConfig::default();
        let out = aggregate(&regions(), &config, LayerPolicy::SeparateLayers).unwrap();
        let indices: Vec<u32> = out.document.layers.iter().map(|l| l.layer_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_grouped_by_params() {
        let config = LaserCardConfig::default();
        let out = aggregate(&regions(), &config, LayerPolicy::GroupedByParams).unwrap();
        let layers = &out.document.layers;
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].regions, vec!["a", "c"]);
        assert_eq!(layers[0].polylines.len(), 2);
        assert_eq!(layers[1].layer_index, 1);
        assert_eq!(layers[1].regions, vec!["b"]);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = LaserCardConfig::default();
        config.power.correction_table = vec![1.0];
        assert!(aggregate(&regions(), &config, LayerPolicy::SingleLayer).is_err());
    }

    #[test]
    fn test_unknown_laser_card() {
        let configs = BTreeMap::from([(0, LaserCardConfig::default())]);
        let mut batch = regions();
        batch[1].laser_index = Some(3);

        let cards = aggregate_by_laser(&batch, &configs, LayerPolicy::SingleLayer).unwrap();
        assert_eq!(cards[&0].document.layers.len(), 2);
        assert!(cards[&3].document.is_empty());

        let failures: Vec<_> = cards[&3].failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].code(), "E001");
        assert!(matches!(
            failures[0].kind,
            DiagnosticKind::RegionCompileFailure(RegionError::UnknownLaserCard { card: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_card_config_is_fatal() {
        let mut broken = LaserCardConfig::default();
        broken.power.correction_table = vec![1.0];
        let configs = BTreeMap::from([(0, LaserCardConfig::default()), (1, broken)]);
        assert!(aggregate_by_laser(&regions(), &configs, LayerPolicy::SingleLayer).is_err());
    }

    #[test]
    fn test_policy_serde() {
        let json = serde_json::to_string(&LayerPolicy::GroupedByParams).unwrap();
        assert_eq!(json, "\"grouped_by_params\"");
    }
}

//! FDE calculator: factor composition, cascade breakdown and flow graph
//!
//! Everything here is a pure function of a theoretical volume and a
//! [`CorrectionFactors`] tuple. No validation or clamping happens at this
//! level; out-of-range factors propagate arithmetically (an `fcp` above 1
//! flips the sign of `1 - fcp`). Callers that need guarantees run
//! [`CorrectionFactors::validate`] first.
//!
//! The four reductions are always applied in the same order:
//! collection, competition, seasonality, logistics. Charts depend on the
//! stage positions, so the order is fixed.

use crate::core_types::units::{Percent, Volume};
use crate::factors::{CorrectionFactors, Factor};
use serde::Serialize;
use tracing::debug;

/// Effective Availability Factor: `fc * (1 - fcp) * fs * fl`
///
/// # Example
/// ```
/// use biogas_atlas_core::{calculate_fde, CorrectionFactors};
///
/// let fde = calculate_fde(&CorrectionFactors::new(0.85, 0.30, 0.85, 0.80));
/// assert!((fde - 0.4046).abs() < 1e-4);
/// ```
#[inline]
pub fn calculate_fde(factors: &CorrectionFactors) -> f64 {
    factors.fc * (1.0 - factors.fcp) * factors.fs * factors.fl
}

/// Remaining volume after each reduction
#[derive(Debug, Clone, Copy, PartialEq)]
struct StageVolumes {
    after_collection: Volume,
    after_competition: Volume,
    after_seasonality: Volume,
    final_volume: Volume,
}

impl StageVolumes {
    fn compute(theoretical: Volume, factors: &CorrectionFactors) -> Self {
        let after_collection = theoretical * factors.fc;
        let after_competition = after_collection * (1.0 - factors.fcp);
        let after_seasonality = after_competition * factors.fs;
        let final_volume = after_seasonality * factors.fl;
        StageVolumes {
            after_collection,
            after_competition,
            after_seasonality,
            final_volume,
        }
    }
}

// ============================================================================
// CASCADE
// ============================================================================

/// Position of a stage in the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Total theoretical production
    Theoretical,
    /// Volume lost to collection
    CollectionLoss,
    /// Remaining after FC
    AfterCollection,
    /// Volume diverted to competing uses
    CompetitionLoss,
    /// Remaining after FCp
    AfterCompetition,
    /// Volume lost to seasonality
    SeasonalLoss,
    /// Remaining after FS
    AfterSeasonality,
    /// Volume lost to logistics
    LogisticsLoss,
    /// Final FDE volume
    FinalFde,
}

impl StageKind {
    /// Stages in cascade order
    pub const ALL: [StageKind; 9] = [
        StageKind::Theoretical,
        StageKind::CollectionLoss,
        StageKind::AfterCollection,
        StageKind::CompetitionLoss,
        StageKind::AfterCompetition,
        StageKind::SeasonalLoss,
        StageKind::AfterSeasonality,
        StageKind::LogisticsLoss,
        StageKind::FinalFde,
    ];

    /// True for the four stages that remove volume
    pub fn is_loss(self) -> bool {
        matches!(
            self,
            StageKind::CollectionLoss
                | StageKind::CompetitionLoss
                | StageKind::SeasonalLoss
                | StageKind::LogisticsLoss
        )
    }

    /// Factor responsible for this stage, if any
    pub fn factor(self) -> Option<Factor> {
        match self {
            StageKind::CollectionLoss | StageKind::AfterCollection => Some(Factor::Collection),
            StageKind::CompetitionLoss | StageKind::AfterCompetition => Some(Factor::Competition),
            StageKind::SeasonalLoss | StageKind::AfterSeasonality => Some(Factor::Seasonality),
            StageKind::LogisticsLoss => Some(Factor::Logistics),
            StageKind::Theoretical | StageKind::FinalFde => None,
        }
    }

    /// Chart label
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Theoretical => "Theoretical",
            StageKind::CollectionLoss => "Collection",
            StageKind::AfterCollection => "After FC",
            StageKind::CompetitionLoss => "Competition",
            StageKind::AfterCompetition => "After FCp",
            StageKind::SeasonalLoss => "Seasonal",
            StageKind::AfterSeasonality => "After FS",
            StageKind::LogisticsLoss => "Logistics",
            StageKind::FinalFde => "Final FDE",
        }
    }

    /// Bar colour
    pub fn color(self) -> &'static str {
        match self {
            StageKind::Theoretical => "#FFD700",
            StageKind::CollectionLoss
            | StageKind::CompetitionLoss
            | StageKind::SeasonalLoss
            | StageKind::LogisticsLoss => "#DC143C",
            StageKind::AfterCollection => "#FFA500",
            StageKind::AfterCompetition => "#228B22",
            StageKind::AfterSeasonality => "#32CD32",
            StageKind::FinalFde => "#006400",
        }
    }
}

/// One bar of the cascade (waterfall) chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeStage {
    /// Stage position
    pub kind: StageKind,
    /// Chart label
    pub name: &'static str,
    /// Negative removed volume for loss stages, remaining volume otherwise
    pub value: Volume,
    /// Whether this stage removes volume
    pub is_loss: bool,
    /// `value` as a percentage of the theoretical volume
    pub percentage_of_theoretical: Percent,
    /// Tooltip text
    pub description: String,
    /// Bar colour
    pub color: &'static str,
}

/// Nine-stage breakdown of a theoretical volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cascade {
    theoretical: Volume,
    factors: CorrectionFactors,
    fde: f64,
    stages: Vec<CascadeStage>,
}

impl Cascade {
    /// Stages in fixed order
    pub fn stages(&self) -> &[CascadeStage] {
        &self.stages
    }

    /// Iterate stages in order
    pub fn iter(&self) -> std::slice::Iter<'_, CascadeStage> {
        self.stages.iter()
    }

    /// Number of stages (always 9)
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Never true: an empty cascade is represented by `None`
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage of the given kind
    pub fn stage(&self, kind: StageKind) -> &CascadeStage {
        &self.stages[kind as usize]
    }

    /// Input volume
    pub fn theoretical(&self) -> Volume {
        self.theoretical
    }

    /// Input factors
    pub fn factors(&self) -> &CorrectionFactors {
        &self.factors
    }

    /// FDE of the input factors
    pub fn fde(&self) -> f64 {
        self.fde
    }

    /// Volume left after all four reductions
    pub fn final_volume(&self) -> Volume {
        self.stage(StageKind::FinalFde).value
    }

    /// Sum of the magnitudes of all loss stages
    pub fn total_losses(&self) -> Volume {
        self.stages
            .iter()
            .filter(|s| s.is_loss)
            .fold(Volume::zero(self.theoretical.unit()), |acc, s| {
                acc + s.value.abs()
            })
    }

    /// Consume into the stage list
    pub fn into_stages(self) -> Vec<CascadeStage> {
        self.stages
    }
}

impl<'a> IntoIterator for &'a Cascade {
    type Item = &'a CascadeStage;
    type IntoIter = std::slice::Iter<'a, CascadeStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

/// Tooltip for a loss stage, e.g. `Collection losses (FC=85%)`
fn loss_description(kind: StageKind, label: &str, factors: &CorrectionFactors) -> String {
    match kind.factor() {
        Some(factor) => format!(
            "{label} ({}={:.0}%)",
            factor.symbol(),
            factors.get(factor) * 100.0
        ),
        None => label.to_string(),
    }
}

/// Build the nine-stage cascade for a theoretical volume.
///
/// Returns `None` when `theoretical` is not strictly positive, so callers can
/// show an empty state instead of zero-height bars.
pub fn generate_cascade_data(
    theoretical: Volume,
    factors: &CorrectionFactors,
) -> Option<Cascade> {
    if !theoretical.is_positive() {
        debug!(%theoretical, "non-positive theoretical volume, no cascade");
        return None;
    }

    let v = StageVolumes::compute(theoretical, factors);
    let fde = calculate_fde(factors);

    let pass = |kind: StageKind, value: Volume, description: String| CascadeStage {
        kind,
        name: kind.name(),
        value,
        is_loss: false,
        percentage_of_theoretical: value.percent_of(theoretical),
        description,
        color: kind.color(),
    };
    let loss = |kind: StageKind, before: Volume, after: Volume, label: &str| {
        let value = -(before - after);
        CascadeStage {
            kind,
            name: kind.name(),
            value,
            is_loss: true,
            percentage_of_theoretical: value.percent_of(theoretical),
            description: loss_description(kind, label, factors),
            color: kind.color(),
        }
    };

    let stages = vec![
        CascadeStage {
            percentage_of_theoretical: Percent::new(100.0),
            ..pass(
                StageKind::Theoretical,
                theoretical,
                "Total theoretical potential".to_string(),
            )
        },
        loss(
            StageKind::CollectionLoss,
            theoretical,
            v.after_collection,
            "Collection losses",
        ),
        pass(
            StageKind::AfterCollection,
            v.after_collection,
            "Available after collection".to_string(),
        ),
        loss(
            StageKind::CompetitionLoss,
            v.after_collection,
            v.after_competition,
            "Competing uses",
        ),
        pass(
            StageKind::AfterCompetition,
            v.after_competition,
            "Available after competition".to_string(),
        ),
        loss(
            StageKind::SeasonalLoss,
            v.after_competition,
            v.after_seasonality,
            "Seasonal losses",
        ),
        pass(
            StageKind::AfterSeasonality,
            v.after_seasonality,
            "Adjusted for seasonality".to_string(),
        ),
        loss(
            StageKind::LogisticsLoss,
            v.after_seasonality,
            v.final_volume,
            "Logistics losses",
        ),
        pass(
            StageKind::FinalFde,
            v.final_volume,
            format!("Effective availability: {:.1}%", fde * 100.0),
        ),
    ];

    debug!(%theoretical, fde, final_volume = *v.final_volume, "generated cascade");

    Some(Cascade {
        theoretical,
        factors: *factors,
        fde,
        stages,
    })
}

// ============================================================================
// FLOW GRAPH
// ============================================================================

/// Node of the flow (Sankey) diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowNodeKind {
    /// Source node
    TheoreticalPotential,
    /// Collection loss sink
    CollectionLosses,
    /// Collected residue
    Collected,
    /// Competing uses sink
    CompetingUses,
    /// Available after competition
    Available,
    /// Seasonal loss sink
    SeasonalLosses,
    /// Adjusted for seasonality
    Adjusted,
    /// Logistics loss sink
    LogisticsLosses,
    /// Final biogas-convertible volume
    BiogasPotential,
}

impl FlowNodeKind {
    /// Nodes in index order
    pub const ALL: [FlowNodeKind; 9] = [
        FlowNodeKind::TheoreticalPotential,
        FlowNodeKind::CollectionLosses,
        FlowNodeKind::Collected,
        FlowNodeKind::CompetingUses,
        FlowNodeKind::Available,
        FlowNodeKind::SeasonalLosses,
        FlowNodeKind::Adjusted,
        FlowNodeKind::LogisticsLosses,
        FlowNodeKind::BiogasPotential,
    ];

    /// Index of this node in [`FlowGraph::nodes`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            FlowNodeKind::TheoreticalPotential => "Theoretical potential",
            FlowNodeKind::CollectionLosses => "Collection losses",
            FlowNodeKind::Collected => "Collected",
            FlowNodeKind::CompetingUses => "Competing uses",
            FlowNodeKind::Available => "Available",
            FlowNodeKind::SeasonalLosses => "Seasonal losses",
            FlowNodeKind::Adjusted => "Adjusted",
            FlowNodeKind::LogisticsLosses => "Logistics losses",
            FlowNodeKind::BiogasPotential => "Biogas potential",
        }
    }

    /// Node colour
    pub fn color(self) -> &'static str {
        match self {
            FlowNodeKind::TheoreticalPotential => "#FFD700",
            FlowNodeKind::CollectionLosses => Factor::Collection.color(),
            FlowNodeKind::Collected => "#FFA500",
            FlowNodeKind::CompetingUses => Factor::Competition.color(),
            FlowNodeKind::Available => "#228B22",
            FlowNodeKind::SeasonalLosses => Factor::Seasonality.color(),
            FlowNodeKind::Adjusted => "#32CD32",
            FlowNodeKind::LogisticsLosses => Factor::Logistics.color(),
            FlowNodeKind::BiogasPotential => "#006400",
        }
    }

    /// True for sinks representing lost or diverted volume
    pub fn is_loss(self) -> bool {
        matches!(
            self,
            FlowNodeKind::CollectionLosses
                | FlowNodeKind::CompetingUses
                | FlowNodeKind::SeasonalLosses
                | FlowNodeKind::LogisticsLosses
        )
    }
}

/// Named node of the flow graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowNode {
    /// Node identity
    pub kind: FlowNodeKind,
    /// Display name
    pub name: &'static str,
    /// Node colour
    pub color: &'static str,
}

/// Directed weighted edge between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowLink {
    /// Index of the source node
    pub source: usize,
    /// Index of the target node
    pub target: usize,
    /// Exact volume flowing along this branch
    pub value: Volume,
}

impl FlowLink {
    /// Minimum rendered edge weight
    pub const RENDER_FLOOR: f64 = 1.0;

    /// Weight to draw: `value` floored at [`RENDER_FLOOR`](Self::RENDER_FLOOR).
    ///
    /// Zero-width edges break Sankey layouts; the floor is visual only.
    pub fn render_value(&self) -> Volume {
        self.value.at_least(Self::RENDER_FLOOR)
    }
}

/// Flow graph: 9 nodes, 8 links, loss and pass-through branches as siblings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowGraph {
    /// Nodes in [`FlowNodeKind::ALL`] order
    pub nodes: Vec<FlowNode>,
    /// Links, loss branch first at each split
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    /// Total exact volume entering `node`
    pub fn inflow(&self, node: FlowNodeKind) -> f64 {
        self.links
            .iter()
            .filter(|l| l.target == node.index())
            .map(|l| *l.value)
            .sum()
    }

    /// Total exact volume leaving `node`
    pub fn outflow(&self, node: FlowNodeKind) -> f64 {
        self.links
            .iter()
            .filter(|l| l.source == node.index())
            .map(|l| *l.value)
            .sum()
    }

    /// Link between two nodes, if present
    pub fn link(&self, source: FlowNodeKind, target: FlowNodeKind) -> Option<&FlowLink> {
        self.links
            .iter()
            .find(|l| l.source == source.index() && l.target == target.index())
    }
}

/// Build the flow graph for a theoretical volume.
///
/// Returns `None` when `theoretical` is not strictly positive.
pub fn generate_sankey_data(
    theoretical: Volume,
    factors: &CorrectionFactors,
) -> Option<FlowGraph> {
    if !theoretical.is_positive() {
        debug!(%theoretical, "non-positive theoretical volume, no flow graph");
        return None;
    }

    let collection_loss = theoretical * (1.0 - factors.fc);
    let after_collection = theoretical * factors.fc;
    let competition_use = after_collection * factors.fcp;
    let after_competition = after_collection * (1.0 - factors.fcp);
    let seasonal_loss = after_competition * (1.0 - factors.fs);
    let after_seasonal = after_competition * factors.fs;
    let logistics_loss = after_seasonal * (1.0 - factors.fl);
    let final_available = after_seasonal * factors.fl;

    let nodes = FlowNodeKind::ALL
        .into_iter()
        .map(|kind| FlowNode {
            kind,
            name: kind.name(),
            color: kind.color(),
        })
        .collect();

    use FlowNodeKind as N;
    let link = |source: N, target: N, value: Volume| FlowLink {
        source: source.index(),
        target: target.index(),
        value,
    };
    let links = vec![
        link(N::TheoreticalPotential, N::CollectionLosses, collection_loss),
        link(N::TheoreticalPotential, N::Collected, after_collection),
        link(N::Collected, N::CompetingUses, competition_use),
        link(N::Collected, N::Available, after_competition),
        link(N::Available, N::SeasonalLosses, seasonal_loss),
        link(N::Available, N::Adjusted, after_seasonal),
        link(N::Adjusted, N::LogisticsLosses, logistics_loss),
        link(N::Adjusted, N::BiogasPotential, final_available),
    ];

    debug!(%theoretical, final_available = *final_available, "generated flow graph");

    Some(FlowGraph { nodes, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn realistic() -> CorrectionFactors {
        CorrectionFactors::new(0.85, 0.30, 0.85, 0.80)
    }

    #[test]
    fn test_fde_identity() {
        assert_eq!(calculate_fde(&CorrectionFactors::new(1.0, 0.0, 1.0, 1.0)), 1.0);
    }

    #[test]
    fn test_fde_zero_collection() {
        assert_eq!(calculate_fde(&CorrectionFactors::new(0.0, 0.0, 1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_fde_realistic() {
        assert_relative_eq!(calculate_fde(&realistic()), 0.4046, epsilon = 1e-12);
    }

    #[test]
    fn test_fde_out_of_range_propagates() {
        // fcp > 1 flips the sign; no clamping at this level
        let fde = calculate_fde(&CorrectionFactors::new(0.85, 1.5, 0.85, 0.80));
        assert!(fde < 0.0);
    }

    #[test]
    fn test_cascade_has_nine_stages_in_order() {
        let cascade = generate_cascade_data(Volume::tonnes_per_year(1000.0), &realistic())
            .expect("positive volume");
        assert_eq!(cascade.len(), 9);
        for (stage, kind) in cascade.iter().zip(StageKind::ALL) {
            assert_eq!(stage.kind, kind);
            assert_eq!(stage.is_loss, kind.is_loss());
            assert_eq!(stage.name, kind.name());
        }
    }

    #[test]
    fn test_cascade_values() {
        let cascade = generate_cascade_data(Volume::tonnes_per_year(1_000_000.0), &realistic())
            .expect("positive volume");
        let value = |kind| *cascade.stage(kind).value;
        assert_relative_eq!(value(StageKind::Theoretical), 1_000_000.0);
        assert_relative_eq!(value(StageKind::CollectionLoss), -150_000.0, epsilon = 1e-6);
        assert_relative_eq!(value(StageKind::AfterCollection), 850_000.0, epsilon = 1e-6);
        assert_relative_eq!(value(StageKind::CompetitionLoss), -255_000.0, epsilon = 1e-6);
        assert_relative_eq!(value(StageKind::AfterCompetition), 595_000.0, epsilon = 1e-6);
        assert_relative_eq!(value(StageKind::FinalFde), 404_600.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cascade_percentages() {
        let cascade = generate_cascade_data(Volume::tonnes_per_year(2000.0), &realistic())
            .expect("positive volume");
        assert_eq!(*cascade.stage(StageKind::Theoretical).percentage_of_theoretical, 100.0);
        assert_relative_eq!(
            *cascade.stage(StageKind::CollectionLoss).percentage_of_theoretical,
            -15.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            *cascade.stage(StageKind::FinalFde).percentage_of_theoretical,
            40.46,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_cascade_descriptions() {
        let cascade = generate_cascade_data(Volume::tonnes_per_year(10.0), &realistic())
            .expect("positive volume");
        assert_eq!(
            cascade.stage(StageKind::CollectionLoss).description,
            "Collection losses (FC=85%)"
        );
        assert_eq!(
            cascade.stage(StageKind::CompetitionLoss).description,
            "Competing uses (FCp=30%)"
        );
        assert_eq!(
            cascade.stage(StageKind::FinalFde).description,
            "Effective availability: 40.5%"
        );
    }

    #[test]
    fn test_loss_descriptions_name_their_factor() {
        let factors = CorrectionFactors::new(0.72, 0.05, 0.91, 0.66);
        let cascade = generate_cascade_data(Volume::tonnes_per_year(10.0), &factors)
            .expect("positive volume");
        for stage in cascade.iter().filter(|s| s.is_loss) {
            let factor = stage.kind.factor().expect("loss stages have a factor");
            let expected = format!("{}={:.0}%)", factor.symbol(), factors.get(factor) * 100.0);
            assert!(stage.description.ends_with(&expected), "{}", stage.description);
        }
        assert_eq!(
            cascade.stage(StageKind::SeasonalLoss).description,
            "Seasonal losses (FS=91%)"
        );
        assert_eq!(StageKind::Theoretical.factor(), None);
        assert_eq!(StageKind::FinalFde.factor(), None);
        assert_eq!(StageKind::AfterCompetition.factor(), Some(Factor::Competition));
    }

    #[test]
    fn test_cascade_empty_for_non_positive_volume() {
        assert!(generate_cascade_data(Volume::tonnes_per_year(0.0), &realistic()).is_none());
        assert!(generate_cascade_data(Volume::tonnes_per_year(-10.0), &realistic()).is_none());
        assert!(generate_cascade_data(Volume::tonnes_per_year(f64::NAN), &realistic()).is_none());
    }

    #[test]
    fn test_cascade_keeps_unit() {
        let cascade = generate_cascade_data(Volume::cubic_meters_per_year(500.0), &realistic())
            .expect("positive volume");
        assert!(cascade
            .iter()
            .all(|s| s.value.unit() == crate::VolumeUnit::CubicMetersPerYear));
    }

    #[test]
    fn test_flow_graph_shape() {
        let graph = generate_sankey_data(Volume::tonnes_per_year(1000.0), &realistic())
            .expect("positive volume");
        assert_eq!(graph.nodes.len(), 9);
        assert_eq!(graph.links.len(), 8);
        let pairs: Vec<(usize, usize)> = graph.links.iter().map(|l| (l.source, l.target)).collect();
        assert_eq!(
            pairs,
            vec![(0, 1), (0, 2), (2, 3), (2, 4), (4, 5), (4, 6), (6, 7), (6, 8)]
        );
    }

    #[test]
    fn test_flow_final_matches_fde() {
        let graph = generate_sankey_data(Volume::tonnes_per_year(1_000_000.0), &realistic())
            .expect("positive volume");
        let link = graph
            .link(FlowNodeKind::Adjusted, FlowNodeKind::BiogasPotential)
            .expect("final link");
        assert_relative_eq!(*link.value, 404_600.0, epsilon = 1e-6);
    }

    #[test]
    fn test_render_floor_is_visual_only() {
        let graph = generate_sankey_data(
            Volume::tonnes_per_year(1000.0),
            &CorrectionFactors::new(0.85, 0.0, 1.0, 1.0),
        )
        .expect("positive volume");
        let competition = graph
            .link(FlowNodeKind::Collected, FlowNodeKind::CompetingUses)
            .expect("competition link");
        assert_eq!(*competition.value, 0.0);
        assert_eq!(*competition.render_value(), 1.0);
    }

    #[test]
    fn test_flow_empty_for_zero_volume() {
        assert!(generate_sankey_data(Volume::tonnes_per_year(0.0), &realistic()).is_none());
    }
}

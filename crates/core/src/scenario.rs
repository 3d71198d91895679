//! Scenario engine: named factor presets and batch evaluation
//!
//! Four presets ship with the atlas, spanning optimistic to pessimistic
//! assumptions about collection, competing uses, seasonality and logistics.
//! Evaluating a theoretical volume against a list of scenarios is a pure map:
//! one result per scenario, in input order.

use crate::calculator::calculate_fde;
use crate::core_types::units::{Percent, Volume};
use crate::factors::CorrectionFactors;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Biogas yield applied to every unit of available residue.
///
/// A single constant for every residue type is a simplification; residue
/// specific yields go through [`crate::energy::calculate_energy_potential`].
pub const BIOGAS_YIELD_PER_UNIT: f64 = 0.6;

/// Two FDE values closer than this are considered the same scenario
pub const SCENARIO_MATCH_TOLERANCE: f64 = 0.001;

/// Named, coloured factor preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier (e.g. `realistic`)
    pub id: String,
    /// Display name
    pub name: String,
    /// One-line rationale
    pub description: String,
    /// Factor tuple
    pub factors: CorrectionFactors,
    /// Chart colour (`#RRGGBB`)
    pub color: String,
}

/// Built-in presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinScenario {
    /// High collection efficiency, low competition, steady availability
    Optimistic,
    /// Literature values validated against field data
    Realistic,
    /// All practical restrictions applied conservatively
    Conservative,
    /// Highest losses and competition
    Pessimistic,
}

impl BuiltinScenario {
    /// Presets from most to least favourable
    pub const ALL: [BuiltinScenario; 4] = [
        BuiltinScenario::Optimistic,
        BuiltinScenario::Realistic,
        BuiltinScenario::Conservative,
        BuiltinScenario::Pessimistic,
    ];

    /// Stable identifier
    pub fn id(self) -> &'static str {
        match self {
            BuiltinScenario::Optimistic => "optimistic",
            BuiltinScenario::Realistic => "realistic",
            BuiltinScenario::Conservative => "conservative",
            BuiltinScenario::Pessimistic => "pessimistic",
        }
    }

    /// Look up a preset by identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<BuiltinScenario> {
        BuiltinScenario::ALL
            .into_iter()
            .find(|s| s.id().eq_ignore_ascii_case(id.trim()))
    }

    /// Factor tuple of this preset
    pub fn factors(self) -> CorrectionFactors {
        match self {
            BuiltinScenario::Optimistic => CorrectionFactors::new(0.92, 0.15, 0.95, 0.90),
            BuiltinScenario::Realistic => CorrectionFactors::REALISTIC,
            BuiltinScenario::Conservative => CorrectionFactors::new(0.70, 0.50, 0.75, 0.70),
            BuiltinScenario::Pessimistic => CorrectionFactors::new(0.60, 0.65, 0.72, 0.68),
        }
    }

    /// Full scenario record
    pub fn scenario(self) -> Scenario {
        let (name, description, color) = match self {
            BuiltinScenario::Optimistic => (
                "Optimistic",
                "High collection efficiency, low competition, constant availability",
                "#22C55E",
            ),
            BuiltinScenario::Realistic => (
                "Realistic",
                "Values based on literature evidence and field validation",
                "#3B82F6",
            ),
            BuiltinScenario::Conservative => (
                "Conservative",
                "Accounts for every practical restriction conservatively",
                "#F59E0B",
            ),
            BuiltinScenario::Pessimistic => (
                "Pessimistic",
                "Scenario with the largest losses and competition",
                "#EF4444",
            ),
        };
        Scenario {
            id: self.id().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            factors: self.factors(),
            color: color.to_string(),
        }
    }
}

impl Scenario {
    /// Optimistic preset
    pub fn optimistic() -> Self {
        BuiltinScenario::Optimistic.scenario()
    }

    /// Realistic preset
    pub fn realistic() -> Self {
        BuiltinScenario::Realistic.scenario()
    }

    /// Conservative preset
    pub fn conservative() -> Self {
        BuiltinScenario::Conservative.scenario()
    }

    /// Pessimistic preset
    pub fn pessimistic() -> Self {
        BuiltinScenario::Pessimistic.scenario()
    }

    /// All four presets, most favourable first
    pub fn builtin() -> Vec<Scenario> {
        BuiltinScenario::ALL
            .into_iter()
            .map(BuiltinScenario::scenario)
            .collect()
    }

    /// User-adjusted factors that match no preset
    pub fn custom(factors: CorrectionFactors) -> Self {
        Scenario {
            id: "custom".to_string(),
            name: "Custom".to_string(),
            description: "User-adjusted correction factors".to_string(),
            factors,
            color: "#8B5CF6".to_string(),
        }
    }

    /// Find a scenario by id in a list
    pub fn find<'a>(scenarios: &'a [Scenario], id: &str) -> Option<&'a Scenario> {
        scenarios.iter().find(|s| s.id == id)
    }
}

/// Outcome of evaluating one scenario against a theoretical volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// Scenario evaluated
    pub scenario: Scenario,
    /// FDE of the scenario's factors
    pub fde: f64,
    /// `theoretical * fde`
    pub available_volume: Volume,
    /// `available_volume * BIOGAS_YIELD_PER_UNIT`
    pub biogas_potential: f64,
    /// FDE as a percentage
    pub percentage: Percent,
}

impl ScenarioResult {
    fn new(scenario: &Scenario, fde: f64, theoretical: Volume) -> Self {
        let available_volume = theoretical * fde;
        ScenarioResult {
            scenario: scenario.clone(),
            fde,
            available_volume,
            biogas_potential: *available_volume * BIOGAS_YIELD_PER_UNIT,
            percentage: Percent::from_ratio(fde),
        }
    }
}

/// Evaluate a theoretical volume against every scenario, preserving order.
pub fn calculate_scenario_results(
    scenarios: &[Scenario],
    theoretical: Volume,
) -> Vec<ScenarioResult> {
    let results: Vec<ScenarioResult> = scenarios
        .iter()
        .map(|s| ScenarioResult::new(s, calculate_fde(&s.factors), theoretical))
        .collect();
    debug!(count = results.len(), %theoretical, "evaluated scenarios");
    results
}

/// Result for user-adjusted factors, unless they reproduce a listed scenario.
///
/// Returns `None` when some result has an FDE within
/// [`SCENARIO_MATCH_TOLERANCE`] of the factors' FDE.
pub fn custom_scenario_result(
    results: &[ScenarioResult],
    factors: &CorrectionFactors,
    theoretical: Volume,
) -> Option<ScenarioResult> {
    let fde = calculate_fde(factors);
    if results
        .iter()
        .any(|r| (r.fde - fde).abs() < SCENARIO_MATCH_TOLERANCE)
    {
        return None;
    }
    Some(ScenarioResult::new(&Scenario::custom(*factors), fde, theoretical))
}

type FactorKey = [u64; 4];

fn factor_key(factors: &CorrectionFactors) -> FactorKey {
    [
        factors.fc.to_bits(),
        factors.fcp.to_bits(),
        factors.fs.to_bits(),
        factors.fl.to_bits(),
    ]
}

/// Scenario evaluation with FDE memoized per unique factor tuple
///
/// Worth it only for large batches over a handful of distinct tuples;
/// results are identical to [`calculate_scenario_results`].
#[derive(Debug, Default)]
pub struct ScenarioEvaluator {
    cache: FxHashMap<FactorKey, f64>,
    hits: u64,
    misses: u64,
}

impl ScenarioEvaluator {
    /// Create an empty evaluator
    pub fn new() -> Self {
        Self::default()
    }

    /// FDE for `factors`, computed once per distinct bit pattern
    pub fn fde(&mut self, factors: &CorrectionFactors) -> f64 {
        let key = factor_key(factors);
        if let Some(&fde) = self.cache.get(&key) {
            self.hits += 1;
            return fde;
        }
        self.misses += 1;
        let fde = calculate_fde(factors);
        self.cache.insert(key, fde);
        fde
    }

    /// Memoized counterpart of [`calculate_scenario_results`]
    pub fn evaluate(&mut self, scenarios: &[Scenario], theoretical: Volume) -> Vec<ScenarioResult> {
        scenarios
            .iter()
            .map(|s| {
                let fde = self.fde(&s.factors);
                ScenarioResult::new(s, fde, theoretical)
            })
            .collect()
    }

    /// Number of distinct factor tuples cached
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Cache hits so far
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Cache misses so far
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop all cached values and counters
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Scenario results for one named theoretical volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeEvaluation {
    /// Caller label, e.g. a municipality name
    pub label: String,
    /// Theoretical volume evaluated
    pub theoretical: Volume,
    /// One result per scenario, in scenario order
    pub results: Vec<ScenarioResult>,
}

/// Evaluate many named volumes against the same scenarios in parallel.
///
/// Output order matches `volumes`.
pub fn par_evaluate_volumes(
    scenarios: &[Scenario],
    volumes: &[(String, Volume)],
) -> Vec<VolumeEvaluation> {
    let fdes: Vec<f64> = scenarios.iter().map(|s| calculate_fde(&s.factors)).collect();

    let evaluations: Vec<VolumeEvaluation> = volumes
        .par_iter()
        .map(|(label, theoretical)| VolumeEvaluation {
            label: label.clone(),
            theoretical: *theoretical,
            results: scenarios
                .iter()
                .zip(&fdes)
                .map(|(s, &fde)| ScenarioResult::new(s, fde, *theoretical))
                .collect(),
        })
        .collect();

    debug!(
        volumes = evaluations.len(),
        scenarios = scenarios.len(),
        "evaluated volume batch"
    );
    evaluations
}

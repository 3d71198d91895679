//! Biogas Atlas Core Library
//!
//! Effective Availability Factor (FDE) model for biogas potential analysis.
//! Theoretical residue production is taken down to a realistic available
//! volume through four sequential correction factors:
//!
//! `FDE = FC × (1 − FCp) × FS × FL`
//!
//! ## Contents
//! - Factor model with ranges, steps and methodology references
//! - Pure calculator producing the FDE ratio, a nine-stage cascade and a flow graph
//! - Scenario engine with four built-in presets, memoized and parallel batch evaluation
//! - Projection helpers for waterfall and Sankey renderers
//! - Monte Carlo uncertainty over the factor ranges
//! - Residue energy potential and JSON analysis configuration

// Core types and utilities
pub mod core_types;

pub mod calculator;
pub mod config;
pub mod energy;
pub mod error;
pub mod factors;
pub mod projection;
pub mod scenario;
pub mod uncertainty;

// Re-export core types
pub use core_types::{Percent, Volume, VolumeUnit};

pub use calculator::{
    calculate_fde, generate_cascade_data, generate_sankey_data, Cascade, CascadeStage, FlowGraph,
    FlowLink, FlowNode, FlowNodeKind, StageKind,
};
pub use config::AnalysisConfig;
pub use energy::{calculate_energy_potential, EnergyPotential, FdeCategory};
pub use error::{ConfigError, FactorError};
pub use factors::{
    get_documentation, get_range, CorrectionFactors, Factor, FactorDocumentation, FactorRange,
};
pub use projection::{format_compact, loss_annotations, waterfall_bars, FlowSummary, RenderLink};
pub use scenario::{
    calculate_scenario_results, custom_scenario_result, par_evaluate_volumes, BuiltinScenario,
    Scenario, ScenarioEvaluator, ScenarioResult, VolumeEvaluation, BIOGAS_YIELD_PER_UNIT,
};
pub use uncertainty::{monte_carlo_fde, FdeDistribution};

use biogas_atlas_core::{
    calculate_fde, calculate_scenario_results, custom_scenario_result, format_compact,
    generate_cascade_data, generate_sankey_data, loss_annotations, monte_carlo_fde,
    waterfall_bars, Cascade, CascadeStage, CorrectionFactors, FdeCategory, FdeDistribution,
    FlowGraph, ScenarioResult, StageKind, Volume,
};
use serde_json::{json, Map, Value};

use crate::{Analysis, View};

/// Width of the widest waterfall bar, in characters
const BAR_WIDTH: f64 = 40.0;

/// Everything the CLI prints, computed once
pub(crate) struct Report {
    theoretical: Volume,
    factors: CorrectionFactors,
    fde: f64,
    cascade: Option<Cascade>,
    flow: Option<FlowGraph>,
    results: Vec<ScenarioResult>,
    custom: Option<ScenarioResult>,
    uncertainty: Option<FdeDistribution>,
}

impl Report {
    pub(crate) fn build(analysis: &Analysis, samples: usize, seed: u64) -> Self {
        let theoretical = analysis.theoretical;
        let factors = analysis.factors;
        let results = calculate_scenario_results(&analysis.scenarios, theoretical);
        let custom = custom_scenario_result(&results, &factors, theoretical);

        Self {
            theoretical,
            factors,
            fde: calculate_fde(&factors),
            cascade: generate_cascade_data(theoretical, &factors),
            flow: generate_sankey_data(theoretical, &factors),
            results,
            custom,
            uncertainty: monte_carlo_fde(samples, seed),
        }
    }

    fn volume(&self, amount: f64) -> String {
        format!("{} {}", format_compact(amount), self.theoretical.unit())
    }

    pub(crate) fn print(&self, view: View) {
        println!("=== Biogas Atlas FDE Analysis ===\n");
        println!("Theoretical: {}", self.volume(*self.theoretical));
        println!(
            "Factors:     FC={:.2} FCp={:.2} FS={:.2} FL={:.2}",
            self.factors.fc, self.factors.fcp, self.factors.fs, self.factors.fl
        );
        println!(
            "FDE:         {:.4} ({})",
            self.fde,
            FdeCategory::from_fde(self.fde).label()
        );

        if view.shows(View::Cascade) {
            self.print_cascade();
        }
        if view.shows(View::Flow) {
            self.print_flow();
        }
        if view.shows(View::Scenarios) {
            self.print_scenarios();
        }
        if let Some(distribution) = &self.uncertainty {
            self.print_uncertainty(distribution);
        }
    }

    fn print_cascade(&self) {
        println!("\n--- Cascade ---");
        let Some(cascade) = &self.cascade else {
            println!("No theoretical volume; nothing to show.");
            return;
        };

        for stage in waterfall_bars(cascade) {
            println!(
                "{:<12} {:>14}  {:>6}  {}",
                stage.name,
                self.volume(*stage.value),
                stage.percentage_of_theoretical.to_string(),
                bar(stage)
            );
        }

        println!("\nLosses:");
        for stage in loss_annotations(cascade) {
            println!("  {:<32} {:>14}", stage.description, self.volume(*stage.value));
        }
        println!("\n{}", cascade.stage(StageKind::FinalFde).description);
    }

    fn print_flow(&self) {
        println!("\n--- Flow ---");
        let Some(graph) = &self.flow else {
            println!("No theoretical volume; nothing to show.");
            return;
        };

        for link in &graph.links {
            println!(
                "{:<22} -> {:<22} {:>14}",
                graph.nodes[link.source].name,
                graph.nodes[link.target].name,
                self.volume(*link.value)
            );
        }

        let summary = graph.summary();
        println!("\nFinal volume:  {}", self.volume(*summary.final_volume));
        println!(
            "Total losses:  {} ({})",
            self.volume(*summary.total_losses),
            summary.loss_percentage
        );
    }

    fn print_scenarios(&self) {
        println!("\n--- Scenarios ---");
        println!("Scenario      |    FDE | Available          | Biogas potential | Category");
        println!("--------------|--------|--------------------|------------------|---------");
        for result in self.results.iter().chain(self.custom.as_ref()) {
            println!(
                "{:<13} | {:>6} | {:<18} | {:<16} | {}",
                result.scenario.name,
                result.percentage.to_string(),
                self.volume(*result.available_volume),
                format_compact(result.biogas_potential),
                FdeCategory::from_fde(result.fde).label()
            );
        }
    }

    fn print_uncertainty(&self, distribution: &FdeDistribution) {
        println!("\n--- Uncertainty ({} samples) ---", distribution.samples);
        println!(
            "FDE mean {:.4} ± {:.4}, median {:.4}",
            distribution.mean, distribution.std_dev, distribution.p50
        );
        println!("90% band: {:.4} - {:.4}", distribution.p5, distribution.p95);
        if self.theoretical.is_positive() {
            let (low, high) = distribution.available_range(self.theoretical);
            println!("Available: {} - {}", self.volume(*low), self.volume(*high));
        }
    }

    pub(crate) fn to_json(&self, view: View) -> Result<String, serde_json::Error> {
        let mut out = Map::new();
        out.insert("theoretical".into(), serde_json::to_value(self.theoretical)?);
        out.insert("factors".into(), serde_json::to_value(self.factors)?);
        out.insert("fde".into(), json!(self.fde));
        out.insert(
            "category".into(),
            serde_json::to_value(FdeCategory::from_fde(self.fde))?,
        );

        if view.shows(View::Cascade) {
            out.insert("cascade".into(), serde_json::to_value(&self.cascade)?);
        }
        if view.shows(View::Flow) {
            let flow = match &self.flow {
                Some(graph) => {
                    let links: Vec<Value> = graph
                        .links
                        .iter()
                        .map(|link| {
                            json!({
                                "source": link.source,
                                "target": link.target,
                                "value": *link.value,
                                "render_value": *link.render_value(),
                            })
                        })
                        .collect();
                    json!({
                        "nodes": graph.nodes,
                        "links": links,
                        "summary": graph.summary(),
                    })
                }
                None => Value::Null,
            };
            out.insert("flow".into(), flow);
        }
        if view.shows(View::Scenarios) {
            out.insert("scenarios".into(), serde_json::to_value(&self.results)?);
            out.insert("custom".into(), serde_json::to_value(&self.custom)?);
        }
        if let Some(distribution) = &self.uncertainty {
            out.insert("uncertainty".into(), serde_json::to_value(distribution)?);
        }

        serde_json::to_string_pretty(&Value::Object(out))
    }
}

/// Proportional bar for a pass-through stage
fn bar(stage: &CascadeStage) -> String {
    let share = stage.percentage_of_theoretical.to_ratio().clamp(0.0, 1.0);
    "█".repeat((share * BAR_WIDTH).round() as usize)
}

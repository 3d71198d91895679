//! Property checks for the FDE cascade model
//!
//! These tests sweep the valid factor ranges and verify the conservation
//! and ordering guarantees that the charts rely on.

mod common;

use approx::assert_relative_eq;
use biogas_atlas_core::{
    calculate_fde, calculate_scenario_results, generate_cascade_data, generate_sankey_data,
    CorrectionFactors, Factor, FlowNodeKind, Scenario, StageKind, Volume,
};

/// Walk each factor over its range in 0.05 increments (plus the upper bound)
fn factor_grid() -> Vec<CorrectionFactors> {
    let points = |factor: Factor| {
        let range = factor.range();
        let mut values: Vec<f64> = (0..)
            .map(|i| range.min + f64::from(i) * 0.05)
            .take_while(|v| *v < range.max)
            .collect();
        values.push(range.max);
        values
    };

    let mut grid = Vec::new();
    for &fc in &points(Factor::Collection) {
        for &fcp in &points(Factor::Competition) {
            for &fs in &points(Factor::Seasonality) {
                for &fl in &points(Factor::Logistics) {
                    grid.push(CorrectionFactors::new(fc, fcp, fs, fl));
                }
            }
        }
    }
    grid
}

#[test]
fn test_fde_within_unit_interval_for_valid_factors() {
    let grid = factor_grid();
    assert!(grid.len() > 1000, "grid too small: {}", grid.len());
    for factors in grid {
        assert!(factors.is_valid(), "{factors:?}");
        let fde = calculate_fde(&factors);
        assert!((0.0..=1.0).contains(&fde), "fde {fde} for {factors:?}");
    }
}

#[test]
fn test_cascade_conserves_volume() {
    for volume in [1.0, 873.5, 1_000_000.0, 4.2e8] {
        let theoretical = Volume::tonnes_per_year(volume);
        for factors in factor_grid().into_iter().step_by(37) {
            let cascade = generate_cascade_data(theoretical, &factors).expect("positive volume");
            let losses: f64 = cascade
                .iter()
                .filter(|s| s.is_loss)
                .map(|s| -*s.value)
                .sum();
            let final_volume = *cascade.stage(StageKind::FinalFde).value;
            assert_relative_eq!(losses + final_volume, volume, max_relative = 1e-12);
            assert_relative_eq!(final_volume, volume * calculate_fde(&factors), max_relative = 1e-12);
        }
    }
}

#[test]
fn test_cascade_loss_stages_are_non_positive() {
    for factors in factor_grid().into_iter().step_by(11) {
        let cascade = generate_cascade_data(Volume::tonnes_per_year(5000.0), &factors)
            .expect("positive volume");
        for stage in &cascade {
            if stage.is_loss {
                assert!(*stage.value <= 1e-9, "{stage:?}");
            } else {
                assert!(*stage.value >= 0.0, "{stage:?}");
            }
        }
    }
}

#[test]
fn test_flow_conserves_volume_at_intermediate_nodes() {
    let theoretical = Volume::tonnes_per_year(2_500_000.0);
    for factors in factor_grid().into_iter().step_by(23) {
        let graph = generate_sankey_data(theoretical, &factors).expect("positive volume");
        for node in [
            FlowNodeKind::Collected,
            FlowNodeKind::Available,
            FlowNodeKind::Adjusted,
        ] {
            assert_relative_eq!(
                graph.inflow(node),
                graph.outflow(node),
                epsilon = 1e-6,
                max_relative = 1e-12
            );
        }
        assert_relative_eq!(
            graph.outflow(FlowNodeKind::TheoreticalPotential),
            2_500_000.0,
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_flow_and_cascade_agree() {
    let theoretical = Volume::cubic_meters_per_year(750_000.0);
    let factors = CorrectionFactors::new(0.7, 0.45, 0.9, 0.75);
    let cascade = generate_cascade_data(theoretical, &factors).expect("positive volume");
    let graph = generate_sankey_data(theoretical, &factors).expect("positive volume");

    let pairs = [
        (StageKind::AfterCollection, FlowNodeKind::Collected),
        (StageKind::AfterCompetition, FlowNodeKind::Available),
        (StageKind::AfterSeasonality, FlowNodeKind::Adjusted),
        (StageKind::FinalFde, FlowNodeKind::BiogasPotential),
    ];
    for (stage, node) in pairs {
        assert_relative_eq!(
            *cascade.stage(stage).value,
            graph.inflow(node),
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_realistic_million_tonnes() {
    let factors = CorrectionFactors::new(0.85, 0.30, 0.85, 0.80);
    let fde = calculate_fde(&factors);
    assert_relative_eq!(fde, 0.4046, epsilon = 1e-4);

    let results = calculate_scenario_results(
        &[Scenario::realistic()],
        Volume::tonnes_per_year(1_000_000.0),
    );
    assert_relative_eq!(*results[0].available_volume, 404_600.0, epsilon = 1.0);
}

#[test]
fn test_zero_volume_has_no_cascade() {
    assert!(generate_cascade_data(Volume::tonnes_per_year(0.0), &CorrectionFactors::default()).is_none());
    assert!(generate_sankey_data(Volume::tonnes_per_year(0.0), &CorrectionFactors::default()).is_none());
}

#[test]
fn test_builtin_scenarios_are_strictly_ordered() {
    let results =
        calculate_scenario_results(&Scenario::builtin(), Volume::tonnes_per_year(10_000_000.0));
    let ids: Vec<&str> = results.iter().map(|r| r.scenario.id.as_str()).collect();
    assert_eq!(ids, ["optimistic", "realistic", "conservative", "pessimistic"]);

    for pair in results.windows(2) {
        assert!(
            pair[0].fde > pair[1].fde,
            "{} ({}) should exceed {} ({})",
            pair[0].scenario.id,
            pair[0].fde,
            pair[1].scenario.id,
            pair[1].fde
        );
    }

    assert_relative_eq!(results[0].fde, 0.66861, epsilon = 1e-9);
    assert_relative_eq!(results[2].fde, 0.18375, epsilon = 1e-9);
    assert_relative_eq!(results[3].fde, 0.102816, epsilon = 1e-9);
}

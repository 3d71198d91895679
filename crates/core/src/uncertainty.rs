//! Monte Carlo treatment of factor uncertainty
//!
//! Each factor is drawn uniformly from its documented range and the resulting
//! FDE distribution is summarised. Sampling is seeded so a given
//! `(samples, seed)` pair always reproduces the same figures.

use crate::calculator::calculate_fde;
use crate::core_types::units::Volume;
use crate::factors::{CorrectionFactors, Factor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

/// Summary statistics of sampled FDE values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FdeDistribution {
    /// Number of samples drawn
    pub samples: usize,
    /// Mean FDE
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// 5th percentile
    pub p5: f64,
    /// Median
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
}

impl FdeDistribution {
    /// 5th-95th percentile band of available volume for a theoretical volume
    pub fn available_range(&self, theoretical: Volume) -> (Volume, Volume) {
        (theoretical * self.p5, theoretical * self.p95)
    }
}

/// Nearest-rank percentile of sorted data
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

fn sample_factors(rng: &mut StdRng) -> CorrectionFactors {
    Factor::ALL
        .into_iter()
        .fold(CorrectionFactors::default(), |acc, factor| {
            let range = factor.range();
            acc.with(factor, rng.random_range(range.min..=range.max))
        })
}

/// Sample `samples` factor tuples uniformly within their ranges.
///
/// Returns `None` when `samples` is zero.
pub fn monte_carlo_fde(samples: usize, seed: u64) -> Option<FdeDistribution> {
    if samples == 0 {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut values: Vec<f64> = (0..samples)
        .map(|_| calculate_fde(&sample_factors(&mut rng)))
        .collect();
    values.sort_by(f64::total_cmp);

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let distribution = FdeDistribution {
        samples,
        mean,
        std_dev: variance.sqrt(),
        min: values[0],
        max: values[values.len() - 1],
        p5: percentile(&values, 5.0),
        p50: percentile(&values, 50.0),
        p95: percentile(&values, 95.0),
    };

    debug!(
        samples,
        seed,
        mean = distribution.mean,
        p5 = distribution.p5,
        p95 = distribution.p95,
        "sampled FDE distribution"
    );
    Some(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_samples() {
        assert!(monte_carlo_fde(0, 1).is_none());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        assert_eq!(monte_carlo_fde(2_000, 42), monte_carlo_fde(2_000, 42));
    }

    #[test]
    fn test_samples_stay_within_bounds() {
        let d = monte_carlo_fde(5_000, 7).expect("non-zero samples");
        // extremes of the ranges: 0.55*0*0.70*0.65 and 0.95*1*1*1
        assert!(d.min >= 0.0);
        assert!(d.max <= 0.95);
        assert!(d.min <= d.p5 && d.p5 <= d.p50 && d.p50 <= d.p95 && d.p95 <= d.max);
        assert!(d.std_dev > 0.0);
    }

    #[test]
    fn test_mean_near_analytic_expectation() {
        // independent uniforms: E = 0.75 * 0.5 * 0.85 * 0.825
        let expected = 0.75 * 0.5 * 0.85 * 0.825;
        let d = monte_carlo_fde(20_000, 2024).expect("non-zero samples");
        assert!((d.mean - expected).abs() < 0.01, "mean {} vs {}", d.mean, expected);
    }

    #[test]
    fn test_available_range() {
        let d = monte_carlo_fde(1_000, 3).expect("non-zero samples");
        let (low, high) = d.available_range(Volume::tonnes_per_year(1000.0));
        assert!(low <= high);
        assert_eq!(*low, 1000.0 * d.p5);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[0.3], 95.0), 0.3);
    }
}

use crate::model::{ProbabilityEstimate, WindowStatistics};
use statrs::function::erf::erfc;
use std::collections::BTreeMap;
use std::f64::consts::SQRT_2;

/// Direction probabilities under a normal model of the next return.
pub struct ProbabilityEstimator;

impl ProbabilityEstimator {
    pub fn new() -> Self {
        Self
    }

    /// P(next return <= 0) is the standard normal CDF at `-mean / std`.
    /// Zero dispersion has no meaningful answer and falls back to a coin flip.
    pub fn calculate_probabilities(mean_return: f64, std_return: f64) -> ProbabilityEstimate {
        if std_return == 0.0 {
            return ProbabilityEstimate { p_up: 0.5, p_down: 0.5 };
        }

        let z_score = (0.0 - mean_return) / std_return;
        let p_down = standard_normal_cdf(z_score).clamp(0.0, 1.0);

        ProbabilityEstimate {
            p_up: 1.0 - p_down,
            p_down,
        }
    }

    pub fn process_all(
        &self,
        stats_by_window: &BTreeMap<u32, WindowStatistics>,
    ) -> BTreeMap<u32, ProbabilityEstimate> {
        stats_by_window
            .iter()
            .map(|(&days, stats)| {
                (days, Self::calculate_probabilities(stats.mean_return, stats.std_return))
            })
            .collect()
    }
}

fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dispersion_is_a_coin_flip() {
        let p = ProbabilityEstimator::calculate_probabilities(0.0, 0.0);
        assert_eq!(p.p_up, 0.5);
        assert_eq!(p.p_down, 0.5);

        let p = ProbabilityEstimator::calculate_probabilities(0.03, 0.0);
        assert_eq!(p, ProbabilityEstimate { p_up: 0.5, p_down: 0.5 });
    }

    #[test]
    fn positive_drift_favours_up() {
        let p = ProbabilityEstimator::calculate_probabilities(0.01, 0.02);
        assert!((p.p_down - 0.308_538).abs() < 1e-5);
        assert!((p.p_up - 0.691_462).abs() < 1e-5);
        assert!((p.p_up + p.p_down - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_mean_is_even() {
        let p = ProbabilityEstimator::calculate_probabilities(0.0, 0.05);
        assert!((p.p_up - 0.5).abs() < 1e-12);
    }

    #[test]
    fn extreme_drift_stays_in_unit_interval() {
        let p = ProbabilityEstimator::calculate_probabilities(-1.0, 1e-6);
        assert!(p.p_down <= 1.0 && p.p_down > 0.999);
        assert!(p.p_up >= 0.0);
    }

    #[test]
    fn process_all_maps_every_window() {
        let mut stats = BTreeMap::new();
        stats.insert(
            5,
            WindowStatistics {
                mean_return: -0.01,
                std_return: 0.02,
                open_price: 1.0,
                close_price: 1.0,
                change_pct: 0.0,
            },
        );
        let out = ProbabilityEstimator::new().process_all(&stats);
        assert!(out[&5].p_down > out[&5].p_up);
    }
}

//! Session-level scoring from ore counts.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_RECOVERY_WEIGHT;
use crate::recovery::RecoveryMetrics;

/// Rates are percentages rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateScore {
    pub total_ores: usize,
    pub recovered_ores: usize,
    pub diluted_ores: usize,
    pub recovery_rate: f64,
    pub dilution_rate: f64,
    pub final_score: i64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Final score = `round(weight * (recovery% - dilution%))`.
///
/// Zero total ores yields the all-zero result regardless of the other
/// arguments.
pub fn scoring_logic(
    total_ores: usize,
    recovered_ores: usize,
    diluted_ores: usize,
    recovery_weight: f64,
) -> AggregateScore {
    if total_ores == 0 {
        return AggregateScore::default();
    }

    let total = total_ores as f64;
    let recovery_rate = recovered_ores as f64 / total * 100.0;
    let dilution_rate = diluted_ores as f64 / total * 100.0;
    let final_score = (recovery_weight * (recovery_rate - dilution_rate)).round() as i64;

    AggregateScore {
        total_ores,
        recovered_ores,
        diluted_ores,
        recovery_rate: round2(recovery_rate),
        dilution_rate: round2(dilution_rate),
        final_score,
    }
}

/// [`scoring_logic`] with the default weight of 10.
pub fn scoring_logic_default(
    total_ores: usize,
    recovered_ores: usize,
    diluted_ores: usize,
) -> AggregateScore {
    scoring_logic(total_ores, recovered_ores, diluted_ores, DEFAULT_RECOVERY_WEIGHT)
}

impl AggregateScore {
    /// Score a blast cycle's metrics; every affected cell counts as an ore.
    pub fn from_metrics(metrics: &RecoveryMetrics, recovery_weight: f64) -> Self {
        scoring_logic(
            metrics.total_affected,
            metrics.recovered_count,
            metrics.diluted_count,
            recovery_weight,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_is_canonical_zero() {
        assert_eq!(scoring_logic(0, 0, 0, 10.0), AggregateScore::default());
        assert_eq!(scoring_logic(0, 50, 7, 99.0), AggregateScore::default());
    }

    #[test]
    fn test_reference_values() {
        let s = scoring_logic(100, 60, 10, 10.0);
        assert_eq!(s.recovery_rate, 60.0);
        assert_eq!(s.dilution_rate, 10.0);
        assert_eq!(s.final_score, 500);
        assert_eq!(s.total_ores, 100);
    }

    #[test]
    fn test_default_weight() {
        assert_eq!(scoring_logic_default(100, 60, 10), scoring_logic(100, 60, 10, 10.0));
    }

    #[test]
    fn test_rates_rounded_to_two_decimals() {
        let s = scoring_logic(3, 1, 1, 10.0);
        assert_eq!(s.recovery_rate, 33.33);
        assert_eq!(s.dilution_rate, 33.33);
        assert_eq!(s.final_score, 0);
    }

    #[test]
    fn test_negative_score_when_dilution_dominates() {
        let s = scoring_logic(10, 1, 5, 10.0);
        assert_eq!(s.final_score, -400);
    }

    #[test]
    fn test_final_score_uses_unrounded_rates() {
        // 2/3 = 66.666..%, 0%: 10 * 66.666.. = 666.67 -> 667
        let s = scoring_logic(3, 2, 0, 10.0);
        assert_eq!(s.recovery_rate, 66.67);
        assert_eq!(s.final_score, 667);
    }

    #[test]
    fn test_from_metrics() {
        let m = RecoveryMetrics {
            total_affected: 4,
            recovered_count: 2,
            diluted_count: 1,
            lost_count: 1,
            efficiency_pct: 50.0,
            avg_score: 0.5,
        };
        let s = AggregateScore::from_metrics(&m, 10.0);
        assert_eq!(s.recovery_rate, 50.0);
        assert_eq!(s.dilution_rate, 25.0);
        assert_eq!(s.final_score, 250);
    }
}

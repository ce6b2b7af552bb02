//! One blast cycle: footprint, scoring, destruction, session score.
//!
//! The caller owns the pending blasts (as a [`BlastPlan`]) and the current
//! grid, and passes both in explicitly. Scoring reads material properties
//! from the pre-blast grid; destroyed cells only appear in the returned
//! `grid_after`.
//!
//! # Cycle Flow
//!
//! 1. Union the blast footprints (first blast wins overlaps)
//! 2. Score affected cells against the untouched grid
//! 3. Copy the grid with affected cells marked destroyed
//! 4. Turn recovered/diluted counts into a session score

use serde::{Deserialize, Serialize};

use crate::config::{validate_config, RecoveryConfig};
use crate::error::{EngineError, Result};
use crate::footprint::{apply_blast_to_grid, calculate_all_affected_cells, AffectedCell, Blast};
use crate::grid::{validate_grid_data, Grid, GridModel};
use crate::recovery::{compute_recovery, NormalizationStats, RecoveryResult};
use crate::scoring::AggregateScore;

/// Blasts queued by the player, with an optional placement limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlastPlan {
    pub blasts: Vec<Blast>,
    pub max_blasts: Option<usize>,
}

impl BlastPlan {
    pub fn with_limit(max_blasts: usize) -> Self {
        Self {
            blasts: Vec::new(),
            max_blasts: Some(max_blasts),
        }
    }

    /// Queue a blast. Rejects negative or non-finite radii and blasts beyond
    /// the limit.
    pub fn push(&mut self, blast: Blast) -> Result<()> {
        if !blast.radius.is_finite() || blast.radius < 0.0 {
            return Err(EngineError::invalid_blast(format!(
                "radius {} at ({}, {})",
                blast.radius, blast.x, blast.y
            )));
        }
        if let Some(limit) = self.max_blasts {
            if self.blasts.len() >= limit {
                return Err(EngineError::BlastLimitReached(limit));
            }
        }
        self.blasts.push(blast);
        Ok(())
    }

    pub fn remaining(&self) -> Option<usize> {
        self.max_blasts
            .map(|limit| limit.saturating_sub(self.blasts.len()))
    }

    pub fn clear(&mut self) {
        self.blasts.clear();
    }
}

/// Everything a blast cycle produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlastOutcome {
    /// Drives destruction animation order and timing.
    pub affected_cells: Vec<AffectedCell>,
    pub recovery: RecoveryResult,
    pub aggregate: AggregateScore,
    pub grid_after: Grid,
}

/// Run a full blast cycle against `model`. The model is not modified.
pub fn run_blast_cycle(
    model: &GridModel,
    blasts: &[Blast],
    config: &RecoveryConfig,
    global_stats: Option<&NormalizationStats>,
) -> Result<BlastOutcome> {
    if !validate_grid_data(&model.grid, &model.dimensions) {
        return Err(EngineError::InvalidGrid);
    }
    let config_errors = validate_config(config);
    if !config_errors.is_empty() {
        let joined = config_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(EngineError::config(joined));
    }

    let affected_cells = calculate_all_affected_cells(&model.grid, blasts);
    let recovery = compute_recovery(&affected_cells, &model.grid, config, global_stats);
    let grid_after = apply_blast_to_grid(&model.grid, &affected_cells);
    let aggregate = AggregateScore::from_metrics(&recovery.metrics, config.recovery_weight);

    log::info!(
        "Blast cycle: {} blasts, {} cells affected ({} recovered, {} diluted, {} lost), efficiency {:.1}%, score {}",
        blasts.len(),
        recovery.metrics.total_affected,
        recovery.metrics.recovered_count,
        recovery.metrics.diluted_count,
        recovery.metrics.lost_count,
        recovery.metrics.efficiency_pct,
        aggregate.final_score
    );

    Ok(BlastOutcome {
        affected_cells,
        recovery,
        aggregate,
        grid_after,
    })
}

/// Run the plan's blasts, then clear it.
pub fn detonate(
    model: &GridModel,
    plan: &mut BlastPlan,
    config: &RecoveryConfig,
    global_stats: Option<&NormalizationStats>,
) -> Result<BlastOutcome> {
    let outcome = run_blast_cycle(model, &plan.blasts, config, global_stats)?;
    plan.clear();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_grid_model;

    fn model_3x3() -> GridModel {
        let mut rows = vec!["x,y,ore_type,density,hardness,fragmentation_index".to_string()];
        for y in 0..3 {
            for x in 0..3 {
                rows.push(format!("{},{},gold,5,0.5,0.1", x, y));
            }
        }
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|l| l.split(',').map(String::from).collect())
            .collect();
        build_grid_model(&rows).unwrap()
    }

    #[test]
    fn test_plan_limit() {
        let mut plan = BlastPlan::with_limit(2);
        plan.push(Blast { x: 0, y: 0, radius: 1.0 }).unwrap();
        assert_eq!(plan.remaining(), Some(1));
        plan.push(Blast { x: 1, y: 1, radius: 1.0 }).unwrap();
        assert!(matches!(
            plan.push(Blast { x: 2, y: 2, radius: 1.0 }),
            Err(EngineError::BlastLimitReached(2))
        ));
        assert_eq!(plan.blasts.len(), 2);
    }

    #[test]
    fn test_plan_rejects_bad_radius() {
        let mut plan = BlastPlan::default();
        assert!(plan.push(Blast { x: 0, y: 0, radius: -1.0 }).is_err());
        assert!(plan.push(Blast { x: 0, y: 0, radius: f64::NAN }).is_err());
        assert!(plan.blasts.is_empty());
        assert_eq!(plan.remaining(), None);
    }

    #[test]
    fn test_cycle_leaves_model_untouched() {
        let model = model_3x3();
        let before = model.clone();
        let outcome = run_blast_cycle(
            &model,
            &[Blast { x: 1, y: 1, radius: 1.0 }],
            &RecoveryConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(model, before);
        assert_eq!(outcome.affected_cells.len(), 5);
        let destroyed = outcome
            .grid_after
            .iter()
            .flatten()
            .flatten()
            .filter(|c| c.is_destroyed())
            .count();
        assert_eq!(destroyed, 5);
    }

    #[test]
    fn test_cycle_scores_pre_blast_values() {
        let model = model_3x3();
        let outcome = run_blast_cycle(
            &model,
            &[Blast { x: 1, y: 1, radius: 1.0 }],
            &RecoveryConfig::default(),
            None,
        )
        .unwrap();
        // Raw density is read before the cells are marked destroyed.
        for c in &outcome.recovery.annotated_cells {
            assert_eq!(c.raw.density, 5.0);
        }
        assert_eq!(outcome.aggregate.total_ores, 5);
        assert_eq!(outcome.aggregate.diluted_ores, 4);
        assert_eq!(outcome.aggregate.dilution_rate, 80.0);
        assert_eq!(outcome.aggregate.final_score, -800);
    }

    #[test]
    fn test_cycle_without_blasts() {
        let outcome =
            run_blast_cycle(&model_3x3(), &[], &RecoveryConfig::default(), None).unwrap();
        assert!(outcome.affected_cells.is_empty());
        assert_eq!(outcome.aggregate, AggregateScore::default());
        assert_eq!(outcome.grid_after, model_3x3().grid);
    }

    #[test]
    fn test_cycle_rejects_invalid_grid() {
        let mut model = model_3x3();
        model.grid.pop();
        assert!(matches!(
            run_blast_cycle(&model, &[], &RecoveryConfig::default(), None),
            Err(EngineError::InvalidGrid)
        ));
    }

    #[test]
    fn test_cycle_rejects_invalid_config() {
        let config = RecoveryConfig {
            blast_force_normalized: 2.0,
            ..RecoveryConfig::default()
        };
        assert!(matches!(
            run_blast_cycle(&model_3x3(), &[], &config, None),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_detonate_clears_plan() {
        let mut plan = BlastPlan::with_limit(3);
        plan.push(Blast { x: 0, y: 0, radius: 1.0 }).unwrap();
        let outcome = detonate(&model_3x3(), &mut plan, &RecoveryConfig::default(), None).unwrap();
        assert_eq!(outcome.affected_cells.len(), 3);
        assert!(plan.blasts.is_empty());
        assert_eq!(plan.remaining(), Some(3));
    }
}

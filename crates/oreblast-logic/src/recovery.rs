//! Recovery scoring for blasted cells.
//!
//! Each affected cell gets four raw features (density, hardness,
//! fragmentation index, blast distance) read from the pre-blast grid. These
//! are min-max normalized against a stats scope, combined into a score in
//! `[0, 1]`, and classified as recovered, diluted, or lost.
//!
//! Degenerate inputs never fail: a constant feature or a missing value
//! normalizes to the neutral 0.5, and an empty footprint yields zero metrics.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::{MaterialWeights, RecoveryConfig, StatsScope, Thresholds, BLAST_PENALTY_K};
use crate::footprint::AffectedCell;
use crate::grid::{cell_at, GridCell, GridModel};

/// Stand-in argument for `ln` when the input is not positive.
pub const LOG_EPSILON: f64 = 1e-6;

/// Value returned for missing values and constant ranges.
pub const NEUTRAL_NORM: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

/// Per-feature ranges used for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationStats {
    /// Range of density, after the log transform when enabled.
    pub density: MinMax,
    pub hardness: MinMax,
    pub fragmentation_index: MinMax,
    pub distance: MinMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFeatures {
    pub density: f64,
    pub hardness: f64,
    pub fragmentation_index: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFeatures {
    pub dens_norm: f64,
    pub hard_norm: f64,
    pub frag_norm: f64,
    pub dist_norm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Recovered,
    Diluted,
    Lost,
}

/// An affected cell with its features, score, and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedCell {
    pub x: usize,
    pub y: usize,
    pub distance: f64,
    pub raw: RawFeatures,
    pub norm: NormalizedFeatures,
    pub recovery_score: f64,
    pub recovery_status: RecoveryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryMetrics {
    pub total_affected: usize,
    pub recovered_count: usize,
    pub diluted_count: usize,
    pub lost_count: usize,
    /// `100 * avg_score`.
    pub efficiency_pct: f64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResult {
    pub annotated_cells: Vec<AnnotatedCell>,
    pub metrics: RecoveryMetrics,
    /// The stats actually used, local or global.
    pub stats: NormalizationStats,
}

/// `ln(v)` for positive finite `v`, otherwise `ln(LOG_EPSILON)`.
pub fn log_transform(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v.ln()
    } else {
        LOG_EPSILON.ln()
    }
}

/// Min and max over the finite values. `{0, 0}` when there are none.
pub fn min_max_stats<I>(values: I) -> MinMax
where
    I: IntoIterator<Item = f64>,
{
    let mut bounds: Option<(OrderedFloat<f64>, OrderedFloat<f64>)> = None;
    for v in values.into_iter().filter(|v| v.is_finite()).map(OrderedFloat) {
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    match bounds {
        Some((lo, hi)) => MinMax { min: lo.0, max: hi.0 },
        None => MinMax::default(),
    }
}

/// `(v - min) / (max - min)`, or 0.5 when `v` is not finite or the range is
/// constant. Not clamped: values outside the range map outside `[0, 1]`.
pub fn safe_min_max_normalize(v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() || min == max {
        return NEUTRAL_NORM;
    }
    (v - min) / (max - min)
}

/// Combine normalized features into a score in `[0, 1]`.
///
/// High fragmentation and heavy blast force both reduce recovery; harder,
/// denser material farther from the blast center raises it.
pub fn compute_recovery_score_from_norms(
    norm: &NormalizedFeatures,
    blast_force_norm: f64,
    weights: &MaterialWeights,
) -> f64 {
    let frag_penalty = 1.0 - norm.frag_norm;
    let material_factor =
        weights.material_hardness * norm.hard_norm + weights.material_density * norm.dens_norm;
    let raw = material_factor * frag_penalty * norm.dist_norm;
    let blast_penalty = 1.0 / (1.0 + BLAST_PENALTY_K * blast_force_norm);
    let score = raw * blast_penalty;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn classify_recovery(score: f64, thresholds: &Thresholds) -> RecoveryStatus {
    if score >= thresholds.recovered {
        RecoveryStatus::Recovered
    } else if score < thresholds.diluted {
        RecoveryStatus::Lost
    } else {
        RecoveryStatus::Diluted
    }
}

/// Density as scored. A non-finite density is missing data and stays NaN,
/// so it is excluded from stats and normalizes to the neutral value.
fn density_feature(density: f64, use_log_density: bool) -> f64 {
    if !density.is_finite() {
        f64::NAN
    } else if use_log_density {
        log_transform(density)
    } else {
        density
    }
}

/// Raw features for an affected cell. Empty slots yield NaN material values.
fn raw_features(affected: &AffectedCell, grid: &[Vec<Option<GridCell>>]) -> RawFeatures {
    match cell_at(grid, affected.x, affected.y) {
        Some(cell) => RawFeatures {
            density: cell.density,
            hardness: cell.hardness,
            fragmentation_index: cell.fragmentation_index,
            distance: affected.distance,
        },
        None => RawFeatures {
            density: f64::NAN,
            hardness: f64::NAN,
            fragmentation_index: f64::NAN,
            distance: affected.distance,
        },
    }
}

fn stats_from_raw(raw: &[RawFeatures], use_log_density: bool) -> NormalizationStats {
    NormalizationStats {
        density: min_max_stats(raw.iter().map(|r| density_feature(r.density, use_log_density))),
        hardness: min_max_stats(raw.iter().map(|r| r.hardness)),
        fragmentation_index: min_max_stats(raw.iter().map(|r| r.fragmentation_index)),
        distance: min_max_stats(raw.iter().map(|r| r.distance)),
    }
}

/// Stats over the affected cells only.
pub fn compute_normalization_stats(
    affected: &[AffectedCell],
    grid: &[Vec<Option<GridCell>>],
    use_log_density: bool,
) -> NormalizationStats {
    let raw: Vec<RawFeatures> = affected.iter().map(|a| raw_features(a, grid)).collect();
    stats_from_raw(&raw, use_log_density)
}

/// Reference stats over every populated cell of a model, for
/// [`StatsScope::Global`]. Distance spans zero to the grid diagonal.
pub fn compute_global_stats(model: &GridModel, use_log_density: bool) -> NormalizationStats {
    let cells: Vec<&GridCell> = model.grid.iter().flatten().flatten().collect();
    let w = model.dimensions.width.saturating_sub(1) as f64;
    let h = model.dimensions.height.saturating_sub(1) as f64;
    NormalizationStats {
        density: min_max_stats(cells.iter().map(|c| density_feature(c.density, use_log_density))),
        hardness: min_max_stats(cells.iter().map(|c| c.hardness)),
        fragmentation_index: min_max_stats(cells.iter().map(|c| c.fragmentation_index)),
        distance: MinMax {
            min: 0.0,
            max: (w * w + h * h).sqrt(),
        },
    }
}

fn normalize(
    raw: &RawFeatures,
    stats: &NormalizationStats,
    use_log_density: bool,
) -> NormalizedFeatures {
    NormalizedFeatures {
        dens_norm: safe_min_max_normalize(
            density_feature(raw.density, use_log_density),
            stats.density.min,
            stats.density.max,
        ),
        hard_norm: safe_min_max_normalize(raw.hardness, stats.hardness.min, stats.hardness.max),
        frag_norm: safe_min_max_normalize(
            raw.fragmentation_index,
            stats.fragmentation_index.min,
            stats.fragmentation_index.max,
        ),
        dist_norm: safe_min_max_normalize(raw.distance, stats.distance.min, stats.distance.max),
    }
}

/// Aggregate counts and mean score. Mean divides by `max(count, 1)`.
pub fn compute_metrics(cells: &[AnnotatedCell]) -> RecoveryMetrics {
    let mut metrics = RecoveryMetrics {
        total_affected: cells.len(),
        ..RecoveryMetrics::default()
    };
    let mut sum = 0.0;
    for c in cells {
        sum += c.recovery_score;
        match c.recovery_status {
            RecoveryStatus::Recovered => metrics.recovered_count += 1,
            RecoveryStatus::Diluted => metrics.diluted_count += 1,
            RecoveryStatus::Lost => metrics.lost_count += 1,
        }
    }
    metrics.avg_score = sum / cells.len().max(1) as f64;
    metrics.efficiency_pct = 100.0 * metrics.avg_score;
    metrics
}

/// Score every affected cell against the pre-blast grid.
///
/// With [`StatsScope::Global`] the supplied `global_stats` are used; if none
/// are supplied the local stats are used instead.
pub fn compute_recovery(
    affected: &[AffectedCell],
    grid: &[Vec<Option<GridCell>>],
    config: &RecoveryConfig,
    global_stats: Option<&NormalizationStats>,
) -> RecoveryResult {
    let raw: Vec<RawFeatures> = affected.iter().map(|a| raw_features(a, grid)).collect();

    let stats = match (config.stats_scope, global_stats) {
        (StatsScope::Global, Some(stats)) => *stats,
        (StatsScope::Global, None) => {
            log::warn!("Global stats scope requested without stats; using local stats");
            stats_from_raw(&raw, config.use_log_density)
        }
        (StatsScope::Local, _) => stats_from_raw(&raw, config.use_log_density),
    };

    let annotated_cells: Vec<AnnotatedCell> = affected
        .iter()
        .zip(raw)
        .map(|(a, raw)| {
            let norm = normalize(&raw, &stats, config.use_log_density);
            let recovery_score = compute_recovery_score_from_norms(
                &norm,
                config.blast_force_normalized,
                &config.weights,
            );
            AnnotatedCell {
                x: a.x,
                y: a.y,
                distance: a.distance,
                raw,
                norm,
                recovery_score,
                recovery_status: classify_recovery(recovery_score, &config.thresholds),
            }
        })
        .collect();

    let metrics = compute_metrics(&annotated_cells);
    RecoveryResult {
        annotated_cells,
        metrics,
        stats,
    }
}

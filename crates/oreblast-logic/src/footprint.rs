//! Blast footprints over the grid.
//!
//! A blast covers every grid position within `radius` (inclusive) of its
//! center. Only the grid's extent matters here; empty slots are covered too.
//! When several blasts overlap, the first blast in input order owns the cell
//! and its distance is the one recorded.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridCell};
use crate::ore_types::DESTROYED_ORE_TYPE;

/// A player-placed circular blast, in grid-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blast {
    pub x: i64,
    pub y: i64,
    pub radius: f64,
}

/// A grid position inside a blast footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffectedCell {
    pub x: usize,
    pub y: usize,
    /// Distance to the center of the blast that claimed this cell.
    pub distance: f64,
}

impl AffectedCell {
    pub fn key(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}

/// Cells within `blast.radius` of the blast center, scanned row by row.
pub fn calculate_affected_cells(
    grid: &[Vec<Option<GridCell>>],
    blast: &Blast,
) -> Vec<AffectedCell> {
    let mut cells = Vec::new();
    for (y, row) in grid.iter().enumerate() {
        for x in 0..row.len() {
            let dx = x as f64 - blast.x as f64;
            let dy = y as f64 - blast.y as f64;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= blast.radius {
                cells.push(AffectedCell { x, y, distance });
            }
        }
    }
    cells
}

/// Union of all blast footprints, deduplicated by position.
///
/// Blasts are processed in order and a position keeps the record from the
/// first blast that reaches it, even if a later blast is closer. Output is in
/// first-seen order.
pub fn calculate_all_affected_cells(
    grid: &[Vec<Option<GridCell>>],
    blasts: &[Blast],
) -> Vec<AffectedCell> {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut union = Vec::new();
    for blast in blasts {
        let footprint = calculate_affected_cells(grid, blast);
        log::debug!(
            "Blast at ({}, {}) r={} covers {} cells",
            blast.x,
            blast.y,
            blast.radius,
            footprint.len()
        );
        for cell in footprint {
            if seen.insert(cell.key()) {
                union.push(cell);
            }
        }
    }
    union
}

/// Copy of `grid` with every affected, populated cell marked destroyed.
/// The input grid is left untouched.
pub fn apply_blast_to_grid(grid: &[Vec<Option<GridCell>>], affected: &[AffectedCell]) -> Grid {
    let mut out = grid.to_vec();
    for a in affected {
        if let Some(Some(cell)) = out.get_mut(a.y).and_then(|row| row.get_mut(a.x)) {
            cell.ore_type = DESTROYED_ORE_TYPE.to_string();
        }
    }
    out
}

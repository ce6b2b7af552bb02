//! Dense grid construction from sparse sample rows.
//!
//! Rows arrive as plain strings (header first). A filtering pass turns them
//! into [`SampleRecord`]s, skipping rows with unusable coordinates or ore
//! type, then the samples are placed into a `height × width` grid shifted so
//! that the minimum sample coordinate lands at `(0, 0)`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::GridBuildError;
use crate::ore_types::{normalize_ore_type, DESTROYED_ORE_TYPE};

/// Columns every sample table must carry. Matched case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "x",
    "y",
    "ore_type",
    "density",
    "hardness",
    "fragmentation_index",
];

/// Upper bound on `width * height`. Sample tables spanning more slots than
/// this are rejected rather than allocated.
pub const MAX_GRID_CELLS: usize = 4_194_304;

/// One parsed sample at an absolute location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub x: i64,
    pub y: i64,
    pub ore_type: String,
    pub density: f64,
    pub hardness: f64,
    pub fragmentation_index: f64,
}

/// A populated grid slot. `grid_x`/`grid_y` are zero-based; `x`/`y` are the
/// original absolute coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub x: i64,
    pub y: i64,
    pub ore_type: String,
    pub grid_x: usize,
    pub grid_y: usize,
    pub density: f64,
    pub hardness: f64,
    pub fragmentation_index: f64,
}

impl GridCell {
    pub fn is_destroyed(&self) -> bool {
        self.ore_type == DESTROYED_ORE_TYPE
    }
}

/// Row-major grid: `grid[grid_y][grid_x]`. `None` means no sample there.
pub type Grid = Vec<Vec<Option<GridCell>>>;

/// Extent of the sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridMetadata {
    pub total_blocks: usize,
    pub ore_types: BTreeSet<String>,
    pub original_blocks: Vec<SampleRecord>,
}

/// Grid plus everything derived from the sample set while building it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridModel {
    pub grid: Grid,
    pub dimensions: Dimensions,
    pub metadata: GridMetadata,
}

impl GridModel {
    /// Build a model directly from already-parsed samples.
    pub fn from_samples(samples: Vec<SampleRecord>) -> Result<Self, GridBuildError> {
        let Some(first) = samples.first() else {
            return Err(GridBuildError::NoValidSamples);
        };

        // Pass 1: bounds and distinct ore types.
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        let mut ore_types = BTreeSet::new();
        for s in &samples {
            min_x = min_x.min(s.x);
            max_x = max_x.max(s.x);
            min_y = min_y.min(s.y);
            max_y = max_y.max(s.y);
            ore_types.insert(s.ore_type.clone());
        }

        let too_large = GridBuildError::ExtentTooLarge {
            min_x,
            max_x,
            min_y,
            max_y,
        };
        let (Some(width), Some(height)) = (axis_extent(min_x, max_x), axis_extent(min_y, max_y))
        else {
            return Err(too_large);
        };
        if width.checked_mul(height).map_or(true, |cells| cells > MAX_GRID_CELLS) {
            return Err(too_large);
        }

        let dimensions = Dimensions {
            width,
            height,
            min_x,
            max_x,
            min_y,
            max_y,
        };

        // Pass 2: place samples. Colliding coordinates keep the last sample.
        let mut grid: Grid = vec![vec![None; dimensions.width]; dimensions.height];
        for s in &samples {
            let grid_x = (s.x - min_x) as usize;
            let grid_y = (s.y - min_y) as usize;
            let slot = &mut grid[grid_y][grid_x];
            if slot.is_some() {
                log::debug!(
                    "Sample at ({}, {}) overwrites an earlier sample at the same location",
                    s.x,
                    s.y
                );
            }
            *slot = Some(GridCell {
                x: s.x,
                y: s.y,
                ore_type: s.ore_type.clone(),
                grid_x,
                grid_y,
                density: s.density,
                hardness: s.hardness,
                fragmentation_index: s.fragmentation_index,
            });
        }

        log::info!(
            "Built {}×{} grid from {} samples ({} ore types)",
            dimensions.width,
            dimensions.height,
            samples.len(),
            ore_types.len()
        );

        Ok(Self {
            grid,
            dimensions,
            metadata: GridMetadata {
                total_blocks: samples.len(),
                ore_types,
                original_blocks: samples,
            },
        })
    }

    /// Cell at grid-local coordinates, if populated.
    pub fn cell(&self, grid_x: usize, grid_y: usize) -> Option<&GridCell> {
        cell_at(&self.grid, grid_x, grid_y)
    }

    /// Number of populated slots. Lower than `total_blocks` when samples collide.
    pub fn occupied_count(&self) -> usize {
        self.grid.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Populated slots per ore type, destroyed cells included.
    pub fn ore_type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for cell in self.grid.iter().flatten().flatten() {
            *counts.entry(cell.ore_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Same model with a replacement grid, e.g. after a blast.
    pub fn with_grid(&self, grid: Grid) -> Self {
        Self {
            grid,
            dimensions: self.dimensions,
            metadata: self.metadata.clone(),
        }
    }
}

/// Number of slots from `min` to `max` inclusive, or `None` on overflow.
fn axis_extent(min: i64, max: i64) -> Option<usize> {
    let span = max.checked_sub(min)?.checked_add(1)?;
    usize::try_from(span).ok()
}

/// Cell lookup on a bare grid.
pub fn cell_at(grid: &[Vec<Option<GridCell>>], grid_x: usize, grid_y: usize) -> Option<&GridCell> {
    grid.get(grid_y)?.get(grid_x)?.as_ref()
}

/// Column positions of the required fields within a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    x: usize,
    y: usize,
    ore_type: usize,
    density: usize,
    hardness: usize,
    fragmentation_index: usize,
}

impl ColumnIndex {
    fn from_header(header: &[String]) -> Result<Self, GridBuildError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| GridBuildError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            x: find("x")?,
            y: find("y")?,
            ore_type: find("ore_type")?,
            density: find("density")?,
            hardness: find("hardness")?,
            fragmentation_index: find("fragmentation_index")?,
        })
    }
}

/// Parse an integer coordinate. A trailing all-zero fraction such as `"3.0"`
/// is accepted; exponents and other fractions are rejected.
fn parse_coordinate(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if !fraction.chars().all(|c| c == '0') {
        return None;
    }
    whole.parse::<i64>().ok()
}

/// Unparseable numbers become NaN and are neutralized during scoring.
fn parse_float(raw: Option<&String>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Filtering pass: turn raw rows (header first) into valid samples.
///
/// Rows whose `x` or `y` is not an integer, or whose `ore_type` is blank, are
/// skipped with a warning. Only a missing header column is an error.
pub fn parse_samples(rows: &[Vec<String>]) -> Result<Vec<SampleRecord>, GridBuildError> {
    let Some((header, data)) = rows.split_first() else {
        return Err(GridBuildError::NoDataRows);
    };
    let cols = ColumnIndex::from_header(header)?;

    let samples: Vec<SampleRecord> = data
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            // 1-based, counting the header
            let row_number = i + 2;
            let field = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

            let (Some(x), Some(y)) = (
                parse_coordinate(field(cols.x)),
                parse_coordinate(field(cols.y)),
            ) else {
                log::warn!(
                    "Skipping row {}: non-integer coordinates ({:?}, {:?})",
                    row_number,
                    field(cols.x),
                    field(cols.y)
                );
                return None;
            };

            let ore_type = normalize_ore_type(field(cols.ore_type));
            if ore_type.is_empty() {
                log::warn!("Skipping row {}: empty ore_type", row_number);
                return None;
            }

            Some(SampleRecord {
                x,
                y,
                ore_type,
                density: parse_float(row.get(cols.density)),
                hardness: parse_float(row.get(cols.hardness)),
                fragmentation_index: parse_float(row.get(cols.fragmentation_index)),
            })
        })
        .collect();

    let skipped = data.len() - samples.len();
    if skipped > 0 {
        log::warn!("Skipped {} of {} data rows", skipped, data.len());
    }
    Ok(samples)
}

/// Build a grid model from raw rows (header first).
pub fn build_grid_model(rows: &[Vec<String>]) -> Result<GridModel, GridBuildError> {
    if rows.len() < 2 {
        return Err(GridBuildError::NoDataRows);
    }
    let samples = parse_samples(rows)?;
    GridModel::from_samples(samples)
}

/// Check a grid's shape against its dimensions. Callers should check this
/// before footprint or scoring work on a grid they did not build.
pub fn validate_grid_data(grid: &[Vec<Option<GridCell>>], dimensions: &Dimensions) -> bool {
    grid.len() == dimensions.height && grid.iter().all(|row| row.len() == dimensions.width)
}

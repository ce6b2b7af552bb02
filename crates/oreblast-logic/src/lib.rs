//! Pure ore-grid and blast recovery logic for OreBlast.
//!
//! This crate contains the scoring engine independent of any UI, file
//! format, or runtime. Functions take plain data and return new data, making
//! them unit-testable and safe to call from any thread.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Recovery weights, thresholds, stats scope, validation |
//! | [`cycle`] | Blast plan limits and the footprint → score → destroy pipeline |
//! | [`error`] | Grid build and engine error types |
//! | [`footprint`] | Circular blast footprints and first-blast-wins union |
//! | [`grid`] | Sample parsing, dense grid construction, destroyed-cell copies |
//! | [`ore_types`] | Ore type name normalization and color/value lookup |
//! | [`recovery`] | Min-max normalization, per-cell recovery score, metrics |
//! | [`scoring`] | Session-level recovery/dilution rates and final score |
//!
//! ```
//! use oreblast_logic::config::RecoveryConfig;
//! use oreblast_logic::cycle::run_blast_cycle;
//! use oreblast_logic::footprint::Blast;
//! use oreblast_logic::grid::build_grid_model;
//!
//! let rows: Vec<Vec<String>> = [
//!     "x,y,ore_type,density,hardness,fragmentation_index",
//!     "0,0,gold,5.0,0.5,0.1",
//!     "1,0,iron,4.0,0.7,0.3",
//! ]
//! .iter()
//! .map(|line| line.split(',').map(String::from).collect())
//! .collect();
//!
//! let model = build_grid_model(&rows).unwrap();
//! let blasts = [Blast { x: 0, y: 0, radius: 1.0 }];
//! let outcome = run_blast_cycle(&model, &blasts, &RecoveryConfig::default(), None).unwrap();
//! assert_eq!(outcome.affected_cells.len(), 2);
//! ```

pub mod config;
pub mod cycle;
pub mod error;
pub mod footprint;
pub mod grid;
pub mod ore_types;
pub mod recovery;
pub mod scoring;

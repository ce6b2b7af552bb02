//! OreBlast Headless Harness
//!
//! Loads a sample CSV, runs a blast cycle, and prints the recovery report.
//! With no CSV it runs the invariant sweep over synthetic deposits instead.
//! Runs entirely in-process — no rendering, no persistence.
//!
//! Usage:
//!   cargo run -p oreblast-simtest
//!   cargo run -p oreblast-simtest -- --trials 500 -v
//!   cargo run -p oreblast-simtest -- --csv samples.csv --blast 4,4,2.5 --blast 9,3,1.5 --json

mod ingest;
mod sweep;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use oreblast_logic::config::{validate_config, RecoveryConfig, StatsScope};
use oreblast_logic::cycle::{run_blast_cycle, BlastOutcome, BlastPlan};
use oreblast_logic::footprint::Blast;
use oreblast_logic::grid::{build_grid_model, GridModel};
use oreblast_logic::recovery::compute_global_stats;
use serde::Serialize;

use sweep::TestResult;

/// OreBlast headless harness
#[derive(Parser)]
#[command(name = "oreblast-simtest")]
#[command(about = "Run OreBlast blast cycles on sample CSVs or validate engine invariants")]
#[command(long_about = None)]
struct Cli {
    /// Sample CSV (x, y, ore_type, density, hardness, fragmentation_index)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Blast as x,y,radius in grid-local coordinates (repeatable)
    #[arg(long = "blast", value_parser = parse_blast)]
    blasts: Vec<Blast>,

    /// Maximum number of blasts per cycle
    #[arg(long)]
    max_blasts: Option<usize>,

    /// Recovery config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Normalization stats scope (local, global)
    #[arg(long)]
    scope: Option<String>,

    /// Normalized blast force, 0..=1
    #[arg(long)]
    force: Option<f64>,

    /// Use raw density instead of log density
    #[arg(long)]
    no_log_density: bool,

    /// Session score weight
    #[arg(long)]
    recovery_weight: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Random seed for the invariant sweep
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Synthetic deposits per sweep check
    #[arg(long, default_value_t = 200)]
    trials: usize,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_blast(s: &str) -> std::result::Result<Blast, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, r] = parts.as_slice() else {
        return Err(format!("expected x,y,radius, got '{}'", s));
    };
    Ok(Blast {
        x: x.parse().map_err(|e| format!("blast x '{}': {}", x, e))?,
        y: y.parse().map_err(|e| format!("blast y '{}': {}", y, e))?,
        radius: r.parse().map_err(|e| format!("blast radius '{}': {}", r, e))?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config = load_config(&cli)?;

    match &cli.csv {
        Some(path) => run_csv(&cli, path, &config),
        None => run_harness(&cli),
    }
}

fn load_config(cli: &Cli) -> Result<RecoveryConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            RecoveryConfig::from_json(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => RecoveryConfig::default(),
    };

    if let Some(scope) = &cli.scope {
        config.stats_scope = match scope.to_lowercase().as_str() {
            "local" => StatsScope::Local,
            "global" => StatsScope::Global,
            other => anyhow::bail!("unknown stats scope '{}' (expected local or global)", other),
        };
    }
    if let Some(force) = cli.force {
        config.blast_force_normalized = force;
    }
    if cli.no_log_density {
        config.use_log_density = false;
    }
    if let Some(weight) = cli.recovery_weight {
        config.recovery_weight = weight;
    }

    let errors = validate_config(&config);
    if !errors.is_empty() {
        for e in &errors {
            log::error!("{}", e);
        }
        anyhow::bail!("invalid configuration ({} errors)", errors.len());
    }
    log::debug!("Using config {:?}", config);
    Ok(config)
}

// ── CSV mode ────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    source: String,
    dimensions: &'a oreblast_logic::grid::Dimensions,
    total_blocks: usize,
    ore_types: Vec<&'a str>,
    ingest_errors: &'a [String],
    blasts: &'a [Blast],
    #[serde(flatten)]
    outcome: &'a BlastOutcome,
}

fn run_csv(cli: &Cli, path: &Path, config: &RecoveryConfig) -> Result<()> {
    let ingested = ingest::read_csv_path(path)?;
    for e in &ingested.errors {
        log::warn!("{}: {}", path.display(), e);
    }
    ingest::validate_headers(&ingested)
        .with_context(|| format!("validating {}", path.display()))?;

    let model = build_grid_model(&ingested.data)
        .with_context(|| format!("building grid from {}", path.display()))?;

    let mut plan = BlastPlan {
        blasts: Vec::new(),
        max_blasts: cli.max_blasts,
    };
    for blast in &cli.blasts {
        plan.push(*blast)?;
    }
    if plan.blasts.is_empty() {
        log::warn!("No blasts given; reporting an empty cycle");
    }

    let global = compute_global_stats(&model, config.use_log_density);
    let global_stats = match config.stats_scope {
        StatsScope::Global => Some(&global),
        StatsScope::Local => None,
    };
    let outcome = run_blast_cycle(&model, &plan.blasts, config, global_stats)?;

    if cli.json {
        let report = Report {
            source: path.display().to_string(),
            dimensions: &model.dimensions,
            total_blocks: model.metadata.total_blocks,
            ore_types: model.metadata.ore_types.iter().map(String::as_str).collect(),
            ingest_errors: &ingested.errors,
            blasts: &plan.blasts,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(path, &model, &plan.blasts, &outcome);
    }
    Ok(())
}

fn print_summary(path: &Path, model: &GridModel, blasts: &[Blast], outcome: &BlastOutcome) {
    let d = model.dimensions;
    println!("=== OreBlast: {} ===\n", path.display());
    println!(
        "Grid {}×{} (x {}..={}, y {}..={}), {} samples",
        d.width, d.height, d.min_x, d.max_x, d.min_y, d.max_y, model.metadata.total_blocks
    );
    for (ore, count) in model.ore_type_counts() {
        println!("  {:<12} {}", ore, count);
    }

    println!("\nBlasts:");
    for b in blasts {
        println!("  ({}, {}) r={}", b.x, b.y, b.radius);
    }

    let m = &outcome.recovery.metrics;
    let a = &outcome.aggregate;
    println!("\nAffected cells:  {}", m.total_affected);
    println!("  recovered      {}", m.recovered_count);
    println!("  diluted        {}", m.diluted_count);
    println!("  lost           {}", m.lost_count);
    println!("Efficiency:      {:.2}%", m.efficiency_pct);
    println!("Recovery rate:   {:.2}%", a.recovery_rate);
    println!("Dilution rate:   {:.2}%", a.dilution_rate);
    println!("Final score:     {}", a.final_score);
}

// ── Harness mode ────────────────────────────────────────────────────────

fn run_harness(cli: &Cli) -> Result<()> {
    let verbose = cli.verbose > 0;
    println!("=== OreBlast Engine Harness ===\n");

    let results: Vec<TestResult> = sweep::run_sweep(cli.seed, cli.trials);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blast() {
        let b = parse_blast("3, -2, 1.5").unwrap();
        assert_eq!(b, Blast { x: 3, y: -2, radius: 1.5 });
        assert!(parse_blast("3,2").is_err());
        assert!(parse_blast("a,2,1").is_err());
        assert!(parse_blast("1,2,3,4").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "oreblast-simtest",
            "--scope",
            "GLOBAL",
            "--force",
            "0.25",
            "--no-log-density",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.stats_scope, StatsScope::Global);
        assert_eq!(config.blast_force_normalized, 0.25);
        assert!(!config.use_log_density);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["oreblast-simtest", "--force", "3"]);
        assert!(load_config(&cli).is_err());
        let cli = Cli::parse_from(["oreblast-simtest", "--scope", "regional"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_sweep_passes() {
        let results = sweep::run_sweep(7, 50);
        let failed: Vec<_> = results.iter().filter(|r| !r.passed).collect();
        assert!(
            failed.is_empty(),
            "failed: {:?}",
            failed.iter().map(|r| (&r.name, &r.detail)).collect::<Vec<_>>()
        );
    }
}

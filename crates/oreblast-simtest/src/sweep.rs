//! Invariant sweep over synthetic deposits.
//!
//! Each check runs across many seeded random deposits and blast layouts and
//! reports one pass/fail line.

use std::collections::HashSet;

use oreblast_logic::config::RecoveryConfig;
use oreblast_logic::cycle::run_blast_cycle;
use oreblast_logic::footprint::{calculate_affected_cells, calculate_all_affected_cells, Blast};
use oreblast_logic::grid::{GridModel, SampleRecord};
use oreblast_logic::ore_types::{COAL, COPPER, GOLD, IRON, SILVER, WASTE};
use oreblast_logic::recovery::{
    compute_recovery_score_from_norms, safe_min_max_normalize, NormalizedFeatures,
};
use oreblast_logic::scoring::scoring_logic;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

const ORES: [&str; 6] = [GOLD, SILVER, COPPER, IRON, COAL, WASTE];

/// Random sparse deposit: roughly `fill` of a `w × h` window at a random
/// offset, with occasional duplicate coordinates.
pub fn synthetic_samples(rng: &mut StdRng, w: i64, h: i64, fill: f64) -> Vec<SampleRecord> {
    let ox = rng.gen_range(-500..500);
    let oy = rng.gen_range(-500..500);
    let mut samples = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if rng.gen_bool(fill) {
                samples.push(SampleRecord {
                    x: ox + x,
                    y: oy + y,
                    ore_type: ORES[rng.gen_range(0..ORES.len())].to_string(),
                    density: rng.gen_range(1.0..12.0),
                    hardness: rng.gen_range(0.0..1.0),
                    fragmentation_index: rng.gen_range(0.0..1.0),
                });
            }
        }
    }
    if samples.is_empty() {
        samples.push(SampleRecord {
            x: ox,
            y: oy,
            ore_type: GOLD.to_string(),
            density: 5.0,
            hardness: 0.5,
            fragmentation_index: 0.5,
        });
    }
    if rng.gen_bool(0.3) {
        let dup = samples[rng.gen_range(0..samples.len())].clone();
        samples.push(SampleRecord {
            ore_type: IRON.to_string(),
            ..dup
        });
    }
    samples
}

fn random_blasts(rng: &mut StdRng, model: &GridModel, count: usize) -> Vec<Blast> {
    let d = model.dimensions;
    (0..count)
        .map(|_| Blast {
            x: rng.gen_range(-2..d.width as i64 + 2),
            y: rng.gen_range(-2..d.height as i64 + 2),
            radius: rng.gen_range(0.0..4.0),
        })
        .collect()
}

fn result(name: &str, failures: Vec<String>, trials: usize) -> TestResult {
    TestResult {
        name: name.into(),
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            format!("{} trials ok", trials)
        } else {
            format!("{} of {} trials failed, first: {}", failures.len(), trials, failures[0])
        },
    }
}

pub fn run_sweep(seed: u64, trials: usize) -> Vec<TestResult> {
    println!("--- Invariant sweep (seed {}, {} trials) ---", seed, trials);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut results = Vec::new();

    let mut placement = Vec::new();
    let mut coverage = Vec::new();
    let mut footprint = Vec::new();
    let mut union = Vec::new();
    let mut cycle = Vec::new();

    for trial in 0..trials {
        let w = rng.gen_range(1..16);
        let h = rng.gen_range(1..16);
        let fill = rng.gen_range(0.2..1.0);
        let samples = synthetic_samples(&mut rng, w, h, fill);
        let model = match GridModel::from_samples(samples) {
            Ok(m) => m,
            Err(e) => {
                placement.push(format!("trial {}: build failed: {}", trial, e));
                continue;
            }
        };
        let d = model.dimensions;

        // Last sample at each coordinate is the one in the grid.
        let mut seen = HashSet::new();
        for s in model.metadata.original_blocks.iter().rev() {
            if !seen.insert((s.x, s.y)) {
                continue;
            }
            let cell = model.grid[(s.y - d.min_y) as usize][(s.x - d.min_x) as usize].as_ref();
            if cell.map(|c| c.ore_type.as_str()) != Some(s.ore_type.as_str()) {
                placement.push(format!("trial {}: ({}, {}) misplaced", trial, s.x, s.y));
                break;
            }
        }

        // Colliding samples share a slot, so compare against distinct coordinates.
        if d.width * d.height < seen.len() || model.occupied_count() != seen.len() {
            coverage.push(format!(
                "trial {}: {}×{} grid for {} distinct samples",
                trial,
                d.width,
                d.height,
                seen.len()
            ));
        }

        let blast_count = rng.gen_range(1..5);
        let blasts = random_blasts(&mut rng, &model, blast_count);
        for b in &blasts {
            let cells = calculate_affected_cells(&model.grid, b);
            if let Some(c) = cells.iter().find(|c| c.distance > b.radius) {
                footprint.push(format!("trial {}: ({}, {}) beyond radius", trial, c.x, c.y));
            }
            let keys: HashSet<_> = cells.iter().map(|c| (c.x, c.y)).collect();
            if keys.len() != cells.len() {
                footprint.push(format!("trial {}: duplicate cell in single footprint", trial));
            }
        }

        let all = calculate_all_affected_cells(&model.grid, &blasts);
        let per_blast: usize = blasts
            .iter()
            .map(|b| calculate_affected_cells(&model.grid, b).len())
            .sum();
        let keys: HashSet<_> = all.iter().map(|c| (c.x, c.y)).collect();
        if keys.len() != all.len() || all.len() > per_blast {
            union.push(format!(
                "trial {}: union {} cells, {} distinct, {} summed",
                trial,
                all.len(),
                keys.len(),
                per_blast
            ));
        }

        match run_blast_cycle(&model, &blasts, &RecoveryConfig::default(), None) {
            Ok(outcome) => {
                let m = outcome.recovery.metrics;
                let bounded = outcome
                    .recovery
                    .annotated_cells
                    .iter()
                    .all(|c| (0.0..=1.0).contains(&c.recovery_score));
                let counted = m.recovered_count + m.diluted_count + m.lost_count;
                if !bounded || counted != m.total_affected {
                    cycle.push(format!("trial {}: inconsistent metrics {:?}", trial, m));
                }
            }
            Err(e) => cycle.push(format!("trial {}: {}", trial, e)),
        }
    }

    results.push(result("grid_round_trip_placement", placement, trials));
    results.push(result("grid_covers_samples", coverage, trials));
    results.push(result("footprint_within_radius", footprint, trials));
    results.push(result("union_deduplicated", union, trials));
    results.push(result("cycle_metrics_consistent", cycle, trials));

    results.extend(check_scoring_properties(&mut rng, trials));
    results
}

fn check_scoring_properties(rng: &mut StdRng, trials: usize) -> Vec<TestResult> {
    let mut results = Vec::new();
    let config = RecoveryConfig::default();

    let mut degenerate = Vec::new();
    let mut monotone = Vec::new();
    for trial in 0..trials {
        let v: f64 = rng.gen_range(-100.0..100.0);
        let m: f64 = rng.gen_range(-100.0..100.0);
        if safe_min_max_normalize(v, m, m) != 0.5 {
            degenerate.push(format!("trial {}: normalize({}, {}, {}) != 0.5", trial, v, m, m));
        }

        let base = NormalizedFeatures {
            dens_norm: rng.gen_range(0.0..=1.0),
            hard_norm: rng.gen_range(0.0..=1.0),
            frag_norm: 0.0,
            dist_norm: rng.gen_range(0.0..=1.0),
        };
        let force = rng.gen_range(0.0..=1.0);
        let mut prev = f64::INFINITY;
        for step in 0..=10 {
            let norm = NormalizedFeatures {
                frag_norm: step as f64 / 10.0,
                ..base
            };
            let s = compute_recovery_score_from_norms(&norm, force, &config.weights);
            if !(0.0..=1.0).contains(&s) || s > prev {
                monotone.push(format!("trial {}: score {} after {}", trial, s, prev));
                break;
            }
            prev = s;
        }
    }
    results.push(result("normalize_degenerate_neutral", degenerate, trials));
    results.push(result("score_monotone_in_fragmentation", monotone, trials));

    let zero = scoring_logic(0, 5, 5, 10.0);
    results.push(TestResult {
        name: "aggregate_zero_total".into(),
        passed: zero.final_score == 0 && zero.recovery_rate == 0.0 && zero.total_ores == 0,
        detail: format!("{:?}", zero),
    });

    let reference = scoring_logic(100, 60, 10, 10.0);
    results.push(TestResult {
        name: "aggregate_reference".into(),
        passed: reference.recovery_rate == 60.0
            && reference.dilution_rate == 10.0
            && reference.final_score == 500,
        detail: format!(
            "rate {} / {} → {}",
            reference.recovery_rate, reference.dilution_rate, reference.final_score
        ),
    });

    results
}

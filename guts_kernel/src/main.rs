/// GUTS kernel: scenario harness
///
/// Loads scenario fixtures (parameters, death policy, random source and a
/// daily exposure schedule), runs each one twice through an `Individual`,
/// and checks that both runs hash identically and, when the fixture pins
/// one, that the hash matches the recorded value.
///
/// Usage: guts_kernel [fixtures.json]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Deserialize;

use guts_kernel::domain::{DayOutcome, DeathPolicy, GutsParams};
use guts_kernel::engine::Individual;
use guts_kernel::exposure::DailyExposure;
use guts_kernel::hashing::canonical_hash_outcomes;
use guts_kernel::random::{stream_rng, FixedDraws, UniformSource};
use guts_kernel::GutsError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    name: String,
    params: GutsParams,
    #[serde(default)]
    policy: DeathPolicy,
    #[serde(default)]
    seed: u64,
    /// Fixed draw sequence; overrides the seeded generator when present.
    #[serde(default)]
    draws: Option<Vec<f64>>,
    exposures: Vec<DailyExposure>,
    #[serde(default)]
    expected_hash: Option<String>,
}

const FIXTURE_PATHS: [&str; 3] = [
    "scenarios.json",
    "tests/fixtures/scenarios.json",
    "guts_kernel/tests/fixtures/scenarios.json",
];

fn find_fixtures() -> Option<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Some(PathBuf::from(arg));
    }
    FIXTURE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn load(path: &Path) -> Result<Vec<Scenario>, String> {
    let data = fs::read_to_string(path).map_err(|e| format!("read {}: {}", path.display(), e))?;
    serde_json::from_str(&data).map_err(|e| format!("parse {}: {}", path.display(), e))
}

/// Run one scenario until the schedule ends or the individual dies.
fn run(scenario: &Scenario) -> Result<Vec<DayOutcome>, GutsError> {
    let mut rng: Box<dyn UniformSource> = match &scenario.draws {
        Some(draws) if !draws.is_empty() => Box::new(FixedDraws::new(draws.clone())),
        _ => Box::new(stream_rng(scenario.seed, 0)),
    };

    let mut individual = Individual::new(&scenario.params, scenario.policy, rng.as_mut())?;
    let mut outcomes = Vec::with_capacity(scenario.exposures.len());
    for exposure in &scenario.exposures {
        let outcome = individual.apply_day(exposure, &scenario.params, rng.as_mut())?;
        outcomes.push(outcome);
        if outcome.lethal {
            break;
        }
    }
    Ok(outcomes)
}

fn main() -> ExitCode {
    let Some(path) = find_fixtures() else {
        eprintln!("No scenario fixtures found. Pass a path or create tests/fixtures/scenarios.json.");
        return ExitCode::FAILURE;
    };
    let scenarios = match load(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Loaded {} scenarios from: {}", scenarios.len(), path.display());

    let mut passed = 0;
    for scenario in &scenarios {
        let (first, second) = match (run(scenario), run(scenario)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                println!("[FAIL] {}: {}", scenario.name, e);
                continue;
            }
        };

        let h1 = canonical_hash_outcomes(&first);
        let h2 = canonical_hash_outcomes(&second);
        let deterministic = h1 == h2;
        let pinned = scenario.expected_hash.as_deref().map_or(true, |h| h == h1);
        let died = first.last().map_or(false, |o| o.lethal);

        if deterministic && pinned {
            passed += 1;
            println!(
                "[PASS] {}: days={}, died={}, hash={}",
                scenario.name,
                first.len(),
                died,
                h1
            );
        } else {
            println!("[FAIL] {}:", scenario.name);
            if !deterministic {
                println!("  Determinism fail: run1={} run2={}", h1, h2);
            }
            if let Some(expected) = scenario.expected_hash.as_deref().filter(|_| !pinned) {
                println!("  Hash mismatch: got={} expected={}", h1, expected);
            }
        }
    }

    println!("\n===========================================");
    println!("Results: {}/{} passed", passed, scenarios.len());
    if passed == scenarios.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

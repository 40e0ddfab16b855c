//! Run one experiment variant from a config file and an exposure schedule.
//!
//! Usage: guts_runtime <config.json> <schedule.json> [base_dir] [run_id]
//!
//! Days already present in the run's log are skipped, so an interrupted
//! run resumes where it stopped. Set `RUST_LOG=debug` for per-death logs.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use guts_runtime::config::RunConfig;
use guts_runtime::drift::verify_determinism;
use guts_runtime::schedule::load_schedule;
use guts_runtime::session::Session;
use guts_runtime::RuntimeError;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn run(args: &[String]) -> Result<(), RuntimeError> {
    let config = RunConfig::from_file(&PathBuf::from(&args[1]))?;
    let schedule = load_schedule(&PathBuf::from(&args[2]))?;
    let base_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("runs"));
    let run_id = args.get(4).map(String::as_str).unwrap_or("default");

    let mut session = Session::open(&base_dir, run_id, config.clone())?;
    let resume_from = session.current_day();
    for day in schedule.iter().filter(|d| d.day > resume_from) {
        let summary = session.apply_day(day)?;
        println!(
            "day {:>4}  alive {:>6}  deaths {:>4}",
            summary.day,
            summary.alive,
            summary.deaths.len()
        );
    }

    let replayed = verify_determinism(&config, &session.recorded_days()?)?;
    if replayed != session.current_hash() {
        return Err(RuntimeError::Determinism {
            run1: session.current_hash(),
            run2: replayed,
        });
    }
    info!(
        run_id = session.run_id(),
        day = session.current_day(),
        hash = %replayed,
        "run complete"
    );
    println!("hash {}", replayed);
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: guts_runtime <config.json> <schedule.json> [base_dir] [run_id]");
        return ExitCode::from(2);
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

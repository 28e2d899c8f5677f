// Daywatch CLI - Command-line driver
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Daywatch CLI
//!
//! Drives the full pipeline: schema validation, baseline generation and
//! statistics, then repeated interactive scoring runs.
//!
//! ## Usage
//!
//! ```bash
//! # Simulate 30 days of baseline activity, then score new stat files
//! daywatch Events.txt Stats.txt 30
//!
//! # Reproducible run with JSON mirrors in a separate directory
//! daywatch Events.txt Stats.txt 30 --seed 42 --out-dir results/
//! ```

use clap::Parser;
use daywatch::{
    generate_activity, read_log, score_log, write_alerts, write_day_records, write_log,
    write_summaries, AnomalyVerdict, BaselineStats, ConfigError, EventTable, GeneratorConfig,
    LogError,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Daywatch activity simulator and anomaly scorer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Event definition file (name:kind:min:max:weight records)
    events: PathBuf,

    /// Statistical parameter file (name:mean:stddev records)
    stats: PathBuf,

    /// Number of days to simulate
    days: usize,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Baseline day-block log destination
    #[arg(long, default_value = "baseline_logs.txt")]
    baseline_log: PathBuf,

    /// Directory for the JSON mirrors (logs.json, analysis_results.json, alerts.json)
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Daywatch v{}", daywatch::VERSION);

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Startup checks, before any engine work.
fn check_config(args: &Args) -> Result<(), ConfigError> {
    for path in [&args.events, &args.stats] {
        if !path.exists() {
            return Err(ConfigError::MissingFile { path: path.clone() });
        }
    }
    if args.days == 0 {
        return Err(ConfigError::InvalidDayCount { days: args.days });
    }
    Ok(())
}

fn run(args: &Args) -> daywatch::Result<()> {
    check_config(args)?;

    info!(
        "Checking for inconsistencies between {} and {}",
        args.events.display(),
        args.stats.display()
    );
    let table = EventTable::load(&args.events, &args.stats)?;
    info!("No inconsistencies found, {} events validated", table.len());

    // Activity engine: baseline run
    let mut config = GeneratorConfig::new(args.days);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    info!("Generating data for {} days of events", args.days);
    let series = generate_activity(&table, &config)?;

    let records = write_log(&args.baseline_log, args.days, &table, &series)?;
    write_day_records(args.out_dir.join("logs.json"), &records)?;

    // Analysis engine: baseline statistics from the persisted log
    let log = read_log(&args.baseline_log)?;
    let baseline = BaselineStats::from_log(&table, &log)?;
    write_summaries(args.out_dir.join("analysis_results.json"), &baseline.summaries())?;
    info!("Baseline statistics locked from {} days", log.len());

    // Alert engine: repeated scoring runs until the operator declines
    let stdin = io::stdin();
    loop {
        let Some(stats_file) = prompt(&stdin, "Enter filename for new Stats file: ")? else {
            break;
        };
        let stats_path = PathBuf::from(stats_file.trim());
        if !stats_path.exists() {
            println!("File does not exist. Please try again.");
            continue;
        }

        let Some(days_raw) = prompt(&stdin, "Enter the number of days: ")? else {
            break;
        };
        let days: usize = match days_raw.trim().parse() {
            Ok(d) if d > 0 => d,
            _ => {
                println!("Days must be a positive integer.");
                continue;
            }
        };

        match scoring_run(args, &table, &baseline, &stats_path, days) {
            Ok(verdicts) => report(&verdicts),
            Err(e) => error!("Scoring run failed: {}", e),
        }

        let Some(again) = prompt(&stdin, "Continue with another Stats file? (y/n): ")? else {
            break;
        };
        if !again.trim().eq_ignore_ascii_case("y") {
            break;
        }
    }

    println!("Exiting alert engine.");
    Ok(())
}

/// One scoring cycle: generate a fresh log from the new parameters and
/// score it against the session baseline and the original weights.
fn scoring_run(
    args: &Args,
    table: &EventTable,
    baseline: &BaselineStats,
    stats_path: &Path,
    days: usize,
) -> daywatch::Result<Vec<AnomalyVerdict>> {
    // Revalidate the event file against the new parameter file.
    let scoring_table = EventTable::load(&args.events, stats_path)?;

    let mut config = GeneratorConfig::new(days);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    info!("Generating data for {} days of events", days);
    let series = generate_activity(&scoring_table, &config)?;

    let log_path = args.out_dir.join("anomaly_logs.txt");
    let records = write_log(&log_path, days, &scoring_table, &series)?;
    write_day_records(args.out_dir.join("logs.json"), &records)?;

    let log = read_log(&log_path)?;
    let verdicts = score_log(table, baseline, &log)?;
    write_alerts(args.out_dir.join("alerts.json"), &verdicts)?;
    Ok(verdicts)
}

/// Print per-day verdicts and the flagged-day summary.
fn report(verdicts: &[AnomalyVerdict]) {
    let Some(first) = verdicts.first() else {
        println!("\nNo days scored.");
        return;
    };

    println!("\nThreshold: {}", first.threshold);
    let mut flagged = Vec::new();
    for (i, v) in verdicts.iter().enumerate() {
        if v.status.is_flagged() {
            println!("Day {} anomaly score = {} --- FLAGGED", i + 1, v.anomaly_score);
            flagged.push(i + 1);
        } else {
            println!("Day {} anomaly score = {}", i + 1, v.anomaly_score);
        }
    }

    if flagged.is_empty() {
        println!("\nNo anomalies detected.");
    } else {
        println!("\nALERT! Anomalies detected:");
        for day in &flagged {
            println!("Day {} has been flagged!", day);
        }
    }
}

/// Prompt the operator; `None` on end of input.
fn prompt(stdin: &io::Stdin, message: &str) -> Result<Option<String>, LogError> {
    print!("{}", message);
    io::stdout().flush().map_err(LogError::from)?;

    let mut line = String::new();
    let read = stdin.lock().read_line(&mut line).map_err(LogError::from)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

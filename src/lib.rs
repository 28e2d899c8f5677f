// Daywatch - Activity simulation and anomaly scoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Daywatch
//!
//! Per-day activity simulation and weighted z-score anomaly scoring for
//! event logs — a lightweight intrusion-detection simulator for teaching
//! and for prototyping alerting logic.
//!
//! ## Pipeline
//!
//! 1. [`schema`]: load event definitions and statistical parameters,
//!    cross-validate them into an [`EventTable`]
//! 2. [`generator`]: draw one day-series per event by bounded rejection
//!    sampling against the target mean and standard deviation
//! 3. [`daylog`]: persist the series as a day-block log (and its JSON
//!    mirror), then replay it
//! 4. [`baseline`]: learn per-event mean and population stddev from the
//!    replayed baseline log
//! 5. [`anomaly`]: score later logs day by day against the baseline and
//!    flag days above the fixed threshold
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daywatch::{
//!     generate_activity, read_log, score_log, write_log,
//!     BaselineStats, EventTable, GeneratorConfig,
//! };
//!
//! let table = EventTable::load("Events.txt", "Stats.txt").unwrap();
//! let config = GeneratorConfig::new(10).with_seed(42);
//!
//! // Baseline run
//! let series = generate_activity(&table, &config).unwrap();
//! write_log("baseline_logs.txt", 10, &table, &series).unwrap();
//! let baseline = BaselineStats::from_log(&table, &read_log("baseline_logs.txt").unwrap()).unwrap();
//!
//! // Scoring run
//! let series = generate_activity(&table, &config).unwrap();
//! write_log("anomaly_logs.txt", 10, &table, &series).unwrap();
//! let verdicts = score_log(&table, &baseline, &read_log("anomaly_logs.txt").unwrap()).unwrap();
//! for v in &verdicts {
//!     println!("{} score {} -> {}", v.date, v.anomaly_score, v.status.as_str());
//! }
//! ```

// Modules
pub mod anomaly;
pub mod baseline;
pub mod daylog;
pub mod error;
pub mod generator;
pub mod schema;

// Re-exports for convenient access
pub use anomaly::{score_log, threshold, write_alerts, AnomalyVerdict, VerdictStatus};
pub use baseline::{write_summaries, BaselineStats, EventBaseline, EventSummary};
pub use daylog::{
    day_label, epoch, read_log, write_day_records, write_log, ActivityLog, DayBlock, DayRecord,
    LogEntry,
};
pub use error::{ConfigError, DaywatchError, GenerateError, LogError, Result, SchemaError};
pub use generator::{
    generate_activity, generate_series, DaySeries, GeneratorConfig, DEFAULT_MAX_ATTEMPTS,
};
pub use schema::{EventDefinition, EventEntry, EventKind, EventTable, StatParameter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

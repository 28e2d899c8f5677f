// Daywatch - Activity simulation and anomaly scoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Integration tests driving the full pipeline: schema load, generation,
//! day-block serialization, baseline statistics, and anomaly scoring.

use approx::assert_relative_eq;
use daywatch::{
    generate_activity, read_log, score_log, threshold, write_log, BaselineStats, EventTable,
    GeneratorConfig, VerdictStatus,
};
use std::fs;
use tempfile::tempdir;

/// Write the two source files into a temp dir and load the table.
fn load_table(dir: &std::path::Path, events: &str, stats: &str) -> EventTable {
    let events_path = dir.join("Events.txt");
    let stats_path = dir.join("Stats.txt");
    fs::write(&events_path, events).unwrap();
    fs::write(&stats_path, stats).unwrap();
    EventTable::load(&events_path, &stats_path).unwrap()
}

#[test]
fn test_full_pipeline() {
    let dir = tempdir().unwrap();
    let table = load_table(
        dir.path(),
        "2\nLogins:D:0:100:3\nTraffic:C:0.0:1000.0:2\n",
        "2\nLogins:50:5\nTraffic:500.0:25.0\n",
    );

    let days = 12;
    let config = GeneratorConfig::new(days).with_seed(42);
    let series = generate_activity(&table, &config).unwrap();

    let log_path = dir.path().join("baseline_logs.txt");
    let records = write_log(&log_path, days, &table, &series).unwrap();
    assert_eq!(records.len(), days);

    let log = read_log(&log_path).unwrap();
    assert_eq!(log.len(), days);

    let baseline = BaselineStats::from_log(&table, &log).unwrap();
    // Accepted batches land within ±5% of the targets for 10+ days.
    let logins = baseline.for_event("Logins").unwrap();
    assert!((47.5..=52.5).contains(&logins.mean));
    let traffic = baseline.for_event("Traffic").unwrap();
    assert!((475.0..=525.0).contains(&traffic.mean));

    // Score a fresh log of a different length against the same baseline.
    let score_days = 7;
    let score_config = GeneratorConfig::new(score_days).with_seed(7);
    let score_series = generate_activity(&table, &score_config).unwrap();
    let score_path = dir.path().join("anomaly_logs.txt");
    write_log(&score_path, score_days, &table, &score_series).unwrap();

    let verdicts = score_log(&table, &baseline, &read_log(&score_path).unwrap()).unwrap();
    assert_eq!(verdicts.len(), score_days);
    assert_eq!(threshold(&table), 10.0);
    for v in &verdicts {
        assert_eq!(v.threshold, 10.0);
        let flagged = v.anomaly_score > v.threshold;
        assert_eq!(v.status.is_flagged(), flagged);
    }
}

#[test]
fn test_roundtrip_law() {
    // Baseline stats derived from a serialized log must reproduce the
    // statistics of the in-memory series that produced it.
    let dir = tempdir().unwrap();
    let table = load_table(
        dir.path(),
        "1\nLogins:D:0:100:3\n",
        "1\nLogins:50:5\n",
    );

    let days = 15;
    let config = GeneratorConfig::new(days).with_seed(99);
    let series = generate_activity(&table, &config).unwrap();

    let log_path = dir.path().join("log.txt");
    write_log(&log_path, days, &table, &series).unwrap();
    let baseline =
        BaselineStats::from_log(&table, &read_log(&log_path).unwrap()).unwrap();

    let values = &series[0].values;
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let logins = baseline.for_event("Logins").unwrap();
    assert_relative_eq!(logins.mean, mean, epsilon = 1e-9);
    assert_relative_eq!(logins.stddev, variance.sqrt(), epsilon = 1e-9);
}

#[test]
fn test_baseline_idempotent_across_replays() {
    let dir = tempdir().unwrap();
    let table = load_table(
        dir.path(),
        "1\nLogins:D:0:100:3\n",
        "1\nLogins:50:5\n",
    );

    let config = GeneratorConfig::new(10).with_seed(5);
    let series = generate_activity(&table, &config).unwrap();
    let log_path = dir.path().join("log.txt");
    write_log(&log_path, 10, &table, &series).unwrap();

    let a = BaselineStats::from_log(&table, &read_log(&log_path).unwrap()).unwrap();
    let b = BaselineStats::from_log(&table, &read_log(&log_path).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_constant_logins_scenario() {
    // Single discrete event, zero spread: every day draws the mean, the
    // log holds one Logins line per block, and self-scoring reports 0.0
    // with status OK under threshold 2 * 3 = 6.
    let dir = tempdir().unwrap();
    let table = load_table(
        dir.path(),
        "1\nLogins:D:0:100:3\n",
        "1\nLogins:50:0\n",
    );

    let days = 10;
    let config = GeneratorConfig::new(days).with_seed(1);
    let series = generate_activity(&table, &config).unwrap();
    assert_eq!(series[0].values, vec![50.0; days]);

    let log_path = dir.path().join("log.txt");
    write_log(&log_path, days, &table, &series).unwrap();

    let content = fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.matches("Logins:D:50:").count(), days);

    let log = read_log(&log_path).unwrap();
    let baseline = BaselineStats::from_log(&table, &log).unwrap();
    let verdicts = score_log(&table, &baseline, &log).unwrap();

    assert_eq!(threshold(&table), 6.0);
    assert_eq!(verdicts.len(), days);
    for v in &verdicts {
        assert_eq!(v.anomaly_score, 0.0);
        assert_eq!(v.status, VerdictStatus::Ok);
    }
}

#[test]
fn test_generated_scenario_bounds() {
    // Single discrete event over 10 days: integer values, mean in
    // [47.5, 52.5], sample stddev in [4.75, 5.25].
    let dir = tempdir().unwrap();
    let table = load_table(
        dir.path(),
        "1\nLogins:D:0:100:3\n",
        "1\nLogins:50:5\n",
    );

    let config = GeneratorConfig::new(10).with_seed(2024);
    let series = generate_activity(&table, &config).unwrap();
    let values = &series[0].values;

    assert_eq!(values.len(), 10);
    assert!(values.iter().all(|v| *v == v.round()));

    let mean = values.iter().sum::<f64>() / 10.0;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 9.0;
    assert!((47.5..=52.5).contains(&mean));
    assert!((4.75..=5.25).contains(&variance.sqrt()));
}

#[test]
fn test_schema_rejection_is_total() {
    // A single altered name must reject the whole table.
    let dir = tempdir().unwrap();
    let events_path = dir.path().join("Events.txt");
    let stats_path = dir.path().join("Stats.txt");
    fs::write(&events_path, "2\nLogins:D:0:100:3\nTraffic:C:0.0:1000.0:2\n").unwrap();
    fs::write(&stats_path, "2\nLogins:50:5\nBandwidth:500:25\n").unwrap();

    assert!(EventTable::load(&events_path, &stats_path).is_err());
}

#[test]
fn test_scoring_shifted_stats_flags_days() {
    // Baseline at mean 50, then a scoring run generated far away from it:
    // every day deviates by roughly 10 baseline stddevs, well past the
    // threshold of 6.
    let dir = tempdir().unwrap();
    let table = load_table(
        dir.path(),
        "1\nLogins:D:0:200:3\n",
        "1\nLogins:50:5\n",
    );

    let days = 10;
    let config = GeneratorConfig::new(days).with_seed(11);
    let series = generate_activity(&table, &config).unwrap();
    let base_path = dir.path().join("baseline_logs.txt");
    write_log(&base_path, days, &table, &series).unwrap();
    let baseline =
        BaselineStats::from_log(&table, &read_log(&base_path).unwrap()).unwrap();

    let shifted = load_table(
        dir.path(),
        "1\nLogins:D:0:200:3\n",
        "1\nLogins:150:5\n",
    );
    let shifted_series = generate_activity(&shifted, &config).unwrap();
    let shifted_path = dir.path().join("anomaly_logs.txt");
    write_log(&shifted_path, days, &shifted, &shifted_series).unwrap();

    let verdicts =
        score_log(&table, &baseline, &read_log(&shifted_path).unwrap()).unwrap();
    assert!(verdicts.iter().all(|v| v.status.is_flagged()));
}

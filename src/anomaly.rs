// Daywatch - Anomaly scoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Weighted z-score anomaly scoring against a locked baseline.
//!
//! Each day's score is the sum over events of
//! `weight × |value − mean| / stddev`, compared against the fixed
//! threshold `2 × Σ weights`. A day whose score strictly exceeds the
//! threshold is flagged.

use crate::baseline::{round2, BaselineStats};
use crate::daylog::{day_label, ActivityLog};
use crate::error::LogError;
use crate::schema::EventTable;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Per-day verdict status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    /// Score within threshold.
    Ok,
    /// Score strictly above threshold, or a zero-variance break.
    Flagged,
}

impl VerdictStatus {
    /// Status tag as reported in alerts.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Ok => "OK",
            VerdictStatus::Flagged => "FLAGGED",
        }
    }

    /// True for flagged days.
    pub fn is_flagged(&self) -> bool {
        matches!(self, VerdictStatus::Flagged)
    }
}

/// Verdict for one day of a scored log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    /// Calendar label from the fixed epoch and this log's day index.
    pub date: String,
    /// Weighted absolute z-score, rounded to 2 decimals.
    pub anomaly_score: f64,
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// OK or FLAGGED.
    pub status: VerdictStatus,
}

/// Fixed alerting threshold: twice the sum of all event weights.
pub fn threshold(table: &EventTable) -> f64 {
    2.0 * table.total_weight() as f64
}

/// Score a replayed log against the baseline, one verdict per day.
///
/// Log records resolve to table positions by the name each record
/// carries. An event with zero baseline stddev contributes 0 when the
/// observed value equals the baseline mean; any deviation from a
/// zero-variance baseline is maximal — the day is flagged regardless of
/// the finite score reported.
pub fn score_log(
    table: &EventTable,
    baseline: &BaselineStats,
    log: &ActivityLog,
) -> Result<Vec<AnomalyVerdict>, LogError> {
    let threshold = threshold(table);
    let mut verdicts = Vec::with_capacity(log.len());

    for block in &log.days {
        let mut score = 0.0;
        let mut zero_variance_break = false;

        for record in &block.entries {
            let entry = table
                .entries()
                .iter()
                .find(|e| e.definition.name == record.name)
                .ok_or_else(|| LogError::UnknownEvent {
                    day: block.day,
                    name: record.name.clone(),
                })?;
            let stats = baseline
                .get(entry.index)
                .ok_or_else(|| LogError::UnknownEvent {
                    day: block.day,
                    name: record.name.clone(),
                })?;

            let weight = entry.definition.weight as f64;
            let deviation = (record.value - stats.mean).abs();
            if stats.stddev > 0.0 {
                score += weight * deviation / stats.stddev;
            } else if deviation > 0.0 {
                zero_variance_break = true;
            }
        }

        let score = round2(score);
        let status = if zero_variance_break || score > threshold {
            VerdictStatus::Flagged
        } else {
            VerdictStatus::Ok
        };
        debug!(
            "day {} score {} threshold {} -> {}",
            block.day,
            score,
            threshold,
            status.as_str()
        );

        verdicts.push(AnomalyVerdict {
            date: day_label(block.day.saturating_sub(1)),
            anomaly_score: score,
            threshold,
            status,
        });
    }

    Ok(verdicts)
}

/// Write the per-day alerts as a JSON sink.
pub fn write_alerts(path: impl AsRef<Path>, verdicts: &[AnomalyVerdict]) -> Result<(), LogError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, verdicts)?;
    Ok(())
}

// Daywatch - Baseline statistics
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Baseline statistics over a replayed activity log.
//!
//! Replays a day-block log and computes, per event, the arithmetic mean
//! and the population standard deviation (divide by N) of all day-values.
//! The day count comes from the log itself, never from a caller-supplied
//! count, so a log shorter or longer than any particular generation run
//! is fine.

use crate::daylog::ActivityLog;
use crate::error::LogError;
use crate::schema::EventTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Running accumulator for one event's values.
#[derive(Debug, Clone, Default)]
struct FieldAccumulator {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

impl FieldAccumulator {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// Population standard deviation (divide by N).
    fn stddev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let mean = self.mean();
        let variance = (self.sum_sq - n * mean * mean) / n;
        variance.max(0.0).sqrt()
    }
}

/// Learned statistics for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBaseline {
    /// Event name.
    pub name: String,
    /// Number of day-values observed.
    pub count: u64,
    /// Sum of all observed values.
    pub total: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
}

/// Per-event baseline statistics, aligned to table order.
///
/// Computed once from the baseline log and reused across all scoring runs
/// in the same session; deterministic given the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    entries: Vec<EventBaseline>,
}

impl BaselineStats {
    /// Compute baseline statistics from a replayed log.
    ///
    /// Log records resolve to table positions by the event name each
    /// record carries; a record naming an event absent from the table
    /// is an error.
    pub fn from_log(table: &EventTable, log: &ActivityLog) -> Result<Self, LogError> {
        let mut accumulators: Vec<FieldAccumulator> =
            (0..table.len()).map(|_| FieldAccumulator::default()).collect();

        for block in &log.days {
            for record in &block.entries {
                let index =
                    table
                        .index_of(&record.name)
                        .ok_or_else(|| LogError::UnknownEvent {
                            day: block.day,
                            name: record.name.clone(),
                        })?;
                accumulators[index].add(record.value);
            }
        }

        let entries = table
            .entries()
            .iter()
            .zip(&accumulators)
            .map(|(entry, acc)| EventBaseline {
                name: entry.definition.name.clone(),
                count: acc.count,
                total: acc.sum,
                mean: acc.mean(),
                stddev: acc.stddev(),
            })
            .collect();

        Ok(Self { entries })
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Baselines in table order.
    pub fn entries(&self) -> &[EventBaseline] {
        &self.entries
    }

    /// Baseline at a table position.
    pub fn get(&self, index: usize) -> Option<&EventBaseline> {
        self.entries.get(index)
    }

    /// Baseline for an event name.
    pub fn for_event(&self, name: &str) -> Option<&EventBaseline> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Per-event summary records for the external sink, keyed by
    /// lowercased event name with values rounded to 2 decimals.
    pub fn summaries(&self) -> BTreeMap<String, EventSummary> {
        self.entries
            .iter()
            .map(|e| {
                (
                    e.name.to_lowercase(),
                    EventSummary {
                        total: round2(e.total),
                        mean: round2(e.mean),
                        stddev: round2(e.stddev),
                    },
                )
            })
            .collect()
    }
}

/// Summary of one event for the external sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Sum of all day-values, rounded to 2 decimals.
    pub total: f64,
    /// Mean, rounded to 2 decimals.
    pub mean: f64,
    /// Population standard deviation, rounded to 2 decimals.
    pub stddev: f64,
}

/// Write the per-event summaries as a JSON sink.
pub fn write_summaries(
    path: impl AsRef<Path>,
    summaries: &BTreeMap<String, EventSummary>,
) -> Result<(), LogError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, summaries)?;
    Ok(())
}

/// Round to 2 decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

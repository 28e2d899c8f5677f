// Daywatch - Event schema loading and validation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Event schema loading and validation.
//!
//! Parses the two colon-delimited source files (event definitions and
//! statistical parameters), cross-checks them, and yields the canonical
//! [`EventTable`] the engines run against.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Value domain of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Real-valued, recorded at 2-decimal precision (tag `C`).
    #[serde(rename = "C")]
    Continuous,
    /// Integer-valued (tag `D`).
    #[serde(rename = "D")]
    Discrete,
}

impl EventKind {
    /// One-letter tag used in source files and day-block logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Continuous => "C",
            EventKind::Discrete => "D",
        }
    }

    /// Parse a tag from a source file.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "C" => Some(EventKind::Continuous),
            "D" => Some(EventKind::Discrete),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared event: name, value domain, bounds, and alerting weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Event name (unique key).
    pub name: String,
    /// Value domain.
    pub kind: EventKind,
    /// Lower bound (advisory for generated samples).
    pub minimum: f64,
    /// Upper bound (advisory for generated samples).
    pub maximum: f64,
    /// Non-negative alerting weight.
    pub weight: u32,
}

/// Target distribution parameters for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatParameter {
    /// Event name (must match the definition at the same position).
    pub name: String,
    /// Target mean.
    pub mean: f64,
    /// Target standard deviation (non-negative).
    pub stddev: f64,
}

/// One validated table entry: the definition and its parameters,
/// carrying its own index so downstream stages never depend on
/// array position alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    /// Position in the table (stable for the whole run).
    pub index: usize,
    /// Event definition.
    pub definition: EventDefinition,
    /// Statistical parameters.
    pub params: StatParameter,
}

/// Ordered, validated set of (definition, parameters) pairs.
///
/// Built once per run from the two source files and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTable {
    entries: Vec<EventEntry>,
}

impl EventTable {
    /// Load and validate the table from the two source files.
    pub fn load(
        events_path: impl AsRef<Path>,
        stats_path: impl AsRef<Path>,
    ) -> Result<Self, SchemaError> {
        let events_raw = fs::read_to_string(events_path)?;
        let stats_raw = fs::read_to_string(stats_path)?;
        let event_lines: Vec<&str> = events_raw.lines().collect();
        let stat_lines: Vec<&str> = stats_raw.lines().collect();
        Self::from_lines(&event_lines, &stat_lines)
    }

    /// Build the table from the raw lines of the two source files.
    ///
    /// Line 1 of each file is the record count; event records are
    /// `name:kind:min:max:weight`, stat records `name:mean:stddev`,
    /// positionally aligned. Any validation failure returns an error
    /// naming the offending line; no partial table is produced.
    pub fn from_lines(event_lines: &[&str], stat_lines: &[&str]) -> Result<Self, SchemaError> {
        let event_count = parse_count(event_lines, "events")?;
        let stat_count = parse_count(stat_lines, "stats")?;

        if event_count != stat_count {
            return Err(SchemaError::CountMismatch {
                events: event_count,
                stats: stat_count,
            });
        }

        // Positional name alignment before any field validation.
        for i in 0..event_count {
            let event_name = field(event_lines[i + 1], 0);
            let stat_name = field(stat_lines[i + 1], 0);
            if event_name != stat_name {
                return Err(SchemaError::NameMismatch {
                    line: i + 2,
                    event: event_name.to_string(),
                    stat: stat_name.to_string(),
                });
            }
        }

        let mut entries = Vec::with_capacity(event_count);
        for i in 0..event_count {
            let line_no = i + 2;
            let definition = parse_event_record(event_lines[i + 1], line_no)?;
            let params = parse_stat_record(stat_lines[i + 1], line_no)?;
            debug!(
                "Event: {}, Type: {}, Min: {}, Max: {}, Weight: {}",
                definition.name,
                definition.kind,
                definition.minimum,
                definition.maximum,
                definition.weight
            );
            debug!(
                "Stats: {}, Mean: {}, StdDev: {}",
                params.name, params.mean, params.stddev
            );
            entries.push(EventEntry {
                index: i,
                definition,
                params,
            });
        }

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

    /// All entries in table order.
    pub fn entries(&self) -> &[EventEntry] {
        &self.entries
    }

    /// Entry at a position.
    pub fn get(&self, index: usize) -> Option<&EventEntry> {
        self.entries.get(index)
    }

    /// Resolve an event name to its table position.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.definition.name == name)
    }

    /// Alerting weights in table order.
    pub fn weights(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.definition.weight).collect()
    }

    /// Sum of all alerting weights.
    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|e| e.definition.weight).sum()
    }
}

/// Parse the leading count line and check the file holds that many records.
fn parse_count(lines: &[&str], file: &'static str) -> Result<usize, SchemaError> {
    let first = lines.first().map(|l| l.trim()).unwrap_or("");
    let count: usize = first.parse().map_err(|_| SchemaError::InvalidCount {
        file: file.to_string(),
        content: first.to_string(),
    })?;

    let found = lines.len().saturating_sub(1);
    if found < count {
        return Err(SchemaError::TruncatedFile {
            file: file.to_string(),
            declared: count,
            found,
        });
    }
    Ok(count)
}

/// Colon-delimited field accessor, empty when absent.
fn field(line: &str, index: usize) -> &str {
    line.split(':').nth(index).unwrap_or("").trim()
}

fn parse_event_record(line: &str, line_no: usize) -> Result<EventDefinition, SchemaError> {
    let fields: Vec<&str> = line.split(':').map(str::trim).collect();
    if fields.len() < 5 {
        return Err(SchemaError::TooFewFields {
            line: line_no,
            expected: 5,
            found: fields.len(),
        });
    }

    let name = fields[0];
    if name.is_empty() {
        return Err(SchemaError::EmptyField {
            line: line_no,
            field: "name",
        });
    }

    let kind = EventKind::from_tag(fields[1]).ok_or_else(|| SchemaError::InvalidKind {
        line: line_no,
        value: fields[1].to_string(),
    })?;

    let (min_raw, max_raw, weight_raw) = (fields[2], fields[3], fields[4]);
    for (raw, label) in [
        (min_raw, "minimum"),
        (max_raw, "maximum"),
        (weight_raw, "weight"),
    ] {
        if raw.is_empty() {
            return Err(SchemaError::EmptyField {
                line: line_no,
                field: label,
            });
        }
    }

    // Weights are integers, no fractional separator allowed.
    if weight_raw.contains('.') {
        return Err(SchemaError::FractionalWeight {
            line: line_no,
            value: weight_raw.to_string(),
        });
    }

    // Discrete bounds must be integers too.
    if kind == EventKind::Discrete {
        for raw in [min_raw, max_raw] {
            if raw.contains('.') {
                return Err(SchemaError::FractionalBound {
                    line: line_no,
                    value: raw.to_string(),
                });
            }
        }
    }

    let minimum = parse_f64(min_raw, "minimum", line_no)?;
    let maximum = parse_f64(max_raw, "maximum", line_no)?;
    let weight: u32 = weight_raw.parse().map_err(|_| SchemaError::InvalidNumber {
        line: line_no,
        field: "weight",
        value: weight_raw.to_string(),
    })?;

    if minimum > maximum {
        return Err(SchemaError::InvalidRange {
            line: line_no,
            minimum,
            maximum,
        });
    }

    Ok(EventDefinition {
        name: name.to_string(),
        kind,
        minimum,
        maximum,
        weight,
    })
}

fn parse_stat_record(line: &str, line_no: usize) -> Result<StatParameter, SchemaError> {
    let fields: Vec<&str> = line.split(':').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(SchemaError::TooFewFields {
            line: line_no,
            expected: 3,
            found: fields.len(),
        });
    }

    let mean = parse_f64(fields[1], "mean", line_no)?;
    let stddev = parse_f64(fields[2], "stddev", line_no)?;
    if stddev < 0.0 {
        return Err(SchemaError::NegativeStdDev {
            line: line_no,
            value: stddev,
        });
    }

    Ok(StatParameter {
        name: fields[0].to_string(),
        mean,
        stddev,
    })
}

fn parse_f64(raw: &str, label: &'static str, line_no: usize) -> Result<f64, SchemaError> {
    raw.parse().map_err(|_| SchemaError::InvalidNumber {
        line: line_no,
        field: label,
        value: raw.to_string(),
    })
}

// Daywatch - Day-block activity log
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Day-block activity log format.
//!
//! The persisted interchange contract between the generator and both
//! downstream engines:
//!
//! ```text
//! Day <k>
//! <event_count>
//! <name>:<kind>:<value>:
//! ...
//! <blank line>
//! ```
//!
//! repeated per day in increasing day order starting at 1. A missing or
//! blank leading line ends the log. Alongside the text format the writer
//! emits an equivalent structured day-record set for external sinks.

use crate::error::LogError;
use crate::generator::DaySeries;
use crate::schema::{EventKind, EventTable};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use tracing::info;

/// Fixed epoch for cosmetic day labels.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 24).unwrap()
}

/// Calendar label for a zero-based day offset from the epoch.
pub fn day_label(offset: usize) -> String {
    (epoch() + Duration::days(offset as i64))
        .format("%Y-%m-%d")
        .to_string()
}

/// One event record inside a day block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Event name as written in the log.
    pub name: String,
    /// Value domain tag.
    pub kind: EventKind,
    /// Recorded value.
    pub value: f64,
}

/// One day's worth of event records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBlock {
    /// 1-based day index from the `Day <k>` header.
    pub day: usize,
    /// Event records in written order.
    pub entries: Vec<LogEntry>,
}

/// A replayed activity log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    /// Day blocks in log order.
    pub days: Vec<DayBlock>,
}

impl ActivityLog {
    /// Number of day blocks.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Structured mirror of one day block for external sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Calendar label derived from the epoch.
    pub date: String,
    /// Lowercased event name to recorded value.
    pub events: BTreeMap<String, f64>,
}

/// Serialize the generated series as a day-block log, overwriting `path`.
///
/// Series are resolved by event name against the table, never by slice
/// position. Returns the structured day-record mirror of what was written.
/// The file is fully written and flushed before this returns, so the next
/// stage can reopen it for read.
pub fn write_log(
    path: impl AsRef<Path>,
    days: usize,
    table: &EventTable,
    series: &[DaySeries],
) -> Result<Vec<DayRecord>, LogError> {
    for entry in table.entries() {
        let name = &entry.definition.name;
        let s = series
            .iter()
            .find(|s| &s.event == name)
            .ok_or_else(|| LogError::MissingSeries { event: name.clone() })?;
        if s.len() < days {
            return Err(LogError::ShortSeries {
                event: name.clone(),
                expected: days,
                actual: s.len(),
            });
        }
    }

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    let mut records = Vec::with_capacity(days);

    for day in 0..days {
        writeln!(writer, "Day {}", day + 1)?;
        writeln!(writer, "{}", table.len())?;

        let mut events = BTreeMap::new();
        for entry in table.entries() {
            let name = &entry.definition.name;
            let kind = entry.definition.kind;
            // Checked above, lookup cannot fail.
            let value = series
                .iter()
                .find(|s| &s.event == name)
                .map(|s| s.values[day])
                .unwrap_or_default();

            writeln!(writer, "{}:{}:{}:", name, kind.as_str(), format_value(value, kind))?;
            events.insert(name.to_lowercase(), value);
        }

        writeln!(writer)?;
        records.push(DayRecord {
            date: day_label(day),
            events,
        });
    }

    writer.flush()?;
    info!(
        "{} days of activity written to {}",
        days,
        path.as_ref().display()
    );
    Ok(records)
}

/// Replay a day-block log from storage.
///
/// A missing or blank line where a `Day <k>` header is expected ends the
/// log; anything malformed inside a block is an error with its line number.
pub fn read_log(path: impl AsRef<Path>) -> Result<ActivityLog, LogError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    let mut days = Vec::new();

    loop {
        let header = match next_line(&mut lines, &mut line_no)? {
            Some(l) => l,
            None => break,
        };
        let header = header.trim().to_string();
        if header.is_empty() {
            break;
        }
        let day = parse_day_header(&header, line_no)?;

        let count_raw = next_line(&mut lines, &mut line_no)?
            .ok_or(LogError::UnexpectedEof { line: line_no })?;
        let count: usize =
            count_raw
                .trim()
                .parse()
                .map_err(|_| LogError::InvalidEventCount {
                    line: line_no,
                    content: count_raw.trim().to_string(),
                })?;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let raw = next_line(&mut lines, &mut line_no)?
                .ok_or(LogError::UnexpectedEof { line: line_no })?;
            entries.push(parse_entry(raw.trim(), line_no)?);
        }

        // Block separator; EOF after the last block is fine.
        if let Some(sep) = next_line(&mut lines, &mut line_no)? {
            if !sep.trim().is_empty() {
                return Err(LogError::MalformedEntry {
                    line: line_no,
                    content: sep.trim().to_string(),
                });
            }
        }

        days.push(DayBlock { day, entries });
    }

    Ok(ActivityLog { days })
}

/// Write the day-record mirror as a JSON sink.
pub fn write_day_records(
    path: impl AsRef<Path>,
    records: &[DayRecord],
) -> Result<(), LogError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

fn format_value(value: f64, kind: EventKind) -> String {
    match kind {
        EventKind::Discrete => format!("{}", value.round() as i64),
        EventKind::Continuous => format!("{:.2}", value),
    }
}

fn next_line(
    lines: &mut Lines<BufReader<File>>,
    line_no: &mut usize,
) -> Result<Option<String>, LogError> {
    match lines.next() {
        Some(result) => {
            *line_no += 1;
            Ok(Some(result?))
        }
        None => Ok(None),
    }
}

fn parse_day_header(header: &str, line_no: usize) -> Result<usize, LogError> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("Day"), Some(num)) => num.parse().map_err(|_| LogError::InvalidDayHeader {
            line: line_no,
            content: header.to_string(),
        }),
        _ => Err(LogError::InvalidDayHeader {
            line: line_no,
            content: header.to_string(),
        }),
    }
}

fn parse_entry(raw: &str, line_no: usize) -> Result<LogEntry, LogError> {
    let malformed = || LogError::MalformedEntry {
        line: line_no,
        content: raw.to_string(),
    };

    let fields: Vec<&str> = raw.split(':').collect();
    if fields.len() < 3 || fields[0].is_empty() {
        return Err(malformed());
    }
    let kind = EventKind::from_tag(fields[1]).ok_or_else(malformed)?;
    let value: f64 = fields[2].parse().map_err(|_| malformed())?;

    Ok(LogEntry {
        name: fields[0].to_string(),
        kind,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EventTable;
    use std::fs;
    use tempfile::tempdir;

    fn table() -> EventTable {
        EventTable::from_lines(
            &["2", "Logins:D:0:100:3", "Traffic:C:0.0:1000.0:2"],
            &["2", "Logins:50:5", "Traffic:500.0:25.0"],
        )
        .unwrap()
    }

    fn series(logins: Vec<f64>, traffic: Vec<f64>) -> Vec<DaySeries> {
        vec![
            DaySeries {
                event: "Logins".to_string(),
                values: logins,
            },
            DaySeries {
                event: "Traffic".to_string(),
                values: traffic,
            },
        ]
    }

    #[test]
    fn test_day_labels() {
        assert_eq!(day_label(0), "2024-11-24");
        assert_eq!(day_label(1), "2024-11-25");
        assert_eq!(day_label(7), "2024-12-01");
    }

    #[test]
    fn test_written_format_is_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        write_log(&path, 1, &table(), &series(vec![50.0], vec![12.3])).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Day 1\n2\nLogins:D:50:\nTraffic:C:12.30:\n\n");
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        write_log(
            &path,
            3,
            &table(),
            &series(vec![50.0, 48.0, 53.0], vec![500.25, 475.5, 512.75]),
        )
        .unwrap();

        let log = read_log(&path).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.days[0].day, 1);
        assert_eq!(log.days[2].day, 3);

        let first = &log.days[0].entries;
        assert_eq!(first[0].name, "Logins");
        assert_eq!(first[0].kind, EventKind::Discrete);
        assert_eq!(first[0].value, 50.0);
        assert_eq!(first[1].name, "Traffic");
        assert_eq!(first[1].value, 500.25);
    }

    #[test]
    fn test_day_records_mirror() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        let records = write_log(
            &path,
            2,
            &table(),
            &series(vec![50.0, 48.0], vec![500.0, 475.5]),
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2024-11-24");
        assert_eq!(records[1].date, "2024-11-25");
        assert_eq!(records[0].events["logins"], 50.0);
        assert_eq!(records[1].events["traffic"], 475.5);
    }

    #[test]
    fn test_blank_leading_line_ends_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "\nDay 1\n1\nLogins:D:50:\n\n").unwrap();

        let log = read_log(&path).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_invalid_day_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "Dia 1\n1\nLogins:D:50:\n\n").unwrap();

        let err = read_log(&path).unwrap_err();
        assert!(matches!(err, LogError::InvalidDayHeader { line: 1, .. }));
    }

    #[test]
    fn test_truncated_block() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "Day 1\n2\nLogins:D:50:\n").unwrap();

        let err = read_log(&path).unwrap_err();
        assert!(matches!(err, LogError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_missing_trailing_blank_is_fine() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "Day 1\n1\nLogins:D:50:\n").unwrap();

        let log = read_log(&path).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_missing_series_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        let only_logins = vec![DaySeries {
            event: "Logins".to_string(),
            values: vec![50.0],
        }];
        let err = write_log(&path, 1, &table(), &only_logins).unwrap_err();
        assert!(matches!(err, LogError::MissingSeries { .. }));
    }

    #[test]
    fn test_short_series_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        let err =
            write_log(&path, 3, &table(), &series(vec![50.0], vec![1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(
            err,
            LogError::ShortSeries {
                expected: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_json_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.json");

        let records = vec![DayRecord {
            date: "2024-11-24".to_string(),
            events: BTreeMap::from([("logins".to_string(), 50.0)]),
        }];
        write_day_records(&path, &records).unwrap();

        let loaded: Vec<DayRecord> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, records);
    }
}

// MIT License
//
// Copyright (c) 2026 Raja Lehtihet & Wael El Oraiby
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//
//! Schema-checked, single-pass readers for simulator logs.
//!
//! Two layouts are understood. Occupancy logs start with a metadata line (a
//! `#` marker followed by a JSON object of run parameters) and then the
//! [`OCCUPANCY_SCHEMA`] header. Windowed histograms start directly with the
//! [`WINDOWED_SCHEMA`] header. Every following line is a whitespace separated
//! record.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{BufRead, Lines};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::Deserialize;

use crate::{AnalysisError, Result};

/// Column header of an occupancy log.
pub const OCCUPANCY_SCHEMA: &str = "# time(s) arrivals departures in_system";

/// Column header of a windowed wait histogram.
pub const WINDOWED_SCHEMA: &str =
    "# window_left window_right waits averaged_waits averaged_wait_totals";

/// Highest `in_system` value accepted in an occupancy log.
///
/// Distributions are indexed densely by level, so the bound caps their size.
pub const MAX_OCCUPANCY: u64 = 1 << 24;

/// Run parameters parsed from the metadata line of an occupancy log.
///
/// # Example
/// ```rust
/// use queue_analysis::log_reader::RunParameters;
///
/// let parameters = RunParameters::parse(r#"# {"lambda":1, "mu":2}"#).unwrap();
/// assert_eq!(parameters.rho().unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RunParameters {
    values: BTreeMap<String, serde_json::Value>,
}

impl RunParameters {
    /// Parses a metadata line: one marker character, usually `#`, followed by
    /// a JSON object. The marker itself is not checked.
    ///
    /// # Errors
    /// Returns [`AnalysisError::MalformedMetadata`] when the line is empty or
    /// the remainder is not a JSON object.
    pub fn parse(line: &str) -> Result<Self> {
        let mut chars = line.trim().chars();
        if chars.next().is_none() {
            return Err(AnalysisError::MalformedMetadata(
                "expected a marker followed by a JSON object, received an empty line".to_owned(),
            ));
        }
        let json = chars.as_str();

        serde_json::from_str(json).map_err(|error| AnalysisError::MalformedMetadata(error.to_string()))
    }

    /// Returns a numeric parameter, or `None` when absent or not a number.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(serde_json::Value::as_f64)
    }

    /// Returns a numeric parameter that the analysis cannot do without.
    ///
    /// # Errors
    /// Returns [`AnalysisError::MissingParameter`] when the parameter is absent
    /// or not numeric.
    pub fn require(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| AnalysisError::MissingParameter(name.to_owned()))
    }

    /// Returns the arrival rate `lambda`.
    pub fn lambda(&self) -> Result<f64> {
        self.require("lambda")
    }

    /// Returns the service rate `mu`.
    pub fn mu(&self) -> Result<f64> {
        self.require("mu")
    }

    /// Returns the traffic intensity `rho = lambda / mu`.
    pub fn rho(&self) -> Result<f64> {
        Ok(self.lambda()? / self.mu()?)
    }
}

/// A fixed-schema line of a log.
pub trait Record: Sized {
    /// Header line the file must carry verbatim.
    const SCHEMA: &'static str;
    /// Number of whitespace separated fields per line.
    const FIELDS: usize;

    /// Builds a record from exactly [`Self::FIELDS`] fields.
    fn from_fields(fields: &[&str]) -> std::result::Result<Self, String>;

    /// Key that must be non-negative and non-decreasing along the file.
    fn ordering_key(&self) -> f64;
}

/// One occupancy change emitted by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyEvent {
    pub timestamp: f64,
    pub arrivals: u64,
    pub departures: u64,
    /// Number in the system immediately after the event.
    pub occupancy: u64,
}

impl Record for OccupancyEvent {
    const SCHEMA: &'static str = OCCUPANCY_SCHEMA;
    const FIELDS: usize = 4;

    fn from_fields(fields: &[&str]) -> std::result::Result<Self, String> {
        Ok(Self {
            timestamp: parse_time(fields[0], "time")?,
            arrivals: parse_field(fields[1], "arrivals")?,
            departures: parse_field(fields[2], "departures")?,
            occupancy: parse_occupancy(fields[3])?,
        })
    }

    fn ordering_key(&self) -> f64 {
        self.timestamp
    }
}

/// One fixed-width window of the wait histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRecord {
    pub window_left: f64,
    pub window_right: f64,
    pub wait_count: u64,
    pub averaged_wait_count: u64,
    /// Number of individual waits represented by the averaged bins.
    pub averaged_wait_total: u64,
}

impl Record for WindowRecord {
    const SCHEMA: &'static str = WINDOWED_SCHEMA;
    const FIELDS: usize = 5;

    fn from_fields(fields: &[&str]) -> std::result::Result<Self, String> {
        let window_left = parse_time(fields[0], "window_left")?;
        let window_right = parse_time(fields[1], "window_right")?;
        if window_right < window_left {
            return Err(format!(
                "window_right {window_right} precedes window_left {window_left}"
            ));
        }

        Ok(Self {
            window_left,
            window_right,
            wait_count: parse_field(fields[2], "waits")?,
            averaged_wait_count: parse_field(fields[3], "averaged_waits")?,
            averaged_wait_total: parse_field(fields[4], "averaged_wait_totals")?,
        })
    }

    fn ordering_key(&self) -> f64 {
        self.window_left
    }
}

fn parse_field<T>(field: &str, name: &str) -> std::result::Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    field
        .parse()
        .map_err(|error| format!("field `{name}` = `{field}`: {error}"))
}

fn parse_occupancy(field: &str) -> std::result::Result<u64, String> {
    let value: u64 = parse_field(field, "in_system")?;
    if value > MAX_OCCUPANCY {
        return Err(format!(
            "field `in_system` = {value} exceeds the supported maximum {MAX_OCCUPANCY}"
        ));
    }
    Ok(value)
}

fn parse_time(field: &str, name: &str) -> std::result::Result<f64, String> {
    let value: f64 = parse_field(field, name)?;
    if !value.is_finite() {
        return Err(format!("field `{name}` must be finite, received `{field}`"));
    }
    Ok(value)
}

/// Lazy iterator over the records of a log whose header has been checked.
///
/// The reader is single pass: after the first error it yields nothing more,
/// and reading the file again requires reopening the source.
#[derive(Debug)]
pub struct RecordReader<R, T> {
    lines: Lines<R>,
    line_number: usize,
    last_key: f64,
    failed: bool,
    _record: PhantomData<T>,
}

/// Reader over a windowed wait histogram.
pub type WindowedLog<R> = RecordReader<R, WindowRecord>;

impl<R: BufRead, T: Record> RecordReader<R, T> {
    /// Checks the column header at the start of `source`.
    ///
    /// # Errors
    /// Returns [`AnalysisError::SchemaMismatch`] when the first line is not
    /// [`Record::SCHEMA`].
    pub fn new(source: R) -> Result<Self> {
        Self::from_lines(source.lines(), 0)
    }

    fn from_lines(mut lines: Lines<R>, consumed: usize) -> Result<Self> {
        let header = lines.next().transpose()?.unwrap_or_default();
        if header.trim() != T::SCHEMA {
            return Err(AnalysisError::SchemaMismatch {
                expected: T::SCHEMA.to_owned(),
                received: header.trim().to_owned(),
            });
        }

        Ok(Self {
            lines,
            line_number: consumed + 1,
            last_key: 0.0,
            failed: false,
            _record: PhantomData,
        })
    }

    fn parse(&mut self, line: &str) -> Result<T> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != T::FIELDS {
            return Err(self.malformed(format!(
                "expected {} fields, found {}",
                T::FIELDS,
                fields.len()
            )));
        }

        let record = T::from_fields(&fields).map_err(|reason| self.malformed(reason))?;
        let key = record.ordering_key();
        if key < self.last_key {
            return Err(self.malformed(format!(
                "ordering key {key} is negative or precedes {}",
                self.last_key
            )));
        }
        self.last_key = key;
        Ok(record)
    }

    fn malformed(&self, reason: String) -> AnalysisError {
        AnalysisError::MalformedRecord {
            line: self.line_number,
            reason,
        }
    }
}

impl<R: BufRead, T: Record> Iterator for RecordReader<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error.into()));
                }
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let record = self.parse(&line);
            self.failed = record.is_err();
            return Some(record);
        }
    }
}

/// An occupancy log: run parameters plus a lazy stream of events.
///
/// # Example
/// ```rust
/// use std::io::Cursor;
/// use queue_analysis::log_reader::OccupancyLog;
///
/// let text = "# {\"lambda\":1,\"mu\":2}\n# time(s) arrivals departures in_system\n0.5 1 0 1\n";
/// let mut log = OccupancyLog::open(Cursor::new(text)).unwrap();
/// assert_eq!(log.parameters().mu().unwrap(), 2.0);
///
/// let event = log.next().unwrap().unwrap();
/// assert_eq!(event.occupancy, 1);
/// assert!(log.next().is_none());
/// ```
#[derive(Debug)]
pub struct OccupancyLog<R> {
    parameters: RunParameters,
    events: RecordReader<R, OccupancyEvent>,
}

impl<R: BufRead> OccupancyLog<R> {
    /// Reads the metadata line and checks the column header.
    ///
    /// # Errors
    /// Returns [`AnalysisError::MalformedMetadata`] for a missing or invalid
    /// metadata line and [`AnalysisError::SchemaMismatch`] for a wrong header.
    pub fn open(source: R) -> Result<Self> {
        let mut lines = source.lines();
        let metadata = lines
            .next()
            .transpose()?
            .ok_or_else(|| AnalysisError::MalformedMetadata("log is empty".to_owned()))?;
        let parameters = RunParameters::parse(&metadata)?;
        let events = RecordReader::from_lines(lines, 1)?;

        Ok(Self { parameters, events })
    }

    /// Returns the run parameters from the metadata line.
    pub fn parameters(&self) -> &RunParameters {
        &self.parameters
    }
}

impl<R: BufRead> Iterator for OccupancyLog<R> {
    type Item = Result<OccupancyEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.next()
    }
}

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
//! Estimators that check queue simulator logs against queueing theory.
//!
//! The crate currently exposes:
//! - [`log_reader`] for schema-checked, single-pass reading of simulator logs.
//! - [`occupancy::TimeWeightedOccupancy`] for dwell-time occupancy distributions.
//! - [`occupancy::CountWeightedOccupancy`] for snapshot occupancy distributions.
//! - [`rates::RateEstimator`] for empirical arrival and service rates.
//! - [`percentiles::WindowedHistogram`] for wait-time percentile boundaries.
//! - [`theory`] for closed-form M/M/1, M/M/c and M/M/c/K references.
//! - [`report`] for the plain text report lines.
//! - [`logging`] for the stderr diagnostics of the command line tool.

use std::path::PathBuf;

pub mod formats;
pub mod log_reader;
pub mod logging;
pub mod occupancy;
pub mod pathing;
pub mod percentiles;
pub mod rates;
pub mod report;
pub mod theory;

/// Errors returned while reading logs and deriving estimates.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The column header does not match the schema expected for the log.
    #[error("file failed sanity check, did the columns change?\nexpected: {expected}\nreceived: {received}")]
    SchemaMismatch { expected: String, received: String },
    /// A required run parameter is absent from the metadata line.
    #[error("missing run parameter `{0}`")]
    MissingParameter(String),
    /// An estimate would divide by zero.
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),
    /// A data line could not be parsed into a record.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
    /// The metadata line is missing or is not a JSON object.
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),
    /// A caller supplied an argument outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    /// No `target` directory exists at or above the start directory.
    #[error("no `target` directory found above {}", .0.display())]
    TargetNotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

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
//! Wait-time percentile boundaries from a windowed histogram.
//!
//! The histogram holds, per fixed-width wait window, the number of individual
//! waits and the number of waits represented by windowed averages. A
//! percentile resolves to the first window whose cumulative count range
//! `[below, below + count)` contains `p * total`.
//!
//! The averaged series is aggregated upstream over closed time windows only,
//! so the trailing partial window is missing from it and its total usually
//! falls short of the raw total. That gap is reported, never asserted away.

use std::str::FromStr;

use tracing::{debug, warn};

use crate::log_reader::WindowRecord;
use crate::{AnalysisError, Result};

/// Percentiles resolved when none are configured.
pub const DEFAULT_PERCENTILES: [f64; 4] = [0.9, 0.95, 0.99, 0.995];

/// Validated percentile targets, each strictly inside `(0, 1)`.
///
/// # Example
/// ```rust
/// use queue_analysis::percentiles::PercentileTargets;
///
/// let targets: PercentileTargets = "0.5, 0.9".parse().unwrap();
/// assert_eq!(targets.as_slice(), &[0.5, 0.9]);
/// assert!("0.5,1.0".parse::<PercentileTargets>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileTargets {
    targets: Vec<f64>,
}

impl PercentileTargets {
    /// # Errors
    /// Returns [`AnalysisError::InvalidParameter`] for an empty list or a
    /// target outside `(0, 1)`.
    pub fn new(targets: Vec<f64>) -> Result<Self> {
        if targets.is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "at least one percentile target is required",
            ));
        }
        if targets.iter().any(|p| !(p.is_finite() && *p > 0.0 && *p < 1.0)) {
            return Err(AnalysisError::InvalidParameter(
                "percentile targets must be strictly between 0 and 1",
            ));
        }

        Ok(Self { targets })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.targets
    }
}

impl Default for PercentileTargets {
    fn default() -> Self {
        Self {
            targets: DEFAULT_PERCENTILES.to_vec(),
        }
    }
}

impl FromStr for PercentileTargets {
    type Err = AnalysisError;

    /// Parses a comma separated list such as `0.9,0.99`.
    fn from_str(list: &str) -> Result<Self> {
        let targets = list
            .split(',')
            .map(|item| item.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| AnalysisError::InvalidParameter("percentile targets must be numbers"))?;
        Self::new(targets)
    }
}

/// Boundary times of one percentile in both series.
///
/// A boundary is `None` only when no window's range contains the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileBoundary {
    pub percentile: f64,
    pub wait: Option<f64>,
    pub averaged: Option<f64>,
}

/// Per-window proportions of both series, aligned with the window times.
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionSeries {
    pub times: Vec<f64>,
    pub waits: Vec<f64>,
    pub averaged: Vec<f64>,
}

/// Parallel, ordered columns of a windowed wait histogram.
///
/// # Example
/// ```rust
/// use queue_analysis::log_reader::WindowRecord;
/// use queue_analysis::percentiles::{PercentileTargets, WindowedHistogram};
///
/// let mut histogram = WindowedHistogram::new();
/// for (right, waits) in [(1.0, 10), (2.0, 40)] {
///     histogram.push(&WindowRecord {
///         window_left: right - 1.0,
///         window_right: right,
///         wait_count: waits,
///         averaged_wait_count: 1,
///         averaged_wait_total: waits,
///     });
/// }
///
/// let targets = PercentileTargets::new(vec![0.9]).unwrap();
/// let boundaries = histogram.percentile_boundaries(&targets).unwrap();
/// assert_eq!(boundaries[0].wait, Some(2.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowedHistogram {
    times: Vec<f64>,
    wait_counts: Vec<u64>,
    averaged_counts: Vec<u64>,
    total_waits: u128,
    total_averaged: u128,
}

impl WindowedHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every record of a windowed log, stopping at the first error.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<WindowRecord>>,
    {
        let mut histogram = Self::new();
        for record in records {
            histogram.push(&record?);
        }
        debug!(
            windows = histogram.len(),
            total_waits = %histogram.total_waits,
            total_averaged = %histogram.total_averaged,
            "windowed histogram loaded"
        );
        Ok(histogram)
    }

    /// Appends one window. Windows are expected in increasing order.
    pub fn push(&mut self, record: &WindowRecord) {
        self.times.push(record.window_right);
        self.wait_counts.push(record.wait_count);
        self.averaged_counts.push(record.averaged_wait_total);
        self.total_waits += u128::from(record.wait_count);
        self.total_averaged += u128::from(record.averaged_wait_total);
    }

    /// Returns the number of windows.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the right edge of each window.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn wait_counts(&self) -> &[u64] {
        &self.wait_counts
    }

    pub fn averaged_counts(&self) -> &[u64] {
        &self.averaged_counts
    }

    /// Returns the sum of raw wait counts over all windows.
    ///
    /// Totals and running counts are kept in `u128`, so summing `u64`
    /// windows cannot overflow.
    pub fn total_waits(&self) -> u128 {
        self.total_waits
    }

    /// Returns the sum of averaged wait counts over all windows.
    pub fn total_averaged(&self) -> u128 {
        self.total_averaged
    }

    /// Returns `total_waits - total_averaged`.
    ///
    /// Nonzero when the trailing partial window was left out of the averaged
    /// aggregation.
    pub fn aggregation_gap(&self) -> i128 {
        let total_waits = i128::try_from(self.total_waits).unwrap_or(i128::MAX);
        let total_averaged = i128::try_from(self.total_averaged).unwrap_or(i128::MAX);
        total_waits - total_averaged
    }

    /// Returns each window's share of its series total.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InsufficientData`] when either total is zero.
    pub fn proportions(&self) -> Result<ProportionSeries> {
        self.check_totals()?;
        let share = |counts: &[u64], total: u128| -> Vec<f64> {
            counts.iter().map(|&count| count as f64 / total as f64).collect()
        };

        Ok(ProportionSeries {
            times: self.times.clone(),
            waits: share(&self.wait_counts, self.total_waits),
            averaged: share(&self.averaged_counts, self.total_averaged),
        })
    }

    /// Locates the window holding each percentile in both series.
    ///
    /// One forward scan keeps running cumulative counts. The first window
    /// whose range contains a target wins, and the scan stops once every
    /// target of both series is resolved.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InsufficientData`] when either total is zero.
    pub fn percentile_boundaries(
        &self,
        targets: &PercentileTargets,
    ) -> Result<Vec<PercentileBoundary>> {
        self.check_totals()?;
        let gap = self.aggregation_gap();
        if gap != 0 {
            warn!(gap = %gap, "averaged series does not cover every wait");
        }

        let percentiles = targets.as_slice();
        let wait_targets: Vec<f64> = percentiles
            .iter()
            .map(|p| p * self.total_waits as f64)
            .collect();
        let averaged_targets: Vec<f64> = percentiles
            .iter()
            .map(|p| p * self.total_averaged as f64)
            .collect();

        let mut waits = vec![None; percentiles.len()];
        let mut averaged = vec![None; percentiles.len()];
        let mut n_waits = 0_u128;
        let mut n_averaged = 0_u128;

        for (index, &time) in self.times.iter().enumerate() {
            let wait_count = self.wait_counts[index];
            let averaged_count = self.averaged_counts[index];

            resolve(&mut waits, &wait_targets, n_waits, wait_count, time);
            resolve(&mut averaged, &averaged_targets, n_averaged, averaged_count, time);
            n_waits += u128::from(wait_count);
            n_averaged += u128::from(averaged_count);

            if waits.iter().chain(&averaged).all(Option::is_some) {
                break;
            }
        }

        Ok(percentiles
            .iter()
            .zip(waits.into_iter().zip(averaged))
            .map(|(&percentile, (wait, averaged))| PercentileBoundary {
                percentile,
                wait,
                averaged,
            })
            .collect())
    }

    fn check_totals(&self) -> Result<()> {
        if self.total_waits == 0 {
            return Err(AnalysisError::InsufficientData("no waits in the histogram"));
        }
        if self.total_averaged == 0 {
            return Err(AnalysisError::InsufficientData(
                "no averaged waits in the histogram",
            ));
        }
        Ok(())
    }
}

fn resolve(found: &mut [Option<f64>], targets: &[f64], below: u128, count: u64, time: f64) {
    let low = below as f64;
    let high = (below + u128::from(count)) as f64;
    for (slot, &target) in found.iter_mut().zip(targets) {
        if slot.is_none() && low <= target && target < high {
            *slot = Some(time);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{DEFAULT_PERCENTILES, PercentileTargets, WindowedHistogram};
    use crate::AnalysisError;
    use crate::log_reader::{WindowRecord, WindowedLog};

    fn histogram(windows: &[(f64, u64, u64)]) -> WindowedHistogram {
        let mut histogram = WindowedHistogram::new();
        for &(right, waits, averaged) in windows {
            histogram.push(&WindowRecord {
                window_left: right - 1.0,
                window_right: right,
                wait_count: waits,
                averaged_wait_count: 0,
                averaged_wait_total: averaged,
            });
        }
        histogram
    }

    #[test]
    fn percentile_lands_in_the_containing_window() {
        let histogram = histogram(&[(1.0, 10, 10), (2.0, 40, 40)]);
        let targets = PercentileTargets::new(vec![0.9]).unwrap();
        let boundaries = histogram.percentile_boundaries(&targets).unwrap();

        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].percentile, 0.9);
        assert_eq!(boundaries[0].wait, Some(2.0));
        assert_eq!(boundaries[0].averaged, Some(2.0));
    }

    #[test]
    fn series_are_resolved_independently() {
        let histogram = histogram(&[(1.0, 50, 5), (2.0, 30, 90), (3.0, 20, 5)]);
        let targets = PercentileTargets::new(vec![0.5, 0.9]).unwrap();
        let boundaries = histogram.percentile_boundaries(&targets).unwrap();

        // Raw: 50 falls in [50, 80), 90 in [80, 100).
        assert_eq!(boundaries[0].wait, Some(2.0));
        assert_eq!(boundaries[1].wait, Some(3.0));
        // Averaged: 50 and 90 both fall in [5, 95).
        assert_eq!(boundaries[0].averaged, Some(2.0));
        assert_eq!(boundaries[1].averaged, Some(2.0));
    }

    #[test]
    fn empty_windows_never_hold_a_percentile() {
        let histogram = histogram(&[(1.0, 9, 9), (2.0, 0, 0), (3.0, 1, 1)]);
        let targets = PercentileTargets::new(vec![0.95]).unwrap();
        let boundaries = histogram.percentile_boundaries(&targets).unwrap();
        assert_eq!(boundaries[0].wait, Some(3.0));
    }

    #[test]
    fn default_targets_are_reported_in_order() {
        let windows: Vec<(f64, u64, u64)> = (1..=1000).map(|i| (i as f64, 1, 1)).collect();
        let boundaries = histogram(&windows)
            .percentile_boundaries(&PercentileTargets::default())
            .unwrap();

        let percentiles: Vec<f64> = boundaries.iter().map(|b| b.percentile).collect();
        assert_eq!(percentiles, DEFAULT_PERCENTILES);
        let waits: Vec<Option<f64>> = boundaries.iter().map(|b| b.wait).collect();
        assert_eq!(waits, vec![Some(901.0), Some(951.0), Some(991.0), Some(996.0)]);
    }

    #[test]
    fn zero_totals_are_insufficient() {
        let targets = PercentileTargets::default();
        assert!(matches!(
            WindowedHistogram::new().percentile_boundaries(&targets),
            Err(AnalysisError::InsufficientData(_))
        ));
        assert!(matches!(
            histogram(&[(1.0, 4, 0)]).proportions(),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn aggregation_gap_is_reported_not_rejected() {
        let histogram = histogram(&[(1.0, 6, 6), (2.0, 4, 1)]);
        assert_eq!(histogram.aggregation_gap(), 3);

        let targets = PercentileTargets::new(vec![0.5]).unwrap();
        assert!(histogram.percentile_boundaries(&targets).is_ok());
    }

    #[test]
    fn proportions_follow_each_total() {
        let series = histogram(&[(1.0, 1, 3), (2.0, 3, 1)]).proportions().unwrap();
        assert_eq!(series.times, vec![1.0, 2.0]);
        assert_eq!(series.waits, vec![0.25, 0.75]);
        assert_eq!(series.averaged, vec![0.75, 0.25]);
    }

    #[test]
    fn targets_are_validated() {
        assert!(PercentileTargets::new(Vec::new()).is_err());
        assert!(PercentileTargets::new(vec![0.0]).is_err());
        assert!(PercentileTargets::new(vec![1.0]).is_err());
        assert!("0.9,abc".parse::<PercentileTargets>().is_err());
        assert_eq!(
            " 0.9 ,0.99".parse::<PercentileTargets>().unwrap().as_slice(),
            &[0.9, 0.99]
        );
    }

    #[test]
    fn totals_beyond_u64_are_exact() {
        let text = "# window_left window_right waits averaged_waits averaged_wait_totals\n\
                    0 1 10000000000000000000 1 1\n\
                    1 2 10000000000000000000 1 1\n";
        let log = WindowedLog::new(Cursor::new(text)).unwrap();
        let histogram = WindowedHistogram::from_records(log).unwrap();

        assert_eq!(histogram.total_waits(), 20_000_000_000_000_000_000);
        assert_eq!(histogram.aggregation_gap(), 19_999_999_999_999_999_998);

        let targets = PercentileTargets::new(vec![0.25, 0.75]).unwrap();
        let boundaries = histogram.percentile_boundaries(&targets).unwrap();
        assert_eq!(boundaries[0].wait, Some(1.0));
        assert_eq!(boundaries[1].wait, Some(2.0));
        assert_eq!(boundaries[0].averaged, Some(1.0));
        assert_eq!(boundaries[1].averaged, Some(2.0));
    }

    #[test]
    fn loads_from_a_windowed_log() {
        let text = "# window_left window_right waits averaged_waits averaged_wait_totals\n\
                    0 1 10 2 10\n\
                    1 2 40 3 38\n";
        let log = WindowedLog::new(Cursor::new(text)).unwrap();
        let histogram = WindowedHistogram::from_records(log).unwrap();

        assert_eq!(histogram.times(), &[1.0, 2.0]);
        assert_eq!(histogram.total_waits(), 50);
        assert_eq!(histogram.total_averaged(), 48);
        assert_eq!(histogram.averaged_counts(), &[10, 38]);
    }
}

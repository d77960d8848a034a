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
//! Empirical occupancy distributions from an event stream.
//!
//! Two estimators walk the same events. [`TimeWeightedOccupancy`] weights each
//! level by the time the system dwelt there, [`CountWeightedOccupancy`] counts
//! how many events reported each level. The two diverge when events are not
//! sampled uniformly in time.

use std::collections::BTreeMap;

use tracing::debug;

use crate::formats::human_readable;
use crate::log_reader::{MAX_OCCUPANCY, OccupancyEvent};
use crate::{AnalysisError, Result};

/// A single pass over occupancy events.
pub trait OccupancyEstimator {
    type Output;

    /// Folds one event into the running state.
    fn observe(&mut self, event: &OccupancyEvent);

    /// Consumes the accumulated state and derives the estimate.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InsufficientData`] when the estimate would
    /// divide by zero.
    fn finish(self) -> Result<Self::Output>;
}

/// Runs `estimator` over `events`, stopping at the first read error.
///
/// # Example
/// ```rust
/// use queue_analysis::log_reader::OccupancyEvent;
/// use queue_analysis::occupancy::{estimate, CountWeightedOccupancy};
///
/// let events = [1, 2, 1, 0].map(|occupancy| {
///     Ok(OccupancyEvent { timestamp: 0.0, arrivals: 0, departures: 0, occupancy })
/// });
/// let distribution = estimate(CountWeightedOccupancy::new(), events).unwrap();
/// assert_eq!(distribution.probability(1), 0.5);
/// ```
pub fn estimate<E, I>(mut estimator: E, events: I) -> Result<E::Output>
where
    E: OccupancyEstimator,
    I: IntoIterator<Item = Result<OccupancyEvent>>,
{
    for event in events {
        estimator.observe(&event?);
    }
    estimator.finish()
}

/// Probability mass over the contiguous occupancy levels `0..=max_level`.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyDistribution {
    weights: Vec<f64>,
    total: f64,
}

impl OccupancyDistribution {
    /// Densifies sparse per-level weights, filling skipped levels with zero.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InvalidParameter`] when a level exceeds
    /// [`MAX_OCCUPANCY`] and [`AnalysisError::InsufficientData`] with `reason`
    /// when the weights sum to zero.
    pub fn from_sparse(sparse: &BTreeMap<u64, f64>, reason: &'static str) -> Result<Self> {
        let levels = match sparse.keys().next_back() {
            None => 0,
            Some(&max) => usize::try_from(max)
                .ok()
                .filter(|_| max <= MAX_OCCUPANCY)
                .and_then(|max| max.checked_add(1))
                .ok_or(AnalysisError::InvalidParameter(
                    "occupancy level exceeds the supported maximum",
                ))?,
        };
        let mut weights = vec![0.0; levels];
        for (&level, &weight) in sparse {
            weights[level as usize] = weight;
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(AnalysisError::InsufficientData(reason));
        }

        Ok(Self { weights, total })
    }

    /// Returns the number of levels, `max_level() + 1`.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always `false`: a distribution holds at least level zero.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Returns the highest observed level.
    pub fn max_level(&self) -> u64 {
        self.weights.len().saturating_sub(1) as u64
    }

    /// Returns the raw accumulated weight (dwell time or event count).
    pub fn weight(&self, level: u64) -> f64 {
        self.weights.get(level as usize).copied().unwrap_or(0.0)
    }

    /// Returns the sum of all weights.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Returns `P(N = level)`, zero beyond the observed range.
    pub fn probability(&self, level: u64) -> f64 {
        self.weight(level) / self.total
    }

    /// Iterates `(level, P(N = level))` over `0..=max_level`.
    pub fn probabilities(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.weights
            .iter()
            .enumerate()
            .map(|(level, weight)| (level as u64, weight / self.total))
    }

    /// Returns the expected number in the system, `sum(n * P(N = n))`.
    pub fn mean(&self) -> f64 {
        self.probabilities()
            .map(|(level, probability)| level as f64 * probability)
            .sum()
    }
}

/// Accumulates the time spent at each occupancy level.
///
/// Dwell time between two events belongs to the level held before the later
/// event, so the level reported by an event only starts accruing afterwards.
///
/// # Example
/// ```rust
/// use queue_analysis::log_reader::OccupancyEvent;
/// use queue_analysis::occupancy::{OccupancyEstimator, TimeWeightedOccupancy};
///
/// let mut estimator = TimeWeightedOccupancy::new();
/// estimator.observe(&OccupancyEvent { timestamp: 1.0, arrivals: 1, departures: 0, occupancy: 1 });
/// estimator.observe(&OccupancyEvent { timestamp: 4.0, arrivals: 1, departures: 1, occupancy: 0 });
///
/// let distribution = estimator.finish().unwrap();
/// assert_eq!(distribution.probability(0), 0.25);
/// assert_eq!(distribution.probability(1), 0.75);
/// ```
#[derive(Debug, Clone)]
pub struct TimeWeightedOccupancy {
    level: u64,
    last_timestamp: f64,
    dwell: BTreeMap<u64, f64>,
}

impl TimeWeightedOccupancy {
    /// Starts at level zero at time zero.
    pub fn new() -> Self {
        Self {
            level: 0,
            last_timestamp: 0.0,
            dwell: BTreeMap::from([(0, 0.0)]),
        }
    }

    /// Returns the time elapsed up to the last observed event.
    pub fn elapsed(&self) -> f64 {
        self.last_timestamp
    }
}

impl Default for TimeWeightedOccupancy {
    fn default() -> Self {
        Self::new()
    }
}

impl OccupancyEstimator for TimeWeightedOccupancy {
    type Output = OccupancyDistribution;

    fn observe(&mut self, event: &OccupancyEvent) {
        let dt = event.timestamp - self.last_timestamp;
        *self.dwell.entry(self.level).or_insert(0.0) += dt;

        self.last_timestamp = event.timestamp;
        self.level = event.occupancy;
        self.dwell.entry(self.level).or_insert(0.0);
    }

    fn finish(self) -> Result<Self::Output> {
        debug!(
            elapsed = %human_readable(self.elapsed()),
            levels = self.dwell.len(),
            "time weighted occupancy pass complete"
        );
        OccupancyDistribution::from_sparse(&self.dwell, "no time elapsed in the log")
    }
}

/// Counts how many events reported each occupancy level.
#[derive(Debug, Clone)]
pub struct CountWeightedOccupancy {
    counts: BTreeMap<u64, u64>,
    samples: u64,
}

impl CountWeightedOccupancy {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::from([(0, 0)]),
            samples: 0,
        }
    }

    /// Returns the number of observed events.
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl Default for CountWeightedOccupancy {
    fn default() -> Self {
        Self::new()
    }
}

impl OccupancyEstimator for CountWeightedOccupancy {
    type Output = OccupancyDistribution;

    fn observe(&mut self, event: &OccupancyEvent) {
        *self.counts.entry(event.occupancy).or_insert(0) += 1;
        self.samples = self.samples.saturating_add(1);
    }

    fn finish(self) -> Result<Self::Output> {
        debug!(
            samples = self.samples,
            levels = self.counts.len(),
            "count weighted occupancy pass complete"
        );
        let counts: BTreeMap<u64, f64> = self
            .counts
            .into_iter()
            .map(|(level, count)| (level, count as f64))
            .collect();
        OccupancyDistribution::from_sparse(&counts, "the log holds no events")
    }
}

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
//! Empirical arrival and service rates from renewal intervals.
//!
//! Each event is classified by comparing its occupancy with the previous one:
//! a drop is a departure, anything else is an arrival. Service for a customer
//! starts either when it arrives to an empty system or when the previous
//! customer departs.

use tracing::debug;

use crate::log_reader::OccupancyEvent;
use crate::occupancy::OccupancyEstimator;
use crate::{AnalysisError, Result};

/// Running sums of the arrival and service renewal intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenewalAccumulators {
    pub arrivals: u64,
    pub arrival_time: f64,
    pub departures: u64,
    pub service_time: f64,
}

impl RenewalAccumulators {
    /// Returns `lambda = arrivals / sum(inter-arrival times)`.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InsufficientData`] when no arrival interval
    /// was observed.
    pub fn arrival_rate(&self) -> Result<f64> {
        if self.arrivals == 0 || self.arrival_time <= 0.0 {
            return Err(AnalysisError::InsufficientData(
                "no arrival intervals observed",
            ));
        }
        Ok(self.arrivals as f64 / self.arrival_time)
    }

    /// Returns `mu = departures / sum(service times)`.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InsufficientData`] when no service interval
    /// was observed.
    pub fn service_rate(&self) -> Result<f64> {
        if self.departures == 0 || self.service_time <= 0.0 {
            return Err(AnalysisError::InsufficientData(
                "no service intervals observed",
            ));
        }
        Ok(self.departures as f64 / self.service_time)
    }
}

/// Sampled rates together with the sums they were derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEstimate {
    pub lambda: f64,
    pub mu: f64,
    pub accumulators: RenewalAccumulators,
}

/// Estimates `lambda` and `mu` from occupancy changes.
///
/// # Example
/// ```rust
/// use queue_analysis::log_reader::OccupancyEvent;
/// use queue_analysis::occupancy::OccupancyEstimator;
/// use queue_analysis::rates::RateEstimator;
///
/// let mut estimator = RateEstimator::new();
/// estimator.observe(&OccupancyEvent { timestamp: 2.0, arrivals: 1, departures: 0, occupancy: 1 });
/// estimator.observe(&OccupancyEvent { timestamp: 3.0, arrivals: 1, departures: 1, occupancy: 0 });
///
/// let rates = estimator.finish().unwrap();
/// assert_eq!(rates.lambda, 0.5);
/// assert_eq!(rates.mu, 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RateEstimator {
    last_occupancy: u64,
    last_arrival: f64,
    last_service_start: f64,
    accumulators: RenewalAccumulators,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sums accumulated so far.
    pub fn accumulators(&self) -> RenewalAccumulators {
        self.accumulators
    }
}

impl OccupancyEstimator for RateEstimator {
    type Output = RateEstimate;

    fn observe(&mut self, event: &OccupancyEvent) {
        let totals = &mut self.accumulators;
        if event.occupancy < self.last_occupancy {
            totals.departures += 1;
            totals.service_time += event.timestamp - self.last_service_start;
            self.last_service_start = event.timestamp;
        } else {
            totals.arrivals += 1;
            totals.arrival_time += event.timestamp - self.last_arrival;
            self.last_arrival = event.timestamp;
            if event.occupancy == 1 {
                self.last_service_start = event.timestamp;
            }
        }
        self.last_occupancy = event.occupancy;
    }

    fn finish(self) -> Result<Self::Output> {
        let accumulators = self.accumulators;
        debug!(
            arrivals = accumulators.arrivals,
            departures = accumulators.departures,
            "rate pass complete"
        );

        Ok(RateEstimate {
            lambda: accumulators.arrival_rate()?,
            mu: accumulators.service_rate()?,
            accumulators,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::RateEstimator;
    use crate::AnalysisError;
    use crate::log_reader::{OccupancyEvent, OccupancyLog};
    use crate::occupancy::{OccupancyEstimator, estimate};

    fn event(timestamp: f64, occupancy: u64) -> OccupancyEvent {
        OccupancyEvent {
            timestamp,
            arrivals: 0,
            departures: 0,
            occupancy,
        }
    }

    #[test]
    fn single_intervals_give_exact_rates() {
        let events = [event(2.0, 1), event(3.0, 0)];
        let rates = estimate(RateEstimator::new(), events.map(Ok)).unwrap();

        assert_eq!(rates.lambda, 0.5);
        assert_eq!(rates.mu, 1.0);
        assert_eq!(rates.accumulators.arrivals, 1);
        assert_eq!(rates.accumulators.departures, 1);
    }

    #[test]
    fn service_restarts_at_each_departure_while_busy() {
        let events = [
            event(1.0, 1),
            event(2.0, 2),
            // First customer served over [1, 4], second over [4, 6].
            event(4.0, 1),
            event(6.0, 0),
        ];
        let mut estimator = RateEstimator::new();
        for event in &events {
            estimator.observe(event);
        }

        let sums = estimator.accumulators();
        assert_eq!(sums.arrivals, 2);
        assert_eq!(sums.arrival_time, 2.0);
        assert_eq!(sums.departures, 2);
        assert_eq!(sums.service_time, 5.0);
    }

    #[test]
    fn idle_time_is_not_service_time() {
        let events = [event(1.0, 1), event(2.0, 0), event(10.0, 1), event(11.5, 0)];
        let rates = estimate(RateEstimator::new(), events.map(Ok)).unwrap();

        assert_eq!(rates.accumulators.service_time, 2.5);
        assert_eq!(rates.mu, 2.0 / 2.5);
        assert_eq!(rates.lambda, 2.0 / 10.0);
    }

    #[test]
    fn zero_arrivals_are_insufficient() {
        assert!(matches!(
            RateEstimator::new().finish(),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn zero_departures_are_insufficient() {
        let events = [event(1.0, 1), event(2.0, 2)];
        assert!(matches!(
            estimate(RateEstimator::new(), events.map(Ok)),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn reads_rates_from_a_log() {
        let text = "# {\"lambda\":0.5, \"mu\":1}\n\
                    # time(s) arrivals departures in_system\n\
                    2.0 1 0 1\n\
                    3.0 1 1 0\n\
                    4.0 2 1 1\n\
                    5.0 2 2 0\n";
        let log = OccupancyLog::open(Cursor::new(text)).unwrap();
        let rates = estimate(RateEstimator::new(), log).unwrap();

        assert_eq!(rates.lambda, 2.0 / 4.0);
        assert_eq!(rates.mu, 1.0);
    }
}

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
//! Closed-form steady-state references for Markovian queues.
//!
//! Results for an unstable configuration (`rho >= 1` without a capacity
//! limit) diverge and are returned as computed. Callers decide what to do with
//! them, see [`Mm1::is_stable`].

use crate::log_reader::RunParameters;
use crate::{AnalysisError, Result};

/// Steady-state measures shared by the queue models.
pub trait QueueTheory {
    /// Expected number in the system, `L`.
    fn number_in_system(&self) -> f64;

    /// Expected time in the system, `W`.
    fn wait_in_system(&self) -> f64;

    /// Expected number waiting for service, `Lq`.
    fn number_in_queue(&self) -> f64;

    /// Expected time waiting for service, `Wq`.
    fn wait_in_queue(&self) -> f64;

    /// Probability of exactly `n` customers in the system, `p_n`.
    fn proportion(&self, n: u32) -> f64;

    fn l(&self) -> f64 {
        self.number_in_system()
    }

    fn w(&self) -> f64 {
        self.wait_in_system()
    }

    fn l_q(&self) -> f64 {
        self.number_in_queue()
    }

    fn w_q(&self) -> f64 {
        self.wait_in_queue()
    }

    fn p(&self, n: u32) -> f64 {
        self.proportion(n)
    }
}

fn check_rates(lambda: f64, mu: f64) -> Result<()> {
    if !(lambda.is_finite() && lambda > 0.0) {
        return Err(AnalysisError::InvalidParameter(
            "lambda must be finite and positive",
        ));
    }
    if !(mu.is_finite() && mu > 0.0) {
        return Err(AnalysisError::InvalidParameter(
            "mu must be finite and positive",
        ));
    }
    Ok(())
}

fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

fn powi(base: f64, exponent: u32) -> f64 {
    base.powf(f64::from(exponent))
}

/// Single server queue with Poisson arrivals and exponential service.
///
/// # Example
/// ```rust
/// use queue_analysis::theory::{Mm1, QueueTheory};
///
/// let queue = Mm1::new(1.0, 2.0).unwrap();
/// assert_eq!(queue.rho(), 0.5);
/// assert_eq!(queue.proportion(0), 0.5);
/// assert_eq!(queue.proportion(1), 0.25);
/// assert_eq!(queue.number_in_system(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mm1 {
    lambda: f64,
    mu: f64,
    rho: f64,
}

impl Mm1 {
    /// # Errors
    /// Returns [`AnalysisError::InvalidParameter`] unless both rates are
    /// finite and positive.
    pub fn new(lambda: f64, mu: f64) -> Result<Self> {
        check_rates(lambda, mu)?;
        Ok(Self {
            lambda,
            mu,
            rho: lambda / mu,
        })
    }

    /// Builds the model from the `lambda` and `mu` run parameters.
    ///
    /// # Errors
    /// Returns [`AnalysisError::MissingParameter`] when either is absent.
    pub fn from_parameters(parameters: &RunParameters) -> Result<Self> {
        Self::new(parameters.lambda()?, parameters.mu()?)
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Returns the traffic intensity `lambda / mu`.
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Returns `true` when `rho < 1`.
    pub fn is_stable(&self) -> bool {
        self.rho < 1.0
    }
}

impl QueueTheory for Mm1 {
    fn number_in_system(&self) -> f64 {
        self.rho / (1.0 - self.rho)
    }

    fn wait_in_system(&self) -> f64 {
        self.number_in_system() / self.lambda
    }

    fn number_in_queue(&self) -> f64 {
        self.rho * self.number_in_system()
    }

    fn wait_in_queue(&self) -> f64 {
        self.number_in_queue() / self.lambda
    }

    fn proportion(&self, n: u32) -> f64 {
        (1.0 - self.rho) * powi(self.rho, n)
    }
}

/// Queue with `c` identical exponential servers and unlimited waiting room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mmc {
    lambda: f64,
    servers: u32,
    r: f64,
    rho: f64,
    p0: f64,
}

impl Mmc {
    /// # Errors
    /// Returns [`AnalysisError::InvalidParameter`] for non-positive rates or
    /// zero servers.
    pub fn new(lambda: f64, mu: f64, servers: u32) -> Result<Self> {
        check_rates(lambda, mu)?;
        if servers == 0 {
            return Err(AnalysisError::InvalidParameter(
                "at least one server is required",
            ));
        }

        let r = lambda / mu;
        let rho = r / f64::from(servers);
        let idle: f64 = (0..servers).map(|i| powi(r, i) / factorial(i)).sum();
        let busy = powi(r, servers) / factorial(servers) / (1.0 - rho);

        Ok(Self {
            lambda,
            servers,
            r,
            rho,
            p0: 1.0 / (busy + idle),
        })
    }

    pub fn servers(&self) -> u32 {
        self.servers
    }

    /// Returns the per-server utilization `lambda / (c * mu)`.
    pub fn rho(&self) -> f64 {
        self.rho
    }
}

impl QueueTheory for Mmc {
    fn number_in_system(&self) -> f64 {
        self.r + self.number_in_queue()
    }

    fn wait_in_system(&self) -> f64 {
        self.number_in_system() / self.lambda
    }

    fn number_in_queue(&self) -> f64 {
        let c = self.servers;
        self.p0 * powi(self.r, c) * self.rho / (factorial(c) * (1.0 - self.rho).powi(2))
    }

    fn wait_in_queue(&self) -> f64 {
        self.number_in_queue() / self.lambda
    }

    fn proportion(&self, n: u32) -> f64 {
        let c = self.servers;
        if n < c {
            powi(self.r, n) / factorial(n) * self.p0
        } else {
            powi(self.r, n) * self.p0 / (powi(f64::from(c), n - c) * factorial(c))
        }
    }
}

/// Queue with `c` exponential servers and room for `queue_capacity` waiting
/// customers. Arrivals that find the system full are lost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mmck {
    lambda: f64,
    mu: f64,
    servers: u32,
    queue_capacity: u32,
    r: f64,
    rho: f64,
    p0: f64,
}

impl Mmck {
    /// # Errors
    /// Returns [`AnalysisError::InvalidParameter`] for non-positive rates or
    /// zero servers.
    pub fn new(lambda: f64, mu: f64, servers: u32, queue_capacity: u32) -> Result<Self> {
        check_rates(lambda, mu)?;
        if servers == 0 {
            return Err(AnalysisError::InvalidParameter(
                "at least one server is required",
            ));
        }

        let r = lambda / mu;
        let rho = r / f64::from(servers);
        let idle: f64 = (0..servers).map(|i| powi(r, i) / factorial(i)).sum();
        let waiting = if rho == 1.0 {
            f64::from(queue_capacity) + 1.0
        } else {
            (1.0 - powi(rho, queue_capacity + 1)) / (1.0 - rho)
        };
        let busy = powi(r, servers) / factorial(servers) * waiting;

        Ok(Self {
            lambda,
            mu,
            servers,
            queue_capacity,
            r,
            rho,
            p0: 1.0 / (busy + idle),
        })
    }

    /// Returns the largest number the system can hold, `c + K`.
    pub fn capacity(&self) -> u32 {
        self.servers + self.queue_capacity
    }

    /// Returns the arrival rate of customers that actually join.
    pub fn effective_arrival_rate(&self) -> f64 {
        self.lambda * (1.0 - self.proportion(self.capacity()))
    }
}

impl QueueTheory for Mmck {
    fn number_in_system(&self) -> f64 {
        self.number_in_queue() + self.r * (1.0 - self.proportion(self.capacity()))
    }

    fn wait_in_system(&self) -> f64 {
        self.number_in_system() / self.effective_arrival_rate()
    }

    fn number_in_queue(&self) -> f64 {
        let c = self.servers;
        let k = f64::from(self.queue_capacity);
        let scale = self.p0 * powi(self.r, c) / factorial(c);
        if self.rho == 1.0 {
            return scale * k * (k + 1.0) / 2.0;
        }

        let rho = self.rho;
        scale * rho / (1.0 - rho).powi(2)
            * (1.0
                - powi(rho, self.queue_capacity + 1)
                - (1.0 - rho) * (k + 1.0) * powi(rho, self.queue_capacity))
    }

    fn wait_in_queue(&self) -> f64 {
        self.wait_in_system() - 1.0 / self.mu
    }

    fn proportion(&self, n: u32) -> f64 {
        let c = self.servers;
        if n < c {
            powi(self.r, n) / factorial(n) * self.p0
        } else if n <= self.capacity() {
            powi(self.r, n) * self.p0 / (powi(f64::from(c), n - c) * factorial(c))
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mm1, Mmc, Mmck, QueueTheory};
    use crate::AnalysisError;
    use crate::log_reader::RunParameters;

    fn assert_close(expected: f64, actual: f64, tolerance: f64) {
        assert!(
            (expected - actual).abs() <= tolerance,
            "expected={expected} actual={actual} tolerance={tolerance}"
        );
    }

    #[test]
    fn mm1_geometric_distribution() {
        let queue = Mm1::new(1.0, 2.0).unwrap();
        assert_eq!(queue.p(0), 0.5);
        assert_eq!(queue.p(1), 0.25);
        assert_eq!(queue.l(), 1.0);
        assert_eq!(queue.w(), 1.0);
        assert_eq!(queue.l_q(), 0.5);
        assert!(queue.is_stable());
    }

    #[test]
    fn mm1_from_run_parameters() {
        let parameters = RunParameters::parse("# {\"lambda\":0.75, \"mu\":1.0}").unwrap();
        let queue = Mm1::from_parameters(&parameters).unwrap();
        assert_eq!(queue.rho(), 0.75);
        assert_close(3.0, queue.number_in_system(), 1e-12);

        let parameters = RunParameters::parse("# {\"mu\":1.0}").unwrap();
        assert!(matches!(
            Mm1::from_parameters(&parameters),
            Err(AnalysisError::MissingParameter(_))
        ));
    }

    #[test]
    fn unstable_mm1_is_computed_not_rejected() {
        let queue = Mm1::new(2.0, 1.0).unwrap();
        assert!(!queue.is_stable());
        assert!(queue.number_in_system() < 0.0);
    }

    #[test]
    fn rates_are_validated() {
        assert!(Mm1::new(0.0, 1.0).is_err());
        assert!(Mm1::new(1.0, f64::NAN).is_err());
        assert!(Mmc::new(1.0, 1.0, 0).is_err());
        assert!(Mmck::new(1.0, 1.0, 0, 3).is_err());
    }

    #[test]
    fn mmc_three_servers() {
        let queue = Mmc::new(6.0, 3.0, 3).unwrap();
        assert_close(1.0 / 9.0, queue.p(0), 1e-12);
        assert_close(8.0 / 9.0, queue.l_q(), 1e-12);
        assert_close(28.9 / 60.0, queue.w(), 5.0e-2 / 60.0);

        let idle = queue.p(0) + queue.p(1) + queue.p(2);
        assert_close(5.0 / 9.0, idle, 1e-12);
    }

    #[test]
    fn mmc_with_one_server_matches_mm1() {
        let single = Mm1::new(1.0, 2.5).unwrap();
        let multi = Mmc::new(1.0, 2.5, 1).unwrap();
        for n in 0..6 {
            assert_close(single.p(n), multi.p(n), 1e-12);
        }
        assert_close(single.l(), multi.l(), 1e-12);
        assert_close(single.w_q(), multi.w_q(), 1e-12);
    }

    #[test]
    fn mmck_three_servers_four_places() {
        let queue = Mmck::new(1.0, 1.0 / 6.0, 3, 4).unwrap();
        assert_eq!(queue.capacity(), 7);
        assert_close(0.00088, queue.p(0), 5.0e-6);
        assert_close(3.09, queue.l_q(), 5.0e-3);
        assert_close(6.06, queue.l(), 5.0e-3);
        assert_close(12.3, queue.w(), 6.2e-2);
        assert_eq!(queue.p(8), 0.0);
    }

    #[test]
    fn mmck_at_unit_utilization() {
        let queue = Mmck::new(3.0, 1.0, 3, 4).unwrap();
        let total: f64 = (0..=queue.capacity()).map(|n| queue.p(n)).sum();
        assert_close(1.0, total, 1e-12);

        let waiting: f64 = (4..=queue.capacity())
            .map(|n| f64::from(n - 3) * queue.p(n))
            .sum();
        assert_close(waiting, queue.l_q(), 1e-12);
    }

    #[test]
    fn mmck_distribution_sums_to_one() {
        let queue = Mmck::new(1.5, 1.0, 2, 5).unwrap();
        let total: f64 = (0..=queue.capacity()).map(|n| queue.p(n)).sum();
        assert_close(1.0, total, 1e-12);
        assert_close(queue.w_q() + 1.0, queue.w(), 1e-12);
    }
}

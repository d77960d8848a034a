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
//! Plain text report lines, one estimate per line.

use std::io::{self, Write};

use tracing::warn;

use crate::occupancy::OccupancyDistribution;
use crate::percentiles::PercentileBoundary;
use crate::rates::RateEstimate;
use crate::theory::{Mm1, QueueTheory};

/// Writes `<level> <measured> <theoretical>` for every level `0..=max`.
pub fn write_distribution<W: Write>(
    out: &mut W,
    distribution: &OccupancyDistribution,
    model: &Mm1,
) -> io::Result<()> {
    if !model.is_stable() {
        warn!(rho = model.rho(), "rho >= 1, theoretical values diverge");
    }

    for (level, probability) in distribution.probabilities() {
        let expected = model.proportion(u32::try_from(level).unwrap_or(u32::MAX));
        writeln!(out, "{level} {probability} {expected}")?;
    }
    Ok(())
}

/// Writes the expected number in the system, measured against `rho / (1 - rho)`.
pub fn write_cross_sectional<W: Write>(
    out: &mut W,
    distribution: &OccupancyDistribution,
    model: &Mm1,
) -> io::Result<()> {
    writeln!(
        out,
        "L, theoretical = {}, measured = {}",
        model.number_in_system(),
        distribution.mean()
    )
}

/// Writes the configured rates next to the sampled ones.
pub fn write_rates<W: Write>(out: &mut W, model: &Mm1, estimate: &RateEstimate) -> io::Result<()> {
    writeln!(out, "lambda, actual = {}, sampled = {}", model.lambda(), estimate.lambda)?;
    writeln!(out, "mu, actual = {}, sampled = {}", model.mu(), estimate.mu)
}

/// Writes a header and `<percentile> <wait> <averaged>` per target.
pub fn write_percentiles<W: Write>(out: &mut W, boundaries: &[PercentileBoundary]) -> io::Result<()> {
    writeln!(out, "Percentile wait average")?;
    for boundary in boundaries {
        writeln!(
            out,
            "{} {} {}",
            boundary.percentile,
            render(boundary.wait),
            render(boundary.averaged)
        )?;
    }
    Ok(())
}

/// Writes `L`, `W`, `Lq` and `Wq` followed by `p_n` for `n` in `0..=levels`.
pub fn write_theory<W: Write, Q: QueueTheory + ?Sized>(
    out: &mut W,
    model: &Q,
    levels: u32,
) -> io::Result<()> {
    writeln!(out, "L = {}", model.l())?;
    writeln!(out, "W = {}", model.w())?;
    writeln!(out, "Lq = {}", model.l_q())?;
    writeln!(out, "Wq = {}", model.w_q())?;
    for n in 0..=levels {
        writeln!(out, "{n} {}", model.p(n))?;
    }
    Ok(())
}

fn render(boundary: Option<f64>) -> String {
    boundary.map_or_else(|| "-".to_owned(), |time| time.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{write_cross_sectional, write_distribution, write_percentiles, write_rates, write_theory};
    use crate::occupancy::OccupancyDistribution;
    use crate::percentiles::PercentileBoundary;
    use crate::rates::{RateEstimate, RenewalAccumulators};
    use crate::theory::{Mm1, Mmc};

    fn rendered(write: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn distribution_lines_pair_measured_and_theoretical() {
        let weights = BTreeMap::from([(0, 1.0), (2, 1.0)]);
        let distribution = OccupancyDistribution::from_sparse(&weights, "empty").unwrap();
        let model = Mm1::new(1.0, 2.0).unwrap();

        let text = rendered(|out| write_distribution(out, &distribution, &model));
        assert_eq!(text, "0 0.5 0.5\n1 0 0.25\n2 0.5 0.125\n");

        let text = rendered(|out| write_cross_sectional(out, &distribution, &model));
        assert_eq!(text, "L, theoretical = 1, measured = 1\n");
    }

    #[test]
    fn rate_lines() {
        let model = Mm1::new(0.5, 1.0).unwrap();
        let estimate = RateEstimate {
            lambda: 0.25,
            mu: 2.0,
            accumulators: RenewalAccumulators::default(),
        };

        let text = rendered(|out| write_rates(out, &model, &estimate));
        assert_eq!(
            text,
            "lambda, actual = 0.5, sampled = 0.25\nmu, actual = 1, sampled = 2\n"
        );
    }

    #[test]
    fn percentile_lines_mark_unresolved_boundaries() {
        let boundaries = [
            PercentileBoundary {
                percentile: 0.9,
                wait: Some(2.5),
                averaged: Some(2.0),
            },
            PercentileBoundary {
                percentile: 0.99,
                wait: Some(4.0),
                averaged: None,
            },
        ];

        let text = rendered(|out| write_percentiles(out, &boundaries));
        assert_eq!(text, "Percentile wait average\n0.9 2.5 2\n0.99 4 -\n");
    }

    #[test]
    fn theory_lines_for_any_model() {
        let model = Mmc::new(1.0, 2.0, 1).unwrap();
        let text = rendered(|out| write_theory(out, &model, 1));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "L = 1");
        assert_eq!(lines[4], "0 0.5");
    }
}

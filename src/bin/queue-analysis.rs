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
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use queue_analysis::log_reader::{OccupancyLog, WindowedLog};
use queue_analysis::logging::{LogFormat, init_logging};
use queue_analysis::occupancy::{
    CountWeightedOccupancy, OccupancyDistribution, OccupancyEstimator, TimeWeightedOccupancy,
    estimate,
};
use queue_analysis::pathing::{COUNTS_FILE, WINDOWED_FILE, find_target_from_current_dir};
use queue_analysis::percentiles::{PercentileTargets, WindowedHistogram};
use queue_analysis::rates::RateEstimator;
use queue_analysis::report;
use queue_analysis::theory::{Mm1, Mmc, Mmck, QueueTheory};

#[derive(Parser, Debug)]
#[command(
    name = "queue-analysis",
    version,
    about = "Checks queue simulator logs against queueing theory"
)]
struct Cli {
    /// Emit diagnostics as JSON lines on stderr
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Time weighted occupancy distribution against M/M/1
    Proportions {
        /// Occupancy log, defaults to target/counts.txt
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Event count weighted occupancy distribution against M/M/1
    Counts {
        /// Occupancy log, defaults to target/counts.txt
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Sampled arrival and service rates
    Rates {
        /// Occupancy log, defaults to target/counts.txt
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Wait percentile boundaries from a windowed histogram
    Percentiles {
        /// Windowed histogram, defaults to target/windowed_output.txt
        #[arg(long)]
        path: Option<PathBuf>,

        /// Comma separated percentile targets in (0, 1)
        #[arg(long, default_value = "0.9,0.95,0.99,0.995")]
        percentiles: PercentileTargets,
    },

    /// Closed-form steady state measures
    Theory {
        #[arg(long)]
        lambda: f64,

        #[arg(long)]
        mu: f64,

        #[arg(long, default_value_t = 1)]
        servers: u32,

        /// Waiting room size, unlimited when absent
        #[arg(long)]
        capacity: Option<u32>,

        /// Highest level to print p_n for
        #[arg(long, default_value_t = 10)]
        levels: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Proportions { path } => {
            run_distribution(&mut out, path, TimeWeightedOccupancy::new())
        }
        Command::Counts { path } => run_distribution(&mut out, path, CountWeightedOccupancy::new()),
        Command::Rates { path } => {
            let log = OccupancyLog::open(open_input(path, COUNTS_FILE)?)?;
            let model = Mm1::from_parameters(log.parameters())?;
            let rates = estimate(RateEstimator::new(), log)?;
            report::write_rates(&mut out, &model, &rates)?;
            Ok(())
        }
        Command::Percentiles { path, percentiles } => {
            let log = WindowedLog::new(open_input(path, WINDOWED_FILE)?)?;
            let histogram = WindowedHistogram::from_records(log)?;
            let boundaries = histogram.percentile_boundaries(&percentiles)?;
            report::write_percentiles(&mut out, &boundaries)?;
            Ok(())
        }
        Command::Theory {
            lambda,
            mu,
            servers,
            capacity,
            levels,
        } => {
            let model: Box<dyn QueueTheory> = match capacity {
                Some(capacity) => Box::new(Mmck::new(lambda, mu, servers, capacity)?),
                None if servers == 1 => Box::new(Mm1::new(lambda, mu)?),
                None => Box::new(Mmc::new(lambda, mu, servers)?),
            };
            report::write_theory(&mut out, model.as_ref(), levels)?;
            Ok(())
        }
    }
}

fn run_distribution<W, E>(out: &mut W, path: Option<PathBuf>, estimator: E) -> anyhow::Result<()>
where
    W: Write,
    E: OccupancyEstimator<Output = OccupancyDistribution>,
{
    let log = OccupancyLog::open(open_input(path, COUNTS_FILE)?)?;
    let model = Mm1::from_parameters(log.parameters())?;
    let distribution = estimate(estimator, log)?;

    report::write_distribution(out, &distribution, &model)?;
    writeln!(out)?;
    report::write_cross_sectional(out, &distribution, &model)?;
    Ok(())
}

fn open_input(path: Option<PathBuf>, default_name: &str) -> anyhow::Result<BufReader<File>> {
    let path = match path {
        Some(path) => path,
        None => find_target_from_current_dir()?.join(default_name),
    };
    info!(path = %path.display(), "reading log");

    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

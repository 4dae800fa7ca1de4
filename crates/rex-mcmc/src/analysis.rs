//! Run statistics and the algorithm comparison suite.

use rex_core::{Integrand, ModalIntegrand, RexError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::baseline::{HaltonSampler, MetropolisHastings, UniformSampler};
use crate::config::{AlgorithmConfig, BaselineConfig, EngineOptions};
use crate::determinism::{algorithm_seed, baseline_stream};
use crate::engine::{EngineStats, ReplicaExchange};
use crate::sampler::{SamplePoint, Sampler};
use crate::sequence::{check_halton_dimension, halton_point};

/// First and second moments of the untempered density over the unit cube.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMoments {
    /// Mean density.
    pub first: f64,
    /// Mean squared density.
    pub second: f64,
    /// Halton points used for the estimate.
    pub points: usize,
}

impl ReferenceMoments {
    /// Quasi-Monte-Carlo estimate over the first `points` Halton points.
    pub fn estimate<I: Integrand + ?Sized>(integrand: &I, points: usize) -> Result<Self, RexError> {
        check_halton_dimension(integrand.dimension())?;
        if points == 0 {
            return Err(RexError::config(
                "reference-points",
                "the reference estimate needs at least one point",
            ));
        }
        let mut first = 0.0;
        let mut second = 0.0;
        for index in 0..points {
            let value = integrand.density(&halton_point(index as u64, integrand.dimension()), 1.0);
            let count = (index + 1) as f64;
            first += (value - first) / count;
            second += (value * value - second) / count;
        }
        if !(first > 0.0 && second > 0.0) {
            return Err(
                RexError::numeric("degenerate-reference", "reference moments vanished")
                    .with_context("points", points.to_string())
                    .with_hint("increase reference_points or widen the mixture components"),
            );
        }
        Ok(Self {
            first,
            second,
            points,
        })
    }
}

/// Accumulated statistics of one sampler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    samples: usize,
    squares: f64,
    mode_hits: Vec<u64>,
}

impl RunStatistics {
    /// Empty statistics for an integrand with `mode_count` modes.
    pub fn new(mode_count: usize) -> Self {
        Self {
            samples: 0,
            squares: 0.0,
            mode_hits: vec![0; mode_count],
        }
    }

    /// Statistics of `samples`, whose densities are rescaled by `pdf_normalization`.
    pub fn collect<I: ModalIntegrand + ?Sized>(
        integrand: &I,
        samples: &[SamplePoint],
        pdf_normalization: f64,
    ) -> Self {
        let mut stats = Self::new(integrand.mode_count());
        for sample in samples {
            let value = integrand.density(&sample.state, 1.0);
            let mode = if value > 0.0 {
                integrand.mode(&sample.state)
            } else {
                None
            };
            stats.add(value, sample.density / pdf_normalization, mode);
        }
        stats
    }

    /// Adds one sample with untempered density `value`, drawn with density `pdf`.
    pub fn add(&mut self, value: f64, pdf: f64, mode: Option<usize>) {
        if value > 0.0 {
            if let Some(hits) = mode.and_then(|mode| self.mode_hits.get_mut(mode)) {
                *hits += 1;
            }
        }
        if pdf > 0.0 {
            self.squares += value * value / pdf;
        }
        self.samples += 1;
    }

    /// Samples seen.
    pub fn sample_count(&self) -> usize {
        self.samples
    }

    /// Importance estimate of the second moment.
    pub fn second_moment(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.squares / self.samples as f64
        }
    }

    /// Samples landing in each mode.
    pub fn mode_hits(&self) -> &[u64] {
        &self.mode_hits
    }

    /// Modes visited at least once.
    pub fn modes_hit(&self) -> usize {
        self.mode_hits.iter().filter(|&&hits| hits > 0).count()
    }

    /// Error metrics against `reference`.
    pub fn report(&self, reference: &ReferenceMoments) -> RunReport {
        let modes = self.mode_hits.len();
        let most = self.mode_hits.iter().copied().max().unwrap_or(0);
        let least = self.mode_hits.iter().copied().min().unwrap_or(0);
        RunReport {
            second_moment_diff_pct: 100.0 * (self.second_moment() / reference.second - 1.0).abs(),
            modes_missed_pct: if modes == 0 {
                0.0
            } else {
                100.0 * (modes - self.modes_hit()) as f64 / modes as f64
            },
            modes_diff_pct: if self.samples == 0 {
                0.0
            } else {
                100.0 * (most - least) as f64 / self.samples as f64
            },
        }
    }
}

/// Error metrics of one run, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// `|second moment / reference - 1|`.
    pub second_moment_diff_pct: f64,
    /// Share of modes never visited.
    pub modes_missed_pct: f64,
    /// Gap between the most and least visited modes, relative to the sample count.
    pub modes_diff_pct: f64,
}

/// Metrics of one algorithm over all runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmReport {
    /// Algorithm name.
    pub name: String,
    /// Every run in order.
    pub runs: Vec<RunReport>,
    /// Per-metric minimum.
    pub best: RunReport,
    /// Per-metric mean.
    pub average: RunReport,
    /// Per-metric maximum.
    pub worst: RunReport,
    /// Engine diagnostics after the last run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_stats: Option<EngineStats>,
}

impl AlgorithmReport {
    /// Aggregates `runs`.
    pub fn from_runs(name: String, runs: Vec<RunReport>, chain_stats: Option<EngineStats>) -> Self {
        let fold = |init: f64, pick: fn(f64, f64) -> f64, metric: fn(&RunReport) -> f64| {
            runs.iter().map(metric).fold(init, pick)
        };
        let aggregate = |init: f64, pick: fn(f64, f64) -> f64| RunReport {
            second_moment_diff_pct: fold(init, pick, |run| run.second_moment_diff_pct),
            modes_missed_pct: fold(init, pick, |run| run.modes_missed_pct),
            modes_diff_pct: fold(init, pick, |run| run.modes_diff_pct),
        };
        let count = runs.len().max(1) as f64;
        let total = aggregate(0.0, |a, b| a + b);
        let average = RunReport {
            second_moment_diff_pct: total.second_moment_diff_pct / count,
            modes_missed_pct: total.modes_missed_pct / count,
            modes_diff_pct: total.modes_diff_pct / count,
        };
        let (best, worst) = if runs.is_empty() {
            (average, average)
        } else {
            (aggregate(f64::INFINITY, f64::min), aggregate(f64::NEG_INFINITY, f64::max))
        };
        Self {
            name,
            best,
            average,
            worst,
            runs,
            chain_stats,
        }
    }
}

/// Shared settings of a comparison suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitePlan {
    /// Ladder used by the replica-exchange entries.
    pub temperatures: Vec<f64>,
    /// Options of every chain-based sampler.
    pub engine: EngineOptions,
    /// Seed every sampler seed derives from.
    pub master_seed: u64,
    /// Runs per algorithm.
    pub runs: usize,
    /// Samples per run.
    pub samples_per_run: usize,
}

/// Builds the sampler described by `config`, boxed behind [`Sampler`].
pub fn build_sampler<'a, I: Integrand + 'a>(
    config: &AlgorithmConfig,
    integrand: I,
    temperatures: &[f64],
    options: &EngineOptions,
    seed: u64,
) -> Result<Box<dyn Sampler + 'a>, RexError> {
    let dimension = integrand.dimension();
    Ok(match config {
        AlgorithmConfig::Baseline(BaselineConfig::Uniform) => {
            Box::new(UniformSampler::new(dimension, baseline_stream(seed, 0)))
        }
        AlgorithmConfig::Baseline(BaselineConfig::Halton) => {
            Box::new(HaltonSampler::new(dimension, 0)?)
        }
        AlgorithmConfig::Baseline(BaselineConfig::MetropolisHastings) => Box::new(
            MetropolisHastings::new(integrand, options.clone(), baseline_stream(seed, 1))?,
        ),
        AlgorithmConfig::ReplicaExchange(exchange) => Box::new(ReplicaExchange::new(
            integrand,
            temperatures,
            exchange,
            options.clone(),
            seed,
        )?),
    })
}

/// Runs every algorithm `plan.runs` times on `integrand` and reports the metrics.
///
/// Each algorithm is built once and run repeatedly, so consecutive runs
/// continue its random streams.
pub fn run_suite<I: ModalIntegrand + ?Sized>(
    integrand: &I,
    reference: &ReferenceMoments,
    algorithms: &[AlgorithmConfig],
    plan: &SuitePlan,
) -> Result<Vec<AlgorithmReport>, RexError> {
    let mut reports = Vec::with_capacity(algorithms.len());
    for (index, config) in algorithms.iter().enumerate() {
        let seed = algorithm_seed(plan.master_seed, index);
        let mut sampler = build_sampler(config, integrand, &plan.temperatures, &plan.engine, seed)?;
        let normalization = if sampler.normalized() {
            1.0
        } else {
            reference.first
        };
        let mut runs = Vec::with_capacity(plan.runs);
        for run in 0..plan.runs {
            let samples = sampler.run(plan.samples_per_run)?;
            let report = RunStatistics::collect(integrand, &samples, normalization).report(reference);
            info!(
                algorithm = %sampler.name(),
                run,
                second_moment_diff = report.second_moment_diff_pct,
                modes_missed = report.modes_missed_pct,
                "run finished"
            );
            runs.push(report);
        }
        reports.push(AlgorithmReport::from_runs(sampler.name(), runs, sampler.stats()));
    }
    Ok(reports)
}


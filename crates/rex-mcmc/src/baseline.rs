//! Single-chain reference samplers the replica-exchange engines are compared against.

use rex_core::{random_point, Integrand, RexError, RngHandle};
use tracing::debug;

use crate::config::EngineOptions;
use crate::engine::{check_integrand, initial_state, metropolis_step};
use crate::mutation::LocalMutation;
use crate::sampler::{SamplePoint, Sampler};
use crate::sequence::{check_halton_dimension, halton_point};

/// Independent uniform points of the unit cube.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    dimension: usize,
    rng: RngHandle,
}

impl UniformSampler {
    /// Sampler over `[0,1)^dimension`.
    pub fn new(dimension: usize, seed: u64) -> Self {
        Self {
            dimension,
            rng: RngHandle::from_seed(seed),
        }
    }
}

impl Sampler for UniformSampler {
    fn name(&self) -> String {
        "uniform".to_string()
    }

    fn normalized(&self) -> bool {
        true
    }

    fn run(&mut self, sample_count: usize) -> Result<Vec<SamplePoint>, RexError> {
        Ok((0..sample_count)
            .map(|_| SamplePoint {
                state: random_point(&mut self.rng, self.dimension),
                density: 1.0,
            })
            .collect())
    }
}

/// Consecutive Halton points; each run continues where the previous one stopped.
#[derive(Debug, Clone)]
pub struct HaltonSampler {
    dimension: usize,
    next_index: u64,
}

impl HaltonSampler {
    /// Sampler over `[0,1)^dimension`, starting at index `start`.
    pub fn new(dimension: usize, start: u64) -> Result<Self, RexError> {
        check_halton_dimension(dimension)?;
        Ok(Self {
            dimension,
            next_index: start,
        })
    }
}

impl Sampler for HaltonSampler {
    fn name(&self) -> String {
        "halton".to_string()
    }

    fn normalized(&self) -> bool {
        true
    }

    fn run(&mut self, sample_count: usize) -> Result<Vec<SamplePoint>, RexError> {
        let start = self.next_index;
        self.next_index += sample_count as u64;
        Ok((start..self.next_index)
            .map(|index| SamplePoint {
                state: halton_point(index, self.dimension),
                density: 1.0,
            })
            .collect())
    }
}

/// Adaptive Metropolis-Hastings chain on the untempered target.
#[derive(Debug, Clone)]
pub struct MetropolisHastings<I> {
    integrand: I,
    options: EngineOptions,
    mutator: LocalMutation,
    rng: RngHandle,
}

impl<I: Integrand> MetropolisHastings<I> {
    /// Builds the chain; validation matches [`crate::engine::ReplicaExchange::new`].
    pub fn new(integrand: I, options: EngineOptions, seed: u64) -> Result<Self, RexError> {
        options.validate()?;
        check_integrand(&integrand)?;
        let mutator = LocalMutation::new(vec![0.0; integrand.dimension()]);
        Ok(Self {
            integrand,
            options,
            mutator,
            rng: RngHandle::from_seed(seed),
        })
    }

    /// Local mutation controller of the chain.
    pub fn mutator(&self) -> &LocalMutation {
        &self.mutator
    }
}

impl<I: Integrand> Sampler for MetropolisHastings<I> {
    fn name(&self) -> String {
        "metropolis-hastings".to_string()
    }

    fn normalized(&self) -> bool {
        false
    }

    fn run(&mut self, sample_count: usize) -> Result<Vec<SamplePoint>, RexError> {
        let start = initial_state(&self.integrand, &mut self.rng, self.options.max_initial_draws)?;
        self.mutator.reset(start);
        self.mutator.start_adaptation(self.options.goal_acceptance);

        let burn_in = self.options.burn_in;
        let period = self.options.independent_period;
        let mut samples = Vec::with_capacity(sample_count);
        for iteration in 0..burn_in + sample_count {
            metropolis_step(
                &self.integrand,
                &mut self.mutator,
                1.0,
                iteration % period != 0,
                &mut self.rng,
            );
            if iteration >= burn_in {
                let state = self.mutator.state().to_vec();
                let density = self.integrand.density(&state, 1.0);
                samples.push(SamplePoint { state, density });
            }
        }
        debug!(
            samples = samples.len(),
            acceptance = self.mutator.acceptance_rate().unwrap_or(0.0),
            scale = self.mutator.scale(),
            "metropolis-hastings run done"
        );
        Ok(samples)
    }
}

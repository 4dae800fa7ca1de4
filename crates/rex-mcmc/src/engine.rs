use rex_core::{random_point, Integrand, RexError, RngHandle, UniformSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{EngineOptions, ExchangeConfig};
use crate::determinism::{chain_stream, exchange_stream};
use crate::exchange::{ExchangeAction, ExchangeCounters, ExchangeStrategy, ReplicaView};
use crate::mutation::LocalMutation;
use crate::sampler::{SamplePoint, Sampler};
use crate::tempering::{metropolis_acceptance, validate_ladder};

/// Per-chain diagnostics reported by [`ReplicaExchange::stats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStats {
    /// Temperature of the chain.
    pub temperature: f64,
    /// Local-move acceptance rate, `None` before any proposal.
    pub acceptance_rate: Option<f64>,
    /// Current adaptive mutation scale.
    pub mutation_scale: f64,
    /// Exchange attempts involving the chain.
    pub exchange_attempts: u64,
    /// Accepted exchanges involving the chain.
    pub exchanges: u64,
    /// Accepted fraction of exchange attempts.
    pub exchange_rate: Option<f64>,
    /// Ring populations, for ring-jump engines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring_sizes: Option<Vec<usize>>,
}

/// Level-jump bookkeeping: how often a partner chain was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounts {
    /// Bucketings performed.
    pub attempted: u64,
    /// Bucketings that found at least one partner.
    pub possible: u64,
}

/// Engine-wide diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Exchange strategy name.
    pub strategy: String,
    /// Diagnostics per chain, coldest first.
    pub chains: Vec<ChainStats>,
    /// Level-jump move counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves: Option<MoveCounts>,
}

/// Replica-exchange sampler over a ladder of tempered chains.
///
/// Chain 0 runs at temperature 1 and is the only chain whose states are
/// returned. Every iteration moves each chain from the hottest to the
/// coldest, running the strategy's per-chain hook after each move, and then
/// runs the strategy's sweep hook. Every chain draws from its own stream;
/// sweep-level strategies draw from a separate engine stream.
#[derive(Debug, Clone)]
pub struct ReplicaExchange<I> {
    integrand: I,
    name: String,
    options: EngineOptions,
    temperatures: Vec<f64>,
    betas: Vec<f64>,
    chains: Vec<LocalMutation>,
    counters: Vec<ExchangeCounters>,
    streams: Vec<RngHandle>,
    exchange_rng: RngHandle,
    strategy: ExchangeStrategy,
}

impl<I: Integrand> ReplicaExchange<I> {
    /// Builds an engine over an ascending ladder starting at 1.0.
    ///
    /// Fails on a malformed ladder, invalid options, a zero-dimensional or
    /// degenerate integrand, or strategy parameters it cannot honour.
    pub fn new(
        integrand: I,
        temperatures: &[f64],
        exchange: &ExchangeConfig,
        options: EngineOptions,
        seed: u64,
    ) -> Result<Self, RexError> {
        validate_ladder(temperatures)?;
        options.validate()?;
        check_integrand(&integrand)?;
        let betas: Vec<f64> = temperatures.iter().map(|t| 1.0 / t).collect();
        let strategy = ExchangeStrategy::from_config(exchange, &integrand, &betas)?;
        let streams = (0..temperatures.len())
            .map(|chain| {
                let (state, sequence) = chain_stream(seed, chain);
                RngHandle::from_stream(state, sequence)
            })
            .collect();
        let dimension = integrand.dimension();
        Ok(Self {
            name: exchange.name(),
            options,
            temperatures: temperatures.to_vec(),
            chains: vec![LocalMutation::new(vec![0.0; dimension]); betas.len()],
            counters: vec![ExchangeCounters::default(); betas.len()],
            betas,
            streams,
            exchange_rng: RngHandle::from_seed(exchange_stream(seed)),
            strategy,
            integrand,
        })
    }

    /// Target density.
    pub fn integrand(&self) -> &I {
        &self.integrand
    }

    /// Temperature ladder, coldest first.
    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    /// Number of chains.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Local mutation controller of `chain`.
    pub fn chain(&self, chain: usize) -> Option<&LocalMutation> {
        self.chains.get(chain)
    }

    /// Exchange strategy.
    pub fn strategy(&self) -> &ExchangeStrategy {
        &self.strategy
    }

    /// Runs burn-in plus `sample_count` iterations and returns the chain-0 states.
    pub fn run(&mut self, sample_count: usize) -> Result<Vec<SamplePoint>, RexError> {
        let burn_in = self.options.burn_in;
        info!(
            strategy = self.strategy.name(),
            chains = self.chains.len(),
            burn_in,
            samples = sample_count,
            "replica exchange run starting"
        );
        self.initialize()?;
        debug!(iterations = burn_in, "burn-in started");

        let chain_count = self.chains.len();
        let period = self.options.independent_period;
        let mut samples = Vec::with_capacity(sample_count);
        for iteration in 0..burn_in + sample_count {
            if iteration == burn_in {
                debug!(iteration, "burn-in finished, sampling");
            }
            let local = iteration % period != 0;
            for chain in (0..chain_count).rev() {
                metropolis_step(
                    &self.integrand,
                    &mut self.chains[chain],
                    self.betas[chain],
                    local,
                    &mut self.streams[chain],
                );
                if chain == 0 && iteration >= burn_in {
                    let state = self.chains[0].state().to_vec();
                    let density = self.integrand.density(&state, 1.0);
                    samples.push(SamplePoint { state, density });
                }
                let view = ReplicaView::new(&self.integrand, &self.chains, &self.betas);
                let action = self.strategy.after_local_move(
                    chain,
                    &view,
                    &mut self.counters,
                    &mut self.streams[chain],
                    &mut self.exchange_rng,
                );
                if let Some(action) = action {
                    apply(&mut self.chains, action);
                }
            }
            for step in 0..self.strategy.sweep_steps(chain_count) {
                let view = ReplicaView::new(&self.integrand, &self.chains, &self.betas);
                let action = self.strategy.after_sweep(
                    step,
                    &view,
                    &mut self.counters,
                    &mut self.exchange_rng,
                );
                if let Some(action) = action {
                    apply(&mut self.chains, action);
                }
            }
        }

        let exchanges: u64 = self.counters.iter().map(|counter| counter.accepted).sum();
        info!(
            strategy = self.strategy.name(),
            samples = samples.len(),
            acceptance = self.chains[0].acceptance_rate().unwrap_or(0.0),
            exchanges,
            "replica exchange run done"
        );
        Ok(samples)
    }

    fn initialize(&mut self) -> Result<(), RexError> {
        let max_draws = self.options.max_initial_draws;
        for (chain, (mutator, rng)) in self.chains.iter_mut().zip(&mut self.streams).enumerate() {
            let state = initial_state(&self.integrand, rng, max_draws)
                .map_err(|err| err.with_context("chain", chain.to_string()))?;
            mutator.reset(state);
            mutator.start_adaptation(self.options.goal_acceptance);
        }
        self.counters.fill(ExchangeCounters::default());
        self.strategy.reset();
        Ok(())
    }

    /// Diagnostics of the chains and the exchange strategy.
    pub fn stats(&self) -> EngineStats {
        let chains = self
            .chains
            .iter()
            .zip(&self.counters)
            .zip(&self.temperatures)
            .enumerate()
            .map(|(index, ((mutator, counters), &temperature))| ChainStats {
                temperature,
                acceptance_rate: mutator.acceptance_rate(),
                mutation_scale: mutator.scale(),
                exchange_attempts: counters.attempts,
                exchanges: counters.accepted,
                exchange_rate: counters.rate(),
                ring_sizes: self.strategy.ring_sizes(index),
            })
            .collect();
        EngineStats {
            strategy: self.name.clone(),
            chains,
            moves: self
                .strategy
                .moves()
                .map(|(attempted, possible)| MoveCounts {
                    attempted,
                    possible,
                }),
        }
    }
}

impl<I: Integrand> Sampler for ReplicaExchange<I> {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn normalized(&self) -> bool {
        false
    }

    fn run(&mut self, sample_count: usize) -> Result<Vec<SamplePoint>, RexError> {
        ReplicaExchange::run(self, sample_count)
    }

    fn stats(&self) -> Option<EngineStats> {
        Some(ReplicaExchange::stats(self))
    }
}

/// Rejects integrands no chain can sample.
pub(crate) fn check_integrand<I: Integrand + ?Sized>(integrand: &I) -> Result<(), RexError> {
    if integrand.dimension() == 0 {
        return Err(RexError::config("dimension", "the integrand must have a positive dimension"));
    }
    let max = integrand.max_density(1.0);
    if !(max.is_finite() && max > 0.0) {
        return Err(RexError::config(
            "degenerate-max-density",
            "the integrand's maximum density must be positive and finite",
        )
        .with_context("max_density", max.to_string()));
    }
    Ok(())
}

/// Uniform point with positive untempered density, drawn at most `max_draws` times.
pub(crate) fn initial_state<I, S>(
    integrand: &I,
    rng: &mut S,
    max_draws: usize,
) -> Result<Vec<f64>, RexError>
where
    I: Integrand + ?Sized,
    S: UniformSource + ?Sized,
{
    for _ in 0..max_draws {
        let state = random_point(rng, integrand.dimension());
        if integrand.density(&state, 1.0) > 0.0 {
            return Ok(state);
        }
    }
    Err(
        RexError::numeric("degenerate-start", "no start with positive density was found")
            .with_context("draws", max_draws.to_string())
            .with_hint("check that the integrand has mass inside the unit cube"),
    )
}

/// One tempered Metropolis step: a local mutation, or a uniform point when `local` is false.
pub(crate) fn metropolis_step<I, S>(
    integrand: &I,
    mutator: &mut LocalMutation,
    beta: f64,
    local: bool,
    rng: &mut S,
) where
    I: Integrand + ?Sized,
    S: UniformSource + ?Sized,
{
    let proposed = if local {
        mutator.mutate(rng)
    } else {
        random_point(rng, integrand.dimension())
    };
    let current = integrand.density(mutator.state(), beta);
    let candidate = integrand.density(&proposed, beta);
    if rng.draw() < metropolis_acceptance(current, candidate) {
        mutator.accept(proposed, local);
    } else {
        mutator.reject(local);
    }
}

fn apply(chains: &mut [LocalMutation], action: ExchangeAction) {
    match action {
        ExchangeAction::Swap(a, b) if a != b => {
            let state_a = chains[a].replace_state(Vec::new());
            let state_b = chains[b].replace_state(state_a);
            chains[a].replace_state(state_b);
        }
        ExchangeAction::Swap(..) => {}
        ExchangeAction::Adopt { chain, state } => {
            chains[chain].replace_state(state);
        }
        ExchangeAction::Permute(permutation) => {
            let mut previous: Vec<Option<Vec<f64>>> = chains
                .iter_mut()
                .map(|chain| Some(chain.replace_state(Vec::new())))
                .collect();
            for (chain, &source) in permutation.iter().enumerate() {
                if let Some(state) = previous[source].take() {
                    chains[chain].replace_state(state);
                }
            }
        }
    }
}

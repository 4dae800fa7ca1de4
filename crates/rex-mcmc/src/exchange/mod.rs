//! Exchange strategies run by [`crate::engine::ReplicaExchange`] after the local moves.
//!
//! Strategies never own chain state. They read a [`ReplicaView`] snapshot,
//! update the exchange counters and return an [`ExchangeAction`] that the
//! engine applies.

mod level_jump;
mod permute;
mod ring_jump;
mod sampled;

use rex_core::{ErrorInfo, Integrand, RexError, UniformSource};
use serde::{Deserialize, Serialize};

use crate::config::ExchangeConfig;
use crate::mutation::LocalMutation;
use crate::tempering::swap_acceptance;

pub use level_jump::LevelJump;
pub use permute::PermutationExchange;
pub use ring_jump::RingJump;

/// Read-only snapshot of every chain handed to a strategy.
pub struct ReplicaView<'a, I: ?Sized> {
    integrand: &'a I,
    chains: &'a [LocalMutation],
    betas: &'a [f64],
}

impl<'a, I: Integrand + ?Sized> ReplicaView<'a, I> {
    /// Wraps the chains and their inverse temperatures; both slices are indexed by chain.
    pub fn new(integrand: &'a I, chains: &'a [LocalMutation], betas: &'a [f64]) -> Self {
        debug_assert_eq!(chains.len(), betas.len());
        Self {
            integrand,
            chains,
            betas,
        }
    }

    /// Number of chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether the view holds no chain.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Target density.
    pub fn integrand(&self) -> &'a I {
        self.integrand
    }

    /// Current state of `chain`.
    pub fn state(&self, chain: usize) -> &'a [f64] {
        self.chains[chain].state()
    }

    /// Inverse temperature of `chain`.
    pub fn beta(&self, chain: usize) -> f64 {
        self.betas[chain]
    }

    /// Density of `state` at the temperature of `chain`.
    pub fn density_at(&self, state: &[f64], chain: usize) -> f64 {
        self.integrand.density(state, self.betas[chain])
    }

    /// Density of the state of `owner` at the temperature of `chain`.
    pub fn cross(&self, owner: usize, chain: usize) -> f64 {
        self.density_at(self.state(owner), chain)
    }

    /// Acceptance of swapping the states of chains `a` and `b`.
    pub fn swap_acceptance(&self, a: usize, b: usize) -> f64 {
        swap_acceptance(
            self.cross(a, a),
            self.cross(a, b),
            self.cross(b, a),
            self.cross(b, b),
        )
    }
}

/// Attempted and accepted exchanges of one chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeCounters {
    /// Exchange attempts involving the chain.
    pub attempts: u64,
    /// Accepted exchanges involving the chain.
    pub accepted: u64,
}

impl ExchangeCounters {
    /// Accepted fraction, `None` before the first attempt.
    pub fn rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.attempts as f64)
        }
    }
}

/// State change requested by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeAction {
    /// Swap the states of two chains.
    Swap(usize, usize),
    /// Replace the state of `chain` with `state`.
    Adopt {
        /// Receiving chain.
        chain: usize,
        /// New state.
        state: Vec<f64>,
    },
    /// Chain `c` takes the state previously held by chain `permutation[c]`.
    Permute(Vec<usize>),
}

/// Closed set of exchange strategies.
#[derive(Debug, Clone)]
pub enum ExchangeStrategy {
    /// Adjacent tempered swaps once per sweep.
    Pairwise,
    /// Level-based equi-energy swaps.
    LevelJump(LevelJump),
    /// Ring-based equi-energy jumps.
    RingJump(RingJump),
    /// Exact permutation of all states.
    Permutation(PermutationExchange),
    /// Per-chain partner draw weighted by cross densities.
    SampledSwaps,
}

impl ExchangeStrategy {
    /// Builds the strategy for a ladder of inverse temperatures `betas`.
    pub fn from_config<I: Integrand + ?Sized>(
        config: &ExchangeConfig,
        integrand: &I,
        betas: &[f64],
    ) -> Result<Self, RexError> {
        Ok(match config {
            ExchangeConfig::Pairwise => ExchangeStrategy::Pairwise,
            ExchangeConfig::LevelJump { rings, mode } => {
                ExchangeStrategy::LevelJump(LevelJump::new(*rings, *mode, integrand, betas)?)
            }
            ExchangeConfig::RingJump {
                rings,
                jump_probability,
                levels,
            } => {
                if !(0.0..=1.0).contains(jump_probability) {
                    return Err(RexError::Config(
                        ErrorInfo::new("jump-probability", "jump probability must lie in [0, 1]")
                            .with_context("jump_probability", jump_probability.to_string()),
                    ));
                }
                ExchangeStrategy::RingJump(RingJump::new(
                    *rings,
                    *jump_probability,
                    *levels,
                    integrand,
                    betas,
                )?)
            }
            ExchangeConfig::Permutations { policy } => {
                ExchangeStrategy::Permutation(PermutationExchange::new(betas.len(), *policy)?)
            }
            ExchangeConfig::SampledSwaps => ExchangeStrategy::SampledSwaps,
        })
    }

    /// Short name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeStrategy::Pairwise => "pairwise",
            ExchangeStrategy::LevelJump(_) => "level-jump",
            ExchangeStrategy::RingJump(_) => "ring-jump",
            ExchangeStrategy::Permutation(_) => "permutations",
            ExchangeStrategy::SampledSwaps => "sampled-swaps",
        }
    }

    /// Drops every piece of run state.
    pub fn reset(&mut self) {
        match self {
            ExchangeStrategy::LevelJump(jump) => jump.reset(),
            ExchangeStrategy::RingJump(jump) => jump.reset(),
            ExchangeStrategy::Pairwise
            | ExchangeStrategy::Permutation(_)
            | ExchangeStrategy::SampledSwaps => {}
        }
    }

    /// Number of [`ExchangeStrategy::after_sweep`] calls per sweep for `chains` chains.
    pub fn sweep_steps(&self, chains: usize) -> usize {
        match self {
            ExchangeStrategy::Pairwise => chains.saturating_sub(1),
            ExchangeStrategy::LevelJump(jump) if jump.runs_per_sweep() => 1,
            ExchangeStrategy::Permutation(_) => usize::from(chains > 1),
            _ => 0,
        }
    }

    /// Hook run right after `chain` finished its local move.
    ///
    /// `chain_rng` is the private stream of `chain`, `shared_rng` the engine stream.
    pub fn after_local_move<I, C, S>(
        &mut self,
        chain: usize,
        view: &ReplicaView<'_, I>,
        counters: &mut [ExchangeCounters],
        chain_rng: &mut C,
        shared_rng: &mut S,
    ) -> Option<ExchangeAction>
    where
        I: Integrand + ?Sized,
        C: UniformSource + ?Sized,
        S: UniformSource + ?Sized,
    {
        match self {
            ExchangeStrategy::RingJump(jump) => jump.after_local_move(chain, view, counters, chain_rng),
            ExchangeStrategy::LevelJump(jump) => jump.after_local_move(chain, view, counters, shared_rng),
            ExchangeStrategy::SampledSwaps => sampled::attempt(chain, view, counters, chain_rng),
            ExchangeStrategy::Pairwise | ExchangeStrategy::Permutation(_) => None,
        }
    }

    /// Hook run `sweep_steps` times after every chain moved; `step` counts from zero.
    pub fn after_sweep<I, S>(
        &mut self,
        step: usize,
        view: &ReplicaView<'_, I>,
        counters: &mut [ExchangeCounters],
        shared_rng: &mut S,
    ) -> Option<ExchangeAction>
    where
        I: Integrand + ?Sized,
        S: UniformSource + ?Sized,
    {
        match self {
            ExchangeStrategy::Pairwise => pairwise(step, view, counters, shared_rng),
            ExchangeStrategy::LevelJump(jump) => jump.after_sweep(view, counters, shared_rng),
            ExchangeStrategy::Permutation(permute) => permute.after_sweep(view, counters, shared_rng),
            ExchangeStrategy::RingJump(_) | ExchangeStrategy::SampledSwaps => None,
        }
    }

    /// `(attempted, possible)` level-jump move counts.
    pub fn moves(&self) -> Option<(u64, u64)> {
        match self {
            ExchangeStrategy::LevelJump(jump) => Some(jump.moves()),
            _ => None,
        }
    }

    /// Ring populations per chain, for ring jumps.
    pub fn ring_sizes(&self, chain: usize) -> Option<Vec<usize>> {
        match self {
            ExchangeStrategy::RingJump(jump) => jump.ring_sizes(chain),
            _ => None,
        }
    }
}

/// Tempered swap between chains `step` and `step + 1`.
fn pairwise<I, S>(
    step: usize,
    view: &ReplicaView<'_, I>,
    counters: &mut [ExchangeCounters],
    rng: &mut S,
) -> Option<ExchangeAction>
where
    I: Integrand + ?Sized,
    S: UniformSource + ?Sized,
{
    let (a, b) = (step, step + 1);
    if b >= view.len() {
        return None;
    }
    two_chain_swap(a, b, view, counters, rng)
}

/// Attempts the standard two-chain swap, counting it on both chains.
pub(crate) fn two_chain_swap<I, S>(
    a: usize,
    b: usize,
    view: &ReplicaView<'_, I>,
    counters: &mut [ExchangeCounters],
    rng: &mut S,
) -> Option<ExchangeAction>
where
    I: Integrand + ?Sized,
    S: UniformSource + ?Sized,
{
    counters[a].attempts += 1;
    counters[b].attempts += 1;
    if rng.draw() < view.swap_acceptance(a, b) {
        counters[a].accepted += 1;
        counters[b].accepted += 1;
        Some(ExchangeAction::Swap(a, b))
    } else {
        None
    }
}

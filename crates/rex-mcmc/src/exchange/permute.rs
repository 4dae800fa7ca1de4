use rex_core::{Integrand, RexError, UniformSource};
use tracing::warn;

use super::{ExchangeAction, ExchangeCounters, ReplicaView};
use crate::config::PermutationPolicy;
use crate::permutation::PermutationSampler;

/// Exchange drawing a whole permutation of the chain states per sweep.
///
/// Row `c` of the weight matrix holds the density of every chain's state at
/// the temperature of chain `c`, divided by the row average.
#[derive(Debug, Clone)]
pub struct PermutationExchange {
    policy: PermutationPolicy,
    sampler: PermutationSampler,
    weights: Vec<f64>,
}

impl PermutationExchange {
    /// Builds the exchange for `chains` chains.
    pub fn new(chains: usize, policy: PermutationPolicy) -> Result<Self, RexError> {
        let sampler = PermutationSampler::new(chains, policy == PermutationPolicy::NonIdentity)?;
        Ok(Self {
            policy,
            sampler,
            weights: vec![0.0; chains * chains],
        })
    }

    /// Admissible permutations.
    pub fn policy(&self) -> PermutationPolicy {
        self.policy
    }

    fn fill_weights<I: Integrand + ?Sized>(&mut self, view: &ReplicaView<'_, I>) {
        let n = view.len();
        for (chain, row) in self.weights.chunks_mut(n).enumerate() {
            for (owner, weight) in row.iter_mut().enumerate() {
                *weight = view.cross(owner, chain);
            }
            let average = row.iter().sum::<f64>() / n as f64;
            if average > 0.0 {
                row.iter_mut().for_each(|weight| *weight /= average);
            }
        }
    }

    pub(crate) fn after_sweep<I, S>(
        &mut self,
        view: &ReplicaView<'_, I>,
        counters: &mut [ExchangeCounters],
        rng: &mut S,
    ) -> Option<ExchangeAction>
    where
        I: Integrand + ?Sized,
        S: UniformSource + ?Sized,
    {
        let n = view.len();
        self.fill_weights(view);
        counters.iter_mut().for_each(|counter| counter.attempts += 1);

        let weights = &self.weights;
        let Some(draw) = self
            .sampler
            .sample(|position, item| weights[position * n + item], rng.draw())
        else {
            warn!(chains = n, "permutation weights have no positive permanent, skipping exchange");
            return None;
        };
        let permutation = draw.permutation;

        if self.policy == PermutationPolicy::NonIdentity {
            // Reverse move: from the permuted assignment back to the current one.
            let reverse = self
                .sampler
                .normalization(|position, item| weights[position * n + permutation[item]]);
            let ratio = if reverse > 0.0 {
                draw.total_weight / reverse
            } else {
                1.0
            };
            if rng.draw() >= ratio {
                return None;
            }
        }

        for (chain, &source) in permutation.iter().enumerate() {
            if source != chain {
                counters[chain].accepted += 1;
            }
        }
        Some(ExchangeAction::Permute(permutation))
    }
}

use rex_core::{Integrand, RexError, UniformSource};

use super::{ExchangeAction, ExchangeCounters, ReplicaView};
use crate::config::RingLevels;
use crate::rings::{EnergyRings, RingSample};
use crate::tempering::swap_acceptance;

/// Equi-energy jump into states other chains visited.
///
/// Every chain owns an [`EnergyRings`] holding the states observed on the
/// other chains, valued at its own temperature. After a local move the
/// state is published to the rings of every other chain; then, with
/// probability `jump_probability`, the chain draws a candidate from the ring
/// matching its current value and adopts it under the tempered swap ratio.
#[derive(Debug, Clone)]
pub struct RingJump {
    jump_probability: f64,
    rings: Vec<EnergyRings>,
}

impl RingJump {
    /// Builds one ring structure per chain.
    pub fn new<I: Integrand + ?Sized>(
        ring_count: usize,
        jump_probability: f64,
        levels: RingLevels,
        integrand: &I,
        betas: &[f64],
    ) -> Result<Self, RexError> {
        let rings = betas
            .iter()
            .map(|&beta| match levels {
                RingLevels::Fixed => EnergyRings::fixed(ring_count, integrand.max_density(beta)),
                RingLevels::Adaptive => EnergyRings::adaptive(ring_count),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            jump_probability,
            rings,
        })
    }

    /// Probability of attempting a jump after each local move.
    pub fn jump_probability(&self) -> f64 {
        self.jump_probability
    }

    /// Ring structure owned by `chain`.
    pub fn rings(&self, chain: usize) -> Option<&EnergyRings> {
        self.rings.get(chain)
    }

    pub(crate) fn ring_sizes(&self, chain: usize) -> Option<Vec<usize>> {
        self.rings.get(chain).map(EnergyRings::ring_sizes)
    }

    pub(crate) fn reset(&mut self) {
        for rings in &mut self.rings {
            rings.clear();
        }
    }

    pub(crate) fn after_local_move<I, C>(
        &mut self,
        chain: usize,
        view: &ReplicaView<'_, I>,
        counters: &mut [ExchangeCounters],
        rng: &mut C,
    ) -> Option<ExchangeAction>
    where
        I: Integrand + ?Sized,
        C: UniformSource + ?Sized,
    {
        let state = view.state(chain);
        for other in (0..view.len()).rev().filter(|&other| other != chain) {
            self.rings[other].insert(RingSample {
                state: state.to_vec(),
                value: view.density_at(state, other),
                chain,
            });
        }

        let own = &self.rings[chain];
        if !own.is_constructed() || rng.draw() >= self.jump_probability {
            return None;
        }
        let mine_at_mine = view.density_at(state, chain);
        let ring = own.ring_for(mine_at_mine)?;
        // An empty target ring is no attempt.
        let candidate = own.sample_from(ring, rng.draw())?;
        counters[chain].attempts += 1;
        let acceptance = swap_acceptance(
            mine_at_mine,
            view.density_at(state, candidate.chain),
            view.density_at(&candidate.state, chain),
            view.density_at(&candidate.state, candidate.chain),
        );
        if rng.draw() < acceptance {
            counters[chain].accepted += 1;
            Some(ExchangeAction::Adopt {
                chain,
                state: candidate.state.clone(),
            })
        } else {
            None
        }
    }
}

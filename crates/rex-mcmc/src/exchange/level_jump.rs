use rex_core::{Integrand, RexError, UniformSource};

use super::{two_chain_swap, ExchangeAction, ExchangeCounters, ReplicaView};
use crate::config::LevelJumpMode;
use crate::rings::{fixed_levels, level_index};

/// Equi-energy swap between chains whose current densities share a level.
///
/// In [`LevelJumpMode::Original`] all chains are bucketed once per sweep by
/// the untempered level schedule. In [`LevelJumpMode::FrequentFallback`] each
/// chain, after its own local move, buckets the others with the schedule of
/// its own temperature.
#[derive(Debug, Clone)]
pub struct LevelJump {
    mode: LevelJumpMode,
    ring_count: usize,
    /// Schedule at β=1 in original mode, one schedule per chain otherwise.
    levels: Vec<Vec<f64>>,
    attempted: u64,
    possible: u64,
}

impl LevelJump {
    /// Precomputes the level schedules from the maxima of `integrand`.
    pub fn new<I: Integrand + ?Sized>(
        ring_count: usize,
        mode: LevelJumpMode,
        integrand: &I,
        betas: &[f64],
    ) -> Result<Self, RexError> {
        let levels = match mode {
            LevelJumpMode::Original => vec![fixed_levels(ring_count, integrand.max_density(1.0))?],
            LevelJumpMode::FrequentFallback => betas
                .iter()
                .map(|&beta| fixed_levels(ring_count, integrand.max_density(beta)))
                .collect::<Result<_, _>>()?,
        };
        Ok(Self {
            mode,
            ring_count,
            levels,
            attempted: 0,
            possible: 0,
        })
    }

    /// Variant in use.
    pub fn mode(&self) -> LevelJumpMode {
        self.mode
    }

    /// `(attempted, possible)`: bucketings performed and bucketings that found a partner.
    pub fn moves(&self) -> (u64, u64) {
        (self.attempted, self.possible)
    }

    pub(crate) fn reset(&mut self) {
        self.attempted = 0;
        self.possible = 0;
    }

    pub(crate) fn runs_per_sweep(&self) -> bool {
        self.mode == LevelJumpMode::Original
    }

    pub(crate) fn after_local_move<I, S>(
        &mut self,
        chain: usize,
        view: &ReplicaView<'_, I>,
        counters: &mut [ExchangeCounters],
        rng: &mut S,
    ) -> Option<ExchangeAction>
    where
        I: Integrand + ?Sized,
        S: UniformSource + ?Sized,
    {
        if self.mode != LevelJumpMode::FrequentFallback {
            return None;
        }
        self.attempted += 1;
        let levels = &self.levels[chain];
        let own = level_index(levels, view.cross(chain, chain));
        let partners: Vec<usize> = (0..view.len())
            .rev()
            .filter(|&other| other != chain)
            .filter(|&other| level_index(levels, view.cross(other, chain)) == own)
            .collect();
        if partners.is_empty() {
            return None;
        }
        self.possible += 1;
        let partner = partners[pick(rng.draw(), partners.len())];
        two_chain_swap(chain, partner, view, counters, rng)
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
        if self.mode != LevelJumpMode::Original {
            return None;
        }
        self.attempted += 1;
        let levels = &self.levels[0];
        let mut occupants: Vec<Vec<usize>> = vec![Vec::new(); self.ring_count];
        for chain in (0..view.len()).rev() {
            let value = view.integrand().density(view.state(chain), 1.0);
            occupants[level_index(levels, value)].push(chain);
        }
        let usable: Vec<&Vec<usize>> = occupants.iter().filter(|ring| ring.len() > 1).collect();
        if usable.is_empty() {
            return None;
        }
        self.possible += 1;
        let ring = usable[pick(rng.draw(), usable.len())];
        let first = pick(rng.draw(), ring.len());
        let mut second = pick(rng.draw(), ring.len() - 1);
        if second >= first {
            second += 1;
        }
        two_chain_swap(ring[first], ring[second], view, counters, rng)
    }
}

/// `floor(u·len)` clamped to a valid index.
fn pick(u: f64, len: usize) -> usize {
    ((u * len as f64) as usize).min(len.saturating_sub(1))
}

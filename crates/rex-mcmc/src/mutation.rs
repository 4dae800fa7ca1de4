use rex_core::UniformSource;
use serde::{Deserialize, Serialize};

/// Smallest step of the fixed two-scale proposal.
pub const SMALL_STEP: f64 = 1.0 / 1024.0;
/// Largest step of the fixed two-scale proposal, also the scale adaptation starts from.
pub const LARGE_STEP: f64 = 1.0 / 64.0;

/// Lifetime and windowed acceptance counters of a [`LocalMutation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationCounters {
    /// Accepted proposals since construction or the last reset.
    pub accepted: u64,
    /// Rejected proposals since construction or the last reset.
    pub rejected: u64,
    /// Accepted proposals since adaptation started.
    pub accepted_window: u64,
    /// Rejected proposals since adaptation started.
    pub rejected_window: u64,
}

/// Per-chain controller owning the current state and the adaptive proposal scale.
///
/// Every coordinate is perturbed independently with a circular move on
/// `[0, 1)`. Before [`LocalMutation::start_adaptation`] the step size follows a
/// log-uniform mixture between [`LARGE_STEP`] and [`SMALL_STEP`]; afterwards it
/// is `u^(1/scale + 1)` and `scale` is driven toward the goal acceptance rate
/// with a decaying Robbins-Monro step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalMutation {
    state: Vec<f64>,
    adaptive: bool,
    goal_acceptance: f64,
    scale: f64,
    updates: u64,
    counters: MutationCounters,
}

impl LocalMutation {
    /// Creates a non-adaptive controller positioned at `state`.
    pub fn new(state: Vec<f64>) -> Self {
        Self {
            state,
            adaptive: false,
            goal_acceptance: 0.0,
            scale: LARGE_STEP,
            updates: 0,
            counters: MutationCounters::default(),
        }
    }

    /// Repositions the controller at `state`, clearing counters and adaptation.
    pub fn reset(&mut self, state: Vec<f64>) {
        *self = Self::new(state);
    }

    /// Current state vector.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Swaps in `state` without touching any counter and returns the old one.
    ///
    /// Used by exchange moves, which are accounted for separately.
    pub fn replace_state(&mut self, state: Vec<f64>) -> Vec<f64> {
        std::mem::replace(&mut self.state, state)
    }

    /// Current adaptive mutation scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whether adaptation is armed.
    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Number of committed scale updates since adaptation started.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Snapshot of the acceptance counters.
    pub fn counters(&self) -> MutationCounters {
        self.counters
    }

    /// Arms adaptation toward `goal_acceptance`, restarting the window.
    pub fn start_adaptation(&mut self, goal_acceptance: f64) {
        self.goal_acceptance = goal_acceptance;
        self.adaptive = true;
        self.counters.accepted_window = 0;
        self.counters.rejected_window = 0;
        self.updates = 0;
        self.scale = LARGE_STEP;
    }

    /// Proposes a perturbed copy of the current state.
    pub fn mutate<S: UniformSource + ?Sized>(&self, rng: &mut S) -> Vec<f64> {
        self.state
            .iter()
            .map(|&value| self.mutate_coordinate(value, rng))
            .collect()
    }

    fn mutate_coordinate<S: UniformSource + ?Sized>(&self, value: f64, rng: &mut S) -> f64 {
        let mut u = rng.draw();
        let add = u < 0.5;
        u = if add { u * 2.0 } else { 2.0 * (u - 0.5) };
        let step = if self.adaptive {
            u.powf(1.0 / self.scale + 1.0)
        } else {
            LARGE_STEP * (u * (SMALL_STEP / LARGE_STEP).ln()).exp()
        };
        let moved = if add { value + step } else { value - step };
        wrap_unit(moved)
    }

    /// Commits `candidate`; `local` marks a local (not independent) proposal.
    pub fn accept(&mut self, candidate: Vec<f64>, local: bool) {
        self.state = candidate;
        self.counters.accepted += 1;
        self.counters.accepted_window += 1;
        if self.adaptive && local {
            self.adapt();
        }
    }

    /// Records a rejection; `local` marks a local (not independent) proposal.
    pub fn reject(&mut self, local: bool) {
        self.counters.rejected += 1;
        self.counters.rejected_window += 1;
        if self.adaptive && local {
            self.adapt();
        }
    }

    fn adapt(&mut self) {
        let window = self.counters.accepted_window + self.counters.rejected_window;
        if window == 0 {
            return;
        }
        let ratio = self.counters.accepted_window as f64 / window as f64;
        let candidate = self.scale + (ratio - self.goal_acceptance) / (self.updates + 1) as f64;
        if candidate > 0.0 && candidate < 1.0 {
            self.updates += 1;
            self.scale = candidate;
        }
    }

    /// Lifetime acceptance rate, `None` before the first proposal.
    pub fn acceptance_rate(&self) -> Option<f64> {
        let total = self.counters.accepted + self.counters.rejected;
        if total == 0 {
            None
        } else {
            Some(self.counters.accepted as f64 / total as f64)
        }
    }
}

fn wrap_unit(value: f64) -> f64 {
    let wrapped = if value >= 1.0 {
        value - 1.0
    } else if value < 0.0 {
        value + 1.0
    } else {
        value
    };
    // `-tiny + 1.0` rounds to exactly 1.0.
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

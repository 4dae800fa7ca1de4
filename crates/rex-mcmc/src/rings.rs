use std::cmp::Ordering;

use rex_core::{ErrorInfo, RexError};

use crate::config::RingLevels;
use crate::heap::MinMaxHeap;

/// Population slack a ring may carry above the average before it is rebalanced.
pub const REBALANCE_SLACK: usize = 5;

/// A state observed on some chain together with its density at the owning
/// structure's inverse temperature.
///
/// Samples compare by `value` only.
#[derive(Debug, Clone)]
pub struct RingSample {
    /// Observed state.
    pub state: Vec<f64>,
    /// Tempered density of `state`.
    pub value: f64,
    /// Chain the state was observed on.
    pub chain: usize,
}

impl PartialEq for RingSample {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for RingSample {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

/// Boundaries of the fixed level schedule: `max^(1/R)·(k+1)` for `k < R-1`.
pub fn compute_levels(max_value: f64, ring_count: usize) -> Vec<f64> {
    if ring_count == 0 {
        return Vec::new();
    }
    let step = max_value.powf(1.0 / ring_count as f64);
    (1..ring_count).map(|k| step * k as f64).collect()
}

/// Validated [`compute_levels`]: `ring_count` must be positive and `max_value` positive and finite.
pub fn fixed_levels(ring_count: usize, max_value: f64) -> Result<Vec<f64>, RexError> {
    check_ring_count(ring_count)?;
    if !(max_value.is_finite() && max_value > 0.0) {
        return Err(RexError::Config(
            ErrorInfo::new(
                "degenerate-max-density",
                "fixed ring levels need a positive finite maximum density",
            )
            .with_context("max_value", max_value.to_string()),
        ));
    }
    Ok(compute_levels(max_value, ring_count))
}

/// Index of the first level strictly above `value`, or `levels.len()`.
pub fn level_index(levels: &[f64], value: f64) -> usize {
    levels
        .iter()
        .position(|&level| level > value)
        .unwrap_or(levels.len())
}

/// Energy ring structure: `R` value-ranked buckets of [`RingSample`]s.
///
/// Adjacent buckets keep `max(ring i) <= min(ring i+1)`. In
/// [`RingLevels::Fixed`] mode samples are routed by a precomputed level
/// schedule. In [`RingLevels::Adaptive`] mode the first `R` samples are
/// buffered, sorted and dealt one per ring; later samples go to the first ring
/// whose maximum reaches their value and overfull rings shed extremal samples
/// toward a smaller neighbour.
#[derive(Debug, Clone)]
pub struct EnergyRings {
    mode: RingLevels,
    rings: Vec<MinMaxHeap<RingSample>>,
    levels: Vec<f64>,
    seed_buffer: Vec<RingSample>,
    constructed: bool,
}

impl EnergyRings {
    /// Builds rings whose boundaries derive from `max_value`, the supremum of
    /// the owning chain's tempered density.
    pub fn fixed(ring_count: usize, max_value: f64) -> Result<Self, RexError> {
        let levels = fixed_levels(ring_count, max_value)?;
        Ok(Self {
            mode: RingLevels::Fixed,
            rings: (0..ring_count).map(|_| MinMaxHeap::new()).collect(),
            levels,
            seed_buffer: Vec::new(),
            constructed: true,
        })
    }

    /// Builds rings seeded from the first `ring_count` samples.
    pub fn adaptive(ring_count: usize) -> Result<Self, RexError> {
        check_ring_count(ring_count)?;
        Ok(Self {
            mode: RingLevels::Adaptive,
            rings: (0..ring_count).map(|_| MinMaxHeap::new()).collect(),
            levels: Vec::new(),
            seed_buffer: Vec::with_capacity(ring_count),
            constructed: false,
        })
    }

    /// Construction mode.
    pub fn mode(&self) -> RingLevels {
        self.mode
    }

    /// Number of rings `R`.
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Fixed level schedule (empty in adaptive mode).
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Whether jumps may consult the rings.
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Population of every ring.
    pub fn ring_sizes(&self) -> Vec<usize> {
        self.rings.iter().map(MinMaxHeap::len).collect()
    }

    /// Samples stored, including the adaptive seed buffer before it is dealt.
    pub fn len(&self) -> usize {
        if self.constructed {
            self.rings.iter().map(MinMaxHeap::len).sum()
        } else {
            self.seed_buffer.len()
        }
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every sample; adaptive rings return to the seeding phase.
    pub fn clear(&mut self) {
        for ring in &mut self.rings {
            ring.clear();
        }
        self.seed_buffer.clear();
        self.constructed = self.mode == RingLevels::Fixed;
    }

    /// Ring responsible for `value`, `None` while adaptive rings are still seeding.
    pub fn ring_for(&self, value: f64) -> Option<usize> {
        match self.mode {
            RingLevels::Fixed => Some(level_index(&self.levels, value)),
            RingLevels::Adaptive if self.constructed => {
                let last = self.rings.len() - 1;
                let index = self.rings[..last]
                    .iter()
                    .position(|ring| ring.peek_max().is_some_and(|max| max.value >= value))
                    .unwrap_or(last);
                Some(index)
            }
            RingLevels::Adaptive => None,
        }
    }

    /// Picks the sample at `floor(u·len)` (clamped) in `ring`; `None` for an empty ring.
    pub fn sample_from(&self, ring: usize, u: f64) -> Option<&RingSample> {
        let heap = self.rings.get(ring)?;
        if heap.is_empty() {
            return None;
        }
        let index = ((u * heap.len() as f64) as usize).min(heap.len() - 1);
        heap.get(index)
    }

    /// Samples stored in `ring`, in heap order.
    pub fn ring(&self, ring: usize) -> impl Iterator<Item = &RingSample> {
        self.rings.get(ring).into_iter().flat_map(MinMaxHeap::iter)
    }

    /// Stores `sample`; returns `false` when it was discarded for zero density.
    pub fn insert(&mut self, sample: RingSample) -> bool {
        if sample.value == 0.0 || sample.value.is_nan() {
            return false;
        }
        match self.mode {
            RingLevels::Fixed => {
                let index = level_index(&self.levels, sample.value);
                self.rings[index].push(sample);
            }
            RingLevels::Adaptive if !self.constructed => {
                self.seed_buffer.push(sample);
                if self.seed_buffer.len() == self.rings.len() {
                    self.deal_seed_buffer();
                }
            }
            RingLevels::Adaptive => {
                let index = self.ring_for(sample.value).unwrap_or(self.rings.len() - 1);
                self.rings[index].push(sample);
                self.rebalance(index);
                debug_assert!(self.is_ordered());
            }
        }
        true
    }

    fn deal_seed_buffer(&mut self) {
        let mut seeds = std::mem::take(&mut self.seed_buffer);
        seeds.sort_by(|a, b| a.value.total_cmp(&b.value));
        for (ring, sample) in self.rings.iter_mut().zip(seeds) {
            ring.push(sample);
        }
        self.constructed = true;
    }

    fn rebalance(&mut self, mut index: usize) {
        let count = self.rings.len();
        let average = self.rings.iter().map(MinMaxHeap::len).sum::<usize>() / count;
        let mut direction = 0isize;
        while self.rings[index].len() > average + REBALANCE_SLACK {
            let target = if direction == 0 {
                let mut chosen = None;
                if index + 1 < count {
                    chosen = Some(index + 1);
                    direction = 1;
                }
                if index > 0 {
                    let below = index - 1;
                    let prefer_below = match chosen {
                        None => true,
                        Some(above) => self.rings[above].len() > self.rings[below].len(),
                    };
                    if prefer_below {
                        chosen = Some(below);
                        direction = -1;
                    }
                }
                chosen
            } else {
                index
                    .checked_add_signed(direction)
                    .filter(|&next| next < count)
            };
            let Some(target) = target else {
                break;
            };
            if self.rings[target].len() >= self.rings[index].len() {
                break;
            }
            let moved = if target < index {
                self.rings[index].pop_min()
            } else {
                self.rings[index].pop_max()
            };
            match moved {
                Some(sample) => self.rings[target].push(sample),
                None => break,
            }
            index = target;
        }
    }

    /// Checks `max(ring i) <= min(ring j)` for every `i < j`, skipping empty rings.
    pub fn is_ordered(&self) -> bool {
        let mut previous_max = f64::NEG_INFINITY;
        for ring in &self.rings {
            if let (Some(min), Some(max)) = (ring.peek_min(), ring.peek_max()) {
                if min.value < previous_max {
                    return false;
                }
                previous_max = max.value;
            }
        }
        true
    }
}

fn check_ring_count(ring_count: usize) -> Result<(), RexError> {
    if ring_count == 0 {
        return Err(RexError::Config(
            ErrorInfo::new("ring-count", "at least one ring is required")
                .with_context("rings", ring_count.to_string()),
        ));
    }
    Ok(())
}

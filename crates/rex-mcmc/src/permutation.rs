use rex_core::{ErrorInfo, RexError};
use serde::{Deserialize, Serialize};

/// Largest number of items the subset cache can index.
pub const MAX_PERMUTATION_SIZE: usize = 20;

/// Permutation drawn by [`PermutationSampler::sample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationDraw {
    /// `permutation[position]` is the item assigned to `position`.
    pub permutation: Vec<usize>,
    /// Permanent of the weight matrix over the admissible permutations.
    pub total_weight: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    value: f64,
    parity: bool,
}

/// Exact sampler of weighted bijections on `{0..n-1}`.
///
/// The probability of a permutation `σ` is `Π_p w(p, σ(p)) / Z`, where `Z`
/// (the permanent of `w` restricted to admissible permutations) is computed
/// by a top-down recursion over positions, memoized on the bitmask of items
/// already used. The final position is folded into its parent scan, so the
/// cache holds `2^n` entries.
///
/// Each call flips a parity bit instead of clearing the cache; an entry is
/// valid only when its own parity matches the current one.
///
/// With `skip_fixed_points`, any assignment of a position to itself is
/// inadmissible, so only derangements are weighted and sampled.
#[derive(Debug, Clone)]
pub struct PermutationSampler {
    size: usize,
    skip_fixed_points: bool,
    cache: Vec<CacheEntry>,
    parity: bool,
    permutation: Vec<usize>,
}

impl PermutationSampler {
    /// Creates a sampler over `size` items (`1..=MAX_PERMUTATION_SIZE`).
    pub fn new(size: usize, skip_fixed_points: bool) -> Result<Self, RexError> {
        if !(1..=MAX_PERMUTATION_SIZE).contains(&size) {
            return Err(RexError::Config(
                ErrorInfo::new(
                    "permutation-capacity",
                    "permutation exchange supports between 1 and 20 chains",
                )
                .with_context("chains", size.to_string())
                .with_context("max", MAX_PERMUTATION_SIZE.to_string()),
            ));
        }
        Ok(Self {
            size,
            skip_fixed_points,
            cache: vec![CacheEntry::default(); 1usize << size],
            parity: false,
            permutation: (0..size).collect(),
        })
    }

    /// Number of items.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether fixed points are excluded.
    pub fn skips_fixed_points(&self) -> bool {
        self.skip_fixed_points
    }

    /// Draws a permutation by inverse-CDF descent driven by `u ∈ [0, 1)`.
    ///
    /// Returns `None` when no admissible permutation has positive weight.
    pub fn sample<W>(&mut self, weight: W, u: f64) -> Option<PermutationDraw>
    where
        W: Fn(usize, usize) -> f64,
    {
        let total = self.normalization(&weight);
        if !(total > 0.0 && total.is_finite()) {
            return None;
        }
        self.reset_permutation();
        if self.size > 1 && !self.descend(&weight, u * total, 0, 0) {
            return None;
        }
        Some(PermutationDraw {
            permutation: self.permutation.clone(),
            total_weight: total,
        })
    }

    /// Permanent of `weight` over the admissible permutations.
    pub fn normalization<W>(&mut self, weight: W) -> f64
    where
        W: Fn(usize, usize) -> f64,
    {
        self.parity = !self.parity;
        self.reset_permutation();
        self.count(&weight, 0, 0)
    }

    fn reset_permutation(&mut self) {
        for (position, item) in self.permutation.iter_mut().enumerate() {
            *item = position;
        }
    }

    fn admissible(&self, position: usize, item: usize) -> bool {
        !self.skip_fixed_points || position != item
    }

    fn terminal<W>(&self, weight: &W, item: usize) -> f64
    where
        W: Fn(usize, usize) -> f64,
    {
        let last = self.size - 1;
        if self.admissible(last, item) {
            weight(last, item)
        } else {
            0.0
        }
    }

    fn count<W>(&mut self, weight: &W, level: usize, mask: usize) -> f64
    where
        W: Fn(usize, usize) -> f64,
    {
        let last = self.size - 1;
        if level == last {
            return self.terminal(weight, self.permutation[last]);
        }
        let entry = self.cache[mask];
        if entry.parity == self.parity {
            return entry.value;
        }
        let mut total = 0.0;
        for i in level..self.size {
            self.permutation.swap(i, level);
            let item = self.permutation[level];
            if self.admissible(level, item) {
                total += weight(level, item) * self.count(weight, level + 1, mask | (1 << item));
            }
            self.permutation.swap(i, level);
        }
        self.cache[mask] = CacheEntry {
            value: total,
            parity: self.parity,
        };
        total
    }

    /// Weight of assigning `permutation[i]` to `level` times the completions.
    fn candidate_value<W>(&self, weight: &W, level: usize, i: usize, mask: usize) -> (f64, f64)
    where
        W: Fn(usize, usize) -> f64,
    {
        let last = self.size - 1;
        let item = self.permutation[i];
        if !self.admissible(level, item) {
            return (0.0, 0.0);
        }
        let own = weight(level, item);
        let completions = if level + 1 < last {
            self.cache[mask | (1 << item)].value
        } else {
            // Two items remain; the other one lands on the last position.
            let other = if i == level {
                self.permutation[last]
            } else {
                self.permutation[level]
            };
            self.terminal(weight, other)
        };
        (own, own * completions)
    }

    fn descend<W>(&mut self, weight: &W, mut target: f64, level: usize, mask: usize) -> bool
    where
        W: Fn(usize, usize) -> f64,
    {
        let last = self.size - 1;
        // (index, own weight, target left for the subtree)
        let mut chosen: Option<(usize, f64, f64)> = None;
        for i in level..self.size {
            let (own, value) = self.candidate_value(weight, level, i, mask);
            if !(value > 0.0) {
                continue;
            }
            chosen = Some((i, own, target.min(value)));
            if target <= value {
                break;
            }
            target -= value;
        }
        // Rounding can leave `target` above the last positive candidate; that candidate is kept.
        let Some((i, own, left)) = chosen else {
            return false;
        };
        self.permutation.swap(i, level);
        let item = self.permutation[level];
        if level + 1 < last {
            return self.descend(weight, left / own, level + 1, mask | (1 << item));
        }
        true
    }
}

use rex_core::{Integrand, UniformSource};

use super::{ExchangeAction, ExchangeCounters, ReplicaView};

/// Draws a partner for `chain` proportionally to the pair weight
/// `d(x_chain, β_other)·d(x_other, β_chain)` and accepts the swap with the
/// ratio of the weight sums before and after the hypothetical swap.
///
/// The self pair stays in both sums; drawing it means no move.
pub(crate) fn attempt<I, C>(
    chain: usize,
    view: &ReplicaView<'_, I>,
    counters: &mut [ExchangeCounters],
    rng: &mut C,
) -> Option<ExchangeAction>
where
    I: Integrand + ?Sized,
    C: UniformSource + ?Sized,
{
    let n = view.len();
    counters[chain].attempts += 1;

    let mut cumulative = Vec::with_capacity(n);
    let mut sum = 0.0;
    for other in (0..n).rev() {
        sum += view.cross(chain, other) * view.cross(other, chain);
        cumulative.push((other, sum));
    }
    let target = rng.draw() * sum;
    let selected = cumulative
        .iter()
        .find(|&&(_, cumulated)| cumulated > target)
        .map_or(n - 1, |&(other, _)| other);
    if selected == chain {
        return None;
    }

    let swapped_sum: f64 = (0..n)
        .rev()
        .map(|other| {
            if other == chain {
                view.cross(selected, other) * view.cross(selected, chain)
            } else if other == selected {
                view.cross(selected, selected) * view.cross(chain, chain)
            } else {
                view.cross(selected, other) * view.cross(other, chain)
            }
        })
        .sum();
    let acceptance = if swapped_sum > 0.0 {
        sum / swapped_sum
    } else {
        1.0
    };
    if rng.draw() < acceptance {
        counters[chain].accepted += 1;
        Some(ExchangeAction::Swap(chain, selected))
    } else {
        None
    }
}

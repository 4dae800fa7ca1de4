use rex_core::{ErrorInfo, RexError};

use crate::config::{LadderConfig, LadderPolicy};

/// Builds the temperature ladder described by `config`.
///
/// The result is validated with [`validate_ladder`].
pub fn build_ladder(config: &LadderConfig) -> Result<Vec<f64>, RexError> {
    let ladder = match &config.policy {
        LadderPolicy::Geometric {
            replicas,
            max_temperature,
        } => match *replicas {
            0 => Vec::new(),
            1 => vec![1.0],
            n => (0..n)
                .map(|i| max_temperature.powf(i as f64 / (n - 1) as f64))
                .collect(),
        },
        LadderPolicy::Manual { temperatures } => temperatures.clone(),
    };
    validate_ladder(&ladder)?;
    Ok(ladder)
}

/// Checks that `temperatures` is non-empty, finite, ascending and starts at 1.0.
pub fn validate_ladder(temperatures: &[f64]) -> Result<(), RexError> {
    let Some(&first) = temperatures.first() else {
        return Err(RexError::config(
            "empty-ladder",
            "the temperature ladder needs at least one temperature",
        ));
    };
    if let Some((index, t)) = temperatures
        .iter()
        .enumerate()
        .find(|(_, t)| !(t.is_finite() && **t > 0.0))
    {
        return Err(RexError::Config(
            ErrorInfo::new("invalid-temperature", "temperatures must be finite and positive")
                .with_context("index", index.to_string())
                .with_context("temperature", t.to_string()),
        ));
    }
    if first != 1.0 {
        return Err(RexError::Config(
            ErrorInfo::new("ladder-base", "the first temperature must be exactly 1.0")
                .with_context("temperature", first.to_string()),
        ));
    }
    if let Some(index) = temperatures.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(RexError::Config(
            ErrorInfo::new("unsorted-ladder", "temperatures must be sorted ascending")
                .with_context("index", (index + 1).to_string())
                .with_hint("sort the ladder; chain 0 samples the untempered target"),
        ));
    }
    Ok(())
}

/// Metropolis acceptance of a candidate with density `proposed` against `current`.
///
/// A chain sitting on zero density accepts anything.
pub fn metropolis_acceptance(current: f64, proposed: f64) -> f64 {
    if current > 0.0 {
        (proposed / current).min(1.0)
    } else {
        1.0
    }
}

/// Acceptance of exchanging states `a` and `b` between two temperatures.
///
/// Arguments are tempered densities: `a_at_a` is state `a` at its own chain's
/// temperature, `a_at_b` the same state at the other chain's temperature.
/// Returns `min(1, (a_at_b / a_at_a) · (b_at_a / b_at_b))`; a zero denominator
/// accepts.
pub fn swap_acceptance(a_at_a: f64, a_at_b: f64, b_at_a: f64, b_at_b: f64) -> f64 {
    if a_at_a > 0.0 && b_at_b > 0.0 {
        ((a_at_b / a_at_a) * (b_at_a / b_at_b)).min(1.0)
    } else {
        1.0
    }
}

use std::f64::consts::PI;

use rex_core::{Gaussian2D, GaussianMixture, Integrand, ProductGaussian};
use rex_mcmc::config::{
    EngineOptions, ExchangeConfig, LevelJumpMode, PermutationPolicy, RingLevels,
};
use rex_mcmc::engine::ReplicaExchange;
use rex_mcmc::sampler::SamplePoint;

const VARIANCE: f64 = 0.01;

fn centred_gaussian() -> GaussianMixture {
    let block = Gaussian2D::new([0.5, 0.5], [VARIANCE, VARIANCE], 0.0).unwrap();
    GaussianMixture::new(vec![ProductGaussian::new(vec![block]).unwrap()], &[1.0]).unwrap()
}

/// `∫ f²` for an isotropic 2-D normal, the expected density under its own law.
fn closed_form_second_moment() -> f64 {
    1.0 / (4.0 * PI * VARIANCE)
}

fn options() -> EngineOptions {
    EngineOptions {
        burn_in: 2_000,
        ..EngineOptions::default()
    }
}

fn mean_density(samples: &[SamplePoint]) -> f64 {
    samples.iter().map(|s| s.density).sum::<f64>() / samples.len() as f64
}

fn assert_close_to_reference(samples: &[SamplePoint], tolerance: f64, label: &str) {
    let estimate = mean_density(samples);
    let reference = closed_form_second_moment();
    let relative = (estimate / reference - 1.0).abs();
    assert!(
        relative < tolerance,
        "{label}: estimate {estimate}, reference {reference}"
    );
}

#[test]
fn two_chain_ladder_recovers_second_moment() {
    let mut engine = ReplicaExchange::new(
        centred_gaussian(),
        &[1.0, 4.0],
        &ExchangeConfig::Pairwise,
        options(),
        7,
    )
    .unwrap();
    let samples = engine.run(5_000).unwrap();
    assert_eq!(samples.len(), 5_000);
    assert!(samples
        .iter()
        .all(|s| s.state.iter().all(|x| (0.0..1.0).contains(x))));
    assert_close_to_reference(&samples, 0.2, "pairwise");
}

#[test]
fn every_strategy_samples_the_target() {
    let strategies = [
        ExchangeConfig::Pairwise,
        ExchangeConfig::LevelJump {
            rings: 8,
            mode: LevelJumpMode::Original,
        },
        ExchangeConfig::LevelJump {
            rings: 8,
            mode: LevelJumpMode::FrequentFallback,
        },
        ExchangeConfig::RingJump {
            rings: 8,
            jump_probability: 0.1,
            levels: RingLevels::Adaptive,
        },
        ExchangeConfig::RingJump {
            rings: 8,
            jump_probability: 0.1,
            levels: RingLevels::Fixed,
        },
        ExchangeConfig::Permutations {
            policy: PermutationPolicy::All,
        },
        ExchangeConfig::Permutations {
            policy: PermutationPolicy::NonIdentity,
        },
        ExchangeConfig::SampledSwaps,
    ];
    for exchange in strategies {
        let mut engine = ReplicaExchange::new(
            centred_gaussian(),
            &[1.0, 2.0, 4.0, 8.0],
            &exchange,
            options(),
            99,
        )
        .unwrap();
        let samples = engine.run(6_000).unwrap();
        assert_close_to_reference(&samples, 0.25, &exchange.name());

        let stats = engine.stats();
        assert_eq!(stats.chains.len(), 4);
        for chain in &stats.chains {
            let rate = chain.acceptance_rate.unwrap();
            assert!((0.0..=1.0).contains(&rate));
            assert!(chain.mutation_scale > 0.0 && chain.mutation_scale < 1.0);
            assert!(chain.exchanges <= chain.exchange_attempts);
            if let Some(rate) = chain.exchange_rate {
                assert!((0.0..=1.0).contains(&rate));
            }
        }
    }
}

#[test]
fn exchanges_are_attempted_and_accepted() {
    let mut engine = ReplicaExchange::new(
        centred_gaussian(),
        &[1.0, 1.5, 2.25],
        &ExchangeConfig::Pairwise,
        options(),
        3,
    )
    .unwrap();
    engine.run(1_000).unwrap();
    let stats = engine.stats();
    let sweeps = 3_000;
    // Adjacent pairs: the middle chain joins both swaps of every sweep.
    assert_eq!(stats.chains[0].exchange_attempts, sweeps);
    assert_eq!(stats.chains[1].exchange_attempts, 2 * sweeps);
    assert!(stats.chains[0].exchanges > 0);
}

#[test]
fn level_jump_reports_move_counts() {
    let mut engine = ReplicaExchange::new(
        centred_gaussian(),
        &[1.0, 1.2, 1.4],
        &ExchangeConfig::LevelJump {
            rings: 4,
            mode: LevelJumpMode::Original,
        },
        options(),
        5,
    )
    .unwrap();
    engine.run(500).unwrap();
    let moves = engine.stats().moves.unwrap();
    assert_eq!(moves.attempted, 2_500);
    assert!(moves.possible > 0 && moves.possible <= moves.attempted);
}

#[test]
fn ring_jump_reports_ring_populations() {
    let mut engine = ReplicaExchange::new(
        centred_gaussian(),
        &[1.0, 3.0],
        &ExchangeConfig::RingJump {
            rings: 4,
            jump_probability: 0.5,
            levels: RingLevels::Adaptive,
        },
        options(),
        5,
    )
    .unwrap();
    engine.run(100).unwrap();
    let stats = engine.stats();
    for chain in &stats.chains {
        let sizes = chain.ring_sizes.as_ref().unwrap();
        assert_eq!(sizes.len(), 4);
        // Each chain stores the other chain's state once per iteration.
        assert_eq!(sizes.iter().sum::<usize>(), 2_100);
    }
}

#[test]
fn samples_report_untempered_density() {
    let integrand = centred_gaussian();
    let mut engine = ReplicaExchange::new(
        integrand.clone(),
        &[1.0, 2.0],
        &ExchangeConfig::SampledSwaps,
        options(),
        1,
    )
    .unwrap();
    for sample in engine.run(200).unwrap() {
        assert_eq!(sample.density, integrand.density(&sample.state, 1.0));
        assert!(sample.density > 0.0);
    }
}

use rex_core::{Gaussian2D, GaussianMixture, Integrand, ProductGaussian, RexError};
use rex_mcmc::config::{
    from_yaml_str, AlgorithmConfig, BaselineConfig, EngineOptions, ExchangeConfig, LadderConfig,
    LadderPolicy, LevelJumpMode, PermutationPolicy, RingLevels,
};
use rex_mcmc::engine::ReplicaExchange;
use rex_mcmc::tempering::{build_ladder, metropolis_acceptance, swap_acceptance};

fn gaussian() -> GaussianMixture {
    let block = Gaussian2D::new([0.5, 0.5], [0.01, 0.01], 0.0).unwrap();
    GaussianMixture::new(vec![ProductGaussian::new(vec![block]).unwrap()], &[1.0]).unwrap()
}

fn build_error(temperatures: &[f64], exchange: &ExchangeConfig) -> RexError {
    ReplicaExchange::new(gaussian(), temperatures, exchange, EngineOptions::default(), 0)
        .unwrap_err()
}

#[derive(Debug)]
struct Empty;

impl Integrand for Empty {
    fn dimension(&self) -> usize {
        2
    }

    fn density(&self, _state: &[f64], _beta: f64) -> f64 {
        0.0
    }

    fn max_density(&self, _beta: f64) -> f64 {
        1.0
    }
}

#[test]
fn malformed_ladders_fail_fast() {
    let pairwise = ExchangeConfig::Pairwise;
    assert_eq!(build_error(&[], &pairwise).info().code, "empty-ladder");
    assert_eq!(build_error(&[1.0, 4.0, 2.0], &pairwise).info().code, "unsorted-ladder");
    assert_eq!(build_error(&[2.0, 4.0], &pairwise).info().code, "ladder-base");
    assert_eq!(build_error(&[1.0, f64::NAN], &pairwise).info().code, "invalid-temperature");
    assert!(matches!(build_error(&[], &pairwise), RexError::Config(_)));
}

#[test]
fn strategy_parameters_are_validated() {
    let ladder = [1.0, 2.0];
    let zero_rings = ExchangeConfig::RingJump {
        rings: 0,
        jump_probability: 0.1,
        levels: RingLevels::Adaptive,
    };
    assert_eq!(build_error(&ladder, &zero_rings).info().code, "ring-count");
    let zero_levels = ExchangeConfig::LevelJump {
        rings: 0,
        mode: LevelJumpMode::Original,
    };
    assert_eq!(build_error(&ladder, &zero_levels).info().code, "ring-count");
    let bad_probability = ExchangeConfig::RingJump {
        rings: 4,
        jump_probability: 1.5,
        levels: RingLevels::Fixed,
    };
    assert_eq!(build_error(&ladder, &bad_probability).info().code, "jump-probability");
    let permutations = ExchangeConfig::Permutations {
        policy: PermutationPolicy::All,
    };
    let too_many: Vec<f64> = (0..21).map(|i| 1.0 + i as f64).collect();
    assert_eq!(build_error(&too_many, &permutations).info().code, "permutation-capacity");
}

#[test]
fn single_chain_permutation_exchange_is_skipped() {
    let permutations = ExchangeConfig::Permutations {
        policy: PermutationPolicy::NonIdentity,
    };
    let options = EngineOptions {
        burn_in: 50,
        ..EngineOptions::default()
    };
    let mut engine = ReplicaExchange::new(gaussian(), &[1.0], &permutations, options, 4).unwrap();
    assert_eq!(engine.run(100).unwrap().len(), 100);
    let stats = engine.stats();
    assert_eq!(stats.chains.len(), 1);
    assert_eq!(stats.chains[0].exchange_attempts, 0);
    assert_eq!(stats.chains[0].exchange_rate, None);
}

#[test]
fn engine_options_are_validated() {
    let options = EngineOptions {
        goal_acceptance: 0.0,
        ..EngineOptions::default()
    };
    let err = ReplicaExchange::new(gaussian(), &[1.0], &ExchangeConfig::Pairwise, options, 0)
        .unwrap_err();
    assert_eq!(err.info().code, "goal-acceptance");
    let options = EngineOptions {
        independent_period: 0,
        ..EngineOptions::default()
    };
    let err = ReplicaExchange::new(gaussian(), &[1.0], &ExchangeConfig::Pairwise, options, 0)
        .unwrap_err();
    assert_eq!(err.info().code, "independent-period");
}

#[test]
fn zero_density_everywhere_is_a_numeric_error() {
    let options = EngineOptions {
        max_initial_draws: 50,
        ..EngineOptions::default()
    };
    let mut engine =
        ReplicaExchange::new(Empty, &[1.0, 2.0], &ExchangeConfig::Pairwise, options, 0).unwrap();
    let err = engine.run(10).unwrap_err();
    assert!(matches!(err, RexError::Numeric(_)));
    assert_eq!(err.info().code, "degenerate-start");
    assert_eq!(err.info().context.get("chain").map(String::as_str), Some("0"));
    assert_eq!(err.info().context.get("draws").map(String::as_str), Some("50"));
}

#[test]
fn geometric_ladder_spans_one_to_max() {
    let ladder = build_ladder(&LadderConfig::default()).unwrap();
    assert_eq!(ladder.len(), 8);
    assert_eq!(ladder[0], 1.0);
    assert!((ladder[7] - 2500.0).abs() < 1e-9);
    assert!(ladder.windows(2).all(|pair| pair[0] < pair[1]));

    let single = LadderConfig {
        policy: LadderPolicy::Geometric {
            replicas: 1,
            max_temperature: 10.0,
        },
    };
    assert_eq!(build_ladder(&single).unwrap(), vec![1.0]);
}

#[test]
fn acceptance_helpers_escape_zero_density() {
    assert_eq!(metropolis_acceptance(0.0, 0.0), 1.0);
    assert_eq!(metropolis_acceptance(2.0, 1.0), 0.5);
    assert_eq!(metropolis_acceptance(1.0, 3.0), 1.0);
    assert_eq!(swap_acceptance(0.0, 1.0, 1.0, 1.0), 1.0);
    assert!((swap_acceptance(4.0, 2.0, 1.0, 2.0) - 0.25).abs() < 1e-12);
}

#[test]
fn yaml_configuration_round_trips() {
    let text = r#"
- type: uniform
- type: parallel-tempering
- type: level-jump
  mode: frequent-fallback
- type: ring-jump
  rings: 12
  levels: fixed
- type: permutations
  policy: non-identity
- type: sampled-swaps
"#;
    let algorithms: Vec<AlgorithmConfig> = from_yaml_str(text).unwrap();
    assert_eq!(algorithms.len(), 6);
    assert_eq!(algorithms[0], AlgorithmConfig::Baseline(BaselineConfig::Uniform));
    assert_eq!(
        algorithms[2],
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::LevelJump {
            rings: 8,
            mode: LevelJumpMode::FrequentFallback,
        })
    );
    assert_eq!(
        algorithms[3],
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::RingJump {
            rings: 12,
            jump_probability: 0.1,
            levels: RingLevels::Fixed,
        })
    );
    assert_eq!(algorithms[0].exchange(), None);
    assert_eq!(algorithms[1].exchange(), Some(&ExchangeConfig::Pairwise));
    assert_eq!(algorithms[1].name(), "parallel-tempering");
    assert_eq!(algorithms[2].name(), "level-jump-fallback[8]");

    let pairwise: AlgorithmConfig = from_yaml_str("type: pairwise").unwrap();
    assert_eq!(pairwise, algorithms[1]);

    let json = serde_json::to_string(&algorithms).unwrap();
    let back: Vec<AlgorithmConfig> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, algorithms);

    let options: EngineOptions = from_yaml_str("burn_in: 50").unwrap();
    assert_eq!(options.burn_in, 50);
    assert_eq!(options.independent_period, 3);
}

#[test]
fn invalid_yaml_is_a_serde_error() {
    let err = from_yaml_str::<AlgorithmConfig>("type: annealing").unwrap_err();
    assert!(matches!(err, RexError::Serde(_)));
    assert_eq!(err.info().code, "yaml-parse");
}

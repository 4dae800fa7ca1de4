use rex_core::{random_mixture, Integrand, MixtureSpec, RexError};
use rex_mcmc::analysis::{
    run_suite, AlgorithmReport, ReferenceMoments, RunReport, RunStatistics, SuitePlan,
};
use rex_mcmc::baseline::{HaltonSampler, UniformSampler};
use rex_mcmc::config::{AlgorithmConfig, BaselineConfig, EngineOptions, ExchangeConfig};
use rex_mcmc::sampler::Sampler;
use rex_mcmc::sequence::{halton_point, radical_inverse};

fn reference(first: f64, second: f64) -> ReferenceMoments {
    ReferenceMoments {
        first,
        second,
        points: 1,
    }
}

#[test]
fn radical_inverse_mirrors_digits() {
    assert_eq!(radical_inverse(0, 2), 0.0);
    assert_eq!(radical_inverse(1, 2), 0.5);
    assert_eq!(radical_inverse(2, 2), 0.25);
    assert_eq!(radical_inverse(3, 2), 0.75);
    assert!((radical_inverse(5, 3) - (2.0 / 3.0 + 1.0 / 9.0)).abs() < 1e-12);
    assert_eq!(halton_point(1, 3), vec![0.5, 1.0 / 3.0, 0.2]);
}

#[test]
fn run_statistics_follow_the_report_formulas() {
    let mut stats = RunStatistics::new(3);
    stats.add(2.0, 1.0, Some(0));
    stats.add(4.0, 2.0, Some(0));
    stats.add(0.0, 1.0, Some(1));
    stats.add(1.0, 1.0, Some(2));
    assert_eq!(stats.sample_count(), 4);
    assert_eq!(stats.mode_hits(), &[2, 0, 1]);
    assert_eq!(stats.modes_hit(), 2);
    // (4 + 8 + 0 + 1) / 4
    assert!((stats.second_moment() - 3.25).abs() < 1e-12);

    let report = stats.report(&reference(1.0, 2.5));
    assert!((report.second_moment_diff_pct - 30.0).abs() < 1e-9);
    assert!((report.modes_missed_pct - 100.0 / 3.0).abs() < 1e-9);
    assert!((report.modes_diff_pct - 50.0).abs() < 1e-9);
}

#[test]
fn algorithm_report_aggregates_best_average_worst() {
    let runs = vec![
        RunReport {
            second_moment_diff_pct: 10.0,
            modes_missed_pct: 0.0,
            modes_diff_pct: 5.0,
        },
        RunReport {
            second_moment_diff_pct: 30.0,
            modes_missed_pct: 50.0,
            modes_diff_pct: 1.0,
        },
    ];
    let report = AlgorithmReport::from_runs("demo".to_string(), runs, None);
    assert_eq!(report.best.second_moment_diff_pct, 10.0);
    assert_eq!(report.worst.second_moment_diff_pct, 30.0);
    assert_eq!(report.average.second_moment_diff_pct, 20.0);
    assert_eq!(report.best.modes_diff_pct, 1.0);
    assert_eq!(report.worst.modes_missed_pct, 50.0);
    assert_eq!(report.average.modes_missed_pct, 25.0);
    assert_eq!(report.runs.len(), 2);
}

#[test]
fn baselines_produce_normalized_points() {
    let mut uniform = UniformSampler::new(4, 1);
    assert!(uniform.normalized());
    let points = uniform.run(100).unwrap();
    assert!(points.iter().all(|p| p.density == 1.0 && p.state.len() == 4));

    let mut halton = HaltonSampler::new(2, 0).unwrap();
    let first = halton.run(4).unwrap();
    let second = halton.run(4).unwrap();
    assert_eq!(first[1].state, vec![0.5, 1.0 / 3.0]);
    assert_eq!(second[0].state, halton_point(4, 2));
    assert_eq!(HaltonSampler::new(19, 0).unwrap_err().info().code, "dimension");
}

#[test]
fn reference_moments_of_a_flat_mixture() {
    let spec = MixtureSpec {
        components: 4,
        avg_scale: 0.01,
        diff_scale: 1.0,
        ..MixtureSpec::default()
    };
    let mixture = random_mixture(2, &spec).unwrap();
    let moments = ReferenceMoments::estimate(&mixture, 20_000).unwrap();
    // Most of the mass sits inside the cube.
    assert!(moments.first > 0.7 && moments.first < 1.05, "{moments:?}");
    assert!(moments.second > moments.first);
}

struct Vacuum;

impl Integrand for Vacuum {
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
fn vanishing_reference_is_a_numeric_error() {
    let err = ReferenceMoments::estimate(&Vacuum, 100).unwrap_err();
    assert!(matches!(err, RexError::Numeric(_)));
    assert_eq!(err.info().code, "degenerate-reference");
    assert_eq!(err.info().context.get("points").map(String::as_str), Some("100"));
    assert!(err.info().hint.is_some());
}

#[test]
fn suite_runs_every_algorithm() {
    let spec = MixtureSpec {
        components: 4,
        avg_scale: 0.005,
        diff_scale: 2.0,
        ..MixtureSpec::default()
    };
    let mixture = random_mixture(2, &spec).unwrap();
    let reference = ReferenceMoments::estimate(&mixture, 50_000).unwrap();
    let algorithms = vec![
        AlgorithmConfig::Baseline(BaselineConfig::Uniform),
        AlgorithmConfig::Baseline(BaselineConfig::Halton),
        AlgorithmConfig::Baseline(BaselineConfig::MetropolisHastings),
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::Pairwise),
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::SampledSwaps),
    ];
    let plan = SuitePlan {
        temperatures: vec![1.0, 3.0, 9.0],
        engine: EngineOptions {
            burn_in: 200,
            ..EngineOptions::default()
        },
        master_seed: 77,
        runs: 2,
        samples_per_run: 2_000,
    };
    let reports = run_suite(&mixture, &reference, &algorithms, &plan).unwrap();
    assert_eq!(reports.len(), algorithms.len());
    let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["uniform", "halton", "metropolis-hastings", "parallel-tempering", "sampled-swaps"]
    );
    for report in &reports {
        assert_eq!(report.runs.len(), 2);
        assert!(report.best.second_moment_diff_pct <= report.worst.second_moment_diff_pct);
        assert!(report.average.modes_missed_pct <= 100.0);
    }
    assert!(reports[0].chain_stats.is_none());
    assert!(reports[3].chain_stats.is_some());

    let again = run_suite(&mixture, &reference, &algorithms, &plan).unwrap();
    assert_eq!(reports, again);
}

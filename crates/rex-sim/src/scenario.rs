use std::error::Error;
use std::fs;
use std::path::Path;

use rex_core::MixtureSpec;
use rex_mcmc::{
    from_yaml_str, AlgorithmConfig, BaselineConfig, EngineOptions, ExchangeConfig, LadderConfig,
    SeedPolicy,
};
use serde::{Deserialize, Serialize};

/// Everything a comparison run needs, loaded from one YAML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Dimension of the mixture target; must be even.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Shape and seed of the random Gaussian mixture.
    #[serde(default)]
    pub mixture: MixtureSpec,
    /// Temperature ladder shared by the replica-exchange entries.
    #[serde(default)]
    pub ladder: LadderConfig,
    /// Burn-in, adaptation and proposal options of every chain.
    #[serde(default)]
    pub engine: EngineOptions,
    /// Master seed and label recorded in the report.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Runs per algorithm.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Samples collected per run.
    #[serde(default = "default_samples_per_run")]
    pub samples_per_run: usize,
    /// Halton points used for the reference moments.
    #[serde(default = "default_reference_points")]
    pub reference_points: usize,
    /// Algorithms compared, in report order.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<AlgorithmConfig>,
}

fn default_dimension() -> usize {
    2
}

fn default_runs() -> usize {
    10
}

fn default_samples_per_run() -> usize {
    100_000
}

fn default_reference_points() -> usize {
    1_000_000
}

fn default_algorithms() -> Vec<AlgorithmConfig> {
    vec![
        AlgorithmConfig::Baseline(BaselineConfig::Uniform),
        AlgorithmConfig::Baseline(BaselineConfig::Halton),
        AlgorithmConfig::Baseline(BaselineConfig::MetropolisHastings),
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::Pairwise),
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::RingJump {
            rings: 16,
            jump_probability: 0.1,
            levels: Default::default(),
        }),
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::Permutations {
            policy: Default::default(),
        }),
        AlgorithmConfig::ReplicaExchange(ExchangeConfig::SampledSwaps),
    ]
}

/// Reads and parses the scenario at `path`.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let scenario: ScenarioConfig = from_yaml_str(&contents)?;
    Ok(scenario)
}

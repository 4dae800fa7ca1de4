use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use rex_core::{ErrorInfo, RexError};

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded alongside reports.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Temperature ladder construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LadderConfig {
    /// Policy used to generate the temperatures.
    #[serde(default)]
    pub policy: LadderPolicy,
}

/// Supported ladder construction strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LadderPolicy {
    /// `replicas` temperatures `max^(i/(replicas-1))` from 1.0 up to `max_temperature`.
    Geometric {
        /// Number of replicas in the ladder.
        #[serde(default = "default_replicas")]
        replicas: usize,
        /// Temperature of the hottest replica.
        #[serde(default = "default_max_temperature")]
        max_temperature: f64,
    },
    /// Explicit ascending list of temperatures starting at 1.0.
    Manual {
        /// Ordered list of temperatures assigned to replicas.
        temperatures: Vec<f64>,
    },
}

fn default_replicas() -> usize {
    8
}

fn default_max_temperature() -> f64 {
    2500.0
}

impl Default for LadderPolicy {
    fn default() -> Self {
        LadderPolicy::Geometric {
            replicas: default_replicas(),
            max_temperature: default_max_temperature(),
        }
    }
}

/// Knobs shared by every chain-based sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Iterations discarded before samples are recorded.
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,
    /// Acceptance rate the local mutation scale is steered toward.
    #[serde(default = "default_goal_acceptance")]
    pub goal_acceptance: f64,
    /// Every `independent_period`-th iteration proposes a uniform point instead of a local move.
    #[serde(default = "default_independent_period")]
    pub independent_period: usize,
    /// Uniform draws allowed per chain to find a start with positive density.
    #[serde(default = "default_max_initial_draws")]
    pub max_initial_draws: usize,
}

fn default_burn_in() -> usize {
    1000
}

fn default_goal_acceptance() -> f64 {
    0.3
}

fn default_independent_period() -> usize {
    3
}

fn default_max_initial_draws() -> usize {
    1_000_000
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            burn_in: default_burn_in(),
            goal_acceptance: default_goal_acceptance(),
            independent_period: default_independent_period(),
            max_initial_draws: default_max_initial_draws(),
        }
    }
}

impl EngineOptions {
    /// Rejects option combinations the samplers cannot honour.
    pub fn validate(&self) -> Result<(), RexError> {
        if !(self.goal_acceptance > 0.0 && self.goal_acceptance < 1.0) {
            return Err(RexError::Config(
                ErrorInfo::new("goal-acceptance", "goal acceptance must lie in (0, 1)")
                    .with_context("goal_acceptance", self.goal_acceptance.to_string()),
            ));
        }
        if self.independent_period == 0 {
            return Err(RexError::config(
                "independent-period",
                "independent proposal period must be positive",
            ));
        }
        if self.max_initial_draws == 0 {
            return Err(RexError::config(
                "initial-draws",
                "at least one initial draw is required",
            ));
        }
        Ok(())
    }
}

/// How ring-jump rings are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RingLevels {
    /// Boundaries precomputed from the maximum density.
    Fixed,
    /// Boundaries follow the observed population.
    #[default]
    Adaptive,
}

/// Variants of the level-based equi-energy swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LevelJumpMode {
    /// Once per sweep, two chains sharing a level of the β=1 schedule swap.
    #[default]
    Original,
    /// After every local move, the chain swaps with a chain sharing its own level.
    FrequentFallback,
}

/// Permutations admitted by the permutation exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PermutationPolicy {
    /// Every bijection; the draw is applied unconditionally.
    #[default]
    All,
    /// Derangements only, with a Metropolis-Hastings correction.
    NonIdentity,
}

/// Exchange strategy run by the replica-exchange engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExchangeConfig {
    /// Adjacent pairs attempt a tempered swap once per sweep.
    #[serde(rename = "parallel-tempering", alias = "pairwise")]
    Pairwise,
    /// Level-based equi-energy swap.
    LevelJump {
        /// Number of levels `R`.
        #[serde(default = "default_level_rings")]
        rings: usize,
        /// Sweep-level or per-chain variant.
        #[serde(default)]
        mode: LevelJumpMode,
    },
    /// Ring-based equi-energy jump.
    RingJump {
        /// Number of rings `R` per chain.
        #[serde(default = "default_jump_rings")]
        rings: usize,
        /// Probability that a chain attempts a jump after its local move.
        #[serde(default = "default_jump_probability")]
        jump_probability: f64,
        /// Ring bucketing mode.
        #[serde(default)]
        levels: RingLevels,
    },
    /// Exact weighted permutation of all states.
    Permutations {
        /// Admissible permutations.
        #[serde(default)]
        policy: PermutationPolicy,
    },
    /// Per-chain partner draw weighted by cross densities.
    SampledSwaps,
}

fn default_level_rings() -> usize {
    8
}

fn default_jump_rings() -> usize {
    16
}

fn default_jump_probability() -> f64 {
    0.1
}

impl ExchangeConfig {
    /// Short human readable name.
    pub fn name(&self) -> String {
        match self {
            ExchangeConfig::Pairwise => "parallel-tempering".to_string(),
            ExchangeConfig::LevelJump { rings, mode } => match mode {
                LevelJumpMode::Original => format!("level-jump[{rings}]"),
                LevelJumpMode::FrequentFallback => format!("level-jump-fallback[{rings}]"),
            },
            ExchangeConfig::RingJump {
                rings,
                jump_probability,
                levels,
            } => match levels {
                RingLevels::Fixed => format!("ring-jump-fixed[{rings}, p={jump_probability}]"),
                RingLevels::Adaptive => format!("ring-jump[{rings}, p={jump_probability}]"),
            },
            ExchangeConfig::Permutations { policy } => match policy {
                PermutationPolicy::All => "permutations-all".to_string(),
                PermutationPolicy::NonIdentity => "permutations-non-identity".to_string(),
            },
            ExchangeConfig::SampledSwaps => "sampled-swaps".to_string(),
        }
    }
}

/// Single-chain reference samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BaselineConfig {
    /// Independent uniform points.
    Uniform,
    /// Halton low-discrepancy points.
    Halton,
    /// Single adaptive Metropolis-Hastings chain.
    MetropolisHastings,
}

impl BaselineConfig {
    /// Short human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            BaselineConfig::Uniform => "uniform",
            BaselineConfig::Halton => "halton",
            BaselineConfig::MetropolisHastings => "metropolis-hastings",
        }
    }
}

/// One entry of a comparison suite.
///
/// Both kinds share the `type:` tag namespace, so a suite lists
/// `type: halton` next to `type: ring-jump`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlgorithmConfig {
    /// Single-chain sampler.
    Baseline(BaselineConfig),
    /// Replica-exchange engine with the given strategy.
    ReplicaExchange(ExchangeConfig),
}

impl AlgorithmConfig {
    /// Exchange strategy for replica-exchange entries, `None` for single-chain samplers.
    pub fn exchange(&self) -> Option<&ExchangeConfig> {
        match self {
            AlgorithmConfig::Baseline(_) => None,
            AlgorithmConfig::ReplicaExchange(exchange) => Some(exchange),
        }
    }

    /// Short human readable name.
    pub fn name(&self) -> String {
        match self {
            AlgorithmConfig::Baseline(baseline) => baseline.name().to_string(),
            AlgorithmConfig::ReplicaExchange(exchange) => exchange.name(),
        }
    }
}

/// Parses a YAML document into any configuration type of this crate.
pub fn from_yaml_str<T: DeserializeOwned>(text: &str) -> Result<T, RexError> {
    serde_yaml::from_str(text).map_err(|err| {
        RexError::Serde(
            ErrorInfo::new("yaml-parse", err.to_string())
                .with_hint("check the document against the configuration schema"),
        )
    })
}

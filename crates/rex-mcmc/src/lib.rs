#![deny(missing_docs)]

//! Replica-exchange MCMC over tempered chains on the unit cube.
//!
//! The [`engine::ReplicaExchange`] engine moves every chain with an adaptive
//! [`mutation::LocalMutation`] and then runs one of the exchange strategies in
//! [`exchange`]: adjacent tempered swaps, level or ring based equi-energy
//! jumps, exact permutation exchange, or sampled multi-way swaps. Baseline
//! samplers and the comparison suite live in [`baseline`] and [`analysis`].

/// Run statistics and the algorithm comparison suite.
pub mod analysis;
/// Uniform, Halton and single-chain Metropolis-Hastings samplers.
pub mod baseline;
/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Replica-exchange engine and its diagnostics.
pub mod engine;
/// Exchange strategies and the snapshot view they read.
pub mod exchange;
/// Double-ended priority queue backing the energy rings.
pub mod heap;
/// Adaptive local mutation controller.
pub mod mutation;
/// Exact weighted permutation sampler.
pub mod permutation;
/// Energy ring structure.
pub mod rings;
/// Sampler trait and retained sample type.
pub mod sampler;
/// Halton low-discrepancy sequence.
pub mod sequence;
/// Temperature ladder and acceptance helpers.
pub mod tempering;

pub use analysis::{
    build_sampler, run_suite, AlgorithmReport, ReferenceMoments, RunReport, RunStatistics,
    SuitePlan,
};
pub use baseline::{HaltonSampler, MetropolisHastings, UniformSampler};
pub use config::{
    from_yaml_str, AlgorithmConfig, BaselineConfig, EngineOptions, ExchangeConfig, LadderConfig,
    LadderPolicy, LevelJumpMode, PermutationPolicy, RingLevels, SeedPolicy,
};
pub use engine::{ChainStats, EngineStats, MoveCounts, ReplicaExchange};
pub use exchange::{ExchangeAction, ExchangeCounters, ExchangeStrategy, ReplicaView};
pub use heap::MinMaxHeap;
pub use mutation::{LocalMutation, MutationCounters};
pub use permutation::{PermutationDraw, PermutationSampler};
pub use rings::{EnergyRings, RingSample};
pub use sampler::{SamplePoint, Sampler};
pub use tempering::build_ladder;

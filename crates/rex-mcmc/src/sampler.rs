use rex_core::RexError;
use serde::{Deserialize, Serialize};

use crate::engine::EngineStats;

/// One retained draw: the state and the untempered density reported for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// Point of the unit cube.
    pub state: Vec<f64>,
    /// Density attached to the point, `1.0` for normalized samplers.
    pub density: f64,
}

/// Common surface of every sampler compared by the suite.
pub trait Sampler {
    /// Human readable name used in reports.
    fn name(&self) -> String;

    /// Whether [`SamplePoint::density`] is a normalized pdf of the draw.
    ///
    /// Markov chain samplers report the unnormalized target density instead.
    fn normalized(&self) -> bool;

    /// Produces `sample_count` points, restarting from a fresh state.
    fn run(&mut self, sample_count: usize) -> Result<Vec<SamplePoint>, RexError>;

    /// Diagnostics of the last run, if the sampler keeps any.
    fn stats(&self) -> Option<EngineStats> {
        None
    }
}

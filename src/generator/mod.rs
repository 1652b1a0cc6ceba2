//! Random structured-CFG generation.
//!
//! The generator grows a CFG by recursive construct expansion (selections,
//! switches, loops, basic blocks), then optionally decorates loop bodies
//! with break/continue rewrites. A single seed fully determines the result:
//! depth, construct choices, switch arities, fallthrough draws,
//! merge-sharing draws, and break/continue placement.

mod batch;
mod config;
mod decorate;
mod directions;
mod expand;

pub use batch::{generate_batch, BatchResult};
pub use config::{Construct, GeneratorConfig};
pub use directions::{sample_direction_set, sample_directions, MAX_DIRECTIONS};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cfg::StructuredCfg;
use crate::error::GenerateError;

/// Where generator configurations come from in a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CfgSource {
    /// One full-featured configuration for every graph.
    Random,
    /// A fresh uniformly sampled feature subset per graph (swarm testing).
    Swarm,
}

impl std::str::FromStr for CfgSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "random" => Ok(CfgSource::Random),
            "swarm" => Ok(CfgSource::Swarm),
            other => Err(format!(
                "invalid cfg source: {other}. Choose from: random, swarm"
            )),
        }
    }
}

impl std::fmt::Display for CfgSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CfgSource::Random => "random",
            CfgSource::Swarm => "swarm",
        })
    }
}

/// Generates structured CFGs from a [`GeneratorConfig`].
#[derive(Debug, Clone)]
pub struct CfgGenerator {
    config: GeneratorConfig,
}

impl CfgGenerator {
    /// Create a generator with the given configuration.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        CfgGenerator { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one CFG from a seed: expansion to `depth`, then
    /// break/continue decoration.
    ///
    /// # Errors
    ///
    /// Fails when the configuration enables no construct, or on an internal
    /// CFG-mutation error (a generator bug).
    pub fn generate(&self, seed: u64, depth: usize) -> Result<StructuredCfg, GenerateError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate_with_rng(&mut rng, depth)
    }

    /// Generate one CFG drawing from an existing RNG stream.
    ///
    /// # Errors
    ///
    /// Same conditions as [`CfgGenerator::generate`].
    pub fn generate_with_rng(
        &self,
        rng: &mut StdRng,
        depth: usize,
    ) -> Result<StructuredCfg, GenerateError> {
        let mut cfg = expand::Expansion::new(&self.config).run(rng, depth)?;
        decorate::decorate(&mut cfg, &self.config, rng)?;
        Ok(cfg)
    }
}

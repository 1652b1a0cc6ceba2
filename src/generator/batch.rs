//! Batch generation with hash deduplication.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::cfg::StructuredCfg;
use crate::error::GenerateError;
use crate::lang::Language;

use super::{CfgGenerator, CfgSource};

/// Budget per graph: after this long without a new distinct CFG the batch
/// returns what it has.
const GRAPH_BUDGET: Duration = Duration::from_secs(5);

/// The outcome of a batch run.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// The distinct CFGs, in generation order.
    pub cfgs: Vec<StructuredCfg>,
    /// Whether the budget expired before `count` graphs were found.
    pub timed_out: bool,
}

/// Generate up to `count` distinct CFGs.
///
/// A master RNG seeded with `seed` derives one fresh sub-seed per attempt,
/// so the whole batch is a deterministic function of `seed` (up to the time
/// budget). Duplicate CFGs are rejected by hash.
///
/// # Errors
///
/// Propagates generator failures other than the (non-fatal) per-graph
/// timeout, which ends the batch early with `timed_out` set.
pub fn generate_batch(
    seed: u64,
    count: usize,
    source: CfgSource,
    language: Language,
    min_depth: usize,
    max_depth: usize,
) -> Result<BatchResult, GenerateError> {
    let mut master = StdRng::seed_from_u64(seed);
    let mut seen: HashSet<u64> = HashSet::new();
    let mut cfgs: Vec<StructuredCfg> = Vec::new();

    for index in 0..count {
        let started = Instant::now();
        loop {
            if started.elapsed() > GRAPH_BUDGET {
                warn!(
                    graph = index,
                    collected = cfgs.len(),
                    "aborted graph generation (no new distinct CFG within {}s)",
                    GRAPH_BUDGET.as_secs()
                );
                return Ok(BatchResult {
                    cfgs,
                    timed_out: true,
                });
            }

            let sub_seed: u64 = master.gen();
            let cfg = generate_one(sub_seed, source, language, min_depth, max_depth)?;
            if seen.insert(cfg_hash(&cfg)) {
                cfgs.push(cfg);
                break;
            }
        }
    }

    Ok(BatchResult {
        cfgs,
        timed_out: false,
    })
}

fn generate_one(
    seed: u64,
    source: CfgSource,
    language: Language,
    min_depth: usize,
    max_depth: usize,
) -> Result<StructuredCfg, GenerateError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let config = match source {
        CfgSource::Random => super::GeneratorConfig::allow_all(language),
        CfgSource::Swarm => super::GeneratorConfig::swarm(&mut rng, language),
    };
    let depth = rng.gen_range(min_depth..=max_depth.max(min_depth));
    CfgGenerator::new(config).generate_with_rng(&mut rng, depth)
}

fn cfg_hash(cfg: &StructuredCfg) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    cfg.hash(&mut hasher);
    hasher.finish()
}

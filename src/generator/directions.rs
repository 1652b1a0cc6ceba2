//! Directions-vector sampling.
//!
//! A directions vector is a random walk through the CFG: every block with
//! out-degree ≥ 2 contributes one uniformly chosen edge index. A walk that
//! fails to reach an exit within the length cap is retried with fresh draws.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;

use crate::cfg::{path, StructuredCfg};
use crate::error::GenerateError;

/// Length cap per sampled vector.
pub const MAX_DIRECTIONS: usize = 512;

const MAX_ATTEMPTS: usize = 16;

/// Budget after the last *new* path before a path set is returned short.
const PATH_SET_BUDGET: Duration = Duration::from_secs(1);

/// Sample one directions vector that drives the CFG to an exit.
///
/// # Errors
///
/// Fails with [`GenerateError::NoTerminatingPath`] when no attempt reaches
/// an exit within [`MAX_DIRECTIONS`] choices; the caller should treat this
/// as a CFG whose exits are effectively unreachable.
pub fn sample_directions(
    cfg: &StructuredCfg,
    rng: &mut StdRng,
) -> Result<Vec<u32>, GenerateError> {
    for _ in 0..MAX_ATTEMPTS {
        if let Some(directions) = try_walk(cfg, rng)? {
            return Ok(directions);
        }
    }
    Err(GenerateError::NoTerminatingPath {
        max_length: MAX_DIRECTIONS,
        attempts: MAX_ATTEMPTS,
    })
}

fn try_walk(cfg: &StructuredCfg, rng: &mut StdRng) -> Result<Option<Vec<u32>>, GenerateError> {
    let mut directions: Vec<u32> = Vec::new();
    let mut current = cfg.entry()?;
    let step_cap = (MAX_DIRECTIONS + 1) * cfg.block_count().max(1);
    let mut steps = 0usize;

    while directions.len() < MAX_DIRECTIONS && steps < step_cap {
        steps += 1;
        if cfg.is_exit(current)? {
            return Ok(Some(directions));
        }
        let next = if path::consumes_direction(cfg, current)? {
            let edge_index = rng.gen_range(0..cfg.out_degree(current)?);
            directions.push(edge_index as u32);
            cfg.edge_index_to_dst(current, edge_index)?
        } else {
            cfg.edge_index_to_dst(current, 0)?
        };
        current = next;
    }

    // The cap was reached mid-walk; let the caller retry.
    Ok(if cfg.is_exit(current)? {
        Some(directions)
    } else {
        None
    })
}

/// Sample up to `count` *distinct* directions vectors for one CFG.
///
/// Stops early when [`PATH_SET_BUDGET`] elapses without a new distinct
/// vector; the bool reports whether the set was cut short.
///
/// # Errors
///
/// Propagates [`GenerateError::NoTerminatingPath`] when the CFG admits no
/// terminating walk at all.
pub fn sample_direction_set(
    cfg: &StructuredCfg,
    rng: &mut StdRng,
    count: usize,
) -> Result<(Vec<Vec<u32>>, bool), GenerateError> {
    let mut seen: BTreeSet<Vec<u32>> = BTreeSet::new();
    let mut paths: Vec<Vec<u32>> = Vec::new();
    let mut last_new = Instant::now();

    while paths.len() < count {
        if last_new.elapsed() > PATH_SET_BUDGET {
            return Ok((paths, true));
        }
        let directions = sample_directions(cfg, rng)?;
        if seen.insert(directions.clone()) {
            paths.push(directions);
            last_new = Instant::now();
        }
    }
    Ok((paths, false))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use crate::cfg::{examples, expected_path};

    use super::*;

    #[test]
    fn sampled_directions_reach_an_exit() {
        for (name, cfg) in examples::all() {
            let mut rng = StdRng::seed_from_u64(3);
            let directions = sample_directions(&cfg, &mut rng).unwrap();
            let result = expected_path(&cfg, &directions);
            assert!(result.is_ok(), "{name}: {result:?}");
        }
    }

    #[test]
    fn direction_sets_are_distinct() {
        let cfg = examples::switch_no_fallthrough();
        let mut rng = StdRng::seed_from_u64(11);
        let (paths, _) = sample_direction_set(&cfg, &mut rng, 3).unwrap();
        let unique: BTreeSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn single_path_cfgs_cut_the_set_short() {
        // An if-then has only two paths; asking for ten must stop early.
        let cfg = examples::if_then();
        let mut rng = StdRng::seed_from_u64(5);
        let (paths, aborted) = sample_direction_set(&cfg, &mut rng, 10).unwrap();
        assert!(paths.len() <= 2);
        assert!(aborted);
    }

    #[test]
    fn sampling_is_deterministic_per_seed() {
        let cfg = examples::nested_while();
        let mut left = StdRng::seed_from_u64(21);
        let mut right = StdRng::seed_from_u64(21);
        assert_eq!(
            sample_directions(&cfg, &mut left).unwrap(),
            sample_directions(&cfg, &mut right).unwrap()
        );
    }
}

//! The path oracle and the shared control-consumption trace.
//!
//! [`expected_path`] predicts the exact block sequence a fleshed program must
//! report for a directions vector. [`control_trace`] performs the same walk
//! and additionally records, for every header, the ordered control values it
//! consumes — one slot per visit for selections and switches, one slot per
//! activation (holding the iteration count) for loops. Header-guard emission
//! bakes exactly these records into the program, so the oracle and the
//! emitter can never drift: both read the same walk.

use indexmap::IndexMap;

use crate::error::CfgError;

use super::{BlockId, StructuredCfg};

/// Sentinel stored in slots that were never driven by a direction.
pub const UNUSED_CONTROL_VALUE: i64 = -1;

/// The outcome of walking a CFG under a directions vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlTrace {
    /// Every visited block, in visit order, repeats included.
    pub path: Vec<BlockId>,
    /// Ordered control values per header, keyed in first-consumption order.
    ///
    /// For a loop header each slot is one activation and holds the number of
    /// iterations performed (a break inside the activation contributes the
    /// missing final header visit). For a selection or switch header each
    /// slot is one visit and holds the edge index consumed.
    pub records: IndexMap<BlockId, Vec<i64>>,
    /// Number of directions consumed before reaching the exit.
    pub consumed: usize,
}

impl ControlTrace {
    /// Control events as `(header, activation_index, value_consumed)` triples.
    pub fn events(&self) -> impl Iterator<Item = (BlockId, usize, i64)> + '_ {
        self.records.iter().flat_map(|(header, values)| {
            values
                .iter()
                .enumerate()
                .map(move |(activation, value)| (*header, activation, *value))
        })
    }
}

/// Predict the block sequence executing `cfg` with `directions` must emit.
///
/// Starting at the entry, the walk records the current block; exits stop it;
/// basic blocks follow their sole successor; any other block consumes the
/// next direction `d` and follows `edge_index_to_dst(current, d)`.
///
/// # Errors
///
/// Fails with [`CfgError::DirectionsExhausted`] when the vector runs out
/// before an exit, or with the underlying query error on malformed CFGs.
pub fn expected_path(cfg: &StructuredCfg, directions: &[u32]) -> Result<Vec<BlockId>, CfgError> {
    Ok(control_trace(cfg, directions)?.path)
}

/// Walk `cfg` under `directions`, producing the visited path and the
/// per-header control records that header-guard emission bakes in.
///
/// # Errors
///
/// Same failure conditions as [`expected_path`].
pub fn control_trace(cfg: &StructuredCfg, directions: &[u32]) -> Result<ControlTrace, CfgError> {
    let mut path = Vec::new();
    let mut records: IndexMap<BlockId, Vec<i64>> = IndexMap::new();
    // Innermost-first stack of loops whose current activation has not ended.
    let mut active_loops: Vec<BlockId> = Vec::new();

    let mut current = cfg.entry()?;
    let mut cursor = 0usize;
    let mut silent_steps = 0usize;

    loop {
        path.push(current);

        if cfg.is_exit(current)? {
            break;
        }

        if !consumes_direction(cfg, current)? {
            // Basic block: a break ends the innermost activation and stands
            // in for the final header visit its loop will never get.
            if cfg.is_break(current)? {
                if let Some(loop_header) = active_loops.pop() {
                    if let Some(slots) = records.get_mut(&loop_header) {
                        if let Some(last) = slots.last_mut() {
                            *last += 1;
                        }
                    }
                }
            }
            silent_steps += 1;
            if silent_steps > cfg.block_count() {
                return Err(CfgError::Invalid {
                    reason: format!("cycle of direction-free blocks around {current}"),
                });
            }
            current = cfg.edge_index_to_dst(current, 0)?;
            continue;
        }
        silent_steps = 0;

        let Some(&direction) = directions.get(cursor) else {
            return Err(CfgError::DirectionsExhausted {
                block: current,
                consumed: cursor,
            });
        };
        cursor += 1;

        if cfg.is_loop_header(current)? {
            if active_loops.last() != Some(&current) && !active_loops.contains(&current) {
                records.entry(current).or_default().push(UNUSED_CONTROL_VALUE);
                active_loops.push(current);
            }
            if let Some(last) = records.entry(current).or_default().last_mut() {
                *last += 1;
            }
            if direction != 1 {
                // The activation ends through the merge edge.
                while let Some(done) = active_loops.pop() {
                    if done == current {
                        break;
                    }
                }
            }
        } else {
            records
                .entry(current)
                .or_default()
                .push(i64::from(direction));
        }

        current = cfg.edge_index_to_dst(current, usize::try_from(direction).unwrap_or(usize::MAX))?;
    }

    Ok(ControlTrace {
        path,
        records,
        consumed: cursor,
    })
}

/// Whether a block consumes one element of the directions vector per visit.
///
/// Shared by the oracle, the directions sampler, and the emitter.
pub fn consumes_direction(cfg: &StructuredCfg, block: BlockId) -> Result<bool, CfgError> {
    Ok(cfg.out_degree(block)? >= 2)
}

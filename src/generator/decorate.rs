//! Break/continue decoration.
//!
//! A post-pass over the expanded CFG walks each loop body and, with a
//! configured probability, rewrites eligible basic blocks into break or
//! continue blocks. The walk stops at the loop's merge and at nested loop
//! headers, so every rewrite targets the innermost enclosing loop.

use std::collections::{BTreeSet, VecDeque};

use rand::rngs::StdRng;
use rand::Rng;

use crate::cfg::{Attribute, BlockId, StructuredCfg};
use crate::error::GenerateError;

use super::config::GeneratorConfig;

/// Apply break/continue decoration to every loop of `cfg`.
pub(super) fn decorate(
    cfg: &mut StructuredCfg,
    config: &GeneratorConfig,
    rng: &mut StdRng,
) -> Result<(), GenerateError> {
    if !config.allow_break && !config.allow_continue {
        return Ok(());
    }

    let loop_headers: Vec<BlockId> = cfg
        .blocks()
        .filter(|(_, block)| block.attrs.loop_header)
        .map(|(id, _)| id)
        .collect();

    for header in loop_headers {
        decorate_loop(cfg, config, rng, header)?;
    }
    Ok(())
}

fn decorate_loop(
    cfg: &mut StructuredCfg,
    config: &GeneratorConfig,
    rng: &mut StdRng,
    header: BlockId,
) -> Result<(), GenerateError> {
    let merge = cfg.merge(header)?;
    let body = cfg.edge_index_to_dst(header, 1)?;

    let mut visited: BTreeSet<BlockId> = BTreeSet::new();
    let mut queue: VecDeque<BlockId> = VecDeque::new();
    queue.push_back(body);

    while let Some(current) = queue.pop_front() {
        if current == merge
            || current == header
            || !visited.insert(current)
            || cfg.is_loop_header(current)?
        {
            continue;
        }

        if is_eligible(cfg, header, current)? && rng.gen_bool(config.break_continue_probability) {
            rewrite(cfg, config, rng, header, merge, current)?;
        }

        for &next in cfg.out_edges(current)? {
            if !visited.contains(&next) {
                queue.push_back(next);
            }
        }
    }
    Ok(())
}

/// A candidate must be a plain basic block, must not orphan any successor
/// (every successor keeps another predecessor), and must not already point
/// back at the loop header.
fn is_eligible(
    cfg: &StructuredCfg,
    header: BlockId,
    block: BlockId,
) -> Result<bool, GenerateError> {
    if !cfg.is_basic(block)?
        || cfg.is_header(block)?
        || cfg.is_break(block)?
        || cfg.is_continue(block)?
    {
        return Ok(false);
    }
    let successor = cfg.edge_index_to_dst(block, 0)?;
    if successor == header {
        return Ok(false);
    }
    if cfg.in_degree(successor)? < 2 {
        return Ok(false);
    }
    Ok(true)
}

fn rewrite(
    cfg: &mut StructuredCfg,
    config: &GeneratorConfig,
    rng: &mut StdRng,
    header: BlockId,
    merge: BlockId,
    block: BlockId,
) -> Result<(), GenerateError> {
    let make_break = match (config.allow_break, config.allow_continue) {
        (true, true) => rng.gen(),
        (true, false) => true,
        (false, true) => false,
        (false, false) => return Ok(()),
    };
    let target = if make_break { merge } else { header };

    // With shared merges, redirecting this block can sever the last path
    // from some header to its merge; such a rewrite is skipped.
    if !keeps_merges_reachable(cfg, block, target)? {
        return Ok(());
    }

    cfg.clear_out_edges(block)?;
    cfg.add_edge(block, target)?;
    let attribute = if make_break {
        Attribute::BreakBlock
    } else {
        Attribute::ContinueBlock
    };
    cfg.set_attribute(block, attribute)?;
    Ok(())
}

fn keeps_merges_reachable(
    cfg: &StructuredCfg,
    block: BlockId,
    target: BlockId,
) -> Result<bool, GenerateError> {
    let mut trial = cfg.clone();
    trial.clear_out_edges(block)?;
    trial.add_edge(block, target)?;
    for (id, record) in trial.blocks() {
        if record.attrs.selection_header {
            let merge = trial.merge(id)?;
            if !crate::cfg::reachability::has_path(&trial, id, merge) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

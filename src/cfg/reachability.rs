//! Breadth-first reachability queries over the CFG.
//!
//! The fallthrough test needs reachability *with one block excluded* (the
//! closest loop header enclosing a switch), so the workhorse here takes an
//! optional excluded block rather than being a plain `has_path`.

use std::collections::{BTreeSet, VecDeque};

use super::{BlockId, StructuredCfg};

/// Whether `to` is reachable from `from` by following edges forward.
#[must_use]
pub fn has_path(cfg: &StructuredCfg, from: BlockId, to: BlockId) -> bool {
    has_path_avoiding(cfg, from, to, None)
}

/// Whether `to` is reachable from `from` without ever *traversing through*
/// `excluded`.
///
/// `from == to` counts as reachable. Arriving at `to` is allowed even when a
/// predecessor equals `excluded`... it is the expansion through `excluded`
/// that is forbidden, matching the switch-fallthrough check: a path may end
/// at the next case but must not cross the enclosing loop header.
#[must_use]
pub fn has_path_avoiding(
    cfg: &StructuredCfg,
    from: BlockId,
    to: BlockId,
    excluded: Option<BlockId>,
) -> bool {
    if from == to {
        return true;
    }
    let mut visited: BTreeSet<BlockId> = BTreeSet::new();
    let mut queue: VecDeque<BlockId> = VecDeque::new();
    queue.push_back(from);
    visited.insert(from);

    while let Some(current) = queue.pop_front() {
        if Some(current) == excluded {
            continue;
        }
        let Ok(succs) = cfg.out_edges(current) else {
            continue;
        };
        for &next in succs {
            if next == to {
                return true;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    false
}

/// All blocks reachable from `from`, including `from` itself.
#[must_use]
pub fn reachable_from(cfg: &StructuredCfg, from: BlockId) -> BTreeSet<BlockId> {
    let mut visited: BTreeSet<BlockId> = BTreeSet::new();
    let mut queue: VecDeque<BlockId> = VecDeque::new();
    if cfg.contains(from) {
        visited.insert(from);
        queue.push_back(from);
    }
    while let Some(current) = queue.pop_front() {
        let Ok(succs) = cfg.out_edges(current) else {
            continue;
        };
        for &next in succs {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

/// All blocks from which some exit block (out-degree 0) is reachable.
#[must_use]
pub fn reaches_exit(cfg: &StructuredCfg) -> BTreeSet<BlockId> {
    // Reverse BFS from every exit.
    let mut visited: BTreeSet<BlockId> = BTreeSet::new();
    let mut queue: VecDeque<BlockId> = VecDeque::new();
    for (id, block) in cfg.blocks() {
        if block.succs.is_empty() {
            visited.insert(id);
            queue.push_back(id);
        }
    }
    while let Some(current) = queue.pop_front() {
        let Ok(parents) = cfg.parents(current) else {
            continue;
        };
        for parent in parents {
            if visited.insert(parent) {
                queue.push_back(parent);
            }
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use crate::cfg::Attribute;

    use super::*;

    fn b(raw: u32) -> BlockId {
        BlockId::new(raw)
    }

    /// 1 → 2 → 3 with a side branch 2 → 4.
    fn diamond_free_cfg() -> StructuredCfg {
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_edge(b(2), b(3)).unwrap();
        cfg.add_edge(b(2), b(4)).unwrap();
        cfg
    }

    #[test]
    fn has_path_follows_edges_forward() {
        let cfg = diamond_free_cfg();
        assert!(has_path(&cfg, b(1), b(4)));
        assert!(!has_path(&cfg, b(3), b(1)));
        assert!(has_path(&cfg, b(2), b(2)));
    }

    #[test]
    fn excluded_block_cuts_paths_through_it() {
        // 1 → 2 → 3 → 4 and 1 → 4: excluding 3 leaves the direct edge.
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_edge(b(2), b(3)).unwrap();
        cfg.add_edge(b(3), b(4)).unwrap();
        cfg.add_edge(b(1), b(4)).unwrap();

        assert!(has_path_avoiding(&cfg, b(1), b(4), Some(b(3))));
        assert!(!has_path_avoiding(&cfg, b(2), b(4), Some(b(3))));
    }

    #[test]
    fn arrival_at_excluded_target_is_not_traversal() {
        // 2 → 3 with 3 excluded: the path ends at 3 without crossing it.
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_edge(b(2), b(3)).unwrap();
        assert!(has_path_avoiding(&cfg, b(2), b(3), Some(b(3))));
    }

    #[test]
    fn reaches_exit_handles_loops() {
        // 1 → 2 (loop header) → {5, 3}; 3 → 4 → 2 back edge; 5 exit.
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_edge(b(2), b(5)).unwrap();
        cfg.add_edge(b(2), b(3)).unwrap();
        cfg.add_edge(b(3), b(4)).unwrap();
        cfg.add_edge(b(4), b(2)).unwrap();
        cfg.set_attribute(b(2), Attribute::SelectionHeader).unwrap();
        cfg.set_attribute(b(2), Attribute::LoopHeader).unwrap();
        cfg.set_attribute(b(2), Attribute::Merge(b(5))).unwrap();

        let reaching = reaches_exit(&cfg);
        for id in cfg.block_ids() {
            assert!(reaching.contains(&id), "{id} should reach the exit");
        }
    }

    #[test]
    fn reachable_from_collects_the_component() {
        let cfg = diamond_free_cfg();
        let reached = reachable_from(&cfg, b(2));
        assert!(reached.contains(&b(3)));
        assert!(reached.contains(&b(4)));
        assert!(!reached.contains(&b(1)));
    }
}

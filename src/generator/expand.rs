//! Recursive construct expansion.
//!
//! Generation grows the CFG from a single entry block: a FIFO of open blocks
//! is drained, each open block below the depth limit is rewritten into one
//! construct, and the construct's fresh children are enqueued one level
//! deeper. Every construct is inserted in place: the open block's previous
//! successors are re-attached behind the construct's merge.

use std::collections::{BTreeSet, VecDeque};

use rand::rngs::StdRng;
use rand::Rng;

use crate::cfg::{Attribute, BlockId, StructuredCfg};
use crate::error::GenerateError;

use super::config::{Construct, GeneratorConfig};

/// The construct region an open block sits in: the header that owns it and
/// that construct's merge. Used by the merge-sharing policy.
type OuterContext = Option<(BlockId, BlockId)>;

#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    block: BlockId,
    outer: OuterContext,
    depth: usize,
}

pub(super) struct Expansion<'a> {
    cfg: StructuredCfg,
    config: &'a GeneratorConfig,
    next_id: BlockId,
    expanded: BTreeSet<BlockId>,
}

impl<'a> Expansion<'a> {
    pub(super) fn new(config: &'a GeneratorConfig) -> Self {
        Expansion {
            cfg: StructuredCfg::with_entry(BlockId::ENTRY),
            config,
            next_id: BlockId::ENTRY.next(),
            expanded: BTreeSet::new(),
        }
    }

    /// Expand constructs breadth-first until every open block has reached
    /// `depth`.
    pub(super) fn run(
        mut self,
        rng: &mut StdRng,
        depth: usize,
    ) -> Result<StructuredCfg, GenerateError> {
        let mut open: VecDeque<OpenBlock> = VecDeque::new();
        open.push_back(OpenBlock {
            block: BlockId::ENTRY,
            outer: None,
            depth: 0,
        });

        while let Some(current) = open.pop_front() {
            if current.depth >= depth || self.expanded.contains(&current.block) {
                continue;
            }
            let children = self.expand_block(&current, rng)?;
            self.expanded.insert(current.block);
            for (child, outer) in children {
                if !self.expanded.contains(&child) {
                    open.push_back(OpenBlock {
                        block: child,
                        outer,
                        depth: current.depth + 1,
                    });
                }
            }
        }
        Ok(self.cfg)
    }

    fn fresh_id(&mut self) -> BlockId {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        id
    }

    /// Re-attach `source`'s previous successors behind `target` and clear
    /// `source`'s edges, so a construct replaces the block in place.
    fn move_successors(&mut self, source: BlockId, target: BlockId) -> Result<(), GenerateError> {
        let mut successors: Vec<BlockId> = self.cfg.out_edges(source)?.to_vec();
        successors.retain(|&succ| succ != target);
        for succ in successors {
            self.cfg.add_edge(target, succ)?;
        }
        self.cfg.clear_out_edges(source)?;
        Ok(())
    }

    /// Pick the construct's merge: a fresh block, or the enclosing
    /// construct's merge when the open block already flows straight into it.
    ///
    /// The eligibility restriction keeps the insertion clean: sharing with
    /// the outer merge must not hand that merge any new out-edges, which
    /// holds exactly when the open block's sole successor already is the
    /// outer merge.
    fn choose_merge(&mut self, open: &OpenBlock, rng: &mut StdRng) -> Result<BlockId, GenerateError> {
        if let Some((_, outer_merge)) = open.outer {
            let eligible = self.cfg.out_edges(open.block)? == [outer_merge];
            if eligible && rng.gen_bool(self.config.merge_share_probability) {
                return Ok(outer_merge);
            }
        }
        Ok(self.fresh_id())
    }

    fn expand_block(
        &mut self,
        open: &OpenBlock,
        rng: &mut StdRng,
    ) -> Result<Vec<(BlockId, OuterContext)>, GenerateError> {
        match self.config.choose_construct(rng)? {
            Construct::Basic => self.make_basic(open),
            Construct::Selection => self.make_selection(open, rng),
            Construct::Switch => {
                let low = self.config.min_successors.max(2);
                let high = self.config.max_successors.max(low);
                let out_degree = rng.gen_range(low..=high);
                self.make_switch(open, rng, out_degree)
            }
            Construct::Loop => self.make_loop(open, rng),
        }
    }

    /// `b → …`  becomes  `b → n → …`.
    fn make_basic(&mut self, open: &OpenBlock) -> Result<Vec<(BlockId, OuterContext)>, GenerateError> {
        let fresh = self.fresh_id();
        self.move_successors(open.block, fresh)?;
        self.cfg.add_edge(open.block, fresh)?;
        Ok(vec![(fresh, open.outer)])
    }

    /// Two fresh branches rejoining at the merge; the false branch is edge 0.
    fn make_selection(
        &mut self,
        open: &OpenBlock,
        rng: &mut StdRng,
    ) -> Result<Vec<(BlockId, OuterContext)>, GenerateError> {
        let false_block = self.fresh_id();
        let true_block = self.fresh_id();
        let merge = self.choose_merge(open, rng)?;
        let block = open.block;

        self.move_successors(block, merge)?;
        self.cfg.add_edge(block, false_block)?;
        self.cfg.add_edge(block, true_block)?;
        self.cfg.add_edge(false_block, merge)?;
        self.cfg.add_edge(true_block, merge)?;

        self.cfg.set_attribute(block, Attribute::SelectionHeader)?;
        self.cfg.set_attribute(block, Attribute::Merge(merge))?;

        let inner = Some((block, merge));
        Ok(vec![
            (false_block, inner),
            (true_block, inner),
            (merge, open.outer),
        ])
    }

    /// `out_degree - 1` cases plus a default; each non-default case either
    /// falls through to its neighbour (when the language permits) or goes to
    /// the merge.
    fn make_switch(
        &mut self,
        open: &OpenBlock,
        rng: &mut StdRng,
        out_degree: usize,
    ) -> Result<Vec<(BlockId, OuterContext)>, GenerateError> {
        let block = open.block;
        let cases: Vec<BlockId> = (0..out_degree - 1).map(|_| self.fresh_id()).collect();
        let default = self.fresh_id();
        let merge = self.choose_merge(open, rng)?;

        self.move_successors(block, merge)?;

        for (index, &case) in cases.iter().enumerate() {
            self.cfg.add_edge(block, case)?;

            let fallthrough = self.config.allow_switch_fallthrough && rng.gen();
            if fallthrough {
                let target = cases.get(index + 1).copied().unwrap_or(default);
                self.cfg.add_edge(case, target)?;
            } else {
                self.cfg.add_edge(case, merge)?;
            }
        }
        self.cfg.add_edge(block, default)?;
        self.cfg.add_edge(default, merge)?;

        self.cfg.set_attribute(block, Attribute::SelectionHeader)?;
        self.cfg.set_attribute(block, Attribute::SwitchBlock)?;
        self.cfg.set_attribute(block, Attribute::Merge(merge))?;

        let inner = Some((block, merge));
        let mut children: Vec<(BlockId, OuterContext)> =
            cases.into_iter().map(|case| (case, inner)).collect();
        children.push((default, inner));
        children.push((merge, open.outer));
        Ok(children)
    }

    /// Loop header with out-edges `[merge, body]` and the body looping back.
    fn make_loop(
        &mut self,
        open: &OpenBlock,
        rng: &mut StdRng,
    ) -> Result<Vec<(BlockId, OuterContext)>, GenerateError> {
        let block = open.block;
        let merge = self.choose_merge(open, rng)?;
        let body = self.fresh_id();

        self.move_successors(block, merge)?;
        self.cfg.add_edge(block, merge)?;
        self.cfg.add_edge(block, body)?;
        self.cfg.add_edge(body, block)?;

        self.cfg.set_attribute(block, Attribute::SelectionHeader)?;
        self.cfg.set_attribute(block, Attribute::LoopHeader)?;
        self.cfg.set_attribute(block, Attribute::Merge(merge))?;

        Ok(vec![(body, Some((block, merge))), (merge, open.outer)])
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use crate::lang::Language;

    use super::*;

    fn expand(seed: u64, depth: usize) -> StructuredCfg {
        let config = GeneratorConfig::allow_all(Language::Glsl);
        let mut rng = StdRng::seed_from_u64(seed);
        Expansion::new(&config).run(&mut rng, depth).unwrap()
    }

    #[test]
    fn expansion_yields_valid_cfgs() {
        for seed in 0..50 {
            let cfg = expand(seed, 4);
            assert!(cfg.validate().is_ok(), "seed {seed}: {:?}", cfg.validate());
        }
    }

    #[test]
    fn depth_zero_is_a_single_exit_block() {
        let cfg = expand(1, 0);
        assert_eq!(cfg.block_count(), 1);
        assert!(cfg.is_exit(BlockId::ENTRY).unwrap());
    }

    #[test]
    fn same_seed_same_graph() {
        assert_eq!(expand(42, 5), expand(42, 5));
    }

    #[test]
    fn different_seeds_usually_differ() {
        let distinct = (0..20)
            .map(|seed| expand(seed, 4))
            .collect::<std::collections::HashSet<_>>();
        assert!(distinct.len() > 10);
    }

    #[test]
    fn ids_are_allocated_monotonically() {
        let cfg = expand(7, 5);
        let max_id = cfg.block_ids().map(BlockId::raw).max().unwrap_or(1);
        assert_eq!(cfg.block_count() as u32, max_id);
    }

    #[test]
    fn loop_headers_put_the_merge_first() {
        for seed in 0..30 {
            let cfg = expand(seed, 5);
            for (id, block) in cfg.blocks() {
                if block.attrs.loop_header {
                    assert_eq!(block.succs[0], cfg.merge(id).unwrap(), "seed {seed}");
                }
            }
        }
    }

    #[test]
    fn no_fallthrough_edges_when_disallowed() {
        let config = GeneratorConfig::allow_all(Language::Wgsl);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let cfg = Expansion::new(&config).run(&mut rng, 5).unwrap();
            for (_, block) in cfg.blocks() {
                if block.attrs.switch_block {
                    let destinations = block.succs.clone();
                    for (index, &case) in
                        destinations[..destinations.len() - 1].iter().enumerate()
                    {
                        // A non-default case must never go straight to its
                        // sibling case.
                        let case_succs = cfg.out_edges(case).unwrap();
                        if case_succs.len() == 1 {
                            assert_ne!(
                                Some(&case_succs[0]),
                                destinations.get(index + 1),
                                "seed {seed}: case {case} falls through"
                            );
                        }
                    }
                }
            }
        }
    }
}

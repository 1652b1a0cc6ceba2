//! The structured CFG arena: blocks, ordered edges, queries, and the
//! construction-time mutation primitives used by the generator.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::error::CfgError;

use super::block::{Attribute, BlockAttrs, BlockId};

/// Ordered successor list of a block. Most blocks have at most two.
pub type Successors = SmallVec<[BlockId; 2]>;

/// One block of the arena: its attribute record and its ordered successors.
///
/// The successor order *is* the language-visible branch numbering consumed by
/// the directions vector, so it is part of the graph's semantics (and of its
/// equality and hash).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// Typed attribute record.
    pub attrs: BlockAttrs,
    /// Ordered out-neighbours, in edge-insertion order.
    pub succs: Successors,
}

/// A rooted multi-digraph obeying the structured-programming discipline.
///
/// Blocks live in an arena keyed by [`BlockId`]; headers refer to their merge
/// blocks by id, never by reference. Once emission begins the CFG is treated
/// as immutable; all mutation primitives are meant for the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredCfg {
    blocks: BTreeMap<BlockId, Block>,
}

impl StructuredCfg {
    /// Create an empty CFG.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a CFG with a single entry block carrying the `EntryBlock` flag.
    #[must_use]
    pub fn with_entry(entry: BlockId) -> Self {
        let mut cfg = Self::new();
        cfg.add_block(entry);
        if let Some(block) = cfg.blocks.get_mut(&entry) {
            block.attrs.apply(Attribute::EntryBlock);
        }
        cfg
    }

    // QUERIES

    /// The unique entry-flagged block.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::NoEntry`] if no block is flagged, or
    /// [`CfgError::AmbiguousEntry`] if several are.
    pub fn entry(&self) -> Result<BlockId, CfgError> {
        let mut entries = self
            .blocks
            .iter()
            .filter(|(_, block)| block.attrs.entry)
            .map(|(id, _)| *id);
        let first = entries.next().ok_or(CfgError::NoEntry)?;
        let extra = entries.count();
        if extra > 0 {
            return Err(CfgError::AmbiguousEntry { count: extra + 1 });
        }
        Ok(first)
    }

    /// Whether the block exists in the arena.
    #[must_use]
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains_key(&block)
    }

    /// All block ids, in ascending order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys().copied()
    }

    /// Number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.blocks.values().map(|block| block.succs.len()).sum()
    }

    /// The attribute record of a block.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::UnknownBlock`] for ids outside the arena.
    pub fn attrs(&self, block: BlockId) -> Result<&BlockAttrs, CfgError> {
        self.blocks
            .get(&block)
            .map(|b| &b.attrs)
            .ok_or(CfgError::UnknownBlock { block })
    }

    /// Ordered successors of a block, in edge-insertion order.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::UnknownBlock`] for ids outside the arena.
    pub fn out_edges(&self, block: BlockId) -> Result<&[BlockId], CfgError> {
        self.blocks
            .get(&block)
            .map(|b| b.succs.as_slice())
            .ok_or(CfgError::UnknownBlock { block })
    }

    /// Out-degree of a block.
    pub fn out_degree(&self, block: BlockId) -> Result<usize, CfgError> {
        Ok(self.out_edges(block)?.len())
    }

    /// In-degree of a block (counting parallel edges).
    pub fn in_degree(&self, block: BlockId) -> Result<usize, CfgError> {
        if !self.contains(block) {
            return Err(CfgError::UnknownBlock { block });
        }
        Ok(self
            .blocks
            .values()
            .map(|b| b.succs.iter().filter(|&&dst| dst == block).count())
            .sum())
    }

    /// Predecessors of a block, deduplicated, in ascending id order.
    pub fn parents(&self, block: BlockId) -> Result<Vec<BlockId>, CfgError> {
        if !self.contains(block) {
            return Err(CfgError::UnknownBlock { block });
        }
        Ok(self
            .blocks
            .iter()
            .filter(|(_, b)| b.succs.contains(&block))
            .map(|(id, _)| *id)
            .collect())
    }

    /// The i-th successor of `block` in insertion order.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::EdgeIndexOutOfRange`] when `index` is not a
    /// valid edge index for the block.
    pub fn edge_index_to_dst(&self, block: BlockId, index: usize) -> Result<BlockId, CfgError> {
        let succs = self.out_edges(block)?;
        succs
            .get(index)
            .copied()
            .ok_or(CfgError::EdgeIndexOutOfRange {
                block,
                index,
                out_degree: succs.len(),
            })
    }

    /// A block is basic iff its out-degree is 1.
    pub fn is_basic(&self, block: BlockId) -> Result<bool, CfgError> {
        Ok(self.out_degree(block)? == 1)
    }

    /// A block is an exit iff its out-degree is 0.
    pub fn is_exit(&self, block: BlockId) -> Result<bool, CfgError> {
        Ok(self.out_degree(block)? == 0)
    }

    /// Whether the block carries `SelectionHeader`.
    pub fn is_selection_header(&self, block: BlockId) -> Result<bool, CfgError> {
        Ok(self.attrs(block)?.selection_header)
    }

    /// Whether the block carries `LoopHeader`.
    pub fn is_loop_header(&self, block: BlockId) -> Result<bool, CfgError> {
        Ok(self.attrs(block)?.loop_header)
    }

    /// Whether the block carries `SwitchBlock`.
    pub fn is_switch(&self, block: BlockId) -> Result<bool, CfgError> {
        Ok(self.attrs(block)?.switch_block)
    }

    /// Whether the block carries `BreakBlock`.
    pub fn is_break(&self, block: BlockId) -> Result<bool, CfgError> {
        Ok(self.attrs(block)?.break_block)
    }

    /// Whether the block carries `ContinueBlock`.
    pub fn is_continue(&self, block: BlockId) -> Result<bool, CfgError> {
        Ok(self.attrs(block)?.continue_block)
    }

    /// A header is any block beginning a selection, switch, or loop construct.
    pub fn is_header(&self, block: BlockId) -> Result<bool, CfgError> {
        let attrs = self.attrs(block)?;
        Ok(attrs.selection_header || attrs.loop_header)
    }

    /// The `Merge` attribute of a header.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::NoMerge`] if the block has no merge attribute.
    pub fn merge(&self, block: BlockId) -> Result<BlockId, CfgError> {
        self.attrs(block)?
            .merge
            .ok_or(CfgError::NoMerge { block })
    }

    /// The merge attribute if present, without the header contract.
    pub fn merge_opt(&self, block: BlockId) -> Result<Option<BlockId>, CfgError> {
        Ok(self.attrs(block)?.merge)
    }

    // MUTATION PRIMITIVES (generator only)

    /// Add an isolated block with empty attributes. Re-adding an existing id
    /// is a no-op, matching multigraph semantics.
    pub fn add_block(&mut self, block: BlockId) {
        self.blocks.entry(block).or_default();
    }

    /// Append an edge `from → to` at the end of `from`'s ordered list.
    ///
    /// Both endpoints are created if absent. Self-loops are rejected at
    /// construction time.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::SelfLoop`] when `from == to`.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) -> Result<(), CfgError> {
        if from == to {
            return Err(CfgError::SelfLoop { block: from });
        }
        self.add_block(to);
        self.add_block(from);
        if let Some(block) = self.blocks.get_mut(&from) {
            block.succs.push(to);
        }
        Ok(())
    }

    /// Remove the first edge `from → to` in insertion order.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::UnknownBlock`] or [`CfgError::UnknownEdge`].
    pub fn remove_edge(&mut self, from: BlockId, to: BlockId) -> Result<(), CfgError> {
        let block = self
            .blocks
            .get_mut(&from)
            .ok_or(CfgError::UnknownBlock { block: from })?;
        let position = block
            .succs
            .iter()
            .position(|&dst| dst == to)
            .ok_or(CfgError::UnknownEdge { from, to })?;
        block.succs.remove(position);
        Ok(())
    }

    /// Remove every out-edge of a block.
    pub fn clear_out_edges(&mut self, block: BlockId) -> Result<(), CfgError> {
        let entry = self
            .blocks
            .get_mut(&block)
            .ok_or(CfgError::UnknownBlock { block })?;
        entry.succs.clear();
        Ok(())
    }

    /// Set an attribute on a block.
    ///
    /// # Errors
    ///
    /// Fails with [`CfgError::DuplicateAttribute`] if the attribute is already
    /// present, or [`CfgError::UnknownBlock`] for ids outside the arena.
    pub fn set_attribute(&mut self, block: BlockId, attribute: Attribute) -> Result<(), CfgError> {
        let entry = self
            .blocks
            .get_mut(&block)
            .ok_or(CfgError::UnknownBlock { block })?;
        if entry.attrs.contains(&attribute) {
            return Err(CfgError::DuplicateAttribute {
                block,
                attribute: attribute.name(),
            });
        }
        entry.attrs.apply(attribute);
        Ok(())
    }

    /// Iterate blocks with their records, in ascending id order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().map(|(id, block)| (*id, block))
    }

    /// Whole-record attribute access for the deserializer, which installs a
    /// complete attribute map and therefore bypasses the duplicate guard.
    pub(crate) fn attrs_mut(&mut self, block: BlockId) -> Option<&mut BlockAttrs> {
        self.blocks.get_mut(&block).map(|b| &mut b.attrs)
    }
}

impl Hash for StructuredCfg {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // BTreeMap iterates in ascending id order, so the hash is a
        // deterministic function of the attribute maps and the ordered
        // edge lists.
        for (id, block) in &self.blocks {
            id.hash(state);
            block.attrs.hash(state);
            block.succs.as_slice().hash(state);
        }
    }
}

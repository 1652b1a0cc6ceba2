//! Block identities and typed block attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a basic block within a [`super::StructuredCfg`].
///
/// Ids are positive integers. By convention the entry block is id 1 and the
/// generator allocates fresh ids strictly increasing from 2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// The conventional entry block id.
    pub const ENTRY: BlockId = BlockId(1);

    /// Create a block id from its raw integer value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        BlockId(raw)
    }

    /// Raw integer value of the id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The next id in allocation order.
    #[must_use]
    pub const fn next(self) -> Self {
        BlockId(self.0 + 1)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// A single block attribute, as used by the mutation API.
///
/// Flag attributes carry no payload; `Merge` names the header's merge block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// The unique traversal root.
    EntryBlock,
    /// The block branches and its sub-region has a known structured merge.
    SelectionHeader,
    /// A loop's header block. Implies `SelectionHeader`.
    LoopHeader,
    /// A multi-way branch; the last out-edge is the default case. Implies
    /// `SelectionHeader`.
    SwitchBlock,
    /// A basic block whose successor was rewritten to the enclosing loop
    /// header.
    ContinueBlock,
    /// A basic block whose successor was rewritten to the enclosing loop's
    /// merge.
    BreakBlock,
    /// The merge block of this header.
    Merge(BlockId),
}

impl Attribute {
    /// Stable attribute name, used in errors and in the wire format.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Attribute::EntryBlock => "EntryBlock",
            Attribute::SelectionHeader => "SelectionHeader",
            Attribute::LoopHeader => "LoopHeader",
            Attribute::SwitchBlock => "SwitchBlock",
            Attribute::ContinueBlock => "ContinueBlock",
            Attribute::BreakBlock => "BreakBlock",
            Attribute::Merge(_) => "Merge",
        }
    }
}

/// The attribute record carried by every block.
///
/// Flags default to unset; `merge` defaults to absent. The record is mutated
/// only through [`super::StructuredCfg::set_attribute`], which enforces the
/// duplicate-attribute guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockAttrs {
    /// `EntryBlock` flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub entry: bool,
    /// `SelectionHeader` flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub selection_header: bool,
    /// `LoopHeader` flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub loop_header: bool,
    /// `SwitchBlock` flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub switch_block: bool,
    /// `ContinueBlock` flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub continue_block: bool,
    /// `BreakBlock` flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub break_block: bool,
    /// `Merge` attribute: the header's structural rejoin block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<BlockId>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl BlockAttrs {
    /// Whether the given attribute is already present.
    #[must_use]
    pub fn contains(&self, attribute: &Attribute) -> bool {
        match attribute {
            Attribute::EntryBlock => self.entry,
            Attribute::SelectionHeader => self.selection_header,
            Attribute::LoopHeader => self.loop_header,
            Attribute::SwitchBlock => self.switch_block,
            Attribute::ContinueBlock => self.continue_block,
            Attribute::BreakBlock => self.break_block,
            Attribute::Merge(_) => self.merge.is_some(),
        }
    }

    /// Apply an attribute without any guard. Callers go through
    /// [`super::StructuredCfg::set_attribute`].
    pub(crate) fn apply(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::EntryBlock => self.entry = true,
            Attribute::SelectionHeader => self.selection_header = true,
            Attribute::LoopHeader => self.loop_header = true,
            Attribute::SwitchBlock => self.switch_block = true,
            Attribute::ContinueBlock => self.continue_block = true,
            Attribute::BreakBlock => self.break_block = true,
            Attribute::Merge(target) => self.merge = Some(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_display_and_order() {
        assert_eq!(BlockId::new(42).to_string(), "b42");
        assert_eq!(BlockId::ENTRY.next(), BlockId::new(2));
        assert!(BlockId::new(2) < BlockId::new(10));
    }

    #[test]
    fn attrs_contains_tracks_applied_attributes() {
        let mut attrs = BlockAttrs::default();
        assert!(!attrs.contains(&Attribute::LoopHeader));

        attrs.apply(Attribute::LoopHeader);
        attrs.apply(Attribute::Merge(BlockId::new(5)));

        assert!(attrs.contains(&Attribute::LoopHeader));
        assert!(attrs.contains(&Attribute::Merge(BlockId::new(9))), "any merge counts");
        assert_eq!(attrs.merge, Some(BlockId::new(5)));
    }

    #[test]
    fn attribute_names_are_stable() {
        assert_eq!(Attribute::Merge(BlockId::ENTRY).name(), "Merge");
        assert_eq!(Attribute::BreakBlock.name(), "BreakBlock");
    }
}

//! CFG persistence.
//!
//! A CFG round-trips through [`CfgRecord`], a flat JSON-friendly structure of
//! node records and ordered edge records. Loading re-validates the structural
//! invariants, so a tampered or stale record cannot reach the emitter.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::block::{BlockAttrs, BlockId};
use super::StructuredCfg;

/// One node of the wire format: its id and its attribute record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Block id.
    pub id: BlockId,
    /// Attribute record; absent attributes are omitted from the JSON.
    #[serde(default)]
    pub attrs: BlockAttrs,
}

/// One edge of the wire format. Edge order in the vector is the per-source
/// insertion order, which is semantically significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Source block.
    pub from: BlockId,
    /// Destination block.
    pub to: BlockId,
}

/// The persistable form of a [`StructuredCfg`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgRecord {
    /// All nodes, ascending by id.
    pub nodes: Vec<NodeRecord>,
    /// All edges, grouped by source in insertion order.
    pub edges: Vec<EdgeRecord>,
}

impl CfgRecord {
    /// Capture a CFG into its wire format.
    #[must_use]
    pub fn from_cfg(cfg: &StructuredCfg) -> Self {
        let mut nodes = Vec::with_capacity(cfg.block_count());
        let mut edges = Vec::with_capacity(cfg.edge_count());
        for (id, block) in cfg.blocks() {
            nodes.push(NodeRecord {
                id,
                attrs: block.attrs.clone(),
            });
            for &to in &block.succs {
                edges.push(EdgeRecord { from: id, to });
            }
        }
        CfgRecord { nodes, edges }
    }

    /// Rebuild the CFG and re-validate the §3 invariants.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`crate::error::CfgError`] when the record
    /// violates an invariant (self-loops included).
    pub fn into_cfg(self) -> Result<StructuredCfg> {
        let mut cfg = StructuredCfg::new();
        for node in &self.nodes {
            cfg.add_block(node.id);
        }
        for node in self.nodes {
            if let Some(slot) = cfg.attrs_mut(node.id) {
                *slot = node.attrs;
            }
        }
        for edge in self.edges {
            cfg.add_edge(edge.from, edge.to).map_err(Error::from)?;
        }
        cfg.validate().map_err(Error::from)?;
        Ok(cfg)
    }

    /// Serialize to pretty JSON and write to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a record from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or parse failure.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl StructuredCfg {
    /// Capture this CFG into its persistable record.
    #[must_use]
    pub fn to_record(&self) -> CfgRecord {
        CfgRecord::from_cfg(self)
    }
}

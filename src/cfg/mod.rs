//! Structured control-flow graphs.
//!
//! A structured CFG is a rooted multi-digraph whose multi-way branches carry
//! a designated merge block, so that the region between a header and its
//! merge is expressible as nested structured constructs. Blocks live in an
//! arena keyed by integer ids; the per-block successor order is the
//! language-visible branch numbering consumed by the directions vector.

mod block;
pub mod examples;
mod graph;
pub mod path;
pub mod reachability;
mod serialize;
mod validate;

pub use block::{Attribute, BlockAttrs, BlockId};
pub use graph::{Block, StructuredCfg, Successors};
pub use path::{control_trace, expected_path, ControlTrace};
pub use serialize::{CfgRecord, EdgeRecord, NodeRecord};

//! Structural invariant validation.
//!
//! Every CFG handed to the emitter must satisfy these checks; they are also
//! re-run when a persisted CFG record is loaded.

use crate::error::CfgError;

use super::reachability::{has_path, reachable_from, reaches_exit};
use super::{BlockId, StructuredCfg};

impl StructuredCfg {
    /// Validate the structural invariants of a structured CFG.
    ///
    /// Checked, in order: unique entry; reachability of every block from the
    /// entry; exit-reachability (with the loop-trap exception: a block that
    /// cannot reach an exit must reach a loop header whose merge can); header
    /// attribute consistency (merge present, distinct from the header, and
    /// reachable from it; loop headers have out-degree 2 with the merge as
    /// edge 0); break/continue blocks are basic and point at the enclosing
    /// loop's merge or header respectively.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`CfgError`].
    pub fn validate(&self) -> Result<(), CfgError> {
        let entry = self.entry()?;

        let reachable = reachable_from(self, entry);
        for id in self.block_ids() {
            if !reachable.contains(&id) {
                return Err(CfgError::Invalid {
                    reason: format!("block {id} is unreachable from entry {entry}"),
                });
            }
        }

        let exiting = reaches_exit(self);
        for id in self.block_ids() {
            if !exiting.contains(&id) && !self.escapes_through_loop_merge(id, &exiting)? {
                return Err(CfgError::Invalid {
                    reason: format!("block {id} can reach neither an exit nor an escaping loop merge"),
                });
            }
        }

        for id in self.block_ids() {
            self.validate_block(id)?;
        }
        Ok(())
    }

    /// A trapped block is permitted when it reaches a loop header whose merge
    /// itself reaches an exit.
    fn escapes_through_loop_merge(
        &self,
        block: BlockId,
        exiting: &std::collections::BTreeSet<BlockId>,
    ) -> Result<bool, CfgError> {
        for candidate in reachable_from(self, block) {
            if self.is_loop_header(candidate)? {
                let merge = self.merge(candidate)?;
                if exiting.contains(&merge) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn validate_block(&self, id: BlockId) -> Result<(), CfgError> {
        let attrs = self.attrs(id)?.clone();
        let out_degree = self.out_degree(id)?;

        if attrs.loop_header && !attrs.selection_header {
            return Err(CfgError::Invalid {
                reason: format!("loop header {id} is missing the SelectionHeader flag"),
            });
        }
        if attrs.switch_block && !attrs.selection_header {
            return Err(CfgError::Invalid {
                reason: format!("switch block {id} is missing the SelectionHeader flag"),
            });
        }

        if attrs.selection_header {
            let merge = self.merge(id)?;
            if merge == id {
                return Err(CfgError::Invalid {
                    reason: format!("header {id} names itself as merge"),
                });
            }
            if !self.contains(merge) {
                return Err(CfgError::UnknownBlock { block: merge });
            }
            if !has_path(self, id, merge) {
                return Err(CfgError::Invalid {
                    reason: format!("merge {merge} is unreachable from header {id}"),
                });
            }
        }

        if attrs.loop_header {
            if out_degree != 2 {
                return Err(CfgError::Invalid {
                    reason: format!("loop header {id} has out-degree {out_degree}, expected 2"),
                });
            }
            let merge = self.merge(id)?;
            if self.edge_index_to_dst(id, 0)? != merge {
                return Err(CfgError::Invalid {
                    reason: format!("loop header {id}: edge 0 must be the merge {merge}"),
                });
            }
        }

        if attrs.break_block || attrs.continue_block {
            if out_degree != 1 {
                return Err(CfgError::Invalid {
                    reason: format!(
                        "break/continue block {id} has out-degree {out_degree}, expected 1"
                    ),
                });
            }
            let target = self.edge_index_to_dst(id, 0)?;
            if attrs.continue_block && !self.is_loop_header(target)? {
                return Err(CfgError::Invalid {
                    reason: format!("continue block {id} targets {target}, not a loop header"),
                });
            }
            if attrs.break_block {
                let is_some_loop_merge = self.block_ids().any(|other| {
                    self.is_loop_header(other).unwrap_or(false)
                        && self.merge_opt(other).ok().flatten() == Some(target)
                });
                if !is_some_loop_merge {
                    return Err(CfgError::Invalid {
                        reason: format!("break block {id} targets {target}, not a loop merge"),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cfg::examples;
    use crate::cfg::Attribute;

    use super::*;

    fn b(raw: u32) -> BlockId {
        BlockId::new(raw)
    }

    #[test]
    fn example_cfgs_validate() {
        for (name, cfg) in examples::all() {
            assert!(cfg.validate().is_ok(), "{name} failed validation");
        }
    }

    #[test]
    fn unreachable_block_is_rejected() {
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_block(b(9));
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, CfgError::Invalid { .. }));
    }

    #[test]
    fn header_without_merge_is_rejected() {
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_edge(b(1), b(3)).unwrap();
        cfg.set_attribute(b(1), Attribute::SelectionHeader).unwrap();
        assert_eq!(cfg.validate(), Err(CfgError::NoMerge { block: b(1) }));
    }

    #[test]
    fn loop_header_edge_order_is_checked() {
        // Edge 0 must be the merge; here the body comes first.
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_edge(b(2), b(3)).unwrap();
        cfg.add_edge(b(2), b(5)).unwrap();
        cfg.add_edge(b(3), b(2)).unwrap();
        cfg.set_attribute(b(2), Attribute::SelectionHeader).unwrap();
        cfg.set_attribute(b(2), Attribute::LoopHeader).unwrap();
        cfg.set_attribute(b(2), Attribute::Merge(b(5))).unwrap();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("edge 0 must be the merge"));
    }

    #[test]
    fn continue_block_must_target_loop_header() {
        let mut cfg = StructuredCfg::with_entry(b(1));
        cfg.add_edge(b(1), b(2)).unwrap();
        cfg.add_edge(b(2), b(3)).unwrap();
        cfg.set_attribute(b(2), Attribute::ContinueBlock).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("not a loop header"));
    }
}

//! Header-guard precomputation.
//!
//! In header-guard mode the directions vector is compiled away: every header
//! either becomes a constant (no enclosing loop, so it is activated at most
//! once) or reads the next slot of a per-header constant array through a
//! per-header cursor. The slots come from [`crate::cfg::control_trace`] —
//! the same walk that drives the path oracle — so the baked program and the
//! oracle agree by construction.
//!
//! The map from header to enclosing loops is computed by a second traversal
//! that walks regions exactly the way emission does (same fallthrough test,
//! same tree-switch default rule).

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

use crate::cfg::path::UNUSED_CONTROL_VALUE;
use crate::cfg::{control_trace, BlockId, StructuredCfg};
use crate::error::EmitError;
use crate::lang::{cntrl_arr_name, cntrl_cursor_name, cntrl_val_name, Language};

use super::builder::{regions, MergeFrame};

/// Everything needed to flesh a header-guard skeleton: the per-header
/// control records and the enclosing-loop classification.
#[derive(Debug)]
pub struct Fleshing {
    language: Language,
    /// Control values per header, in first-consumption order.
    records: IndexMap<BlockId, Vec<i64>>,
    /// Header → enclosing loop headers, outermost first, excluding itself.
    enclosing: BTreeMap<BlockId, Vec<BlockId>>,
}

impl Fleshing {
    /// Precompute the fleshing data for one `(cfg, directions)` pair.
    ///
    /// # Errors
    ///
    /// Fails when the walk exhausts the directions before an exit or when
    /// the CFG violates the structured contract.
    pub fn compute(
        cfg: &StructuredCfg,
        language: Language,
        directions: &[u32],
    ) -> Result<Self, EmitError> {
        let trace = control_trace(cfg, directions)?;
        let enclosing = enclosing_loops_exclusive(cfg, language)?;
        Ok(Fleshing {
            language,
            records: trace.records,
            enclosing,
        })
    }

    fn is_enclosed(&self, header: BlockId) -> bool {
        self.enclosing
            .get(&header)
            .map(|loops| !loops.is_empty())
            .unwrap_or(false)
    }

    fn values_for(&self, header: BlockId) -> Vec<i64> {
        match self.records.get(&header) {
            Some(values) if !values.is_empty() => values.clone(),
            _ => vec![UNUSED_CONTROL_VALUE],
        }
    }

    fn constant_for(&self, header: BlockId) -> i64 {
        self.records
            .get(&header)
            .and_then(|values| values.first().copied())
            .unwrap_or(UNUSED_CONTROL_VALUE)
    }

    /// Array and cursor declarations for every header that sits inside a
    /// loop. Declaration order follows the enclosing-loop map so repeated
    /// emissions are byte-identical.
    #[must_use]
    pub fn declarations(&self) -> String {
        let mut code = String::new();
        for (&header, loops) in &self.enclosing {
            if loops.is_empty() {
                continue;
            }
            let values = self.values_for(header);
            let declaration = match self.language {
                Language::Wgsl => crate::lang::wgsl_guard_declaration(header, &values),
                Language::Glsl => crate::lang::glsl_guard_declaration(header, &values),
                Language::Wasm => String::new(),
            };
            code.push_str(&declaration);
        }
        code
    }

    /// Replace every `$$read:N$$`, `$$bound:N$$`, and `$$advance:N$$` marker
    /// in the skeleton with its baked form.
    #[must_use]
    pub fn substitute(&self, skeleton: &str) -> String {
        let mut output = String::with_capacity(skeleton.len());
        let mut rest = skeleton;

        while let Some(start) = rest.find("$$") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("$$") else {
                output.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let marker = &after[..end];
            match parse_marker(marker) {
                Some((kind, header)) => output.push_str(&self.render(kind, header)),
                None => {
                    // Not one of ours; emit verbatim.
                    output.push_str("$$");
                    output.push_str(marker);
                    output.push_str("$$");
                }
            }
            rest = &after[end + 2..];
        }
        output.push_str(rest);
        output
    }

    fn render(&self, kind: MarkerKind, header: BlockId) -> String {
        let cntrl = cntrl_val_name(self.language);
        let array = cntrl_arr_name(header);
        let cursor = cntrl_cursor_name(header);
        match kind {
            MarkerKind::Read => {
                if self.is_enclosed(header) {
                    format!("{cntrl} = {array}[{cursor}];\n{cursor}++;")
                } else {
                    format!("{cntrl} = {};", self.constant_for(header))
                }
            }
            MarkerKind::Bound => {
                if self.is_enclosed(header) {
                    format!("{array}[{cursor}]")
                } else {
                    self.constant_for(header).to_string()
                }
            }
            MarkerKind::Advance => {
                if self.is_enclosed(header) {
                    format!("{cursor}++;")
                } else {
                    String::new()
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MarkerKind {
    Read,
    Bound,
    Advance,
}

fn parse_marker(marker: &str) -> Option<(MarkerKind, BlockId)> {
    let (kind, raw) = marker.split_once(':')?;
    let kind = match kind {
        "read" => MarkerKind::Read,
        "bound" => MarkerKind::Bound,
        "advance" => MarkerKind::Advance,
        _ => return None,
    };
    let id: u32 = raw.parse().ok()?;
    Some((kind, BlockId::new(id)))
}

/// For each header, the loop headers enclosing it (outermost first), itself
/// excluded. Computed by a traversal that mirrors emission regions.
pub(crate) fn enclosing_loops_exclusive(
    cfg: &StructuredCfg,
    language: Language,
) -> Result<BTreeMap<BlockId, Vec<BlockId>>, EmitError> {
    let mut map = BTreeMap::new();
    let mut merge_stack: Vec<MergeFrame> = Vec::new();
    let mut visited: BTreeSet<BlockId> = BTreeSet::new();
    let entry = cfg.entry()?;
    walk(
        cfg,
        language,
        Some(entry),
        None,
        &mut map,
        &mut merge_stack,
        &mut visited,
    )?;
    for (header, loops) in &mut map {
        loops.retain(|loop_header| loop_header != header);
    }
    Ok(map)
}

fn walk(
    cfg: &StructuredCfg,
    language: Language,
    block: Option<BlockId>,
    end_block: Option<BlockId>,
    map: &mut BTreeMap<BlockId, Vec<BlockId>>,
    merge_stack: &mut Vec<MergeFrame>,
    visited: &mut BTreeSet<BlockId>,
) -> Result<(), EmitError> {
    let Some(block) = block else {
        return Ok(());
    };
    if Some(block) == end_block || !visited.insert(block) {
        return Ok(());
    }
    if cfg.is_exit(block)? {
        return Ok(());
    }

    regions::handle_merge_stack(cfg, block, merge_stack)?;

    if cfg.is_header(block)? {
        let mut loops = Vec::new();
        for frame in merge_stack.iter() {
            if cfg.is_loop_header(frame.related_header)? {
                loops.push(frame.related_header);
            }
        }
        map.insert(block, loops);
    }

    if cfg.is_basic(block)? {
        let next = cfg.edge_index_to_dst(block, 0)?;
        walk(cfg, language, Some(next), end_block, map, merge_stack, visited)?;
    } else if cfg.is_loop_header(block)? {
        let body = cfg.edge_index_to_dst(block, 1)?;
        walk(
            cfg,
            language,
            Some(body),
            Some(block),
            map,
            merge_stack,
            visited,
        )?;
    } else if cfg.is_switch(block)? {
        let destinations = cfg.out_edges(block)?.to_vec();
        if let Some((&default, cases)) = destinations.split_last() {
            for (index, &case) in cases.iter().enumerate() {
                let next_case = if index + 1 == cases.len() {
                    default
                } else {
                    cases[index + 1]
                };
                let is_fallthrough =
                    regions::there_is_path_not_using_loop(cfg, merge_stack, case, next_case)?;
                if is_fallthrough && !language.allows_switch_fallthrough() {
                    return Err(EmitError::UnsupportedFeature {
                        language: language.name(),
                        feature: format!("switch fallthrough from {case} to {next_case}"),
                    });
                }
                let case_end = if is_fallthrough {
                    Some(next_case)
                } else {
                    Some(cfg.merge(block)?)
                };
                walk(cfg, language, Some(case), case_end, map, merge_stack, visited)?;
            }
            let default_end = regions::end_block_for_default(cfg, default, merge_stack, block)?;
            walk(
                cfg,
                language,
                Some(default),
                default_end,
                map,
                merge_stack,
                visited,
            )?;
        }
    } else {
        let merge = cfg.merge(block)?;
        let false_block = cfg.edge_index_to_dst(block, 0)?;
        let true_block = cfg.edge_index_to_dst(block, 1)?;
        walk(
            cfg,
            language,
            Some(false_block),
            Some(merge),
            map,
            merge_stack,
            visited,
        )?;
        walk(
            cfg,
            language,
            Some(true_block),
            Some(merge),
            map,
            merge_stack,
            visited,
        )?;
    }

    if cfg.merge_opt(block)?.is_some() {
        let merge = cfg.merge(block)?;
        walk(
            cfg,
            language,
            Some(merge),
            end_block,
            map,
            merge_stack,
            visited,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cfg::examples;

    use super::*;

    fn b(raw: u32) -> BlockId {
        BlockId::new(raw)
    }

    #[test]
    fn top_level_headers_have_no_enclosing_loops() {
        let cfg = examples::if_else();
        let map = enclosing_loops_exclusive(&cfg, Language::Glsl).unwrap();
        assert_eq!(map.get(&b(1)), Some(&vec![]));
    }

    #[test]
    fn nested_loop_sees_the_outer_one() {
        let cfg = examples::nested_while();
        let map = enclosing_loops_exclusive(&cfg, Language::Glsl).unwrap();
        assert_eq!(map.get(&b(2)), Some(&vec![]));
        assert_eq!(map.get(&b(4)), Some(&vec![b(2)]));
    }

    #[test]
    fn selection_inside_loop_is_enclosed() {
        let cfg = examples::early_continue();
        let map = enclosing_loops_exclusive(&cfg, Language::Glsl).unwrap();
        assert_eq!(map.get(&b(3)), Some(&vec![b(2)]));
    }

    #[test]
    fn unenclosed_headers_bake_constants() {
        let cfg = examples::if_else();
        let fleshing = Fleshing::compute(&cfg, Language::Glsl, &[1]).unwrap();
        assert_eq!(fleshing.substitute("$$read:1$$"), "cntrl_val = 1;");
        assert_eq!(fleshing.declarations(), "");
    }

    #[test]
    fn enclosed_headers_bake_arrays_with_cursors() {
        let cfg = examples::early_continue();
        // Two loop iterations: inner selection visited twice (1 then 0).
        let fleshing = Fleshing::compute(&cfg, Language::Glsl, &[1, 1, 1, 0, 0]).unwrap();
        let declarations = fleshing.declarations();
        assert!(declarations.contains("const int cntrl_arr_var_3[] = int[](1, 0);"));
        assert!(declarations.contains("int cntrl_ix_3 = 0;"));
        let read = fleshing.substitute("$$read:3$$");
        assert!(read.contains("cntrl_val = cntrl_arr_var_3[cntrl_ix_3];"));
        assert!(read.contains("cntrl_ix_3++;"));
    }

    #[test]
    fn loop_bound_is_a_constant_at_top_level() {
        let cfg = examples::while_loop();
        let fleshing = Fleshing::compute(&cfg, Language::Glsl, &[1, 1, 0]).unwrap();
        assert_eq!(fleshing.substitute("$$bound:2$$"), "2");
        assert_eq!(fleshing.substitute("$$advance:2$$"), "");
    }

    #[test]
    fn never_visited_headers_get_the_unused_sentinel() {
        let cfg = examples::nested_if();
        // Direction 0 takes the false arm; header 3 is never reached.
        let fleshing = Fleshing::compute(&cfg, Language::Glsl, &[0]).unwrap();
        assert_eq!(fleshing.substitute("$$read:3$$"), "cntrl_val = -1;");
    }

    #[test]
    fn unknown_markers_pass_through() {
        let cfg = examples::if_else();
        let fleshing = Fleshing::compute(&cfg, Language::Glsl, &[1]).unwrap();
        assert_eq!(fleshing.substitute("$$weird$$"), "$$weird$$");
    }
}

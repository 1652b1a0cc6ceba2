//! The CFG-to-source traversal.
//!
//! One recursive walk over the CFG produces the body of the fleshed program.
//! The walk carries the region's end block, a stack of `(merge, header)`
//! frames for the enclosing constructs, the entry block of the following
//! switch case when fallthrough is possible, and a counter for nested
//! WebAssembly switch labels. Each block is emitted at most once; the merge
//! block of a construct is always emitted after the construct itself.

use std::collections::BTreeSet;

use crate::cfg::{BlockId, StructuredCfg};
use crate::error::EmitError;
use crate::lang::{
    wasm_switch_case_wrap, wasm_switch_default_wrap, wasm_switch_inner_block, CodeType, Language,
};

/// One enclosing construct on the merge stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeFrame {
    /// The construct's merge block.
    pub merge_block: BlockId,
    /// The header that owns the construct.
    pub related_header: BlockId,
}

/// Emits the control-flow body of a program for one `(language, code type)`
/// pair. The emitted-set is reset on every [`CodeBuilder::build_code`] call.
#[derive(Debug)]
pub struct CodeBuilder<'a> {
    cfg: &'a StructuredCfg,
    language: Language,
    code_type: CodeType,
    added_blocks: BTreeSet<BlockId>,
}

impl<'a> CodeBuilder<'a> {
    /// Create a builder for the given CFG and target.
    #[must_use]
    pub fn new(cfg: &'a StructuredCfg, language: Language, code_type: CodeType) -> Self {
        CodeBuilder {
            cfg,
            language,
            code_type,
            added_blocks: BTreeSet::new(),
        }
    }

    /// Emit the control-flow body, starting at the entry block.
    ///
    /// # Errors
    ///
    /// Fails when the CFG violates the structured contract (missing merges,
    /// malformed loop headers) or requests a feature the target lacks.
    pub fn build_code(&mut self) -> Result<String, EmitError> {
        self.added_blocks.clear();
        let entry = self.cfg.entry()?;
        let mut merge_stack: Vec<MergeFrame> = Vec::new();
        self.code_in_block_range(Some(entry), None, &mut merge_stack, None, 0)
    }

    /// Emit the code for all blocks in the region `[block, end_block)`.
    ///
    /// When `block` is a header, `end_block` is normally the corresponding
    /// merge block.
    fn code_in_block_range(
        &mut self,
        block: Option<BlockId>,
        end_block: Option<BlockId>,
        merge_stack: &mut Vec<MergeFrame>,
        next_case_block: Option<BlockId>,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        let Some(block) = block else {
            return Ok(String::new());
        };
        if Some(block) == end_block || self.added_blocks.contains(&block) {
            return Ok(String::new());
        }

        self.handle_merge_stack(block, merge_stack)?;

        let mut code = String::new();

        // Loop headers record themselves inside the loop template.
        if !self.cfg.is_loop_header(block)? {
            code.push_str(&self.add_block(block)?);
        }

        if self.cfg.is_exit(block)? {
            code.push_str(self.language.exit_code());
        } else if self.cfg.is_basic(block)? {
            if self.cfg.is_break(block)? {
                code.push_str(self.language.break_code());
            } else if self.cfg.is_continue(block)? {
                code.push_str(self.language.continue_code());
            } else {
                let next = self.dst_block(block)?;
                code.push_str(&self.code_in_block_range(
                    next,
                    end_block,
                    merge_stack,
                    next_case_block,
                    switch_label_num,
                )?);
            }
        } else {
            let merge_block = self.cfg.merge(block)?;

            let construct = if self.cfg.is_loop_header(block)? {
                self.loop_code(block, merge_stack, next_case_block, switch_label_num)?
            } else if self.cfg.is_switch(block)? {
                self.switch_code(block, merge_stack, next_case_block, switch_label_num)?
            } else {
                self.selection_code(block, merge_stack, next_case_block, switch_label_num)?
            };
            code.push_str(&construct);

            // When the merge doubles as the next switch case, the enclosing
            // switch emits its code later.
            if Some(merge_block) != next_case_block {
                code.push_str(&self.code_in_block_range(
                    Some(merge_block),
                    end_block,
                    merge_stack,
                    next_case_block,
                    switch_label_num,
                )?);
            }
        }

        Ok(code)
    }

    /// Pop every enclosing construct whose merge is reached, then push the
    /// construct this block opens. Several headers may share one merge, so
    /// the pop loops.
    fn handle_merge_stack(
        &self,
        block: BlockId,
        merge_stack: &mut Vec<MergeFrame>,
    ) -> Result<(), EmitError> {
        regions::handle_merge_stack(self.cfg, block, merge_stack)
    }

    /// Record the block in the observable output and mark it emitted.
    fn add_block(&mut self, block: BlockId) -> Result<String, EmitError> {
        if !self.added_blocks.insert(block) {
            return Err(EmitError::DuplicateEmission { block });
        }
        Ok(self.language.block_emit(block))
    }

    fn dst_block(&self, block: BlockId) -> Result<Option<BlockId>, EmitError> {
        if self.cfg.out_degree(block)? == 0 {
            Ok(None)
        } else {
            Ok(Some(self.cfg.edge_index_to_dst(block, 0)?))
        }
    }

    // LOOPS

    fn loop_code(
        &mut self,
        block: BlockId,
        merge_stack: &mut Vec<MergeFrame>,
        next_case_block: Option<BlockId>,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        if self.cfg.out_degree(block)? != 2 {
            return Err(EmitError::Cfg(crate::error::CfgError::Invalid {
                reason: format!("loop header {block} must have out-degree 2"),
            }));
        }
        let merge_block = self.cfg.merge(block)?;
        let body_block = self.cfg.edge_index_to_dst(block, 1)?;

        let header_code = self.add_block(block)?;
        let body_code = self.code_in_block_range(
            Some(body_block),
            Some(merge_block),
            merge_stack,
            next_case_block,
            switch_label_num,
        )?;
        self.language
            .loop_template(self.code_type, block, &header_code, &body_code)
    }

    // SELECTIONS

    fn selection_code(
        &mut self,
        block: BlockId,
        merge_stack: &mut Vec<MergeFrame>,
        next_case_block: Option<BlockId>,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        let merge_block = self.cfg.merge(block)?;
        let true_block = self.cfg.edge_index_to_dst(block, 1)?;

        let true_code = self.code_in_block_range(
            Some(true_block),
            Some(merge_block),
            merge_stack,
            next_case_block,
            switch_label_num,
        )?;
        let else_code =
            self.else_code(block, merge_stack, next_case_block, switch_label_num)?;
        Ok(self
            .language
            .selection_template(self.code_type, block, &true_code, &else_code))
    }

    /// The else arm is present iff the false branch does not go straight to
    /// the merge block.
    fn else_code(
        &mut self,
        block: BlockId,
        merge_stack: &mut Vec<MergeFrame>,
        next_case_block: Option<BlockId>,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        let false_block = self.cfg.edge_index_to_dst(block, 0)?;
        let merge_block = self.cfg.merge(block)?;
        if false_block == merge_block {
            return Ok(String::new());
        }
        let false_code = self.code_in_block_range(
            Some(false_block),
            Some(merge_block),
            merge_stack,
            next_case_block,
            switch_label_num,
        )?;
        Ok(self.language.else_template(&false_code))
    }

    // SWITCHES

    fn switch_code(
        &mut self,
        block: BlockId,
        merge_stack: &mut Vec<MergeFrame>,
        next_case_block: Option<BlockId>,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        let destinations = self.cfg.out_edges(block)?.to_vec();
        let Some((&default, cases)) = destinations.split_last() else {
            return Err(EmitError::Cfg(crate::error::CfgError::Invalid {
                reason: format!("switch {block} has no out-edges"),
            }));
        };

        if self.language == Language::Wasm {
            self.wasm_switch_code(
                block,
                cases,
                default,
                merge_stack,
                next_case_block,
                switch_label_num,
            )
        } else {
            let mut cases_code = String::new();
            for index in 0..cases.len() {
                cases_code.push_str(&self.case_code(
                    block,
                    cases,
                    default,
                    index,
                    merge_stack,
                    next_case_block,
                    switch_label_num,
                )?);
            }
            let default_end = self.end_block_for_default(default, merge_stack, block)?;
            let default_body = self.code_in_block_range(
                Some(default),
                default_end,
                merge_stack,
                next_case_block,
                switch_label_num,
            )?;
            let default_code = self.language.switch_default_template(&default_body);
            Ok(self.language.switch_full_template(
                self.code_type,
                block,
                &cases_code,
                &default_code,
            ))
        }
    }

    fn case_code(
        &mut self,
        block: BlockId,
        cases: &[BlockId],
        default: BlockId,
        index: usize,
        merge_stack: &mut Vec<MergeFrame>,
        next_case_block: Option<BlockId>,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        let current_case = cases[index];
        let next_case = if index + 1 == cases.len() {
            default
        } else {
            cases[index + 1]
        };

        let is_fallthrough =
            self.there_is_path_not_using_loop(merge_stack, current_case, next_case)?;
        if is_fallthrough && !self.language.allows_switch_fallthrough() {
            return Err(EmitError::UnsupportedFeature {
                language: self.language.name(),
                feature: format!("switch fallthrough from {current_case} to {next_case}"),
            });
        }

        let case_end = if is_fallthrough {
            Some(next_case)
        } else {
            Some(self.cfg.merge(block)?)
        };
        let body = self.code_in_block_range(
            Some(current_case),
            case_end,
            merge_stack,
            next_case_block,
            switch_label_num,
        )?;
        let switch_break =
            self.switch_break_code(current_case, is_fallthrough, switch_label_num)?;
        Ok(self
            .language
            .switch_case_template(index, &body, &switch_break))
    }

    /// WebAssembly switches are a `br_table` inside a chain of labelled
    /// blocks: each case wraps the chain built so far, and the default wraps
    /// the whole construct together with the control read.
    fn wasm_switch_code(
        &mut self,
        block: BlockId,
        cases: &[BlockId],
        default: BlockId,
        merge_stack: &mut Vec<MergeFrame>,
        next_case_block: Option<BlockId>,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        let next_label_num = switch_label_num + 1;
        let mut chain = wasm_switch_inner_block(cases.len(), switch_label_num);

        for index in 0..cases.len() {
            let current_case = cases[index];
            let next_case = if index + 1 == cases.len() {
                default
            } else {
                cases[index + 1]
            };
            let is_fallthrough =
                self.there_is_path_not_using_loop(merge_stack, current_case, next_case)?;
            let case_end = if is_fallthrough {
                Some(next_case)
            } else {
                Some(self.cfg.merge(block)?)
            };
            let body = self.code_in_block_range(
                Some(current_case),
                case_end,
                merge_stack,
                Some(next_case),
                next_label_num,
            )?;
            let switch_break =
                self.switch_break_code(current_case, is_fallthrough, switch_label_num)?;
            chain = wasm_switch_case_wrap(index, &chain, &body, &switch_break);
        }

        let default_end = self.end_block_for_default(default, merge_stack, block)?;
        let default_body = self.code_in_block_range(
            Some(default),
            default_end,
            merge_stack,
            next_case_block,
            next_label_num,
        )?;
        Ok(wasm_switch_default_wrap(
            cases.len(),
            switch_label_num,
            &chain,
            &default_body,
        ))
    }

    /// No switch break when the case falls through, when the target is an
    /// exit (the return is emitted instead), or when the target is a
    /// break/continue block (those emit their own transfer).
    fn switch_break_code(
        &self,
        target: BlockId,
        is_fallthrough: bool,
        switch_label_num: usize,
    ) -> Result<String, EmitError> {
        if is_fallthrough
            || self.cfg.is_exit(target)?
            || self.cfg.is_break(target)?
            || self.cfg.is_continue(target)?
        {
            Ok(String::new())
        } else {
            Ok(self.language.switch_break(switch_label_num))
        }
    }

    /// End block for the default case. A default that *is* the surrounding
    /// merge marks a tree-like switch: its region then runs to the innermost
    /// enclosing loop header, or to the end of the program if there is none.
    fn end_block_for_default(
        &self,
        default: BlockId,
        merge_stack: &[MergeFrame],
        block: BlockId,
    ) -> Result<Option<BlockId>, EmitError> {
        regions::end_block_for_default(self.cfg, default, merge_stack, block)
    }

    /// Whether a path from `current_case` to `next_case` exists that does
    /// not cross the closest loop header enclosing the switch. This is the
    /// fallthrough test: such a path means the case reaches the next case
    /// from inside the switch.
    fn there_is_path_not_using_loop(
        &self,
        merge_stack: &[MergeFrame],
        current_case: BlockId,
        next_case: BlockId,
    ) -> Result<bool, EmitError> {
        regions::there_is_path_not_using_loop(self.cfg, merge_stack, current_case, next_case)
    }
}

/// Helpers shared with the header-guard fleshing traversal, which must walk
/// regions exactly the way emission does.
pub(crate) mod regions {
    use super::{BlockId, EmitError, MergeFrame, StructuredCfg};
    use crate::cfg::reachability;

    pub(crate) fn handle_merge_stack(
        cfg: &StructuredCfg,
        block: BlockId,
        merge_stack: &mut Vec<MergeFrame>,
    ) -> Result<(), EmitError> {
        while merge_stack
            .last()
            .map(|frame| frame.merge_block == block)
            .unwrap_or(false)
        {
            merge_stack.pop();
        }
        if cfg.is_header(block)? {
            merge_stack.push(MergeFrame {
                merge_block: cfg.merge(block)?,
                related_header: block,
            });
        }
        Ok(())
    }

    pub(crate) fn there_is_path_not_using_loop(
        cfg: &StructuredCfg,
        merge_stack: &[MergeFrame],
        current_case: BlockId,
        next_case: BlockId,
    ) -> Result<bool, EmitError> {
        let mut enclosing_loop = None;
        if merge_stack.len() > 1 {
            for frame in merge_stack[..merge_stack.len() - 1].iter().rev() {
                if cfg.is_loop_header(frame.related_header)? {
                    enclosing_loop = Some(frame.related_header);
                    break;
                }
            }
        }
        Ok(reachability::has_path_avoiding(
            cfg,
            current_case,
            next_case,
            enclosing_loop,
        ))
    }

    pub(crate) fn end_block_for_default(
        cfg: &StructuredCfg,
        default: BlockId,
        merge_stack: &[MergeFrame],
        block: BlockId,
    ) -> Result<Option<BlockId>, EmitError> {
        let top_merge = merge_stack.last().map(|frame| frame.merge_block);
        if Some(default) == top_merge {
            let above_top = merge_stack.len().saturating_sub(1);
            for frame in merge_stack[..above_top].iter().rev() {
                if cfg.is_loop_header(frame.related_header)? {
                    return Ok(Some(frame.related_header));
                }
            }
            Ok(None)
        } else {
            Ok(Some(cfg.merge(block)?))
        }
    }
}

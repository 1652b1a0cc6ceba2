//! Per-target language descriptors.
//!
//! Each target is a variant of [`Language`]; the code builder dispatches
//! explicitly on the variant rather than through dynamic lookup. The
//! descriptor functions return the template strings a target uses for block
//! emission, control reads, structured constructs, and the full program
//! skeleton.

mod glsl;
mod wasm;
mod wgsl;

pub(crate) use glsl::guard_declaration as glsl_guard_declaration;
pub(crate) use wasm::{
    switch_case_wrap as wasm_switch_case_wrap, switch_default_wrap as wasm_switch_default_wrap,
    switch_inner_block as wasm_switch_inner_block,
};
pub(crate) use wgsl::guard_declaration as wgsl_guard_declaration;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cfg::BlockId;
use crate::error::EmitError;

/// The emission mode: where the directions vector lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    /// Directions are read from an external input buffer at runtime.
    GlobalArray,
    /// Directions are baked into the program as a local constant array.
    LocalArray,
    /// Directions are compiled away: each header becomes a constant loop
    /// bound or a constant branch.
    HeaderGuard,
}

impl CodeType {
    /// Whether this mode reads directions from an array at runtime.
    #[must_use]
    pub fn is_array_type(self) -> bool {
        matches!(self, CodeType::GlobalArray | CodeType::LocalArray)
    }

    /// `text` when this is the global-array mode, empty otherwise.
    #[must_use]
    pub fn if_global(self, text: &str) -> String {
        if self == CodeType::GlobalArray {
            text.to_string()
        } else {
            String::new()
        }
    }

    /// `text` when this is the local-array mode, empty otherwise.
    #[must_use]
    pub fn if_local(self, text: &str) -> String {
        if self == CodeType::LocalArray {
            text.to_string()
        } else {
            String::new()
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeType::GlobalArray => "global_array",
            CodeType::LocalArray => "local_array",
            CodeType::HeaderGuard => "header_guard",
        };
        f.write_str(name)
    }
}

impl FromStr for CodeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "global_array" => Ok(CodeType::GlobalArray),
            "local_array" => Ok(CodeType::LocalArray),
            "header_guard" => Ok(CodeType::HeaderGuard),
            other => Err(format!(
                "invalid code type: {other}. Choose from: global_array, local_array, header_guard"
            )),
        }
    }
}

/// A code-emission target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// WebAssembly text format.
    Wasm,
    /// WGSL compute shaders.
    Wgsl,
    /// GLSL compute shaders.
    Glsl,
}

impl Language {
    /// All supported targets.
    pub const ALL: [Language; 3] = [Language::Wasm, Language::Wgsl, Language::Glsl];

    /// Lower-case target name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Language::Wasm => "wasm",
            Language::Wgsl => "wgsl",
            Language::Glsl => "glsl",
        }
    }

    /// Whether the target runs as a compute shader.
    #[must_use]
    pub fn is_shader_language(self) -> bool {
        matches!(self, Language::Wgsl | Language::Glsl)
    }

    /// Whether switch cases may fall through into the next case.
    #[must_use]
    pub fn allows_switch_fallthrough(self) -> bool {
        match self {
            Language::Wasm | Language::Glsl => true,
            Language::Wgsl => false,
        }
    }

    /// File-suffix hint. The human-readable form differs only for
    /// WebAssembly, whose binary encoding uses `.wasm`.
    #[must_use]
    pub fn extension(self, human_readable: bool) -> &'static str {
        match self {
            Language::Wasm => {
                if human_readable {
                    "wat"
                } else {
                    "wasm"
                }
            }
            Language::Wgsl => "wgsl",
            Language::Glsl => "glsl",
        }
    }

    /// Whether this language supports the given emission mode.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::UnsupportedFeature`] naming the gap.
    pub fn check_code_type(self, code_type: CodeType) -> Result<(), EmitError> {
        match (self, code_type) {
            (Language::Wasm, CodeType::LocalArray) => Err(EmitError::UnsupportedFeature {
                language: self.name(),
                feature: "local-array emission".to_string(),
            }),
            (Language::Wasm, CodeType::HeaderGuard) => Err(EmitError::UnsupportedFeature {
                language: self.name(),
                feature: "header-guard emission".to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// How a CFG block records itself in the observable output.
    #[must_use]
    pub fn block_emit(self, block: BlockId) -> String {
        match self {
            Language::Wasm => wasm::block_emit(block),
            Language::Wgsl => wgsl::block_emit(block),
            Language::Glsl => glsl::block_emit(block),
        }
    }

    /// Read the next directions element into the control variable and
    /// advance the cursor.
    #[must_use]
    pub fn set_and_inc_control(self) -> String {
        match self {
            Language::Wasm => wasm::set_and_inc_control(),
            Language::Wgsl => wgsl::set_and_inc_control(),
            Language::Glsl => glsl::set_and_inc_control(),
        }
    }

    /// The control read at a header for the given mode: a runtime read for
    /// array modes, a fleshing placeholder for header-guard mode.
    #[must_use]
    pub fn control_read(self, code_type: CodeType, block: BlockId) -> String {
        if code_type == CodeType::HeaderGuard {
            format!("$$read:{}$$\n", block.raw())
        } else {
            self.set_and_inc_control()
        }
    }

    /// The continue statement.
    #[must_use]
    pub fn continue_code(self) -> &'static str {
        match self {
            Language::Wasm => "(br $while)\n",
            Language::Wgsl => wgsl::BREAKLESS_CONTINUE,
            Language::Glsl => "continue;\n",
        }
    }

    /// The loop-break statement.
    #[must_use]
    pub fn break_code(self) -> &'static str {
        match self {
            Language::Wasm => "(br $comparison)\n",
            Language::Wgsl => wgsl::SENTINEL_BREAK,
            Language::Glsl => "break;\n",
        }
    }

    /// The program-exit statement.
    #[must_use]
    pub fn exit_code(self) -> &'static str {
        match self {
            Language::Wasm => "(return)\n",
            Language::Wgsl | Language::Glsl => "return;\n",
        }
    }

    /// The if/then(/else) shape around an emitted control read.
    #[must_use]
    pub fn selection_template(
        self,
        code_type: CodeType,
        block: BlockId,
        true_code: &str,
        else_code: &str,
    ) -> String {
        match self {
            Language::Wasm => wasm::selection(self, code_type, block, true_code, else_code),
            Language::Wgsl => wgsl::selection(self, code_type, block, true_code, else_code),
            Language::Glsl => glsl::selection(self, code_type, block, true_code, else_code),
        }
    }

    /// The else arm wrapping an emitted false-branch body.
    #[must_use]
    pub fn else_template(self, false_code: &str) -> String {
        match self {
            Language::Wasm => wasm::else_arm(false_code),
            Language::Wgsl => wgsl::else_arm(false_code),
            Language::Glsl => glsl::else_arm(false_code),
        }
    }

    /// The loop shape for the given mode.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::UnsupportedFeature`] for modes the target cannot
    /// express (header-guard WebAssembly).
    pub fn loop_template(
        self,
        code_type: CodeType,
        block: BlockId,
        header_code: &str,
        body_code: &str,
    ) -> Result<String, EmitError> {
        match self {
            Language::Wasm => wasm::loop_shape(code_type, header_code, body_code),
            Language::Wgsl => Ok(wgsl::loop_shape(self, code_type, block, header_code, body_code)),
            Language::Glsl => Ok(glsl::loop_shape(self, code_type, block, header_code, body_code)),
        }
    }

    /// One non-default switch case. WebAssembly cases are wrapped by the
    /// builder instead, because its switch is a chain of labelled blocks.
    #[must_use]
    pub fn switch_case_template(self, index: usize, case_code: &str, switch_break: &str) -> String {
        match self {
            Language::Wasm => String::new(),
            Language::Wgsl => wgsl::switch_case(index, case_code),
            Language::Glsl => glsl::switch_case(index, case_code, switch_break),
        }
    }

    /// The default switch case.
    #[must_use]
    pub fn switch_default_template(self, default_code: &str) -> String {
        match self {
            Language::Wasm => String::new(),
            Language::Wgsl => wgsl::switch_default(default_code),
            Language::Glsl => glsl::switch_default(default_code),
        }
    }

    /// The full switch statement around rendered cases and default.
    #[must_use]
    pub fn switch_full_template(
        self,
        code_type: CodeType,
        block: BlockId,
        cases_code: &str,
        default_code: &str,
    ) -> String {
        match self {
            Language::Wasm => String::new(),
            Language::Wgsl => wgsl::switch_full(self, code_type, block, cases_code, default_code),
            Language::Glsl => glsl::switch_full(self, code_type, block, cases_code, default_code),
        }
    }

    /// The statement that leaves the switch at the end of a case: a labelled
    /// branch for WebAssembly, nothing for WGSL (cases never fall through),
    /// a plain `break;` for GLSL.
    #[must_use]
    pub fn switch_break(self, label_num: usize) -> String {
        match self {
            Language::Wasm => wasm::switch_break_label(label_num),
            Language::Wgsl => String::new(),
            Language::Glsl => "break;".to_string(),
        }
    }

    /// Wrap the emitted body in the target's full program skeleton.
    #[must_use]
    pub fn full_program(
        self,
        code_type: CodeType,
        control_flow_code: &str,
        guard_declarations: Option<&str>,
        directions: Option<&[u32]>,
    ) -> String {
        match self {
            Language::Wasm => wasm::full_program(code_type, control_flow_code),
            Language::Wgsl => {
                wgsl::full_program(code_type, control_flow_code, guard_declarations, directions)
            }
            Language::Glsl => {
                glsl::full_program(code_type, control_flow_code, guard_declarations, directions)
            }
        }
    }

    /// Indent and line-wrap emitted code.
    #[must_use]
    pub fn format_code(self, code: &str) -> String {
        match self {
            Language::Wasm => crate::emit::format::format_code(
                code,
                &[";; setup", ";; control flow code"],
                ('(', ')'),
                ";;",
            ),
            Language::Wgsl => {
                crate::emit::format::format_code(code, &["@compute"], ('{', '}'), "//")
            }
            Language::Glsl => crate::emit::format::format_code(
                code,
                &["layout", "void main()"],
                ('{', '}'),
                "//",
            ),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "wasm" | "wat" => Ok(Language::Wasm),
            "wgsl" => Ok(Language::Wgsl),
            "glsl" => Ok(Language::Glsl),
            other => Err(format!(
                "invalid language: {other}. Choose from: wasm, wgsl, glsl"
            )),
        }
    }
}

/// Name of the scalar holding the most recent control value.
#[must_use]
pub(crate) fn cntrl_val_name(language: Language) -> &'static str {
    match language {
        Language::Wasm => "$cntrl_val",
        Language::Wgsl | Language::Glsl => "cntrl_val",
    }
}

/// Name of the per-header constant array used by header-guard mode.
#[must_use]
pub(crate) fn cntrl_arr_name(block: BlockId) -> String {
    format!("cntrl_arr_var_{}", block.raw())
}

/// Name of the per-header cursor into [`cntrl_arr_name`].
#[must_use]
pub(crate) fn cntrl_cursor_name(block: BlockId) -> String {
    format!("cntrl_ix_{}", block.raw())
}

/// Name of a baked loop's induction variable.
#[must_use]
pub(crate) fn loop_ix_name(block: BlockId) -> String {
    format!("ix_{}", block.raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_round_trips() {
        for language in Language::ALL {
            assert_eq!(language.name().parse::<Language>().unwrap(), language);
        }
        assert_eq!("GLOBAL_ARRAY".parse::<CodeType>().unwrap(), CodeType::GlobalArray);
        assert!("brainfuck".parse::<Language>().is_err());
    }

    #[test]
    fn fallthrough_capability_matrix() {
        assert!(Language::Wasm.allows_switch_fallthrough());
        assert!(Language::Glsl.allows_switch_fallthrough());
        assert!(!Language::Wgsl.allows_switch_fallthrough());
    }

    #[test]
    fn wasm_rejects_embedded_direction_modes() {
        assert!(Language::Wasm.check_code_type(CodeType::GlobalArray).is_ok());
        assert!(Language::Wasm.check_code_type(CodeType::LocalArray).is_err());
        assert!(Language::Wasm.check_code_type(CodeType::HeaderGuard).is_err());
        for language in [Language::Wgsl, Language::Glsl] {
            for code_type in [CodeType::GlobalArray, CodeType::LocalArray, CodeType::HeaderGuard] {
                assert!(language.check_code_type(code_type).is_ok());
            }
        }
    }

    #[test]
    fn extensions_differ_for_wasm_only() {
        assert_eq!(Language::Wasm.extension(true), "wat");
        assert_eq!(Language::Wasm.extension(false), "wasm");
        assert_eq!(Language::Wgsl.extension(true), "wgsl");
    }

    #[test]
    fn glsl_switch_break_reads_like_a_case_end() {
        // The GLSL switch break is the plain statement, indistinguishable
        // from a loop break at the text level.
        assert_eq!(Language::Glsl.switch_break(3), "break;");
        assert_eq!(Language::Wgsl.switch_break(3), "");
        assert_eq!(Language::Wasm.switch_break(3), "(br $switch3)");
    }
}

//! WGSL compute-shader templates.
//!
//! WGSL forbids switch fallthrough, so case bodies need no trailing break.
//! A loop break inside a switch cannot use `break` (that leaves the switch
//! only); instead the break statement poisons the control value with -1 and
//! continues, and the loop's `continuing` clause turns the sentinel into a
//! real loop exit.

use crate::cfg::BlockId;

use super::{cntrl_arr_name, cntrl_cursor_name, cntrl_val_name, loop_ix_name, CodeType, Language};

/// Continue goes straight to the `continuing` clause.
pub(super) const BREAKLESS_CONTINUE: &str = "continue;\n";

/// Loop break via the -1 sentinel; see the module docs.
pub(super) const SENTINEL_BREAK: &str =
    "cntrl_val = -1;\ncontinue; // 'break' breaks from switch, not loop. This code works cleaner for the latter.\n";

pub(super) fn block_emit(block: BlockId) -> String {
    format!(
        r"// ------ BLOCK {n} -------
output_data[output_ix] = {n};
output_ix++;
// ------------------------
",
        n = block.raw()
    )
}

pub(super) fn set_and_inc_control() -> String {
    format!(
        "cntrl_ix++;\n{cntrl} = input_data[cntrl_ix];\n",
        cntrl = cntrl_val_name(Language::Wgsl)
    )
}

pub(super) fn selection(
    language: Language,
    code_type: CodeType,
    block: BlockId,
    true_code: &str,
    else_code: &str,
) -> String {
    format!(
        r"{read}
if ({cntrl} == 1) {{
    {true_code}
}}
{else_code}
",
        read = language.control_read(code_type, block),
        cntrl = cntrl_val_name(Language::Wgsl),
    )
}

pub(super) fn else_arm(false_code: &str) -> String {
    format!(
        r"else {{
    {false_code}
}}
"
    )
}

pub(super) fn loop_shape(
    language: Language,
    code_type: CodeType,
    block: BlockId,
    header_code: &str,
    body_code: &str,
) -> String {
    if code_type == CodeType::HeaderGuard {
        let ix = loop_ix_name(block);
        let n = block.raw();
        return format!(
            r"var {ix}: i32 = 0;
loop {{
    {header_code}
    if ({ix} == $$bound:{n}$$) {{
        break;
    }}
    {body_code}
    continuing {{
        {ix} = {ix} + 1;
        break if {cntrl} == -1;
    }}
}}
{cntrl} = 0; // clear the break sentinel so it cannot leak into an enclosing loop
$$advance:{n}$$
",
            cntrl = cntrl_val_name(Language::Wgsl),
        );
    }

    format!(
        r"{read}
loop {{
    {header_code}
    if {cntrl} != 1 {{
        break;
    }}
    {body_code}
    continuing {{
        if {cntrl} != -1 {{
            {reread}
        }}
        break if {cntrl} == -1; // way to break out of a loop while in a switch (`break` in a switch just leaves switch)
    }}
}}
{cntrl} = 0; // clear the break sentinel so it cannot leak into an enclosing loop
",
        read = language.control_read(code_type, block),
        reread = set_and_inc_control(),
        cntrl = cntrl_val_name(Language::Wgsl),
    )
}

pub(super) fn switch_case(index: usize, case_code: &str) -> String {
    format!(
        r"case {index}: {{
    {case_code}
}}
"
    )
}

pub(super) fn switch_default(default_code: &str) -> String {
    format!(
        r"default: {{
    {default_code}
}}
"
    )
}

pub(super) fn switch_full(
    language: Language,
    code_type: CodeType,
    block: BlockId,
    cases_code: &str,
    default_code: &str,
) -> String {
    format!(
        r"{read}
switch ({cntrl}) {{
    {cases_code}
    {default_code}
}}
",
        read = language.control_read(code_type, block),
        cntrl = cntrl_val_name(Language::Wgsl),
    )
}

/// Declaration of one baked control array plus its cursor.
pub(crate) fn guard_declaration(block: BlockId, values: &[i64]) -> String {
    let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!(
        "const {arr} = array<i32, {len}>({values});\nvar {cursor}: i32 = 0;\n",
        arr = cntrl_arr_name(block),
        len = values.len(),
        values = rendered.join(", "),
        cursor = cntrl_cursor_name(block),
    )
}

fn local_directions_declaration(directions: &[u32]) -> String {
    // An empty embedded array is not valid WGSL; pad with a never-read zero.
    let padded: Vec<String> = if directions.is_empty() {
        vec!["0".to_string()]
    } else {
        directions.iter().map(ToString::to_string).collect()
    };
    format!(
        "const input_data = array<i32, {len}>({values});",
        len = padded.len(),
        values = padded.join(", "),
    )
}

pub(super) fn full_program(
    code_type: CodeType,
    control_flow_code: &str,
    guard_declarations: Option<&str>,
    directions: Option<&[u32]>,
) -> String {
    // WGSL silently discards bindings not used by the shader, then errors
    // because the pipeline still supplies them; touching input_data keeps
    // the binding alive for programs that never read a direction.
    let keep_binding = code_type.if_global("var use_input_data = input_data[0];\n");

    if code_type == CodeType::HeaderGuard {
        return format!(
            r"@group(0) @binding(0) var<storage, read_write> output_data: array<i32>;
@group(0) @binding(1) var<storage, read_write> input_data: array<i32>;

@compute @workgroup_size(1)
fn control_flow( @builtin(global_invocation_id) id: vec3u ) {{
    var output_ix: i32 = 0;
    var {cntrl}: i32;
    {declarations}
    {control_flow_code}
}}
",
            cntrl = cntrl_val_name(Language::Wgsl),
            declarations = guard_declarations.unwrap_or_default(),
        );
    }

    let local_directions = match directions {
        Some(values) if code_type == CodeType::LocalArray => local_directions_declaration(values),
        _ => String::new(),
    };
    format!(
        r"@group(0) @binding(0) var<storage, read_write> output_data: array<i32>;
{input_binding}

@compute @workgroup_size(1)
fn control_flow( @builtin(global_invocation_id) id: vec3u ) {{
    var cntrl_ix: i32 = -1; // always incremented before use
    var output_ix: i32 = 0;
    var {cntrl}: i32; // assigned prior to use
    {local_directions}
    {keep_binding}{control_flow_code}
}}
",
        input_binding = code_type
            .if_global("@group(0) @binding(1) var<storage, read_write> input_data: array<i32>;"),
        cntrl = cntrl_val_name(Language::Wgsl),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_break_poisons_and_continues() {
        assert!(SENTINEL_BREAK.contains("cntrl_val = -1;"));
        assert!(SENTINEL_BREAK.contains("continue;"));
    }

    #[test]
    fn array_loop_rereads_in_continuing() {
        let shape = loop_shape(Language::Wgsl, CodeType::GlobalArray, BlockId::new(2), "H", "B");
        assert!(shape.contains("continuing"));
        assert!(shape.contains("break if cntrl_val == -1;"));
        assert!(shape.contains("input_data[cntrl_ix]"));
    }

    #[test]
    fn guard_loop_uses_bound_placeholders() {
        let shape = loop_shape(Language::Wgsl, CodeType::HeaderGuard, BlockId::new(2), "H", "B");
        assert!(shape.contains("$$bound:2$$"));
        assert!(shape.contains("$$advance:2$$"));
        assert!(shape.contains("var ix_2: i32 = 0;"));
    }

    #[test]
    fn local_array_embeds_directions() {
        let program = full_program(CodeType::LocalArray, "return;", None, Some(&[1, 0, 2]));
        assert!(program.contains("const input_data = array<i32, 3>(1, 0, 2);"));
        assert!(!program.contains("@binding(1)"));
    }

    #[test]
    fn empty_local_directions_are_padded() {
        let program = full_program(CodeType::LocalArray, "return;", None, Some(&[]));
        assert!(program.contains("array<i32, 1>(0)"));
    }

    #[test]
    fn global_array_keeps_the_binding_alive() {
        let program = full_program(CodeType::GlobalArray, "return;", None, None);
        assert!(program.contains("use_input_data"));
        assert!(program.contains("@binding(1)"));
    }
}

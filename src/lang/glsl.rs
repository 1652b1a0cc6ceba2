//! GLSL compute-shader templates.
//!
//! Loop headers are not conditional expressions in the emitted code, so the
//! array-mode loop is a `while (true)` that re-reads the control value at
//! the top of every iteration. The switch break is the plain `break;`
//! statement and therefore textually identical to a loop break.

use crate::cfg::BlockId;

use super::{cntrl_arr_name, cntrl_cursor_name, cntrl_val_name, loop_ix_name, CodeType, Language};

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
        cntrl = cntrl_val_name(Language::Glsl)
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
        cntrl = cntrl_val_name(Language::Glsl),
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
            r"for (int {ix} = 0; {ix} <= $$bound:{n}$$; ++{ix}) {{
    {header_code}
    if ({ix} == $$bound:{n}$$) {{
        break;
    }}
    {body_code}
}}
$$advance:{n}$$
"
        );
    }

    format!(
        r"while (true) {{
    {header_code}
    {read}
    if ({cntrl} != 1) {{
        break;
    }}
    {body_code}
}}
",
        read = set_and_inc_control(),
        cntrl = cntrl_val_name(Language::Glsl),
    )
}

pub(super) fn switch_case(index: usize, case_code: &str, possible_switch_break: &str) -> String {
    format!(
        r"case {index}: {{
    {case_code}
    {possible_switch_break}
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
        cntrl = cntrl_val_name(Language::Glsl),
    )
}

/// Declaration of one baked control array plus its cursor.
pub(crate) fn guard_declaration(block: BlockId, values: &[i64]) -> String {
    let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!(
        "const int {arr}[] = int[]({values});\nint {cursor} = 0;\n",
        arr = cntrl_arr_name(block),
        values = rendered.join(", "),
        cursor = cntrl_cursor_name(block),
    )
}

fn local_directions_declaration(directions: &[u32]) -> String {
    // `int[]()` is not valid GLSL; pad with a never-read zero.
    let padded: Vec<String> = if directions.is_empty() {
        vec!["0".to_string()]
    } else {
        directions.iter().map(ToString::to_string).collect()
    };
    format!("const int input_data[] = int[]({});", padded.join(", "))
}

fn directions_layout_binding() -> &'static str {
    "layout(std430, binding = 1) buffer directions {\n\tuint input_data[];\n};"
}

pub(super) fn full_program(
    code_type: CodeType,
    control_flow_code: &str,
    guard_declarations: Option<&str>,
    directions: Option<&[u32]>,
) -> String {
    let program_start = r"#version 450

layout(local_size_x=1, local_size_y=1, local_size_z=1) in;

layout(std430, binding = 0) buffer actual_path {
    uint output_data[];
};
";

    if code_type == CodeType::HeaderGuard {
        return format!(
            r"{program_start}

void main() {{
    int output_ix = 0;
    int {cntrl};
    {declarations}
    {control_flow_code}
}}
",
            cntrl = cntrl_val_name(Language::Glsl),
            declarations = guard_declarations.unwrap_or_default(),
        );
    }

    let local_directions = match directions {
        Some(values) if code_type == CodeType::LocalArray => local_directions_declaration(values),
        _ => String::new(),
    };
    format!(
        r"{program_start}
{directions_binding}
void main() {{
    int cntrl_ix = -1; // always incremented before use
    int output_ix = 0;
    int {cntrl};
    {local_directions}
    {control_flow_code}
}}
",
        directions_binding = code_type.if_global(directions_layout_binding()),
        cntrl = cntrl_val_name(Language::Glsl),
    )
}

//! WebAssembly text-format templates.
//!
//! The module records visited blocks through a `$store_in_output` helper
//! writing into an exported output memory; directions arrive through an
//! imported memory read by `$calc_cntrl_val`. Loops are a `$comparison`
//! block around a `$while` loop, so `(br $comparison)` is a loop break and
//! `(br $while)` a continue. Switches are a `br_table` inside a chain of
//! labelled blocks, one per case.

use crate::cfg::BlockId;
use crate::error::EmitError;

use super::{cntrl_val_name, CodeType, Language};

pub(super) fn block_emit(block: BlockId) -> String {
    format!(
        r";; ------ BLOCK {n} -------
(call $store_in_output
    (local.get $output_index)
    (i32.const {n})
)
(local.set $output_index
    (call $inc (local.get $output_index))
)
;; ------------------------
",
        n = block.raw()
    )
}

pub(super) fn set_and_inc_control() -> String {
    format!(
        r"(local.set $control_index
    (call $inc (local.get $control_index))
)
(local.set {cntrl}
    (call $calc_cntrl_val (local.get $control_index))
)
",
        cntrl = cntrl_val_name(Language::Wasm)
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
(if (i32.eq (local.get {cntrl}) (i32.const 1))
    (then
        {true_code}
    )
    {else_code}
)
",
        read = language.control_read(code_type, block),
        cntrl = cntrl_val_name(Language::Wasm),
    )
}

pub(super) fn else_arm(false_code: &str) -> String {
    format!(
        r"(else
    {false_code}
)
"
    )
}

pub(super) fn loop_shape(
    code_type: CodeType,
    header_code: &str,
    body_code: &str,
) -> Result<String, EmitError> {
    if !code_type.is_array_type() {
        return Err(EmitError::UnsupportedFeature {
            language: Language::Wasm.name(),
            feature: "header-guard loops".to_string(),
        });
    }
    Ok(format!(
        r"(block $comparison
    (loop $while
        ;; comparison block
        {header_code}
        ;; comparison
        {read}
        (br_if $comparison (i32.eqz (local.get {cntrl})))
        ;; condition TRUE - loop body
        {body_code}
        (br $while)
    )
)
;; condition FALSE - merge block
",
        read = set_and_inc_control(),
        cntrl = cntrl_val_name(Language::Wasm),
    ))
}

/// Label of the `n`-th nested switch.
pub(super) fn switch_label(label_num: usize) -> String {
    format!("$switch{label_num}")
}

/// The branch that leaves the `n`-th nested switch.
pub(super) fn switch_break_label(label_num: usize) -> String {
    format!("(br {})", switch_label(label_num))
}

fn build_br_table(case_count: usize) -> String {
    let mut table = String::new();
    for case in 0..case_count {
        table.push_str(&format!("{case}\t ;; case == {case} => (br {case})\n"));
    }
    table.push_str(&format!(
        "{default}\t ;; default => (br {default})\n",
        default = case_count
    ));
    table
}

/// The innermost block of the switch chain: dispatch through `br_table`,
/// with an unreachable guard value recorded if the table is somehow missed.
pub(crate) fn switch_inner_block(case_count: usize, label_num: usize) -> String {
    format!(
        r"(block (local.get {cntrl})
    (br_table
        {table}
    )
    ;; guard from UB
    (call $store_in_output (local.get $output_index)(i32.const -1))
    (local.set $output_index (call $inc (local.get $output_index)))
    (br {label})
)
",
        cntrl = cntrl_val_name(Language::Wasm),
        table = build_br_table(case_count),
        label = switch_label(label_num),
    )
}

/// Wrap the accumulated chain in one case's labelled block.
pub(crate) fn switch_case_wrap(
    index: usize,
    accumulated: &str,
    case_code: &str,
    possible_switch_break: &str,
) -> String {
    format!(
        r"(block
    {accumulated}
    ;; Target for (br {index})
    {case_code}
    {possible_switch_break}
)
"
    )
}

/// Wrap the finished case chain in the outer labelled block holding the
/// default target, preceded by the control read feeding the `br_table`.
pub(crate) fn switch_default_wrap(
    case_count: usize,
    label_num: usize,
    accumulated: &str,
    default_code: &str,
) -> String {
    format!(
        r"{read}
(block {label}
    {accumulated}
    ;; Target for (br {index}) => default
    {default_code}
)
",
        read = set_and_inc_control(),
        label = switch_label(label_num),
        index = case_count,
    )
}

pub(super) fn full_program(code_type: CodeType, control_flow_code: &str) -> String {
    let calc_cntrl_val = r"(func $calc_cntrl_val (param $index i32) (result i32)
    (i32.load
        (memory 0)
        (call $byte_offset(local.get $index))
    )
)";
    format!(
        r#"(module

{import_memory}

(memory $outputMemory 1)
(export "outputMemory" (memory $outputMemory))

(global $elem_size i32 (i32.const 4))

(func $byte_offset (param $index i32) (result i32)
    (i32.mul (local.get $index) (global.get $elem_size))
)
(func $inc (param $num i32) (result i32)
    (i32.add (local.get $num) (i32.const 1))
)
(func $dec (param $num i32) (result i32)
    (i32.sub (local.get $num) (i32.const 1))
)
{calc_cntrl_val}

(func $store_in_output (param $index i32) (param $value i32)
    (i32.store
        (memory $outputMemory)
        (call $byte_offset (local.get $index))
        (local.get $value)
    )
)

(func $cf (export "cf")

    ;; setup

    (local $output_index i32)
    {control_index_local}
    (local {cntrl} i32)
    (local.set $output_index (i32.const 0))
    {control_index_init}

    ;; control flow code

    {control_flow_code}

)
)
"#,
        import_memory = code_type.if_global(r#"(import "js" "memory" (memory 0))"#),
        calc_cntrl_val = code_type.if_global(calc_cntrl_val),
        control_index_local = code_type.if_global("(local $control_index i32)"),
        control_index_init = code_type.if_global(
            "(local.set $control_index (i32.const -1)) ;; always incremented before cntrl_val is calculated and used"
        ),
        cntrl = cntrl_val_name(Language::Wasm),
    )
}

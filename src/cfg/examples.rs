//! Canonical example CFGs.
//!
//! Hand-built graphs covering every construct the emitter supports. They are
//! the shared corpus for unit tests, the integration scenarios, the
//! benchmarks, and the fuzz targets.

use crate::error::CfgError;

use super::{Attribute, BlockId, StructuredCfg};

fn cfg_from_edges(edges: &[(u32, u32)]) -> StructuredCfg {
    let mut cfg = StructuredCfg::with_entry(BlockId::ENTRY);
    for &(from, to) in edges {
        // Example graphs are static; a self-loop here is a typo in the table.
        if let Err(err) = cfg.add_edge(BlockId::new(from), BlockId::new(to)) {
            unreachable!("bad example edge {from}->{to}: {err}");
        }
    }
    cfg
}

fn set(cfg: &mut StructuredCfg, block: u32, attribute: Attribute) {
    if let Err(err) = cfg.set_attribute(BlockId::new(block), attribute) {
        unreachable!("bad example attribute on {block}: {err}");
    }
}

fn selection(cfg: &mut StructuredCfg, block: u32, merge: u32) {
    set(cfg, block, Attribute::SelectionHeader);
    set(cfg, block, Attribute::Merge(BlockId::new(merge)));
}

fn switch(cfg: &mut StructuredCfg, block: u32, merge: u32) {
    set(cfg, block, Attribute::SelectionHeader);
    set(cfg, block, Attribute::SwitchBlock);
    set(cfg, block, Attribute::Merge(BlockId::new(merge)));
}

fn loop_header(cfg: &mut StructuredCfg, block: u32, merge: u32) {
    set(cfg, block, Attribute::SelectionHeader);
    set(cfg, block, Attribute::LoopHeader);
    set(cfg, block, Attribute::Merge(BlockId::new(merge)));
}

/// If-then: `1 → {3, 2}`, true branch 2 rejoining at 3.
#[must_use]
pub fn if_then() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 3), (1, 2), (2, 3)]);
    selection(&mut cfg, 1, 3);
    cfg
}

/// If-else: `1 → {2, 3}`, both branches rejoining at 4.
#[must_use]
pub fn if_else() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
    selection(&mut cfg, 1, 4);
    cfg
}

/// A selection whose true branch holds a nested if-then.
#[must_use]
pub fn nested_if() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (1, 3), (2, 6), (3, 5), (3, 4), (4, 5), (5, 6)]);
    selection(&mut cfg, 1, 6);
    selection(&mut cfg, 3, 5);
    cfg
}

/// While loop: header 2 with out-edges `[5, 3]`, body `3 → 4 → 2`.
#[must_use]
pub fn while_loop() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (2, 5), (2, 3), (3, 4), (4, 2)]);
    loop_header(&mut cfg, 2, 5);
    cfg
}

/// Two nested while loops.
#[must_use]
pub fn nested_while() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (2, 7),
        (2, 3),
        (3, 4),
        (4, 6),
        (4, 5),
        (5, 4),
        (6, 2),
    ]);
    loop_header(&mut cfg, 2, 7);
    loop_header(&mut cfg, 4, 6);
    cfg
}

/// Loop whose body selection can continue straight back to the header.
#[must_use]
pub fn early_continue() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (2, 5), (2, 3), (3, 4), (3, 6), (6, 2), (4, 2)]);
    loop_header(&mut cfg, 2, 5);
    selection(&mut cfg, 3, 4);
    set(&mut cfg, 6, Attribute::ContinueBlock);
    cfg
}

/// Loop whose body selection can break straight to the loop merge.
#[must_use]
pub fn early_break() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (2, 5), (2, 3), (3, 4), (3, 6), (6, 5), (4, 2)]);
    loop_header(&mut cfg, 2, 5);
    selection(&mut cfg, 3, 4);
    set(&mut cfg, 6, Attribute::BreakBlock);
    cfg
}

/// A switch inside a loop with one continue case and one break case.
#[must_use]
pub fn early_mixed_switch() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (2, 9),
        (2, 3),
        (3, 4),
        (3, 5),
        (3, 6),
        (4, 2),
        (5, 9),
        (6, 8),
        (8, 2),
    ]);
    loop_header(&mut cfg, 2, 9);
    switch(&mut cfg, 3, 8);
    set(&mut cfg, 4, Attribute::ContinueBlock);
    set(&mut cfg, 5, Attribute::BreakBlock);
    cfg
}

/// Switch with one fallthrough case: case 0 (block 2) falls into the
/// default (block 3).
#[must_use]
pub fn switch_fallthrough() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (1, 3), (2, 3), (3, 4)]);
    switch(&mut cfg, 1, 4);
    cfg
}

/// Three-way switch, every case rejoining at the merge.
#[must_use]
pub fn switch_no_fallthrough() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (1, 3), (1, 4), (2, 5), (3, 5), (4, 5)]);
    switch(&mut cfg, 1, 5);
    cfg
}

/// Switch inside a loop, no fallthrough.
#[must_use]
pub fn switch_in_loop() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (2, 8),
        (2, 3),
        (3, 4),
        (3, 5),
        (3, 6),
        (4, 7),
        (5, 7),
        (6, 7),
        (7, 2),
    ]);
    loop_header(&mut cfg, 2, 8);
    switch(&mut cfg, 3, 7);
    cfg
}

/// Switch inside a loop where case 0 falls through into case 1.
#[must_use]
pub fn switch_in_loop_with_fallthrough() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (2, 9),
        (2, 3),
        (3, 4),
        (3, 5),
        (3, 6),
        (4, 5),
        (5, 8),
        (6, 8),
        (8, 2),
    ]);
    loop_header(&mut cfg, 2, 9);
    switch(&mut cfg, 3, 8);
    cfg
}

/// Tree-like nested switches: each default *is* the merge, and the selected
/// leaf is an exit, so no merge code runs after it.
#[must_use]
pub fn switch_nested_tree() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (1, 3),
        (1, 10),
        (3, 7),
        (3, 8),
        (3, 9),
        (3, 10),
    ]);
    switch(&mut cfg, 1, 10);
    switch(&mut cfg, 3, 10);
    cfg
}

/// A merge block that is itself a selection header.
#[must_use]
pub fn merge_is_selection_header() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (1, 3),
        (2, 4),
        (3, 4),
        (4, 5),
        (4, 6),
        (5, 7),
        (6, 7),
    ]);
    selection(&mut cfg, 1, 4);
    selection(&mut cfg, 4, 7);
    cfg
}

/// A loop and an inner selection sharing one merge block; both branches of
/// the selection break out of the loop.
#[must_use]
pub fn shared_merge_loop() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (2, 5),
        (2, 3),
        (3, 6),
        (3, 7),
        (6, 5),
        (7, 5),
        (5, 8),
    ]);
    loop_header(&mut cfg, 2, 5);
    selection(&mut cfg, 3, 5);
    set(&mut cfg, 6, Attribute::BreakBlock);
    set(&mut cfg, 7, Attribute::BreakBlock);
    cfg
}

/// Every example CFG with a stable name, fallthrough cases included.
#[must_use]
pub fn all() -> Vec<(&'static str, StructuredCfg)> {
    vec![
        ("if_then", if_then()),
        ("if_else", if_else()),
        ("nested_if", nested_if()),
        ("while_loop", while_loop()),
        ("nested_while", nested_while()),
        ("early_continue", early_continue()),
        ("early_break", early_break()),
        ("early_mixed_switch", early_mixed_switch()),
        ("switch_fallthrough", switch_fallthrough()),
        ("switch_no_fallthrough", switch_no_fallthrough()),
        ("switch_in_loop", switch_in_loop()),
        ("switch_in_loop_with_fallthrough", switch_in_loop_with_fallthrough()),
        ("switch_nested_tree", switch_nested_tree()),
        ("merge_is_selection_header", merge_is_selection_header()),
        ("shared_merge_loop", shared_merge_loop()),
    ]
}

/// The examples that contain no switch fallthrough, for targets that forbid
/// it.
#[must_use]
pub fn all_without_fallthrough() -> Vec<(&'static str, StructuredCfg)> {
    all()
        .into_iter()
        .filter(|(name, _)| {
            *name != "switch_fallthrough" && *name != "switch_in_loop_with_fallthrough"
        })
        .collect()
}

/// A short valid directions vector per example, used by smoke tests.
pub fn sample_directions(name: &str) -> Result<Vec<u32>, CfgError> {
    let directions: &[u32] = match name {
        "if_then" => &[1],
        "if_else" => &[0],
        "nested_if" => &[1, 1],
        "while_loop" => &[1, 0],
        "nested_while" => &[1, 1, 0, 0],
        "early_continue" => &[1, 1, 0],
        "early_break" => &[1, 1],
        "early_mixed_switch" => &[1, 1],
        "switch_fallthrough" => &[0],
        "switch_no_fallthrough" => &[2],
        "switch_in_loop" => &[1, 0, 0],
        "switch_in_loop_with_fallthrough" => &[1, 0, 0],
        "switch_nested_tree" => &[1, 2],
        "merge_is_selection_header" => &[0, 1],
        "shared_merge_loop" => &[1, 0],
        other => {
            return Err(CfgError::Invalid {
                reason: format!("no sample directions for example {other}"),
            })
        }
    };
    Ok(directions.to_vec())
}

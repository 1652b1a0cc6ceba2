//! End-to-end scenarios: canonical CFGs, their oracle paths, and their
//! emissions in every supported mode.

use cfg_flesher::cfg::{expected_path, Attribute, BlockId, StructuredCfg};
use cfg_flesher::emit::{glsl_shader_test, SourceProgram};
use cfg_flesher::lang::{CodeType, Language};

fn b(raw: u32) -> BlockId {
    BlockId::new(raw)
}

fn cfg_from_edges(edges: &[(u32, u32)]) -> StructuredCfg {
    let mut cfg = StructuredCfg::with_entry(b(1));
    for &(from, to) in edges {
        cfg.add_edge(b(from), b(to)).unwrap();
    }
    cfg
}

fn path_of(cfg: &StructuredCfg, directions: &[u32]) -> Vec<u32> {
    expected_path(cfg, directions)
        .unwrap()
        .iter()
        .map(|id| id.raw())
        .collect()
}

/// Every `(language, code type)` pair that can emit the given CFG.
fn supported_modes(has_fallthrough: bool) -> Vec<(Language, CodeType)> {
    let mut modes = Vec::new();
    for language in Language::ALL {
        if has_fallthrough && !language.allows_switch_fallthrough() {
            continue;
        }
        for code_type in [
            CodeType::GlobalArray,
            CodeType::LocalArray,
            CodeType::HeaderGuard,
        ] {
            if language.check_code_type(code_type).is_ok() {
                modes.push((language, code_type));
            }
        }
    }
    modes
}

fn emit_all_modes(cfg: &StructuredCfg, directions: &[u32], has_fallthrough: bool) {
    for (language, code_type) in supported_modes(has_fallthrough) {
        let program = SourceProgram::generate(cfg, language, code_type, Some(directions))
            .unwrap_or_else(|err| panic!("{language}/{code_type}: {err}"));
        assert!(!program.source.is_empty());
        assert!(
            !program.source.contains("$$"),
            "{language}/{code_type} left unfleshed markers"
        );

        // Idempotence: same inputs, byte-identical source.
        let again =
            SourceProgram::generate(cfg, language, code_type, Some(directions)).unwrap();
        assert_eq!(program.source, again.source, "{language}/{code_type}");
    }
}

// Scenario 1: if/else, both branches taken.

fn if_else_cfg() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
    cfg.set_attribute(b(1), Attribute::SelectionHeader).unwrap();
    cfg.set_attribute(b(1), Attribute::Merge(b(4))).unwrap();
    cfg
}

#[test]
fn if_else_takes_either_branch() {
    let cfg = if_else_cfg();
    assert_eq!(path_of(&cfg, &[0]), vec![1, 2, 4]);
    assert_eq!(path_of(&cfg, &[1]), vec![1, 3, 4]);
    emit_all_modes(&cfg, &[1], false);
}

#[test]
fn if_else_true_branch_is_edge_one() {
    // The true arm of the emitted selection holds the second-listed edge.
    let cfg = if_else_cfg();
    let program =
        SourceProgram::generate(&cfg, Language::Glsl, CodeType::GlobalArray, None).unwrap();
    let true_arm = program.source.find("output_data[output_ix] = 3;").unwrap();
    let else_arm = program.source.find("else").unwrap();
    let false_arm = program.source.find("output_data[output_ix] = 2;").unwrap();
    assert!(true_arm < else_arm && else_arm < false_arm);
}

// Scenario 2: while loop, two iterations.

fn while_loop_cfg() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (2, 5), (2, 3), (3, 4), (4, 2)]);
    cfg.set_attribute(b(2), Attribute::SelectionHeader).unwrap();
    cfg.set_attribute(b(2), Attribute::LoopHeader).unwrap();
    cfg.set_attribute(b(2), Attribute::Merge(b(5))).unwrap();
    cfg
}

#[test]
fn while_loop_runs_twice_then_exits() {
    let cfg = while_loop_cfg();
    assert_eq!(
        path_of(&cfg, &[1, 1, 0]),
        vec![1, 2, 3, 4, 2, 3, 4, 2, 5]
    );
    emit_all_modes(&cfg, &[1, 1, 0], false);
}

#[test]
fn while_loop_header_guard_bakes_the_iteration_count() {
    let cfg = while_loop_cfg();
    let program = SourceProgram::generate(
        &cfg,
        Language::Glsl,
        CodeType::HeaderGuard,
        Some(&[1, 1, 0]),
    )
    .unwrap();
    // Two iterations: bound constant 2 at top level.
    assert!(program.source.contains("ix_2 <= 2"), "{}", program.source);
    assert!(program.source.contains("ix_2 == 2"));
}

// Scenario 3: early continue inside a loop.

fn early_continue_cfg() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (2, 5), (2, 3), (3, 4), (3, 6), (6, 2), (4, 2)]);
    cfg.set_attribute(b(2), Attribute::SelectionHeader).unwrap();
    cfg.set_attribute(b(2), Attribute::LoopHeader).unwrap();
    cfg.set_attribute(b(2), Attribute::Merge(b(5))).unwrap();
    cfg.set_attribute(b(3), Attribute::SelectionHeader).unwrap();
    cfg.set_attribute(b(3), Attribute::Merge(b(4))).unwrap();
    cfg.set_attribute(b(6), Attribute::ContinueBlock).unwrap();
    cfg
}

#[test]
fn early_continue_returns_to_the_header() {
    let cfg = early_continue_cfg();
    // Enter the loop, take the inner true branch, continue, exit.
    assert_eq!(path_of(&cfg, &[1, 1, 0]), vec![1, 2, 3, 6, 2, 5]);
    emit_all_modes(&cfg, &[1, 1, 0], false);
}

#[test]
fn continue_block_never_reaches_the_inner_merge() {
    let cfg = early_continue_cfg();
    let path = path_of(&cfg, &[1, 1, 0]);
    assert!(!path.contains(&4), "continue must skip the inner merge");
}

// Scenario 4: switch with fallthrough (WebAssembly / GLSL only).

fn switch_fallthrough_cfg() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[(1, 2), (1, 3), (2, 3), (3, 4)]);
    cfg.set_attribute(b(1), Attribute::SelectionHeader).unwrap();
    cfg.set_attribute(b(1), Attribute::SwitchBlock).unwrap();
    cfg.set_attribute(b(1), Attribute::Merge(b(4))).unwrap();
    cfg
}

#[test]
fn fallthrough_case_visits_both_cases() {
    let cfg = switch_fallthrough_cfg();
    assert_eq!(path_of(&cfg, &[0]), vec![1, 2, 3, 4]);
    assert_eq!(path_of(&cfg, &[1]), vec![1, 3, 4]);
    emit_all_modes(&cfg, &[0], true);
}

#[test]
fn wgsl_refuses_fallthrough() {
    let cfg = switch_fallthrough_cfg();
    let err = SourceProgram::generate(&cfg, Language::Wgsl, CodeType::GlobalArray, None)
        .unwrap_err();
    assert!(err.to_string().contains("fallthrough"));
}

// Scenario 5: tree-like nested switches (default is the merge).

fn nested_tree_switch_cfg() -> StructuredCfg {
    let mut cfg = cfg_from_edges(&[
        (1, 2),
        (1, 3),
        (1, 10),
        (3, 7),
        (3, 8),
        (3, 9),
        (3, 10),
    ]);
    for switch in [1, 3] {
        cfg.set_attribute(b(switch), Attribute::SelectionHeader).unwrap();
        cfg.set_attribute(b(switch), Attribute::SwitchBlock).unwrap();
        cfg.set_attribute(b(switch), Attribute::Merge(b(10))).unwrap();
    }
    cfg
}

#[test]
fn tree_switch_stops_at_the_selected_leaf() {
    let cfg = nested_tree_switch_cfg();
    // Case 1 of the outer switch, then case 2 of the inner one.
    assert_eq!(path_of(&cfg, &[1, 2]), vec![1, 3, 9]);
    emit_all_modes(&cfg, &[1, 2], false);
}

#[test]
fn tree_switch_emits_the_shared_default_once() {
    let cfg = nested_tree_switch_cfg();
    let program =
        SourceProgram::generate(&cfg, Language::Glsl, CodeType::GlobalArray, None).unwrap();
    assert_eq!(
        program.source.matches("// ------ BLOCK 10 -------").count(),
        1
    );
}

// Scenario 6: a loop and an inner selection sharing one merge.

fn shared_merge_cfg() -> StructuredCfg {
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
    cfg.set_attribute(b(2), Attribute::SelectionHeader).unwrap();
    cfg.set_attribute(b(2), Attribute::LoopHeader).unwrap();
    cfg.set_attribute(b(2), Attribute::Merge(b(5))).unwrap();
    cfg.set_attribute(b(3), Attribute::SelectionHeader).unwrap();
    cfg.set_attribute(b(3), Attribute::Merge(b(5))).unwrap();
    cfg.set_attribute(b(6), Attribute::BreakBlock).unwrap();
    cfg.set_attribute(b(7), Attribute::BreakBlock).unwrap();
    cfg
}

#[test]
fn shared_merge_loop_exits_through_either_break() {
    let cfg = shared_merge_cfg();
    // Take the loop body once, the false branch, then out. The trailing
    // direction is never consumed: the break reaches the exit first.
    assert_eq!(path_of(&cfg, &[1, 0, 1]), vec![1, 2, 3, 6, 5, 8]);
    assert_eq!(path_of(&cfg, &[1, 1]), vec![1, 2, 3, 7, 5, 8]);
    assert_eq!(path_of(&cfg, &[0]), vec![1, 2, 5, 8]);
    emit_all_modes(&cfg, &[1, 0, 1], false);
}

#[test]
fn shared_merge_is_emitted_after_the_loop() {
    let cfg = shared_merge_cfg();
    let program =
        SourceProgram::generate(&cfg, Language::Wgsl, CodeType::GlobalArray, None).unwrap();
    let loop_start = program.source.find("loop {").unwrap();
    let merge_emit = program.source.find("output_data[output_ix] = 5;").unwrap();
    assert!(loop_start < merge_emit);
    assert_eq!(
        program.source.matches("// ------ BLOCK 5 -------").count(),
        1
    );
}

// Cross-cutting assertions.

#[test]
fn glsl_shader_tests_cover_every_scenario() {
    let scenarios: Vec<(StructuredCfg, Vec<u32>)> = vec![
        (if_else_cfg(), vec![0]),
        (while_loop_cfg(), vec![1, 1, 0]),
        (early_continue_cfg(), vec![1, 1, 0]),
        (switch_fallthrough_cfg(), vec![0]),
        (nested_tree_switch_cfg(), vec![1, 2]),
        (shared_merge_cfg(), vec![1, 0, 1]),
    ];
    for (cfg, directions) in scenarios {
        let program =
            SourceProgram::generate(&cfg, Language::Glsl, CodeType::GlobalArray, None).unwrap();
        let script = glsl_shader_test(&program, &cfg, &directions).unwrap();
        assert!(script.contains("ASSERT_EQUAL BUFFERS expected_path actual_path"));

        let expected = path_of(&cfg, &directions);
        let rendered: Vec<String> = expected.iter().map(ToString::to_string).collect();
        assert!(
            script.contains(&format!("uint {} 0", rendered.join(" "))),
            "expected-path buffer missing from:\n{script}"
        );
    }
}

#[test]
fn scenario_cfgs_satisfy_the_invariants() {
    for cfg in [
        if_else_cfg(),
        while_loop_cfg(),
        early_continue_cfg(),
        switch_fallthrough_cfg(),
        nested_tree_switch_cfg(),
        shared_merge_cfg(),
    ] {
        assert!(cfg.validate().is_ok(), "{:?}", cfg.validate());
    }
}

#[test]
fn exhaustion_before_exit_is_an_error() {
    let cfg = while_loop_cfg();
    assert!(expected_path(&cfg, &[1, 1]).is_err());
    assert!(expected_path(&cfg, &[]).is_err());
}

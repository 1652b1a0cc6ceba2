//! Property-based tests over generated CFGs.
//!
//! Uses proptest to sweep seeds and configurations, checking the universal
//! invariants: generated graphs are structurally valid, generation is
//! deterministic, emission is idempotent, sampled directions always drive
//! the oracle to an exit, and serialization round-trips.

use proptest::prelude::*;

use cfg_flesher::cfg::{expected_path, CfgRecord};
use cfg_flesher::emit::SourceProgram;
use cfg_flesher::generator::{sample_directions, CfgGenerator, GeneratorConfig};
use cfg_flesher::lang::{CodeType, Language};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn language_strategy() -> impl Strategy<Value = Language> {
    prop_oneof![
        Just(Language::Wasm),
        Just(Language::Wgsl),
        Just(Language::Glsl),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn generated_cfgs_satisfy_the_invariants(
        seed in any::<u64>(),
        depth in 1usize..5,
        language in language_strategy(),
    ) {
        let generator = CfgGenerator::new(GeneratorConfig::allow_all(language));
        let cfg = generator.generate(seed, depth).unwrap();
        prop_assert!(cfg.validate().is_ok(), "{:?}", cfg.validate());
    }

    #[test]
    fn generation_is_deterministic(seed in any::<u64>(), depth in 1usize..5) {
        let generator = CfgGenerator::new(GeneratorConfig::allow_all(Language::Glsl));
        let first = generator.generate(seed, depth).unwrap();
        let second = generator.generate(seed, depth).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn sampled_directions_always_terminate(seed in any::<u64>(), depth in 1usize..5) {
        let generator = CfgGenerator::new(GeneratorConfig::allow_all(Language::Wasm));
        let cfg = generator.generate(seed, depth).unwrap();
        let mut rng = StdRng::seed_from_u64(seed ^ 0x9e37_79b9);
        let directions = sample_directions(&cfg, &mut rng).unwrap();
        let path = expected_path(&cfg, &directions);
        prop_assert!(path.is_ok(), "{path:?}");
    }

    #[test]
    fn emission_is_idempotent(
        seed in any::<u64>(),
        depth in 1usize..4,
        language in language_strategy(),
    ) {
        let generator = CfgGenerator::new(GeneratorConfig::allow_all(language));
        let cfg = generator.generate(seed, depth).unwrap();
        let first =
            SourceProgram::generate(&cfg, language, CodeType::GlobalArray, None).unwrap();
        let second =
            SourceProgram::generate(&cfg, language, CodeType::GlobalArray, None).unwrap();
        prop_assert_eq!(first.source, second.source);
    }

    #[test]
    fn wgsl_emission_never_sees_fallthrough(seed in any::<u64>(), depth in 1usize..5) {
        // The generator constrained to WGSL must only produce CFGs the WGSL
        // emitter accepts: its fallthrough check must never fire.
        let generator = CfgGenerator::new(GeneratorConfig::allow_all(Language::Wgsl));
        let cfg = generator.generate(seed, depth).unwrap();
        let emitted = SourceProgram::generate(&cfg, Language::Wgsl, CodeType::GlobalArray, None);
        prop_assert!(emitted.is_ok(), "{emitted:?}");
    }

    #[test]
    fn embedded_modes_flesh_completely(seed in any::<u64>(), depth in 1usize..4) {
        let generator = CfgGenerator::new(GeneratorConfig::allow_all(Language::Glsl));
        let cfg = generator.generate(seed, depth).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let directions = sample_directions(&cfg, &mut rng).unwrap();

        for code_type in [CodeType::LocalArray, CodeType::HeaderGuard] {
            let program =
                SourceProgram::generate(&cfg, Language::Glsl, code_type, Some(&directions))
                    .unwrap();
            prop_assert!(
                !program.source.contains("$$"),
                "{code_type}: unfleshed markers in\n{}",
                program.source
            );
        }
    }

    #[test]
    fn records_round_trip(seed in any::<u64>(), depth in 1usize..5) {
        let generator = CfgGenerator::new(GeneratorConfig::allow_all(Language::Glsl));
        let cfg = generator.generate(seed, depth).unwrap();
        let json = serde_json::to_string(&cfg.to_record()).unwrap();
        let record: CfgRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(record.into_cfg().unwrap(), cfg);
    }

    #[test]
    fn break_blocks_target_their_loop_merge(seed in any::<u64>(), depth in 1usize..5) {
        let mut config = GeneratorConfig::allow_all(Language::Glsl);
        config.break_continue_probability = 1.0;
        let cfg = CfgGenerator::new(config).generate(seed, depth).unwrap();

        for (id, block) in cfg.blocks() {
            if block.attrs.break_block {
                let target = block.succs[0];
                let targets_a_loop_merge = cfg.blocks().any(|(other, record)| {
                    record.attrs.loop_header && cfg.merge(other).unwrap() == target
                });
                prop_assert!(targets_a_loop_merge, "break {id} targets {target}");
            }
            if block.attrs.continue_block {
                prop_assert!(cfg.is_loop_header(block.succs[0]).unwrap());
            }
        }
    }
}

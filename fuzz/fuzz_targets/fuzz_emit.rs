//! Fuzz the emitter: every generated CFG must emit in every mode its
//! target supports, with all fleshing markers resolved.

#![no_main]

use libfuzzer_sys::fuzz_target;

use cfg_flesher::emit::SourceProgram;
use cfg_flesher::generator::{sample_directions, CfgGenerator, GeneratorConfig};
use cfg_flesher::lang::{CodeType, Language};
use rand::rngs::StdRng;
use rand::SeedableRng;

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }
    let seed = u64::from_le_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]);
    let depth = (data[8] % 5) as usize;
    let language = match data[9] % 3 {
        0 => Language::Wasm,
        1 => Language::Wgsl,
        _ => Language::Glsl,
    };

    let generator = CfgGenerator::new(GeneratorConfig::allow_all(language));
    let cfg = generator.generate(seed, depth).expect("generation must not fail");
    let mut rng = StdRng::seed_from_u64(seed);
    let directions = sample_directions(&cfg, &mut rng).expect("directions must exist");

    for code_type in [CodeType::GlobalArray, CodeType::LocalArray, CodeType::HeaderGuard] {
        if language.check_code_type(code_type).is_err() {
            continue;
        }
        let program = SourceProgram::generate(&cfg, language, code_type, Some(&directions))
            .expect("emission must not fail");
        assert!(!program.source.contains("$$"), "unfleshed marker");
    }
});

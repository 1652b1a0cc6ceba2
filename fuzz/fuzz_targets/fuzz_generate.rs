//! Fuzz the generator: any (seed, depth, language) triple must yield a CFG
//! that passes structural validation.

#![no_main]

use libfuzzer_sys::fuzz_target;

use cfg_flesher::generator::{CfgGenerator, GeneratorConfig};
use cfg_flesher::lang::Language;

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }
    let seed = u64::from_le_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]);
    let depth = (data[8] % 6) as usize;
    let language = match data[9] % 3 {
        0 => Language::Wasm,
        1 => Language::Wgsl,
        _ => Language::Glsl,
    };

    let generator = CfgGenerator::new(GeneratorConfig::allow_all(language));
    let cfg = generator.generate(seed, depth).expect("generation must not fail");
    cfg.validate().expect("generated CFG must be valid");
});

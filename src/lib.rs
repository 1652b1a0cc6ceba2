//! # cfg-flesher
//!
//! A differential compiler-testing library built around *control-flow
//! fleshing*: generate random structured control-flow graphs, translate each
//! into a source program (WebAssembly text, WGSL, or GLSL) whose execution
//! path is dictated by a directions vector, run the program, and check that
//! it reports exactly the block sequence the graph predicts.
//!
//! ## Architecture
//!
//! ```text
//! Generator → Structured CFG → Code Builder → Program Assembly
//!                  ↓                                ↓
//!             Path Oracle  ←——— compare ———→  External Runner
//! ```
//!
//! The generator ([`generator`]) grows CFGs by recursive construct
//! expansion; the oracle ([`cfg::expected_path`]) predicts the block
//! sequence for a directions vector; the emitter ([`emit`]) produces a
//! program that reports its own path at runtime; the harness ([`harness`])
//! runs campaigns against real toolchains and records every discrepancy as
//! a bug report.
//!
//! ## Quick start
//!
//! ```
//! use cfg_flesher::generator::{CfgGenerator, GeneratorConfig};
//! use cfg_flesher::lang::{CodeType, Language};
//! use cfg_flesher::emit::SourceProgram;
//! use cfg_flesher::cfg::expected_path;
//!
//! let generator = CfgGenerator::new(GeneratorConfig::allow_all(Language::Wgsl));
//! let cfg = generator.generate(7, 3)?;
//! let program = SourceProgram::generate(&cfg, Language::Wgsl, CodeType::GlobalArray, None)?;
//! assert!(program.source.contains("@compute"));
//!
//! let path = expected_path(&cfg, &[1, 0, 0, 0, 0, 0, 0, 0]);
//! let _ = path; // exhaustion is possible for arbitrary vectors
//! # Ok::<(), cfg_flesher::Error>(())
//! ```

pub mod cfg;
pub mod cli;
pub mod emit;
pub mod error;
pub mod generator;
pub mod harness;
pub mod lang;

pub use error::{Error, Result};

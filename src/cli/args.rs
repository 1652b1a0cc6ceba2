use std::path::PathBuf;

use clap::Parser;

use crate::generator::CfgSource;
use crate::lang::{CodeType, Language};

/// Command line interface for running control-flow fleshing campaigns.
#[derive(Debug, Parser)]
#[command(
    name = "cfg-flesh",
    author,
    version,
    about = "Differential compiler testing via control-flow fleshing",
    long_about = None
)]
pub struct Cli {
    /// Emission target: wasm, wgsl, or glsl.
    pub(super) language: Language,

    /// Number of CFGs to generate.
    pub(super) no_of_graphs: usize,

    /// Number of directions vectors per CFG.
    pub(super) no_of_paths: usize,

    /// Generator-configuration source:
    /// 'random' uses every feature the target permits,
    /// 'swarm' samples a fresh feature subset per graph.
    pub(super) cfg_source: CfgSource,

    /// Emission mode:
    /// 'global_array' reads directions from an input buffer,
    /// 'local_array' embeds them as a constant,
    /// 'header_guard' compiles them away.
    pub(super) code_type: CodeType,

    /// Seed for all randomness; drawn from entropy when absent.
    #[arg(long)]
    pub(super) seed: Option<u64>,

    /// Minimum construct-expansion depth.
    #[arg(long, default_value_t = 3)]
    pub(super) min_depth: usize,

    /// Maximum construct-expansion depth.
    #[arg(long, default_value_t = 5)]
    pub(super) max_depth: usize,

    /// Campaign output folder; a timestamped one is created when absent.
    #[arg(long)]
    pub(super) output_folder: Option<PathBuf>,

    /// wasm-opt optimization level (WebAssembly only).
    #[arg(long, value_parser = ["O", "O1", "O2", "O3", "O4", "Os", "Oz"])]
    pub(super) opt_level: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Remove artifacts after testing, per --tidy-mode.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(super) tidy: bool,

    /// 'working' keeps only failing artifacts (for triage);
    /// 'non-working' keeps only passing ones (for building a test suite).
    #[arg(long, default_value = "working")]
    pub(super) tidy_mode: crate::harness::TidyMode,

    /// Emit and persist all artifacts but skip external execution.
    #[arg(long, default_value_t = false)]
    pub(super) dry_run: bool,

    /// Per-invocation timeout for external tools, in seconds.
    #[arg(long, default_value_t = 30)]
    pub(super) timeout_secs: u64,
}

//! Campaign orchestration.
//!
//! A campaign generates a batch of CFGs, samples directions per graph, emits
//! programs in the selected mode, executes them through a [`ProgramRunner`],
//! compares observed paths against the oracle, and records every failure as
//! a bug report. Runner failures never abort the campaign.

mod directories;
mod report;
mod runner;

pub use directories::TestDirectories;
pub use report::{BugReport, FailureKind};
pub use runner::{CommandRunner, ProgramRunner, RunOutcome, RunRequest};

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::cfg::expected_path;
use crate::emit::{glsl_shader_test, SourceProgram};
use crate::error::{Result, RunFailure};
use crate::generator::{generate_batch, sample_direction_set, CfgSource};
use crate::lang::{CodeType, Language};

/// Which side of the pass/fail divide tidying removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TidyMode {
    /// Remove artifacts of passing tests, keeping only failures for triage.
    Working,
    /// Remove artifacts of failing tests, keeping a passing test suite.
    NonWorking,
}

impl std::str::FromStr for TidyMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "working" => Ok(TidyMode::Working),
            "non-working" | "non_working" => Ok(TidyMode::NonWorking),
            other => Err(format!(
                "invalid tidy mode: {other}. Choose from: working, non-working"
            )),
        }
    }
}

/// Full campaign configuration, mirroring the CLI surface.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Emission target.
    pub language: Language,
    /// Emission mode.
    pub code_type: CodeType,
    /// Generator-configuration source.
    pub cfg_source: CfgSource,
    /// Number of graphs to generate.
    pub no_of_graphs: usize,
    /// Number of directions vectors per graph.
    pub no_of_paths: usize,
    /// Master seed; a random one is drawn when absent.
    pub seed: Option<u64>,
    /// Minimum expansion depth.
    pub min_depth: usize,
    /// Maximum expansion depth.
    pub max_depth: usize,
    /// Campaign output root.
    pub output_folder: PathBuf,
    /// Optional wasm-opt level (WebAssembly only).
    pub opt_level: Option<String>,
    /// Whether to tidy artifacts after testing.
    pub tidy: bool,
    /// What tidying removes.
    pub tidy_mode: TidyMode,
    /// Emit and persist everything but skip external execution.
    pub dry_run: bool,
}

/// Aggregate counts of one campaign run.
#[derive(Debug, Clone, Default)]
pub struct CampaignSummary {
    /// Graphs generated (may fall short on generation timeout).
    pub graphs: usize,
    /// Total (graph, path) pairs tested or dry-emitted.
    pub paths_tested: usize,
    /// Runner failures recorded.
    pub failures: usize,
    /// Written bug report files.
    pub bug_reports: Vec<PathBuf>,
}

/// Run a campaign to completion.
///
/// Runner failures are recorded and skipped past; only infrastructure
/// errors (I/O, generator bugs, emission contract violations) abort.
///
/// # Errors
///
/// Returns an error on I/O failure or on a core bug surfaced through the
/// generator or emitter.
pub fn run_campaign(
    config: &CampaignConfig,
    runner: &dyn ProgramRunner,
) -> Result<CampaignSummary> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, language = %config.language, code_type = %config.code_type, "starting campaign");

    let directories = TestDirectories::create(&config.output_folder)?;
    let batch = generate_batch(
        seed,
        config.no_of_graphs,
        config.cfg_source,
        config.language,
        config.min_depth,
        config.max_depth,
    )
    .map_err(crate::error::Error::from)?;
    if batch.timed_out {
        warn!(collected = batch.cfgs.len(), "graph generation timed out early");
    }

    let mut summary = CampaignSummary {
        graphs: batch.cfgs.len(),
        ..CampaignSummary::default()
    };

    for (graph_index, cfg) in batch.cfgs.iter().enumerate() {
        let cfg_file = directories.cfg_file(graph_index);
        cfg.to_record().save(&cfg_file)?;

        let mut paths_rng = StdRng::seed_from_u64(seed.wrapping_add(graph_index as u64 + 1));
        let paths = match sample_direction_set(cfg, &mut paths_rng, config.no_of_paths) {
            Ok((paths, aborted)) => {
                if aborted {
                    debug!(graph = graph_index, found = paths.len(), "path set cut short");
                }
                paths
            }
            Err(error) => {
                warn!(graph = graph_index, %error, "skipping graph without terminating paths");
                continue;
            }
        };
        fs::write(
            directories.directions_file(graph_index),
            serde_json::to_string_pretty(&paths)?,
        )?;

        let mut graph_passed = true;
        let mut per_graph_artifacts: Vec<PathBuf> = Vec::new();
        let mut per_path_artifacts: Vec<(usize, Vec<PathBuf>, bool)> = Vec::new();

        // One program per graph for the global-array mode; one per path for
        // the modes that embed the directions.
        let shared_program = if config.code_type == CodeType::GlobalArray {
            let program =
                SourceProgram::generate(cfg, config.language, config.code_type, None)?;
            let path = directories.program_file(
                config.language,
                graph_index,
                None,
                program.extension(),
            );
            fs::write(&path, &program.source)?;
            per_graph_artifacts.push(path.clone());
            Some((program, path))
        } else {
            None
        };

        for (path_index, directions) in paths.iter().enumerate() {
            let mut artifacts: Vec<PathBuf> = Vec::new();
            let (program, source_path) = match &shared_program {
                Some((program, path)) => (program.clone(), path.clone()),
                None => {
                    let program = SourceProgram::generate(
                        cfg,
                        config.language,
                        config.code_type,
                        Some(directions),
                    )?;
                    let path = directories.program_file(
                        config.language,
                        graph_index,
                        Some(path_index),
                        program.extension(),
                    );
                    fs::write(&path, &program.source)?;
                    artifacts.push(path.clone());
                    (program, path)
                }
            };

            let expected: Vec<u32> = expected_path(cfg, directions)
                .map_err(crate::error::Error::from)?
                .iter()
                .map(|id| id.raw())
                .collect();

            summary.paths_tested += 1;
            if config.dry_run {
                per_path_artifacts.push((path_index, artifacts, true));
                continue;
            }

            // GLSL executes through a per-path shadertrap script.
            let run_path = if config.language == Language::Glsl {
                let script = glsl_shader_test(&program, cfg, directions)?;
                let script_path = directories.program_file(
                    config.language,
                    graph_index,
                    Some(path_index),
                    "shadertrap",
                );
                fs::write(&script_path, script)?;
                artifacts.push(script_path.clone());
                script_path
            } else {
                source_path
            };

            let run_directions: &[u32] = if config.code_type == CodeType::GlobalArray {
                directions
            } else {
                &[]
            };
            let outcome = runner.run(&RunRequest {
                program: &program,
                source_path: &run_path,
                directions: run_directions,
            });

            let failure = classify(outcome, &expected);
            let path_passed = failure.is_none();
            if let Some(failure) = failure {
                graph_passed = false;
                summary.failures += 1;
                let report = build_report(
                    config,
                    graph_index,
                    path_index,
                    &cfg_file,
                    directions,
                    &expected,
                    &failure,
                );
                let bug_file = directories.bug_file(config.language, graph_index, path_index);
                report.save(&bug_file)?;
                summary.bug_reports.push(bug_file);
                info!(graph = graph_index, path = path_index, %failure, "recorded bug");
            }
            per_path_artifacts.push((path_index, artifacts, path_passed));
        }

        tidy(config, &directories, graph_passed, &per_graph_artifacts, &per_path_artifacts, graph_index);
    }

    info!(
        graphs = summary.graphs,
        paths = summary.paths_tested,
        failures = summary.failures,
        "campaign finished"
    );
    Ok(summary)
}

/// Turn a run outcome into the failure to record, if any.
fn classify(outcome: RunOutcome, expected: &[u32]) -> Option<RunFailure> {
    match outcome {
        RunOutcome::Verified => None,
        RunOutcome::ObservedPath(observed) => {
            if observed == expected {
                None
            } else {
                Some(RunFailure::PathMismatch {
                    expected: expected.to_vec(),
                    observed,
                })
            }
        }
        RunOutcome::Failed(failure) => Some(failure),
    }
}

fn build_report(
    config: &CampaignConfig,
    graph_index: usize,
    path_index: usize,
    cfg_file: &std::path::Path,
    directions: &[u32],
    expected: &[u32],
    failure: &RunFailure,
) -> BugReport {
    let observed = match failure {
        RunFailure::PathMismatch { observed, .. } => Some(observed.clone()),
        _ => None,
    };
    BugReport {
        kind: FailureKind::from(failure),
        detail: failure.to_string(),
        language: config.language,
        code_type: config.code_type,
        graph_index,
        path_index,
        cfg_file: cfg_file.to_path_buf(),
        directions: directions.to_vec(),
        expected_path: expected.to_vec(),
        observed_path: observed,
        recorded_at: Utc::now(),
    }
}

fn tidy(
    config: &CampaignConfig,
    directories: &TestDirectories,
    graph_passed: bool,
    per_graph_artifacts: &[PathBuf],
    per_path_artifacts: &[(usize, Vec<PathBuf>, bool)],
    graph_index: usize,
) {
    if !config.tidy || config.dry_run {
        return;
    }
    let removes = |passed: bool| match config.tidy_mode {
        TidyMode::Working => passed,
        TidyMode::NonWorking => !passed,
    };

    for (_, artifacts, passed) in per_path_artifacts {
        if removes(*passed) {
            for artifact in artifacts {
                directories.remove_file(artifact);
            }
        }
    }
    if removes(graph_passed) {
        for artifact in per_graph_artifacts {
            directories.remove_file(artifact);
        }
        directories.remove_file(&directories.cfg_file(graph_index));
        directories.remove_file(&directories.directions_file(graph_index));
    }
}

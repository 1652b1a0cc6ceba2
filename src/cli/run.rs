//! CLI command execution.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::info;

use crate::error::Result;
use crate::harness::{run_campaign, CampaignConfig, CommandRunner};
use crate::lang::Language;

use super::args::Cli;

impl Cli {
    /// Run the campaign described by the arguments.
    ///
    /// Test failures are recorded as bug reports, not errors: the campaign
    /// completes with status 0 whether or not bugs were found.
    ///
    /// # Errors
    ///
    /// Returns an error on argument inconsistencies, I/O failures, or core
    /// bugs surfaced through the generator or emitter.
    pub fn run(&self) -> Result<()> {
        if self.min_depth > self.max_depth {
            return Err(crate::error::CfgError::Invalid {
                reason: format!(
                    "--min-depth {} exceeds --max-depth {}",
                    self.min_depth, self.max_depth
                ),
            }
            .into());
        }
        if self.opt_level.is_some() && self.language != Language::Wasm {
            return Err(crate::error::CfgError::Invalid {
                reason: "--opt-level is only meaningful for wasm".to_string(),
            }
            .into());
        }
        self.language
            .check_code_type(self.code_type)
            .map_err(crate::error::Error::from)?;

        let output_folder = self.output_folder.clone().unwrap_or_else(|| {
            let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
            PathBuf::from(format!("{timestamp}_{}_TEST", self.language))
        });

        let config = CampaignConfig {
            language: self.language,
            code_type: self.code_type,
            cfg_source: self.cfg_source,
            no_of_graphs: self.no_of_graphs,
            no_of_paths: self.no_of_paths,
            seed: self.seed,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
            output_folder,
            opt_level: self.opt_level.clone(),
            tidy: self.tidy,
            tidy_mode: self.tidy_mode,
            dry_run: self.dry_run,
        };

        let runner = CommandRunner::new(
            Duration::from_secs(self.timeout_secs),
            self.opt_level.clone(),
        );
        let summary = run_campaign(&config, &runner)?;

        info!(
            graphs = summary.graphs,
            paths = summary.paths_tested,
            failures = summary.failures,
            "done"
        );
        println!(
            "{} graphs, {} paths, {} failures ({} bug reports in {})",
            summary.graphs,
            summary.paths_tested,
            summary.failures,
            summary.bug_reports.len(),
            config.output_folder.join("bugs").display()
        );
        Ok(())
    }
}

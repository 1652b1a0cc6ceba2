//! Bug reports.
//!
//! A runner failure is the signal the campaign exists to find; each one is
//! written as a JSON report carrying everything needed to reproduce it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunFailure};
use crate::lang::{CodeType, Language};

/// The failure classification recorded in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The toolchain rejected the emitted program.
    Compile,
    /// The program crashed or the host errored.
    Runtime,
    /// The invocation exceeded its timeout.
    Timeout,
    /// Observed path differs from the oracle's prediction.
    PathMismatch,
}

impl From<&RunFailure> for FailureKind {
    fn from(failure: &RunFailure) -> Self {
        match failure {
            RunFailure::Compile { .. } => FailureKind::Compile,
            RunFailure::Runtime { .. } => FailureKind::Runtime,
            RunFailure::Timeout { .. } => FailureKind::Timeout,
            RunFailure::PathMismatch { .. } => FailureKind::PathMismatch,
        }
    }
}

/// One written bug report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugReport {
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable failure detail.
    pub detail: String,
    /// Target language.
    pub language: Language,
    /// Emission mode.
    pub code_type: CodeType,
    /// Index of the graph within the campaign.
    pub graph_index: usize,
    /// Index of the directions vector within the graph's set.
    pub path_index: usize,
    /// Path of the persisted CFG record.
    pub cfg_file: PathBuf,
    /// The directions vector driving the failing run.
    pub directions: Vec<u32>,
    /// The oracle's predicted path.
    pub expected_path: Vec<u32>,
    /// The observed path, when the program ran far enough to report one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_path: Option<Vec<u32>>,
    /// Report creation time.
    pub recorded_at: DateTime<Utc>,
}

impl BugReport {
    /// Write the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a report back.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or parse failure.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> BugReport {
        BugReport {
            kind: FailureKind::PathMismatch,
            detail: "expected [1, 2, 4], observed [1, 3, 4]".to_string(),
            language: Language::Wgsl,
            code_type: CodeType::GlobalArray,
            graph_index: 2,
            path_index: 0,
            cfg_file: PathBuf::from("cfgs/graph_2.json"),
            directions: vec![0],
            expected_path: vec![1, 2, 4],
            observed_path: Some(vec![1, 3, 4]),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn reports_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = sample_report();
        report.save(&path).unwrap();
        let loaded = BugReport::load(&path).unwrap();
        assert_eq!(loaded.kind, FailureKind::PathMismatch);
        assert_eq!(loaded.directions, vec![0]);
        assert_eq!(loaded.observed_path, Some(vec![1, 3, 4]));
    }

    #[test]
    fn failure_kinds_map_from_run_failures() {
        let failure = RunFailure::Timeout {
            command: "node run-wgsl.js".to_string(),
            timeout_secs: 10,
        };
        assert_eq!(FailureKind::from(&failure), FailureKind::Timeout);
    }
}

//! Campaign output layout.
//!
//! ```text
//! <root>/
//!   cfgs/        graph_<g>.json
//!   directions/  directions_<g>.json
//!   programs/    program_<g>[.path_<p>].<ext>
//!   bugs/        <lang>_bug_cfg_<g>_path_<p>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::lang::Language;

/// Paths of one campaign's output tree.
#[derive(Debug, Clone)]
pub struct TestDirectories {
    root: PathBuf,
}

impl TestDirectories {
    /// Create the directory tree under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn create(root: &Path) -> Result<Self> {
        let directories = TestDirectories {
            root: root.to_path_buf(),
        };
        for dir in [
            directories.cfgs_dir(),
            directories.directions_dir(),
            directories.programs_dir(),
            directories.bugs_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(directories)
    }

    /// The campaign root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of persisted CFG records.
    #[must_use]
    pub fn cfgs_dir(&self) -> PathBuf {
        self.root.join("cfgs")
    }

    /// Directory of persisted directions sets.
    #[must_use]
    pub fn directions_dir(&self) -> PathBuf {
        self.root.join("directions")
    }

    /// Directory of emitted programs.
    #[must_use]
    pub fn programs_dir(&self) -> PathBuf {
        self.root.join("programs")
    }

    /// Directory of bug reports.
    #[must_use]
    pub fn bugs_dir(&self) -> PathBuf {
        self.root.join("bugs")
    }

    /// Path of graph `g`'s CFG record.
    #[must_use]
    pub fn cfg_file(&self, graph: usize) -> PathBuf {
        self.cfgs_dir().join(format!("graph_{graph}.json"))
    }

    /// Path of graph `g`'s directions set.
    #[must_use]
    pub fn directions_file(&self, graph: usize) -> PathBuf {
        self.directions_dir().join(format!("directions_{graph}.json"))
    }

    /// Path of an emitted program; `path_index` is present for modes that
    /// emit one program per directions vector.
    #[must_use]
    pub fn program_file(
        &self,
        language: Language,
        graph: usize,
        path_index: Option<usize>,
        extension: &str,
    ) -> PathBuf {
        let _ = language;
        let stem = match path_index {
            Some(path) => format!("program_{graph}_path_{path}"),
            None => format!("program_{graph}"),
        };
        self.programs_dir().join(format!("{stem}.{extension}"))
    }

    /// Path of one bug report.
    #[must_use]
    pub fn bug_file(&self, language: Language, graph: usize, path_index: usize) -> PathBuf {
        self.bugs_dir().join(format!(
            "{}_bug_cfg_{graph}_path_{path_index}.json",
            language.name()
        ))
    }

    /// Remove a file if present, ignoring a missing one.
    pub fn remove_file(&self, path: &Path) {
        let _ = fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_builds_the_whole_tree() {
        let dir = tempfile::tempdir().unwrap();
        let directories = TestDirectories::create(dir.path()).unwrap();
        assert!(directories.cfgs_dir().is_dir());
        assert!(directories.directions_dir().is_dir());
        assert!(directories.programs_dir().is_dir());
        assert!(directories.bugs_dir().is_dir());
    }

    #[test]
    fn file_names_encode_graph_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let directories = TestDirectories::create(dir.path()).unwrap();
        assert!(directories
            .cfg_file(3)
            .ends_with(Path::new("cfgs/graph_3.json")));
        assert!(directories
            .program_file(Language::Wgsl, 2, Some(4), "wgsl")
            .ends_with(Path::new("programs/program_2_path_4.wgsl")));
        assert!(directories
            .bug_file(Language::Glsl, 1, 0)
            .ends_with(Path::new("bugs/glsl_bug_cfg_1_path_0.json")));
    }
}

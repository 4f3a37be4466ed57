//! Testing tools whose result directories can be aggregated.

use std::path::{Path, PathBuf};

/// How raw coverage-data files of a run are merged before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// One merge over all files into `coverage_all.ec`, skipped when that file exists.
    Direct,
    /// Fixed-size batches, each merged into `coverage_all_<n>.ec`.
    Batched,
}

/// Supported testing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    TimeMachine,
    Monkey,
    Ape,
    Combo,
    Humandroid,
    Stoat,
    Qtesting,
}

impl Tool {
    /// Order in which CLI flags are considered when several are given.
    pub const PRIORITY: [Tool; 7] = [
        Tool::TimeMachine,
        Tool::Monkey,
        Tool::Ape,
        Tool::Combo,
        Tool::Humandroid,
        Tool::Stoat,
        Tool::Qtesting,
    ];

    /// Name as it appears in result directory paths and CSV rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::TimeMachine => "timemachine",
            Tool::Monkey => "monkey",
            Tool::Ape => "ape",
            Tool::Combo => "combodroid",
            Tool::Humandroid => "humandroid",
            Tool::Stoat => "stoat",
            Tool::Qtesting => "qtesting",
        }
    }

    /// Pick the first tool, in priority order, for which `selected` is true.
    pub fn resolve(selected: impl Fn(Tool) -> bool) -> Option<Tool> {
        Self::PRIORITY.into_iter().find(|t| selected(*t))
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        match self {
            // TimeMachine dumps one data file per snapshot, far too many for a
            // single command line.
            Tool::TimeMachine => MergeStrategy::Batched,
            _ => MergeStrategy::Direct,
        }
    }

    /// Directory holding the raw coverage-data files of a run.
    pub fn coverage_data_dir(&self, result_dir: &Path) -> PathBuf {
        match self {
            Tool::TimeMachine => result_dir.join("timemachine-output"),
            _ => result_dir.to_path_buf(),
        }
    }

    /// Whether a result directory was produced by this tool, judged by the
    /// tool name appearing in its base name.
    pub fn produced(&self, result_dir: &Path) -> bool {
        result_dir
            .file_name()
            .is_some_and(|n| n.to_string_lossy().contains(self.as_str()))
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_priority() {
        assert_eq!(Tool::resolve(|_| false), None);
        assert_eq!(
            Tool::resolve(|t| matches!(t, Tool::Monkey | Tool::TimeMachine)),
            Some(Tool::TimeMachine)
        );
        assert_eq!(
            Tool::resolve(|t| matches!(t, Tool::Qtesting | Tool::Stoat)),
            Some(Tool::Stoat)
        );
    }

    #[test]
    fn test_timemachine_layout() {
        let dir = Path::new("/out/AnkiDroid-timemachine#1.a.apk");
        assert_eq!(Tool::TimeMachine.merge_strategy(), MergeStrategy::Batched);
        assert_eq!(
            Tool::TimeMachine.coverage_data_dir(dir),
            dir.join("timemachine-output")
        );
        assert_eq!(Tool::Ape.merge_strategy(), MergeStrategy::Direct);
        assert_eq!(Tool::Ape.coverage_data_dir(dir), dir);
    }

    #[test]
    fn test_produced() {
        let dir = Path::new("/out/AnkiDroid-combodroid#1.a.apk");
        assert!(Tool::Combo.produced(dir));
        assert!(!Tool::Monkey.produced(dir));
    }
}

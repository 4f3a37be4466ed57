//! Merging the raw coverage-data files of a run before reporting.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Result;
use crate::jacoco::CoverageTool;
use crate::tool::MergeStrategy;

/// Extension of JaCoCo execution-data files written by instrumented apps.
pub const DATA_EXTENSION: &str = "ec";

/// Files per merge invocation in the batched strategy.
pub const BATCH_SIZE: usize = 30;

const MERGED_STEM: &str = "coverage_all";

fn is_merge_output(name: &str) -> bool {
    name.starts_with(MERGED_STEM)
}

/// Raw coverage-data files in `dir`, in name order. Outputs of earlier merges
/// are not included. A missing directory has no files.
pub fn collect_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!("coverage data dir does not exist: {}", dir.display());
        return Ok(Vec::new());
    }
    let suffix = format!(".{}", DATA_EXTENSION);
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(&suffix) && !is_merge_output(name) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Path of the single merged file written by [`merge_direct`].
pub fn direct_output(dir: &Path) -> PathBuf {
    dir.join(format!("{}.{}", MERGED_STEM, DATA_EXTENSION))
}

/// Path of the `n`th (1-based) batch written by [`merge_batched`].
pub fn batch_output(dir: &Path, n: usize) -> PathBuf {
    dir.join(format!("{}_{}.{}", MERGED_STEM, n, DATA_EXTENSION))
}

/// Merge every data file in `dir` into `coverage_all.ec` with one tool call.
///
/// An existing `coverage_all.ec` is reused as is. Returns an empty list when
/// there is nothing to report on.
pub fn merge_direct(tool: &dyn CoverageTool, dir: &Path) -> Result<Vec<PathBuf>> {
    let dest = direct_output(dir);
    if dest.exists() {
        debug!("reusing {}", dest.display());
        return Ok(vec![dest]);
    }
    let files = collect_data_files(dir)?;
    if files.is_empty() {
        return Ok(Vec::new());
    }
    tool.merge(&files, &dest)?;
    Ok(vec![dest])
}

/// Merge the data files in `dir` in batches of `batch_size`, one tool call
/// per batch. Always re-merges; returns the batch files in order.
pub fn merge_batched(
    tool: &dyn CoverageTool,
    dir: &Path,
    batch_size: usize,
) -> Result<Vec<PathBuf>> {
    let files = collect_data_files(dir)?;
    let mut merged = Vec::new();
    for (i, batch) in files.chunks(batch_size.max(1)).enumerate() {
        let dest = batch_output(dir, i + 1);
        tool.merge(batch, &dest)?;
        merged.push(dest);
    }
    Ok(merged)
}

pub fn merge(
    tool: &dyn CoverageTool,
    strategy: MergeStrategy,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    match strategy {
        MergeStrategy::Direct => merge_direct(tool, dir),
        MergeStrategy::Batched => merge_batched(tool, dir, BATCH_SIZE),
    }
}

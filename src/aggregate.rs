//! The three aggregation modes and the CSV files they write.
//!
//! - single: one row per run, `app,tool,run_dir,line,branch,method,class`
//! - average: one row per issue, `app,issue,line,branch,method,class`, the
//!   mean over runs with non-zero line coverage
//! - accumulative: one row per APK, `app,tool,apk,line,branch,method,class`,
//!   from the data of all its runs merged together
//!
//! Files have no header row. Each enabled file is deleted once at the start
//! of a run and then appended to.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::coverage::Reporter;
use crate::error::{DroidcovError, Result};
use crate::layout::{self, ResultsIndex};
use crate::merge;
use crate::model::IssueAverages;
use crate::tool::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Accumulative,
    Single,
    Average,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Accumulative => "accumulative",
            Mode::Single => "single",
            Mode::Average => "average",
        }
    }
}

/// Output file per mode; a mode runs only when its path is set.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub accumulative: Option<PathBuf>,
    pub single: Option<PathBuf>,
    pub average: Option<PathBuf>,
}

impl Outputs {
    /// Enabled modes in the order they are processed.
    pub fn enabled(&self) -> Vec<(Mode, &Path)> {
        [
            (Mode::Accumulative, &self.accumulative),
            (Mode::Single, &self.single),
            (Mode::Average, &self.average),
        ]
        .into_iter()
        .filter_map(|(mode, path)| path.as_deref().map(|p| (mode, p)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled().is_empty()
    }
}

/// Which result directories take part in a run.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Runs of this tool only; `None` selects nothing.
    pub tool: Option<Tool>,
    pub app: Option<String>,
    /// Substring of the run directory name. Ignored by the accumulative mode.
    pub issue: Option<String>,
    /// Skip runs whose directory name breaks the naming convention instead
    /// of failing.
    pub skip_malformed: bool,
}

/// Append-only CSV file without header, created on the first row.
pub struct CsvSink {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    rows: usize,
}

impl CsvSink {
    /// Remove any previous file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            std::fs::remove_file(path)?;
            info!("removed previous {}", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
            writer: None,
            rows: 0,
        })
    }

    pub fn append<I, S>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        if self.writer.is_none() {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.writer = Some(
                csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(file),
            );
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_record(record)?;
            writer.flush()?;
        }
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Rows written per mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub rows: Vec<(Mode, usize)>,
}

impl Summary {
    pub fn rows_for(&self, mode: Mode) -> Option<usize> {
        self.rows.iter().find(|(m, _)| *m == mode).map(|(_, n)| *n)
    }
}

fn base_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Runs of `tool` among `dirs`, narrowed by the issue filter when
/// `use_issue` is set. With `skip_malformed`, runs whose names cannot be
/// keyed are logged and dropped here.
fn select_runs(
    dirs: &[PathBuf],
    tool: Tool,
    selection: &Selection,
    use_issue: bool,
) -> Vec<PathBuf> {
    let issue = if use_issue {
        selection.issue.as_deref()
    } else {
        None
    };
    dirs.iter()
        .filter(|dir| tool.produced(dir))
        .filter(|dir| issue.map_or(true, |id| base_name(dir).contains(id)))
        .filter(|dir| {
            if !selection.skip_malformed {
                return true;
            }
            let keyed = layout::apk_name(dir).and_then(|_| layout::issue_id(dir).map(|_| ()));
            match keyed {
                Err(e @ DroidcovError::Naming { .. }) => {
                    warn!("skipping: {}", e);
                    false
                }
                _ => true,
            }
        })
        .cloned()
        .collect()
}

/// Append one row per run with valid coverage.
pub fn single_run(
    reporter: &Reporter,
    app: &str,
    tool: Tool,
    runs: &[PathBuf],
    sink: &mut CsvSink,
) -> Result<()> {
    for dir in runs {
        info!("{}", dir.display());
        let record = reporter.compute(app, tool, dir, &tool.coverage_data_dir(dir))?;
        if !record.valid {
            debug!("no valid coverage for {}", dir.display());
            continue;
        }
        let [line, branch, method, class] = record.columns();
        sink.append([
            app.to_string(),
            tool.to_string(),
            base_name(dir),
            line,
            branch,
            method,
            class,
        ])?;
    }
    Ok(())
}

/// Append one row per issue with the mean coverage of its runs.
pub fn average(
    reporter: &Reporter,
    app: &str,
    tool: Tool,
    runs: &[PathBuf],
    sink: &mut CsvSink,
) -> Result<()> {
    let mut averages = IssueAverages::new();
    for dir in runs {
        info!("{}", dir.display());
        let record = reporter.compute(app, tool, dir, &tool.coverage_data_dir(dir))?;
        if !record.valid {
            continue;
        }
        let issue_id = layout::issue_id(dir)?;
        if !averages.record(&issue_id, &record) {
            debug!("zero line coverage, not averaged: {}", dir.display());
        }
    }

    for mean in averages.means() {
        info!("[{}] average coverage of {}", mean.issue_id, app);
        let [line, branch, method, class] = mean.columns();
        sink.append([
            app.to_string(),
            mean.issue_id.clone(),
            line,
            branch,
            method,
            class,
        ])?;
    }
    Ok(())
}

/// Append one row per APK, covering all of its runs at once. The XML report
/// goes to `<report_dir>/<apk>.coverage_report.xml`.
pub fn accumulative(
    reporter: &Reporter,
    app: &str,
    tool: Tool,
    runs: &[PathBuf],
    report_dir: &Path,
    sink: &mut CsvSink,
) -> Result<()> {
    for (apk_name, cluster) in layout::cluster_by_apk(runs)? {
        let mut merged = Vec::new();
        for dir in &cluster {
            info!("{}", dir.display());
            let data_dir = tool.coverage_data_dir(dir);
            merged.extend(merge::merge(reporter.tool(), tool.merge_strategy(), &data_dir)?);
        }

        let class_dirs = reporter.class_dirs(app, &apk_name)?;
        let xml_out = report_dir.join(format!("{}.coverage_report.xml", apk_name));
        let record = reporter.report(&merged, &class_dirs, &xml_out)?;
        if !record.valid {
            debug!("no valid coverage for {}", apk_name);
            continue;
        }
        let [line, branch, method, class] = record.columns();
        sink.append([
            app.to_string(),
            tool.to_string(),
            apk_name,
            line,
            branch,
            method,
            class,
        ])?;
    }
    Ok(())
}

/// Run every enabled mode over the indexed results.
pub fn run(
    index: &ResultsIndex,
    reporter: &Reporter,
    selection: &Selection,
    outputs: &Outputs,
    results_root: &Path,
) -> Result<Summary> {
    if selection.tool.is_none() {
        warn!("no testing tool selected; no result directory will match");
    }

    let mut summary = Summary::default();
    for (mode, path) in outputs.enabled() {
        let mut sink = CsvSink::create(path)?;
        if let Some(tool) = selection.tool {
            for (app, dirs) in index.apps(selection.app.as_deref()) {
                let runs = select_runs(dirs, tool, selection, mode != Mode::Accumulative);
                match mode {
                    Mode::Single => single_run(reporter, app, tool, &runs, &mut sink)?,
                    Mode::Average => average(reporter, app, tool, &runs, &mut sink)?,
                    Mode::Accumulative => {
                        accumulative(reporter, app, tool, &runs, results_root, &mut sink)?
                    }
                }
            }
        }
        info!(
            "{} coverage: {} rows written to {}",
            mode.as_str(),
            sink.rows(),
            path.display()
        );
        summary.rows.push((mode, sink.rows()));
    }
    Ok(summary)
}

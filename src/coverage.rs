//! Coverage of one reporting unit: merge its data, run the report tool
//! against the APK's compiled classes, read the numbers back.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::jacoco::CoverageTool;
use crate::layout;
use crate::merge;
use crate::model::{AppCoverageConfig, CoverageRecord};
use crate::report;
use crate::tool::Tool;

/// Name of the per-app class-file config inside `<apps_dir>/<app>/`.
pub const CLASS_FILES_CONFIG: &str = "class_files.json";

/// Name of the XML report written inside each result directory.
pub const RUN_REPORT_FILE: &str = "coverage_report.xml";

pub struct Reporter<'a> {
    tool: &'a dyn CoverageTool,
    apps_dir: PathBuf,
}

impl<'a> Reporter<'a> {
    /// `apps_dir` holds one directory per app with its `class_files.json` and
    /// the class-file directories that config names.
    pub fn new(tool: &'a dyn CoverageTool, apps_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            apps_dir: apps_dir.into(),
        }
    }

    pub fn tool(&self) -> &'a dyn CoverageTool {
        self.tool
    }

    /// Class-file directories of `apk_name`, resolved against the app's
    /// directory.
    pub fn class_dirs(&self, app: &str, apk_name: &str) -> Result<Vec<PathBuf>> {
        let app_dir = self.apps_dir.join(app);
        let config = AppCoverageConfig::load(&app_dir.join(CLASS_FILES_CONFIG))?;
        let entry = config.lookup(apk_name)?;
        Ok(entry.classfiles.iter().map(|d| app_dir.join(d)).collect())
    }

    /// Coverage of a single run.
    pub fn compute(
        &self,
        app: &str,
        tool: Tool,
        result_dir: &Path,
        coverage_data_dir: &Path,
    ) -> Result<CoverageRecord> {
        let apk_name = layout::apk_name(result_dir)?;
        let class_dirs = self.class_dirs(app, &apk_name)?;
        let merged = merge::merge(self.tool, tool.merge_strategy(), coverage_data_dir)?;
        self.report(&merged, &class_dirs, &result_dir.join(RUN_REPORT_FILE))
    }

    /// Report on already merged data files. No data means an invalid record
    /// without running the tool.
    pub fn report(
        &self,
        data_files: &[PathBuf],
        class_dirs: &[PathBuf],
        xml_out: &Path,
    ) -> Result<CoverageRecord> {
        if data_files.is_empty() {
            return Ok(CoverageRecord::invalid());
        }
        if xml_out.exists() {
            std::fs::remove_file(xml_out)?;
        }
        self.tool.report(data_files, class_dirs, xml_out)?;
        Ok(report::read_report(xml_out))
    }
}

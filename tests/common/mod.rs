#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use droidcov::error::Result;
use droidcov::jacoco::CoverageTool;
use tempfile::TempDir;

/// Stand-in for jacococli.jar that records its calls.
///
/// `merge` writes the destination file. `report` copies `counters.xml` from
/// the directory of the first data file to the requested output, or writes
/// nothing when there is none (as a failed report would).
#[derive(Default)]
pub struct FakeJacoco {
    pub merges: RefCell<Vec<(Vec<PathBuf>, PathBuf)>>,
    pub reports: RefCell<Vec<(Vec<PathBuf>, Vec<PathBuf>, PathBuf)>>,
}

impl CoverageTool for FakeJacoco {
    fn merge(&self, inputs: &[PathBuf], dest: &Path) -> Result<String> {
        std::fs::write(dest, b"merged")?;
        self.merges
            .borrow_mut()
            .push((inputs.to_vec(), dest.to_path_buf()));
        Ok(String::new())
    }

    fn report(
        &self,
        data_files: &[PathBuf],
        class_dirs: &[PathBuf],
        xml_out: &Path,
    ) -> Result<String> {
        self.reports.borrow_mut().push((
            data_files.to_vec(),
            class_dirs.to_vec(),
            xml_out.to_path_buf(),
        ));
        let counters = data_files
            .first()
            .and_then(|f| f.parent())
            .map(|d| d.join("counters.xml"))
            .filter(|p| p.is_file());
        if let Some(counters) = counters {
            std::fs::copy(counters, xml_out)?;
        }
        Ok(String::new())
    }
}

impl FakeJacoco {
    pub fn merge_count(&self) -> usize {
        self.merges.borrow().len()
    }

    pub fn report_count(&self) -> usize {
        self.reports.borrow().len()
    }
}

/// A JaCoCo report with the given (missed, covered) line, branch, method
/// and class totals.
pub fn counters_xml(
    line: (u64, u64),
    branch: (u64, u64),
    method: (u64, u64),
    class: (u64, u64),
) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<report name="app">
  <sessioninfo id="s1" start="1" dump="2"/>
  <counter type="INSTRUCTION" missed="100" covered="100"/>
  <counter type="BRANCH" missed="{}" covered="{}"/>
  <counter type="LINE" missed="{}" covered="{}"/>
  <counter type="COMPLEXITY" missed="3" covered="4"/>
  <counter type="METHOD" missed="{}" covered="{}"/>
  <counter type="CLASS" missed="{}" covered="{}"/>
</report>
"#,
        branch.0, branch.1, line.0, line.1, method.0, method.1, class.0, class.1
    )
}

/// A results root next to an apps directory, both in a temp dir.
pub struct Workspace {
    pub dir: TempDir,
    pub results: PathBuf,
    pub apps: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        let apps = dir.path().join("apps");
        std::fs::create_dir(&results).unwrap();
        std::fs::create_dir(&apps).unwrap();
        Self { dir, results, apps }
    }

    /// Write `<apps>/<app>/class_files.json` listing the given APKs.
    pub fn class_config(&self, app: &str, apks: &[&str]) {
        let app_dir = self.apps.join(app);
        std::fs::create_dir_all(&app_dir).unwrap();
        let entries: Vec<String> = apks
            .iter()
            .map(|apk| {
                format!(
                    r#""{}": {{"classfiles": ["build/classes", "build/kotlin"], "sourcefiles": ["src/main/java"]}}"#,
                    apk
                )
            })
            .collect();
        std::fs::write(
            app_dir.join("class_files.json"),
            format!("{{{}}}", entries.join(",")),
        )
        .unwrap();
    }

    /// Create a result directory holding `ec_files` data files and, when
    /// given, the report the fake tool should produce for it.
    pub fn run(&self, name: &str, ec_files: usize, counters: Option<String>) -> PathBuf {
        let dir = self.results.join(name);
        std::fs::create_dir(&dir).unwrap();
        for i in 0..ec_files {
            std::fs::write(dir.join(format!("coverage_{:03}.ec", i)), b"ec").unwrap();
        }
        if let Some(xml) = counters {
            std::fs::write(dir.join("counters.xml"), xml).unwrap();
        }
        dir
    }

    pub fn csv(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

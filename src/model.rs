//! In-memory representation of the numbers this tool moves around: one
//! coverage record per reporting unit, the per-issue sample accumulator used
//! by the average mode, and the per-app class-file configuration.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::{DroidcovError, Result};

/// Compute a coverage percentage, returning 0.0 when the total is zero.
#[must_use]
pub fn percent(covered: u64, missed: u64) -> f64 {
    let total = covered as f64 + missed as f64;
    if total == 0.0 {
        0.0
    } else {
        covered as f64 * 100.0 / total
    }
}

/// Round to two decimals, the precision every CSV column is written with.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Line/branch/method/class coverage of one reporting unit, in percent.
///
/// `valid` is false when no coverage data existed or the XML report could
/// not be read; the percentages are then all zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoverageRecord {
    pub valid: bool,
    pub line: f64,
    pub branch: f64,
    pub method: f64,
    pub class: f64,
}

impl CoverageRecord {
    /// Build a valid record, rounding each percentage to two decimals.
    pub fn new(line: f64, branch: f64, method: f64, class: f64) -> Self {
        Self {
            valid: true,
            line: round2(line),
            branch: round2(branch),
            method: round2(method),
            class: round2(class),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    /// The four percentages formatted for a CSV row.
    pub fn columns(&self) -> [String; 4] {
        [self.line, self.branch, self.method, self.class].map(|v| format!("{:.2}", v))
    }
}

#[derive(Debug, Default)]
struct Samples {
    line: Vec<f64>,
    branch: Vec<f64>,
    method: Vec<f64>,
    class: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Per-issue mean coverage produced by [`IssueAverages::means`].
#[derive(Debug, Clone, PartialEq)]
pub struct IssueMean {
    pub issue_id: String,
    pub line: f64,
    pub branch: f64,
    pub method: f64,
    pub class: f64,
}

impl IssueMean {
    pub fn columns(&self) -> [String; 4] {
        [self.line, self.branch, self.method, self.class].map(|v| format!("{:.2}", v))
    }
}

/// Collects coverage samples per issue id so that runs of the same issue can
/// be averaged.
#[derive(Debug, Default)]
pub struct IssueAverages {
    issues: BTreeMap<String, Samples>,
}

impl IssueAverages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one run's record under `issue_id`. Invalid records and records
    /// with zero line coverage are not sampled; returns whether it was.
    pub fn record(&mut self, issue_id: &str, record: &CoverageRecord) -> bool {
        if !record.valid || record.line <= 0.0 {
            return false;
        }
        let samples = self.issues.entry(issue_id.to_string()).or_default();
        samples.line.push(record.line);
        samples.branch.push(record.branch);
        samples.method.push(record.method);
        samples.class.push(record.class);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Consume the accumulator, yielding one mean per issue in issue-id order.
    pub fn means(self) -> Vec<IssueMean> {
        self.issues
            .into_iter()
            .map(|(issue_id, s)| IssueMean {
                issue_id,
                line: mean(&s.line),
                branch: mean(&s.branch),
                method: mean(&s.method),
                class: mean(&s.class),
            })
            .collect()
    }
}

/// Class-file and source-file directories of one APK, relative to the app's
/// config directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ApkClassFiles {
    #[serde(default)]
    pub classfiles: Vec<String>,
    #[serde(default)]
    pub sourcefiles: Vec<String>,
}

/// Contents of an app's `class_files.json`: APK file name → directories.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct AppCoverageConfig {
    apks: HashMap<String, ApkClassFiles>,
}

impl AppCoverageConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DroidcovError::Config(format!(
                "class file config not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read(path)?;
        Self::from_slice(&content)
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(input)?)
    }

    /// Look up an APK's directories. Both lists must be non-empty.
    pub fn lookup(&self, apk_name: &str) -> Result<&ApkClassFiles> {
        let entry = self.apks.get(apk_name).ok_or_else(|| {
            DroidcovError::Config(format!("no class file entry for '{}'", apk_name))
        })?;
        if entry.classfiles.is_empty() || entry.sourcefiles.is_empty() {
            return Err(DroidcovError::Config(format!(
                "empty classfiles or sourcefiles for '{}'",
                apk_name
            )));
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_and_rounding() {
        assert_eq!(percent(90, 10), 90.0);
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(round2(200.0 / 3.0), 66.67);

        let record = CoverageRecord::new(100.0 / 3.0, 50.0, 0.0, 12.344);
        assert!(record.valid);
        assert_eq!(record.line, 33.33);
        assert_eq!(record.columns(), ["33.33", "50.00", "0.00", "12.34"]);
    }

    #[test]
    fn test_percent_huge_counters() {
        assert_eq!(percent(u64::MAX, u64::MAX), 50.0);
        assert_eq!(percent(u64::MAX, 0), 100.0);
    }

    #[test]
    fn test_invalid_record_is_zero() {
        let record = CoverageRecord::invalid();
        assert!(!record.valid);
        assert_eq!(record.line, 0.0);
        assert_eq!(record.class, 0.0);
    }

    #[test]
    fn test_average_excludes_zero_line_runs() {
        let mut averages = IssueAverages::new();
        assert!(!averages.record("7", &CoverageRecord::new(0.0, 10.0, 10.0, 10.0)));
        assert!(averages.record("7", &CoverageRecord::new(80.0, 40.0, 60.0, 70.0)));
        assert!(averages.record("7", &CoverageRecord::new(60.0, 20.0, 40.0, 50.0)));
        assert!(!averages.record("7", &CoverageRecord::invalid()));

        let means = averages.means();
        assert_eq!(means.len(), 1);
        assert_eq!(means[0].issue_id, "7");
        assert_eq!(means[0].line, 70.0);
        assert_eq!(means[0].branch, 30.0);
        assert_eq!(means[0].columns(), ["70.00", "30.00", "50.00", "60.00"]);
    }

    #[test]
    fn test_average_orders_by_issue() {
        let mut averages = IssueAverages::new();
        averages.record("9", &CoverageRecord::new(10.0, 0.0, 0.0, 0.0));
        averages.record("12", &CoverageRecord::new(20.0, 0.0, 0.0, 0.0));
        let ids: Vec<_> = averages.means().into_iter().map(|m| m.issue_id).collect();
        assert_eq!(ids, vec!["12", "9"]);
    }

    #[test]
    fn test_config_lookup() {
        let json = br#"{
            "app.apk": {"classfiles": ["build/classes"], "sourcefiles": ["src/main/java"]},
            "empty.apk": {"classfiles": [], "sourcefiles": ["src"]}
        }"#;
        let config = AppCoverageConfig::from_slice(json).unwrap();

        let entry = config.lookup("app.apk").unwrap();
        assert_eq!(entry.classfiles, vec!["build/classes"]);

        assert!(matches!(
            config.lookup("empty.apk"),
            Err(DroidcovError::Config(_))
        ));
        assert!(matches!(
            config.lookup("missing.apk"),
            Err(DroidcovError::Config(_))
        ));
    }

    #[test]
    fn test_config_missing_file() {
        let err = AppCoverageConfig::load(Path::new("/nonexistent/class_files.json")).unwrap_err();
        assert!(err.to_string().contains("class_files.json"));
    }
}

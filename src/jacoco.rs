//! The external JaCoCo command-line tool.
//!
//! Both operations block until the process exits. The exit status is only
//! logged: a failed merge or report shows up later as a missing output file.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::error::Result;

/// Operations needed from a coverage tool.
pub trait CoverageTool {
    /// Merge coverage-data files into `dest`. Returns the tool's output text.
    fn merge(&self, inputs: &[PathBuf], dest: &Path) -> Result<String>;

    /// Write an XML report for `data_files` against the compiled classes in
    /// `class_dirs`. Returns the tool's output text.
    fn report(
        &self,
        data_files: &[PathBuf],
        class_dirs: &[PathBuf],
        xml_out: &Path,
    ) -> Result<String>;
}

/// `java -jar jacococli.jar ...`
#[derive(Debug, Clone)]
pub struct JacocoCli {
    pub java: PathBuf,
    pub jar: PathBuf,
}

impl JacocoCli {
    pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }

    fn run(&self, subcommand: &str, args: Vec<OsString>) -> Result<String> {
        let mut cmd = Command::new(&self.java);
        cmd.arg("-jar").arg(&self.jar).arg(subcommand).args(&args);

        let printable: Vec<String> = std::iter::once(self.java.as_os_str())
            .chain([OsStr::new("-jar"), self.jar.as_os_str(), OsStr::new(subcommand)])
            .chain(args.iter().map(|a| a.as_os_str()))
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        info!("$ {}", printable.join(" "));

        let output = cmd.output()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let text = text.trim().to_string();

        if output.status.success() {
            if !text.is_empty() {
                info!("{}", text);
            }
        } else {
            warn!("jacococli {} exited with {}: {}", subcommand, output.status, text);
        }
        Ok(text)
    }
}

impl CoverageTool for JacocoCli {
    fn merge(&self, inputs: &[PathBuf], dest: &Path) -> Result<String> {
        let mut args: Vec<OsString> = inputs.iter().map(|p| p.clone().into_os_string()).collect();
        args.push("--destfile".into());
        args.push(dest.as_os_str().to_owned());
        self.run("merge", args)
    }

    fn report(
        &self,
        data_files: &[PathBuf],
        class_dirs: &[PathBuf],
        xml_out: &Path,
    ) -> Result<String> {
        let mut args: Vec<OsString> =
            data_files.iter().map(|p| p.clone().into_os_string()).collect();
        for dir in class_dirs {
            args.push("--classfiles".into());
            args.push(dir.as_os_str().to_owned());
        }
        args.push("--xml".into());
        args.push(xml_out.as_os_str().to_owned());
        self.run("report", args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_java_is_io_error() {
        let cli = JacocoCli::new("/nonexistent/bin/java", "jacococli.jar");
        let err = cli
            .merge(&[PathBuf::from("a.ec")], Path::new("out.ec"))
            .unwrap_err();
        assert!(matches!(err, crate::error::DroidcovError::Io(_)));
    }
}

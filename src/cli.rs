//! Command handler for the droidcov CLI.
//!
//! `cmd_aggregate` returns its summary as a `String` so it can be tested
//! without capturing stdout.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, warn};

use crate::aggregate::{self, Outputs, Selection};
use crate::coverage::Reporter;
use crate::jacoco::CoverageTool;
use crate::layout::ResultsIndex;
use crate::tool::Tool;

/// Testing tool flags. When several are given the first in the order
/// below wins.
#[derive(Args, Debug, Clone, Default)]
pub struct ToolFlags {
    #[arg(long)]
    pub timemachine: bool,
    #[arg(long)]
    pub monkey: bool,
    #[arg(long)]
    pub ape: bool,
    #[arg(long)]
    pub combo: bool,
    #[arg(long)]
    pub humandroid: bool,
    #[arg(long)]
    pub stoat: bool,
    #[arg(long)]
    pub qtesting: bool,
}

impl ToolFlags {
    pub fn tool(&self) -> Option<Tool> {
        Tool::resolve(|t| match t {
            Tool::TimeMachine => self.timemachine,
            Tool::Monkey => self.monkey,
            Tool::Ape => self.ape,
            Tool::Combo => self.combo,
            Tool::Humandroid => self.humandroid,
            Tool::Stoat => self.stoat,
            Tool::Qtesting => self.qtesting,
        })
    }
}

/// Everything `cmd_aggregate` needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct AggregateArgs {
    pub results_root: PathBuf,
    pub apps_dir: PathBuf,
    pub selection: Selection,
    pub outputs: Outputs,
}

pub fn cmd_aggregate(args: &AggregateArgs, tool: &dyn CoverageTool) -> Result<String> {
    if args.outputs.is_empty() {
        warn!("no output file given (--acc-csv, --single-csv, --average-csv); nothing to do");
    }

    let index = ResultsIndex::scan(&args.results_root).with_context(|| {
        format!(
            "Failed to list testing results in {}",
            args.results_root.display()
        )
    })?;
    debug!("{:#?}", index.apps);

    let reporter = Reporter::new(tool, &args.apps_dir);
    let summary = aggregate::run(
        &index,
        &reporter,
        &args.selection,
        &args.outputs,
        &args.results_root,
    )?;

    let mut out = String::new();
    for ((mode, path), (_, rows)) in args.outputs.enabled().iter().zip(&summary.rows) {
        writeln!(
            out,
            "{:<13} {:>5} rows  {}",
            mode.as_str(),
            rows,
            path.display()
        )
        .unwrap();
    }
    if !index.unclassified.is_empty() {
        writeln!(
            out,
            "{} result dirs matched no known app",
            index.unclassified.len()
        )
        .unwrap();
    }
    Ok(out)
}

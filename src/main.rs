use std::path::PathBuf;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use droidcov::aggregate::{Outputs, Selection};
use droidcov::cli::{self, AggregateArgs, ToolFlags};
use droidcov::jacoco::JacocoCli;

/// droidcov — JaCoCo coverage of Android UI-testing runs, aggregated into CSV.
#[derive(Parser)]
#[command(name = "droidcov", version, about)]
struct Cli {
    /// The output directory of testing results.
    #[arg(short = 'o', value_name = "DIR")]
    results_root: PathBuf,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    tools: ToolFlags,

    /// Only compute coverage for this app.
    #[arg(long = "app")]
    app: Option<String>,

    /// Only compute coverage for runs whose path contains this issue id.
    #[arg(long = "id")]
    issue_id: Option<String>,

    /// Write the accumulative coverage of all runs of each APK here.
    #[arg(long, alias = "acc_csv")]
    acc_csv: Option<PathBuf>,

    /// Write the coverage of every single run here.
    #[arg(long, alias = "single_csv")]
    single_csv: Option<PathBuf>,

    /// Write the average coverage of the runs of each issue here.
    #[arg(long, alias = "average_csv")]
    average_csv: Option<PathBuf>,

    /// Directory holding `<app>/class_files.json` and the class files it names.
    #[arg(long, default_value = "..")]
    apps_dir: PathBuf,

    /// Path to jacococli.jar.
    #[arg(long, default_value = "../tools/jacococli.jar")]
    jacoco_jar: PathBuf,

    /// Java executable used to run jacococli.jar.
    #[arg(long, default_value = "java")]
    java: PathBuf,

    /// Skip result directories whose names lack '#' or '.apk' instead of aborting.
    #[arg(long)]
    skip_malformed: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !cli.results_root.exists() {
        Cli::command()
            .error(
                ErrorKind::ValueValidation,
                "Error: the output directory does not exist!",
            )
            .exit();
    }

    let args = AggregateArgs {
        results_root: cli.results_root,
        apps_dir: cli.apps_dir,
        selection: Selection {
            tool: cli.tools.tool(),
            app: cli.app,
            issue: cli.issue_id,
            skip_malformed: cli.skip_malformed,
        },
        outputs: Outputs {
            accumulative: cli.acc_csv,
            single: cli.single_csv,
            average: cli.average_csv,
        },
    };

    let jacoco = JacocoCli::new(cli.java, cli.jacoco_jar);
    print!("{}", cli::cmd_aggregate(&args, &jacoco)?);
    Ok(())
}

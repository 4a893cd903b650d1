use clap::Args;
use std::path::PathBuf;

use crate::cli::run_cli_async;
use crate::config::Config;
use crate::generator::{self, Mode, REPORT_FILE};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(
        value_name = "PROJECT_PATH",
        help = "The path to the project. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
}

pub async fn run(args: CheckArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: CheckArgs) -> Result<(), String> {
    let project_root = args
        .project_path
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = Config::load(&project_root)?;
    println!("Checking generated artifacts against {}", config.spec);

    let summary = generator::run(&project_root, &config, Mode::Check).await?;

    if summary.changed_groups == 0 {
        println!("No changes detected across {} group(s).", summary.groups);
    } else {
        println!(
            "Changes detected in {} of {} group(s).",
            summary.changed_groups, summary.groups
        );
    }
    println!("Report written to {}", project_root.join(REPORT_FILE).display());

    Ok(())
}

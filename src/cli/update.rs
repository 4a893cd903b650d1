use clap::Args;
use std::path::PathBuf;

use crate::cli::run_cli_async;
use crate::config::Config;
use crate::generator::{self, Mode};

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[arg(
        value_name = "PROJECT_PATH",
        help = "The path to the project. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
}

pub async fn run(args: UpdateArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: UpdateArgs) -> Result<(), String> {
    let project_root = args
        .project_path
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = Config::load(&project_root)?;
    println!("Generating API artifacts from {}\n", config.spec);

    let summary = generator::run(&project_root, &config, Mode::Update).await?;

    println!(
        "\nSummary: {} group(s), {} file(s) created, {} updated, {} unchanged",
        summary.groups, summary.files_created, summary.files_updated, summary.files_unchanged
    );

    if !summary.discovered_labels.is_empty() {
        println!("\nNew category labels without an alias (defaulted to themselves):");
        for label in &summary.discovered_labels {
            println!("  - {label}");
        }
        println!("Customize them under [groups.aliases] in apigen.toml.");
    }

    Ok(())
}

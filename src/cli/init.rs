use clap::Args;
use std::fs;
use std::path::PathBuf;

use crate::cli::run_cli_async;
use crate::config::{CONFIG_FILE, DEFAULT_MANIFEST};

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(
        value_name = "PROJECT_PATH",
        help = "The path to the project. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
    #[arg(long, help = "Overwrite an existing manifest")]
    pub force: bool,
}

pub async fn run(args: InitArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: InitArgs) -> Result<(), String> {
    let project_root = args
        .project_path
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let path = project_root.join(CONFIG_FILE);
    if path.exists() && !args.force {
        return Err(format!(
            "{CONFIG_FILE} already exists at {}. Pass --force to overwrite.",
            path.display()
        ));
    }

    fs::create_dir_all(&project_root)
        .map_err(|err| format!("Failed to create project directory: {err}"))?;
    fs::write(&path, DEFAULT_MANIFEST)
        .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;

    println!("Wrote {}", path.display());
    println!("Edit the `spec` location, then run `apigen update`.");
    Ok(())
}

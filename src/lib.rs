#![forbid(unsafe_code)]

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod aliases;
mod cli;
mod config;
mod generator;
mod loader;
mod openapi;

#[derive(Parser)]
#[command(
    name = "apigen",
    version,
    about = "Generate TypeScript types and request functions from a Swagger 2.0 / OpenAPI 3.0 description"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default apigen.toml manifest
    Init(cli::init::InitArgs),
    /// Regenerate artifacts, merging into existing files
    Update(cli::update::UpdateArgs),
    /// Compare a fresh model against existing files and write a change report
    Check(cli::check::CheckArgs),
}

/// Parse and dispatch CLI arguments; returns the process exit code.
pub async fn run_cli(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Init(args)) => cli::init::run(args).await,
            Some(Commands::Update(args)) => cli::update::run(args).await,
            Some(Commands::Check(args)) => cli::check::run(args).await,
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Initialize the tracing subscriber.
pub fn init_tracing() {
    let crate_root = module_path!().to_string();

    // APIGEN_LOG controls the log level: "trace", "debug", "info", "warn",
    // "error", or a full tracing filter spec like "apigen=debug".
    let filter = match std::env::var("APIGEN_LOG") {
        Ok(level) if is_plain_level(&level) => {
            format!("{crate_root}={level}")
        }
        Ok(spec) => spec,
        Err(_) => format!("{crate_root}=info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

//! sierra-forge CLI — instantiates the Sierra platform template for one application.
//!
//! Three commands:
//! - `generate` renders a template into a buildable project, all or nothing
//! - `verify` re-runs the identity consistency check on an existing project
//! - `tokens` lists the substitution vocabulary
//!
//! All generation logic lives in [`sierra_forge_core`]; this crate only parses
//! arguments, merges them with `sierra-forge.json`, and prints results.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sierra-forge",
    about = "Generate per-application Sierra platform projects from the engine template",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to sierra-forge.json (default: ./sierra-forge.json, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the template into a new application project
    Generate {
        /// Application name (also the native library name)
        name: Option<String>,

        /// Application version name, e.g. 1.0.0
        #[arg(long)]
        version_name: Option<String>,

        /// Template directory (default: built-in Android template)
        #[arg(long, short)]
        template: Option<PathBuf>,

        /// Output directory (default: ./<name>)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Replace the output directory if it is not empty
        #[arg(long)]
        force: bool,

        /// Write a JSON digest report of the generated files
        #[arg(long)]
        report: Option<PathBuf>,

        /// Skip probing for cmake, java and gradle
        #[arg(long)]
        skip_toolchain_check: bool,
    },

    /// Check that a generated project's identity references agree
    Verify {
        /// Project directory
        dir: PathBuf,

        /// Expected application name
        #[arg(long)]
        name: String,
    },

    /// List the substitution tokens and their values for an application
    Tokens {
        /// Application name used for the example values
        #[arg(default_value = "Sandbox")]
        name: String,

        /// Application version name used for the example values
        #[arg(long, default_value = sierra_forge_core::config::DEFAULT_VERSION_NAME)]
        version_name: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate {
            name,
            version_name,
            template,
            output,
            force,
            report,
            skip_toolchain_check,
        } => {
            commands::generate::run(
                cli.config.as_deref(),
                commands::generate::GenerateArgs {
                    name,
                    version_name,
                    template,
                    output,
                    force,
                    report,
                    skip_toolchain_check,
                },
            )
            .await?;
        }
        Commands::Verify { dir, name } => {
            commands::verify::run(&dir, &name).await?;
        }
        Commands::Tokens {
            name,
            version_name,
            json,
        } => {
            commands::tokens::run(&name, &version_name, json).await?;
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rust_relschema::compare::{compare_snapshots, report::print_report};
use rust_relschema::{build_schema, BuildOptions};

#[derive(Parser)]
#[command(name = "rust-relschema")]
#[command(author, version, about = "Relational schema derivation for declarative entity models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the relational schema for a relschema.json project
    Build {
        /// Path to the relschema.json file
        #[arg(short, long)]
        project: PathBuf,

        /// Output directory (defaults to out/ beside the project file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target technology version, e.g. 7.1.0
        #[arg(short, long)]
        target_version: Option<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Compare two schema snapshots
    Compare {
        /// Baseline snapshot
        baseline: PathBuf,

        /// Candidate snapshot
        candidate: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            project,
            output,
            target_version,
            verbose,
        } => {
            init_tracing(verbose);
            let options = BuildOptions {
                project_path: project,
                output_dir: output,
                target_version,
                verbose,
            };

            let written = build_schema(options)?;
            println!("{}", written.snapshot_path.display());
        }
        Commands::Compare {
            baseline,
            candidate,
        } => {
            init_tracing(false);
            let result = compare_snapshots(&baseline, &candidate)?;
            print_report(&result);
            if result.has_differences() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

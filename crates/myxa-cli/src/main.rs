//! Myxa CLI - package management with structural compatibility checking.
//!
//! Commands operate on a working `package.json` in the current directory
//! and on the index file named by `MYXA_INDEX` (with a shared temp-dir
//! fallback). The core stays pure; every file read and write happens here
//! at the command boundary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use myxa_core::Version;

mod add;
mod check;
mod info;
mod init;
mod lock;
mod publish;
mod remove;
mod render;
mod store;

#[derive(Parser)]
#[command(name = "myxa")]
#[command(version)]
#[command(about = "A package manager that understands interfaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new working package in the current directory
    Init {
        /// Package name
        name: String,

        /// Short description
        description: String,
    },

    /// Print the package interface tree
    Info {
        /// Show a published version instead of the working draft
        #[arg(long)]
        version: Option<Version>,
    },

    /// Add a dependency requirement
    Add {
        /// Dependency package name
        name: String,

        /// Minimum version; defaults to the latest published version
        #[arg(long)]
        version: Option<Version>,
    },

    /// Remove a dependency requirement
    Remove {
        /// Dependency package name
        name: String,
    },

    /// Resolve requirements and write the lock
    Lock,

    /// Upgrade locked dependencies to the newest qualifying versions
    Update,

    /// Diff against a published version; exits nonzero on breaking changes
    Check {
        /// Compare against this version instead of the latest
        #[arg(long)]
        version: Option<Version>,
    },

    /// Report every change against a published version
    Diff {
        /// Compare against this version instead of the latest
        #[arg(long)]
        version: Option<Version>,
    },

    /// Publish the working package to the index
    Publish,

    /// List the contents of the index
    Index {
        /// Only show the named package
        #[arg(long)]
        package: Option<String>,

        /// Hide per-version listings
        #[arg(long = "no-versions")]
        no_versions: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { name, description } => init::run(&name, &description),
        Commands::Info { version } => info::run(version),
        Commands::Add { name, version } => add::run(&name, version),
        Commands::Remove { name } => remove::run(&name),
        Commands::Lock => lock::run_lock(),
        Commands::Update => lock::run_update(),
        Commands::Check { version } => check::run(version, check::Mode::Check),
        Commands::Diff { version } => check::run(version, check::Mode::Diff),
        Commands::Publish => publish::run(),
        Commands::Index {
            package,
            no_versions,
        } => info::run_index(package.as_deref(), !no_versions),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "myxa=warn".into()),
        )
        .with_target(false)
        .init();
}

//! Implementation of the `myxa check` and `myxa diff` commands.

use crate::{render, store};
use anyhow::Result;
use myxa_core::{diff_packages, Version};

/// How to treat breaking changes in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Exit nonzero when any breaking change is found.
    Check,
    /// Report everything, exit zero.
    Diff,
}

/// Diff the working draft against a published version (latest by default).
pub fn run(version: Option<Version>, mode: Mode) -> Result<()> {
    let package = store::load_package(&store::package_path())?;
    let index = store::load_index(&store::index_path())?;

    let old = match version {
        Some(version) => index.get_version(package.name(), version)?,
        None => index.latest(package.name())?,
    };

    let diff = diff_packages(old, &package);
    if diff.is_empty() {
        println!(
            "No changes in '{}' against published {}",
            package.name(),
            old.version()
        );
        return Ok(());
    }

    print!("{}", render::render_diff(&diff));

    if mode == Mode::Check && diff.is_breaking() {
        eprintln!(
            "breaking changes in '{}' against published {}",
            package.name(),
            old.version()
        );
        std::process::exit(1);
    }
    Ok(())
}

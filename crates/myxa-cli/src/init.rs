//! Implementation of the `myxa init` command.

use crate::store::{self, PACKAGE_FILE};
use anyhow::{bail, Context, Result};
use myxa_core::Package;

/// Write a fresh working package into the current directory.
pub fn run(name: &str, description: &str) -> Result<()> {
    let path = store::package_path();
    if path.exists() {
        bail!("cannot initialize: {PACKAGE_FILE} already exists in this directory");
    }

    let package = Package::new(name, description);
    package
        .validate()
        .with_context(|| format!("'{name}' is not a valid package name"))?;
    store::save_package(&package, &path)?;

    println!(
        "Initialized package '{}' at version {}",
        package.name(),
        package.version()
    );
    Ok(())
}

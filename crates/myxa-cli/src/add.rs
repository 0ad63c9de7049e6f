//! Implementation of the `myxa add` command.

use crate::store;
use anyhow::{bail, Context, Result};
use myxa_core::{DepReq, Version};

/// Add a dependency requirement to the working package.
///
/// Without an explicit version the requirement floor is the latest
/// published version, so a fresh `lock` starts from today's newest line.
pub fn run(name: &str, version: Option<Version>) -> Result<()> {
    let package_path = store::package_path();
    let mut package = store::load_package(&package_path)?;

    if package.requirements.contains_key(name) {
        bail!("'{name}' is already a dependency of '{}'", package.name());
    }

    let index = store::load_index(&store::index_path())?;
    let min_version = match version {
        Some(version) => {
            if !index.contains_version(name, version) {
                bail!("package '{name}' has no published version {version}");
            }
            version
        }
        None => index
            .latest(name)
            .with_context(|| format!("cannot add '{name}'"))?
            .version(),
    };

    package.require(DepReq::new(name, min_version));
    store::save_package(&package, &package_path)?;

    println!("Added {name}~={min_version} to '{}'", package.name());
    Ok(())
}

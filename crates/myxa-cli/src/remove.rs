//! Implementation of the `myxa remove` command.

use crate::store;
use anyhow::{bail, Result};

/// Remove a dependency requirement (and its lock entry) from the working
/// package.
pub fn run(name: &str) -> Result<()> {
    let package_path = store::package_path();
    let mut package = store::load_package(&package_path)?;

    if package.unrequire(name).is_none() {
        bail!(
            "'{name}' is not a dependency of '{}', unable to remove it",
            package.name()
        );
    }
    store::save_package(&package, &package_path)?;

    println!("Removed {name} from '{}'", package.name());
    Ok(())
}

//! Implementation of the `myxa lock` and `myxa update` commands.

use crate::store;
use anyhow::Result;
use myxa_core::{apply_update, Resolver};

/// Resolve the working package's requirements and write the lock.
pub fn run_lock() -> Result<()> {
    let package_path = store::package_path();
    let mut package = store::load_package(&package_path)?;
    let index = store::load_index(&store::index_path())?;

    Resolver::new(&index).lock(&mut package)?;
    store::save_package(&package, &package_path)?;

    let n = package.deps.len();
    println!(
        "Locked '{}' with {n} {}",
        package.name(),
        if n == 1 { "dependency" } else { "dependencies" }
    );
    Ok(())
}

/// Upgrade every locked dependency to the newest qualifying version.
pub fn run_update() -> Result<()> {
    let package_path = store::package_path();
    let mut package = store::load_package(&package_path)?;
    let index = store::load_index(&store::index_path())?;

    let before = package.deps.clone();
    let changed = apply_update(&mut package, &index)?;
    store::save_package(&package, &package_path)?;

    if changed {
        for (name, dep) in &package.deps {
            if before.get(name) != Some(dep) {
                let from = before
                    .get(name)
                    .map_or_else(|| "new".to_string(), |d| d.version.to_string());
                println!("Updated {name}: {from} -> {}", dep.version);
            }
        }
    } else {
        println!("Lock for '{}' is already up to date", package.name());
    }
    Ok(())
}

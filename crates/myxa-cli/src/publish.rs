//! Implementation of the `myxa publish` command.

use crate::store;
use anyhow::Result;

/// Run the publish gate and persist the index on success.
pub fn run() -> Result<()> {
    let package = store::load_package(&store::package_path())?;
    let index_path = store::index_path();
    let mut index = store::load_index(&index_path)?;

    tracing::info!(
        package = %package.name(),
        version = %package.version(),
        "publishing"
    );
    myxa_core::publish(&package, &mut index)?;
    store::save_index(&index, &index_path)?;

    println!(
        "Published {}=={} to index '{}'",
        package.name(),
        package.version(),
        index.name
    );
    Ok(())
}

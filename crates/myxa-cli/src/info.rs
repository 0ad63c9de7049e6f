//! Implementation of the `myxa info` and `myxa index` commands.

use crate::{render, store};
use anyhow::Result;
use myxa_core::Version;

/// Print the interface tree of the working draft, or of a published
/// version when one is requested.
pub fn run(version: Option<Version>) -> Result<()> {
    let package = store::load_package(&store::package_path())?;

    let text = match version {
        Some(version) => {
            let index = store::load_index(&store::index_path())?;
            let published = index.get_version(package.name(), version)?;
            render::render_package(published)
        }
        None => render::render_package(&package),
    };
    print!("{text}");
    Ok(())
}

/// List the index contents.
pub fn run_index(filter: Option<&str>, show_versions: bool) -> Result<()> {
    let index = store::load_index(&store::index_path())?;
    if let Some(name) = filter {
        // Surface a proper not-found error instead of an empty listing.
        index.get(name)?;
    }
    print!("{}", render::render_index(&index, filter, show_versions));
    Ok(())
}

//! Per-dependency upgrade planning.
//!
//! `lock` re-solves the whole graph; `update` is deliberately lighter. For
//! each locked dependency it walks the index from newest to oldest and
//! relocks the first version that qualifies against the members currently
//! in use, which can cross a major boundary when none of those members
//! were broken. Running it twice against an unchanged index is a no-op.

use crate::index::Index;
use crate::interface::{Dep, DepReq, Package};
use crate::resolve::{version_qualifies, ResolveError};
use std::collections::{BTreeMap, BTreeSet};

/// Compute an upgraded lock for `package`.
///
/// The returned map covers the same dependency names as `package.deps`,
/// with versions moved forward where a newer qualifying version exists.
///
/// # Errors
///
/// Returns [`ResolveError::UnknownDependency`] when a locked dependency
/// has vanished from the index.
pub fn plan_update(
    package: &Package,
    index: &Index,
) -> Result<BTreeMap<String, Dep>, ResolveError> {
    let used = current_used_members(package, index)?;

    let mut next = package.deps.clone();
    for (name, dep) in &package.deps {
        for candidate in index.versions_desc(name).map_err(|_| {
            ResolveError::UnknownDependency { name: name.clone() }
        })? {
            let version = candidate.version();
            if version <= dep.version {
                break;
            }
            // The current lock is the version this package was built
            // against, so it is the baseline a crossing must be safe from.
            let req = DepReq::new(name.clone(), dep.version);
            if version_qualifies(index, &req, version, used.get(name)) {
                tracing::debug!(
                    package = %package.info.name,
                    dep = %name,
                    from = %dep.version,
                    to = %version,
                    "upgrading lock"
                );
                next.insert(name.clone(), Dep::new(name.clone(), version));
                break;
            }
        }
    }
    Ok(next)
}

/// Plan and apply an update to `package`'s lock. Returns `true` when any
/// entry moved.
///
/// # Errors
///
/// Propagates everything [`plan_update`] can return.
pub fn apply_update(package: &mut Package, index: &Index) -> Result<bool, ResolveError> {
    let next = plan_update(package, index)?;
    let changed = next != package.deps;
    package.deps = next;
    Ok(changed)
}

/// The usage map of the working package and its locked dependencies: every
/// member path referenced by the root or by any locked dependency snapshot.
fn current_used_members(
    package: &Package,
    index: &Index,
) -> Result<BTreeMap<String, BTreeSet<String>>, ResolveError> {
    let mut used = BTreeMap::new();
    merge(&mut used, package.external_references());
    for dep in package.deps.values() {
        let snapshot = index.get_version(&dep.name, dep.version).map_err(|_| {
            ResolveError::UnknownDependency {
                name: dep.name.clone(),
            }
        })?;
        merge(&mut used, snapshot.external_references());
    }
    Ok(used)
}

fn merge(
    used: &mut BTreeMap<String, BTreeSet<String>>,
    references: BTreeMap<String, BTreeSet<String>>,
) {
    for (name, paths) in references {
        used.entry(name).or_default().extend(paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{Import, Member, Ty};
    use crate::version::Version;

    fn lib(version: Version) -> Package {
        let mut pkg = Package::new("lib", "A library");
        pkg.info.version = version;
        pkg.root_module
            .insert_member("f", Member::func(vec![], Ty::INT));
        pkg.root_module
            .insert_member("g", Member::func(vec![], Ty::STR));
        pkg
    }

    fn lib_v2_g_broken() -> Package {
        let mut pkg = lib(Version::new(2, 0));
        pkg.root_module
            .insert_member("g", Member::func(vec![], Ty::INT));
        pkg
    }

    fn locked_app(members: Vec<&str>) -> Package {
        let mut app = Package::new("app", "A fun app");
        app.require(DepReq::new("lib", Version::new(1, 0)));
        app.root_module
            .imports
            .push(Import::new("lib", vec![], members));
        app.deps
            .insert("lib".to_string(), Dep::new("lib", Version::new(1, 0)));
        app
    }

    #[test]
    fn upgrades_within_major() {
        let mut index = Index::new("primary");
        index.insert(lib(Version::new(1, 0))).unwrap();
        index.insert(lib(Version::new(1, 4))).unwrap();

        let mut app = locked_app(vec!["f", "g"]);
        let changed = apply_update(&mut app, &index).unwrap();
        assert!(changed);
        assert_eq!(app.deps["lib"].version, Version::new(1, 4));
    }

    #[test]
    fn crosses_major_when_unused_member_broke() {
        let mut index = Index::new("primary");
        index.insert(lib(Version::new(1, 0))).unwrap();
        index.insert(lib_v2_g_broken()).unwrap();

        // Only `f` is used; the break in `g` is irrelevant.
        let mut app = locked_app(vec!["f"]);
        let changed = apply_update(&mut app, &index).unwrap();
        assert!(changed);
        assert_eq!(app.deps["lib"].version, Version::new(2, 0));
    }

    #[test]
    fn stays_put_when_used_member_broke() {
        let mut index = Index::new("primary");
        index.insert(lib(Version::new(1, 0))).unwrap();
        index.insert(lib_v2_g_broken()).unwrap();

        let mut app = locked_app(vec!["f", "g"]);
        let changed = apply_update(&mut app, &index).unwrap();
        assert!(!changed);
        assert_eq!(app.deps["lib"].version, Version::new(1, 0));
    }

    #[test]
    fn update_is_idempotent() {
        let mut index = Index::new("primary");
        index.insert(lib(Version::new(1, 0))).unwrap();
        index.insert(lib(Version::new(1, 2))).unwrap();
        index.insert(lib_v2_g_broken()).unwrap();

        let mut app = locked_app(vec!["f"]);
        apply_update(&mut app, &index).unwrap();
        let first = app.deps.clone();
        let changed = apply_update(&mut app, &index).unwrap();
        assert!(!changed);
        assert_eq!(first, app.deps);
    }

    #[test]
    fn vanished_dependency_is_reported() {
        let index = Index::new("primary");
        let app = locked_app(vec!["f"]);
        let err = plan_update(&app, &index).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownDependency { .. }));
    }

    #[test]
    fn skips_inadmissible_then_takes_next_qualifying() {
        let mut index = Index::new("primary");
        index.insert(lib(Version::new(1, 0))).unwrap();
        index.insert(lib(Version::new(1, 6))).unwrap();
        index.insert(lib_v2_g_broken()).unwrap();

        // 2.0 is inadmissible because `g` is used, but 1.6 still qualifies.
        let mut app = locked_app(vec!["f", "g"]);
        apply_update(&mut app, &index).unwrap();
        assert_eq!(app.deps["lib"].version, Version::new(1, 6));
    }
}

//! The publish gate.
//!
//! Publishing is the only moment where the diff engine's classification
//! becomes an enforced contract: a breaking change forces a major bump, a
//! non-breaking change forces a minor bump, and the very first publish of
//! a name must carry the initial version.

use crate::diff::diff_packages;
use crate::index::{Index, IndexError};
use crate::interface::{InterfaceError, Package};
use crate::resolve::version_qualifies;
use crate::version::Version;
use thiserror::Error;

/// Errors that can occur when publishing a package.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Interface(#[from] InterfaceError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// A declared requirement has no lock entry.
    #[error("package '{name}' is not locked; run lock before publishing")]
    NotLocked { name: String },

    /// A lock entry does not satisfy its declared requirement.
    #[error("lock '{dep}=={locked}' does not satisfy the declared requirement '{dep}~={required}'")]
    LockInconsistent {
        dep: String,
        locked: Version,
        required: Version,
    },

    /// The very first publish of a name must use the initial version.
    #[error("first publish of '{name}' must use version {}, got {actual}", Version::INITIAL)]
    InvalidInitialVersion { name: String, actual: Version },

    /// The declared version does not match what the diff demands.
    #[error("publishing these changes requires version {required}, got {actual}")]
    VersionBumpRequired { required: Version, actual: Version },

    /// A reference into a dependency points at nothing at the locked version.
    #[error("reference '{target}' in {path} does not exist in '{dep}=={version}'")]
    UnresolvedExternal {
        path: String,
        target: String,
        dep: String,
        version: Version,
    },

    /// A reference into a dependency resolves to a non-data member.
    #[error("reference '{target}' in {path} does not point at a struct or enum in '{dep}=={version}'")]
    ExternalRefNotData {
        path: String,
        target: String,
        dep: String,
        version: Version,
    },
}

/// Run the publish gate over `package` and insert it on success.
///
/// The gate validates the interface, requires a consistent lock, checks
/// that every cross-package reference resolves at the locked versions,
/// enforces the version-bump rule against the latest published version,
/// and finally stores a deep snapshot in the index.
///
/// # Errors
///
/// Any [`PublishError`]; the index is untouched unless the result is `Ok`.
pub fn publish(package: &Package, index: &mut Index) -> Result<(), PublishError> {
    package.validate()?;
    check_lock(package, index)?;
    check_external_targets(package, index)?;

    match index.latest(&package.info.name) {
        Err(IndexError::PackageNotFound { .. }) => {
            if package.info.version != Version::INITIAL {
                return Err(PublishError::InvalidInitialVersion {
                    name: package.info.name.clone(),
                    actual: package.info.version,
                });
            }
        }
        Err(other) => return Err(other.into()),
        Ok(latest) => {
            let diff = diff_packages(latest, package);
            let required = diff.required_bump(latest.info.version);
            if package.info.version != required {
                return Err(PublishError::VersionBumpRequired {
                    required,
                    actual: package.info.version,
                });
            }
        }
    }

    index.insert(package.clone())?;
    tracing::debug!(
        package = %package.info.name,
        version = %package.info.version,
        index = %index.name,
        "published"
    );
    Ok(())
}

/// Every requirement must be locked, every lock entry must exist in the
/// index, and every lock must satisfy its requirement (same major, or an
/// admissible major-crossing over the members this package uses).
fn check_lock(package: &Package, index: &Index) -> Result<(), PublishError> {
    let used = package.external_references();
    for req in package.requirements.values() {
        let Some(dep) = package.deps.get(&req.name) else {
            return Err(PublishError::NotLocked {
                name: package.info.name.clone(),
            });
        };
        if !version_qualifies(index, req, dep.version, used.get(&req.name)) {
            return Err(PublishError::LockInconsistent {
                dep: req.name.clone(),
                locked: dep.version,
                required: req.min_version,
            });
        }
    }
    for dep in package.deps.values() {
        index.get_version(&dep.name, dep.version)?;
    }
    Ok(())
}

/// Resolve every cross-package `Ref` and import against the locked
/// dependency snapshots.
fn check_external_targets(package: &Package, index: &Index) -> Result<(), PublishError> {
    for (dep_name, targets) in package.external_ref_targets() {
        let dep = locked_version(package, &dep_name)?;
        let dep_pkg = index.get_version(&dep_name, dep)?;
        for target in targets {
            match dep_pkg.member_at(&target) {
                None => {
                    return Err(PublishError::UnresolvedExternal {
                        path: package.info.name.clone(),
                        target,
                        dep: dep_name,
                        version: dep,
                    })
                }
                Some(member) if !member.is_data() => {
                    return Err(PublishError::ExternalRefNotData {
                        path: package.info.name.clone(),
                        target,
                        dep: dep_name,
                        version: dep,
                    })
                }
                Some(_) => {}
            }
        }
    }
    for (dep_name, targets) in package.import_targets() {
        let dep = locked_version(package, &dep_name)?;
        let dep_pkg = index.get_version(&dep_name, dep)?;
        for target in targets {
            if dep_pkg.member_at(&target).is_none() {
                return Err(PublishError::UnresolvedExternal {
                    path: package.info.name.clone(),
                    target,
                    dep: dep_name,
                    version: dep,
                });
            }
        }
    }
    Ok(())
}

fn locked_version(package: &Package, dep_name: &str) -> Result<Version, PublishError> {
    package
        .deps
        .get(dep_name)
        .map(|dep| dep.version)
        .ok_or_else(|| PublishError::NotLocked {
            name: package.info.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{Dep, DepReq, Import, Member, Ty};

    fn euler() -> Package {
        let mut pkg = Package::new("euler", "Useful math stuff");
        pkg.root_module
            .insert_member("compute", Member::func(vec![("x", Ty::INT)], Ty::INT));
        pkg
    }

    #[test]
    fn first_publish_requires_initial_version() {
        let mut index = Index::new("primary");
        let mut pkg = euler();
        pkg.info.version = Version::new(2, 0);

        let err = publish(&pkg, &mut index).unwrap_err();
        assert!(matches!(err, PublishError::InvalidInitialVersion { .. }));

        pkg.info.version = Version::INITIAL;
        publish(&pkg, &mut index).unwrap();
        assert!(index.contains_version("euler", Version::INITIAL));
    }

    #[test]
    fn republishing_same_version_is_rejected() {
        let mut index = Index::new("primary");
        publish(&euler(), &mut index).unwrap();

        let err = publish(&euler(), &mut index).unwrap_err();
        match err {
            // An unchanged interface demands a minor bump before the insert
            // is ever attempted.
            PublishError::VersionBumpRequired { required, actual } => {
                assert_eq!(required, Version::new(1, 1));
                assert_eq!(actual, Version::new(1, 0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_insert_surfaces_already_published() {
        let mut index = Index::new("primary");
        index.insert(euler()).unwrap();
        let err = index.insert(euler()).unwrap_err();
        assert!(matches!(err, IndexError::AlreadyPublished { .. }));
    }

    #[test]
    fn breaking_change_demands_major_bump() {
        let mut index = Index::new("primary");
        publish(&euler(), &mut index).unwrap();

        // Added parameter: breaking.
        let mut next = euler();
        next.root_module.insert_member(
            "compute",
            Member::func(vec![("x", Ty::INT), ("y", Ty::INT)], Ty::INT),
        );

        // Unbumped publish fails and names the required version.
        let err = publish(&next, &mut index).unwrap_err();
        match err {
            PublishError::VersionBumpRequired { required, actual } => {
                assert_eq!(required, Version::new(2, 0));
                assert_eq!(actual, Version::new(1, 0));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // A minor bump is not enough either.
        next.info.version = Version::new(1, 1);
        assert!(matches!(
            publish(&next, &mut index),
            Err(PublishError::VersionBumpRequired { .. })
        ));

        next.info.version = Version::new(2, 0);
        publish(&next, &mut index).unwrap();
        assert_eq!(index.latest("euler").unwrap().version(), Version::new(2, 0));
    }

    #[test]
    fn non_breaking_change_demands_minor_bump() {
        let mut index = Index::new("primary");
        publish(&euler(), &mut index).unwrap();

        let mut next = euler();
        next.root_module
            .insert_member("pi", Member::constant(Ty::FLOAT));

        next.info.version = Version::new(2, 0);
        assert!(matches!(
            publish(&next, &mut index),
            Err(PublishError::VersionBumpRequired { .. })
        ));

        next.info.version = Version::new(1, 1);
        publish(&next, &mut index).unwrap();
    }

    #[test]
    fn published_versions_are_strictly_increasing() {
        let mut index = Index::new("primary");
        let mut pkg = euler();
        publish(&pkg, &mut index).unwrap();

        for _ in 0..3 {
            let mut next = index.latest("euler").unwrap().clone();
            next.root_module.insert_member(
                &format!("extra_{}", next.version().minor),
                Member::constant(Ty::INT),
            );
            next.info.version = next.version().bump_minor();
            publish(&next, &mut index).unwrap();
            pkg = next;
        }

        let versions: Vec<Version> = index.get("euler").unwrap().keys().copied().collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
        assert_eq!(index.latest("euler").unwrap().version(), pkg.version());
    }

    #[test]
    fn unlocked_requirement_blocks_publish() {
        let mut index = Index::new("primary");
        let mut lib = Package::new("lib", "A library");
        lib.root_module
            .insert_member("f", Member::func(vec![], Ty::INT));
        publish(&lib, &mut index).unwrap();

        let mut app = Package::new("app", "An app");
        app.require(DepReq::new("lib", Version::new(1, 0)));
        let err = publish(&app, &mut index).unwrap_err();
        assert!(matches!(err, PublishError::NotLocked { .. }));

        app.deps
            .insert("lib".to_string(), Dep::new("lib", Version::new(1, 0)));
        publish(&app, &mut index).unwrap();
    }

    #[test]
    fn inconsistent_lock_blocks_publish() {
        let mut index = Index::new("primary");
        let mut lib = Package::new("lib", "A library");
        lib.root_module
            .insert_member("f", Member::func(vec![], Ty::INT));
        publish(&lib, &mut index).unwrap();

        let mut app = Package::new("app", "An app");
        app.require(DepReq::new("lib", Version::new(1, 2)));
        app.deps
            .insert("lib".to_string(), Dep::new("lib", Version::new(1, 0)));
        let err = publish(&app, &mut index).unwrap_err();
        assert!(matches!(err, PublishError::LockInconsistent { .. }));
    }

    #[test]
    fn dangling_external_ref_blocks_publish() {
        let mut index = Index::new("primary");
        let mut geo = Package::new("geo", "Geometry");
        geo.root_module.insert_member(
            "Point",
            Member::structure(vec![("x", Ty::INT), ("y", Ty::INT)]),
        );
        publish(&geo, &mut index).unwrap();

        let mut app = Package::new("app", "An app");
        app.require(DepReq::new("geo", Version::new(1, 0)));
        app.deps
            .insert("geo".to_string(), Dep::new("geo", Version::new(1, 0)));
        app.root_module.insert_member(
            "run",
            Member::func(vec![("v", Ty::reference("geo.Vector"))], Ty::NULL),
        );

        let err = publish(&app, &mut index).unwrap_err();
        assert!(matches!(err, PublishError::UnresolvedExternal { .. }));
    }

    #[test]
    fn dangling_import_blocks_publish() {
        let mut index = Index::new("primary");
        let mut lib = Package::new("lib", "A library");
        lib.root_module
            .insert_member("f", Member::func(vec![], Ty::INT));
        publish(&lib, &mut index).unwrap();

        let mut app = Package::new("app", "An app");
        app.require(DepReq::new("lib", Version::new(1, 0)));
        app.deps
            .insert("lib".to_string(), Dep::new("lib", Version::new(1, 0)));
        app.root_module
            .imports
            .push(Import::new("lib", vec![], vec!["missing"]));

        let err = publish(&app, &mut index).unwrap_err();
        assert!(matches!(err, PublishError::UnresolvedExternal { .. }));
    }
}

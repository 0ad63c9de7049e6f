//! The published-package index.
//!
//! The index is the sole durable artifact of the system: a map from
//! package name to every version ever published under that name. Stored
//! packages are deep snapshots; `insert` takes ownership and nothing ever
//! hands out mutable access, so a published `(name, version)` pair always
//! reads back exactly as inserted.

use crate::interface::Package;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// The name an index carries unless the caller chooses another.
pub const DEFAULT_INDEX_NAME: &str = "primary";

/// Errors that can occur during index operations.
#[derive(Error, Debug)]
pub enum IndexError {
    /// No version of the package has ever been published.
    #[error("package '{name}' not found in index")]
    PackageNotFound { name: String },

    /// The package exists but not at the requested version.
    #[error("package '{name}' has no published version {version}")]
    VersionNotFound { name: String, version: Version },

    /// The package exists but has no version with the requested major.
    #[error("package '{name}' has no published {major}.x version")]
    MajorNotFound { name: String, major: u32 },

    /// The exact `(name, version)` pair is already present.
    #[error("package '{name}' version {version} is already published")]
    AlreadyPublished { name: String, version: Version },
}

/// A store of published package versions, keyed by name then version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    /// Human-readable index name, shown in listings and error context.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    packages: BTreeMap<String, BTreeMap<Version, Package>>,
}

fn default_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

impl Default for Index {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

impl Index {
    /// Create an empty index.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: BTreeMap::new(),
        }
    }

    /// Store a deep snapshot of `package` under `(name, version)`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::AlreadyPublished`] when the pair is present.
    pub fn insert(&mut self, package: Package) -> Result<(), IndexError> {
        let name = package.info.name.clone();
        let version = package.info.version;
        let versions = self.packages.entry(name.clone()).or_default();
        if versions.contains_key(&version) {
            return Err(IndexError::AlreadyPublished { name, version });
        }
        versions.insert(version, package);
        Ok(())
    }

    /// Whether any version of `name` has been published.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Whether the exact `(name, version)` pair has been published.
    #[must_use]
    pub fn contains_version(&self, name: &str, version: Version) -> bool {
        self.packages
            .get(name)
            .is_some_and(|versions| versions.contains_key(&version))
    }

    /// All published versions of `name`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PackageNotFound`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<&BTreeMap<Version, Package>, IndexError> {
        self.packages
            .get(name)
            .ok_or_else(|| IndexError::PackageNotFound {
                name: name.to_string(),
            })
    }

    /// The published package at exactly `(name, version)`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PackageNotFound`] or
    /// [`IndexError::VersionNotFound`].
    pub fn get_version(&self, name: &str, version: Version) -> Result<&Package, IndexError> {
        self.get(name)?
            .get(&version)
            .ok_or_else(|| IndexError::VersionNotFound {
                name: name.to_string(),
                version,
            })
    }

    /// The highest published version of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PackageNotFound`] for an unknown name.
    pub fn latest(&self, name: &str) -> Result<&Package, IndexError> {
        self.get(name)?
            .values()
            .next_back()
            .ok_or_else(|| IndexError::PackageNotFound {
                name: name.to_string(),
            })
    }

    /// The highest published version of `name` with the given major.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PackageNotFound`] or
    /// [`IndexError::MajorNotFound`].
    pub fn latest_major(&self, name: &str, major: u32) -> Result<&Package, IndexError> {
        self.get(name)?
            .range(Version::new(major, 0)..=Version::new(major, u32::MAX))
            .next_back()
            .map(|(_, package)| package)
            .ok_or_else(|| IndexError::MajorNotFound {
                name: name.to_string(),
                major,
            })
    }

    /// All published versions of `name`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PackageNotFound`] for an unknown name.
    pub fn versions_desc(&self, name: &str) -> Result<Vec<&Package>, IndexError> {
        Ok(self.get(name)?.values().rev().collect())
    }

    /// Iterate over every package name with its published versions.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<Version, Package>)> {
        self.packages.iter()
    }

    /// Number of distinct package names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{Member, Ty};

    fn lib_at(version: Version) -> Package {
        let mut pkg = Package::new("lib", "A library");
        pkg.info.version = version;
        pkg.root_module
            .insert_member("f", Member::func(vec![], Ty::INT));
        pkg
    }

    #[test]
    fn insert_and_get() {
        let mut index = Index::new("primary");
        index.insert(lib_at(Version::new(1, 0))).unwrap();

        assert!(index.contains("lib"));
        assert!(index.contains_version("lib", Version::new(1, 0)));
        assert_eq!(
            index
                .get_version("lib", Version::new(1, 0))
                .unwrap()
                .version(),
            Version::new(1, 0)
        );
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut index = Index::new("primary");
        index.insert(lib_at(Version::new(1, 0))).unwrap();
        let err = index.insert(lib_at(Version::new(1, 0))).unwrap_err();
        assert!(matches!(err, IndexError::AlreadyPublished { .. }));
    }

    #[test]
    fn latest_picks_highest_version() {
        let mut index = Index::new("primary");
        index.insert(lib_at(Version::new(1, 0))).unwrap();
        index.insert(lib_at(Version::new(2, 0))).unwrap();
        index.insert(lib_at(Version::new(1, 4))).unwrap();

        assert_eq!(index.latest("lib").unwrap().version(), Version::new(2, 0));
    }

    #[test]
    fn latest_major_stays_within_major() {
        let mut index = Index::new("primary");
        index.insert(lib_at(Version::new(1, 0))).unwrap();
        index.insert(lib_at(Version::new(1, 7))).unwrap();
        index.insert(lib_at(Version::new(2, 3))).unwrap();

        assert_eq!(
            index.latest_major("lib", 1).unwrap().version(),
            Version::new(1, 7)
        );
        assert_eq!(
            index.latest_major("lib", 2).unwrap().version(),
            Version::new(2, 3)
        );
        assert!(matches!(
            index.latest_major("lib", 3),
            Err(IndexError::MajorNotFound { major: 3, .. })
        ));
    }

    #[test]
    fn versions_desc_is_newest_first() {
        let mut index = Index::new("primary");
        index.insert(lib_at(Version::new(1, 0))).unwrap();
        index.insert(lib_at(Version::new(1, 2))).unwrap();
        index.insert(lib_at(Version::new(2, 0))).unwrap();

        let versions: Vec<Version> = index
            .versions_desc("lib")
            .unwrap()
            .iter()
            .map(|p| p.version())
            .collect();
        assert_eq!(
            versions,
            vec![Version::new(2, 0), Version::new(1, 2), Version::new(1, 0)]
        );
    }

    #[test]
    fn unknown_package_is_not_found() {
        let index = Index::new("primary");
        assert!(matches!(
            index.latest("ghost"),
            Err(IndexError::PackageNotFound { .. })
        ));
        assert!(matches!(
            index.get_version("ghost", Version::new(1, 0)),
            Err(IndexError::PackageNotFound { .. })
        ));
    }

    #[test]
    fn inserted_snapshot_is_isolated_from_the_draft() {
        let mut index = Index::new("primary");
        let mut draft = lib_at(Version::new(1, 0));
        index.insert(draft.clone()).unwrap();

        // Mutate the draft after publishing; the stored snapshot must not move.
        draft.root_module.remove_member("f").unwrap();
        let stored = index.get_version("lib", Version::new(1, 0)).unwrap();
        assert!(stored.member_at("lib.f").is_some());
    }
}

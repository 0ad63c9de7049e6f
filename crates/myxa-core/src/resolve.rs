//! Dependency resolution against a package index.
//!
//! The resolver walks declared requirements in package-name order, tries
//! index versions from newest to oldest, and backtracks on conflict. A
//! candidate that crosses a major-version boundary is admitted only when
//! none of the members the dependers actually use were broken between the
//! requirer's stated version and the candidate (selective major-crossing).
//!
//! Given the same index, resolution is deterministic: the work list is
//! name-ordered, candidates are version-ordered, and all bookkeeping lives
//! in ordered maps.

use crate::diff::diff_packages;
use crate::index::Index;
use crate::interface::{Dep, DepReq, Package};
use crate::version::Version;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur during dependency resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A requirement names a package absent from the index.
    #[error("unknown dependency '{name}'")]
    UnknownDependency { name: String },

    /// The dependency graph reaches back into a package already on the path.
    #[error("dependency cycle detected: {}", .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    /// No assignment of versions satisfies every requirement.
    #[error("unable to resolve '{package}': {reason}")]
    Unresolvable { package: String, reason: String },
}

/// Member paths in use per package name.
type UsedMembers = BTreeMap<String, BTreeSet<String>>;

/// One entry of the resolver's work list.
#[derive(Debug, Clone)]
struct Requirement {
    name: String,
    min_version: Version,
    requirer: String,
}

/// The last dead end hit during the search, reported on failure.
#[derive(Debug, Clone)]
struct Conflict {
    package: String,
    reason: String,
}

/// Whether `candidate` satisfies a requirer that declared `req`, given the
/// member paths of `req.name` the depending closure uses.
///
/// Same-major candidates qualify when they are at least the stated minimum.
/// A higher-major candidate qualifies only when the restricted diff between
/// the requirer's baseline and the candidate breaks none of `used` (closed
/// over the `Ref`s in the baseline's definitions). The baseline is the
/// stated version if indexed, else the highest same-major version below the
/// candidate; with no same-major version published the crossing cannot be
/// justified and the candidate is rejected.
#[must_use]
pub fn version_qualifies(
    index: &Index,
    req: &DepReq,
    candidate: Version,
    used: Option<&BTreeSet<String>>,
) -> bool {
    if candidate.major == req.min_version.major {
        return candidate >= req.min_version;
    }
    if candidate.major < req.min_version.major {
        return false;
    }

    let Ok(candidate_pkg) = index.get_version(&req.name, candidate) else {
        return false;
    };
    let baseline = match index.get_version(&req.name, req.min_version) {
        Ok(pkg) => pkg,
        Err(_) => {
            let Ok(versions) = index.get(&req.name) else {
                return false;
            };
            let same_major = versions
                .range(..=Version::new(req.min_version.major, u32::MAX))
                .filter(|(v, _)| v.major == req.min_version.major)
                .next_back();
            match same_major {
                Some((_, pkg)) => pkg,
                None => return false,
            }
        }
    };

    let used = match used {
        Some(paths) if !paths.is_empty() => paths,
        // Nothing used means nothing can break.
        _ => return true,
    };
    let closure = baseline.ref_closure(used);
    let diff = diff_packages(baseline, candidate_pkg);
    let admissible = !diff.is_breaking_for(&closure);
    tracing::trace!(
        package = %req.name,
        baseline = %baseline.version(),
        candidate = %candidate,
        admissible,
        "major-crossing check"
    );
    admissible
}

/// Dependency resolver for myxa packages.
#[derive(Debug)]
pub struct Resolver<'a> {
    index: &'a Index,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// Resolve `package`'s requirements to a concrete lock covering every
    /// transitive requirement.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownDependency`] when a required package
    /// is absent from the index, [`ResolveError::Cycle`] when the graph
    /// reaches back into `package` or into itself, and
    /// [`ResolveError::Unresolvable`] when no consistent assignment exists.
    pub fn resolve(&self, package: &Package) -> Result<BTreeMap<String, Dep>, ResolveError> {
        let mut used = UsedMembers::new();
        merge_references(&mut used, package);

        let mut work: Vec<Requirement> = Vec::new();
        for req in package.requirements.values() {
            push_sorted(
                &mut work,
                Requirement {
                    name: req.name.clone(),
                    min_version: req.min_version,
                    requirer: package.info.name.clone(),
                },
            );
        }

        let mut conflict: Option<Conflict> = None;
        let solution = self.solve(package, &work, &BTreeMap::new(), &used, &mut conflict)?;

        match solution {
            Some(assignment) => {
                self.check_acyclic(package, &assignment)?;
                tracing::debug!(
                    package = %package.info.name,
                    deps = assignment.len(),
                    "resolved"
                );
                Ok(assignment
                    .into_iter()
                    .map(|(name, version)| (name.clone(), Dep { name, version }))
                    .collect())
            }
            None => {
                let conflict = conflict.unwrap_or_else(|| Conflict {
                    package: package.info.name.clone(),
                    reason: "no valid configuration found".to_string(),
                });
                Err(ResolveError::Unresolvable {
                    package: conflict.package,
                    reason: conflict.reason,
                })
            }
        }
    }

    /// Resolve and write the lock into `package`.
    ///
    /// # Errors
    ///
    /// Propagates everything [`Resolver::resolve`] can return.
    pub fn lock(&self, package: &mut Package) -> Result<(), ResolveError> {
        let deps = self.resolve(package)?;
        package.deps = deps;
        Ok(())
    }

    fn solve(
        &self,
        root: &Package,
        work: &[Requirement],
        assignment: &BTreeMap<String, Version>,
        used: &UsedMembers,
        conflict: &mut Option<Conflict>,
    ) -> Result<Option<BTreeMap<String, Version>>, ResolveError> {
        let Some((req, rest)) = work.split_first() else {
            // Complete assignment: re-verify every requirement against the
            // final usage map, since usage discovered late in the search
            // must not leak an inadmissible early pick.
            if self.verify(root, assignment, used, conflict) {
                return Ok(Some(assignment.clone()));
            }
            return Ok(None);
        };

        let dep_req = DepReq::new(req.name.clone(), req.min_version);

        if let Some(&version) = assignment.get(&req.name) {
            if version_qualifies(self.index, &dep_req, version, used.get(&req.name)) {
                return self.solve(root, rest, assignment, used, conflict);
            }
            *conflict = Some(Conflict {
                package: req.name.clone(),
                reason: format!(
                    "selected version {version} does not satisfy {} required by '{}'",
                    dep_req, req.requirer
                ),
            });
            return Ok(None);
        }

        let candidates = self.index.versions_desc(&req.name).map_err(|_| {
            ResolveError::UnknownDependency {
                name: req.name.clone(),
            }
        })?;

        let mut admitted_any = false;
        for candidate in candidates {
            let version = candidate.version();
            if !version_qualifies(self.index, &dep_req, version, used.get(&req.name)) {
                continue;
            }
            admitted_any = true;
            tracing::debug!(package = %req.name, %version, "trying candidate");

            let mut next_work = rest.to_vec();
            for sub in candidate.requirements.values() {
                if sub.name == root.info.name {
                    return Err(ResolveError::Cycle {
                        cycle: vec![
                            root.info.name.clone(),
                            req.name.clone(),
                            root.info.name.clone(),
                        ],
                    });
                }
                push_sorted(
                    &mut next_work,
                    Requirement {
                        name: sub.name.clone(),
                        min_version: sub.min_version,
                        requirer: req.name.clone(),
                    },
                );
            }

            let mut next_assignment = assignment.clone();
            next_assignment.insert(req.name.clone(), version);
            let mut next_used = used.clone();
            merge_references(&mut next_used, candidate);

            if let Some(solution) =
                self.solve(root, &next_work, &next_assignment, &next_used, conflict)?
            {
                return Ok(Some(solution));
            }
        }

        if !admitted_any {
            *conflict = Some(Conflict {
                package: req.name.clone(),
                reason: format!(
                    "no published version satisfies {} required by '{}'",
                    dep_req, req.requirer
                ),
            });
        }
        Ok(None)
    }

    /// Check every requirement (the root's and each assigned package's)
    /// against the final assignment and usage map.
    fn verify(
        &self,
        root: &Package,
        assignment: &BTreeMap<String, Version>,
        used: &UsedMembers,
        conflict: &mut Option<Conflict>,
    ) -> bool {
        let mut requirements: Vec<(&DepReq, &str)> = root
            .requirements
            .values()
            .map(|req| (req, root.info.name.as_str()))
            .collect();
        for (name, &version) in assignment {
            if let Ok(pkg) = self.index.get_version(name, version) {
                for req in pkg.requirements.values() {
                    requirements.push((req, name.as_str()));
                }
            }
        }

        for (req, requirer) in requirements {
            let Some(&version) = assignment.get(&req.name) else {
                *conflict = Some(Conflict {
                    package: req.name.clone(),
                    reason: format!("requirement {req} of '{requirer}' was never assigned"),
                });
                return false;
            };
            if !version_qualifies(self.index, req, version, used.get(&req.name)) {
                *conflict = Some(Conflict {
                    package: req.name.clone(),
                    reason: format!(
                        "selected version {version} does not satisfy {req} required by '{requirer}'"
                    ),
                });
                return false;
            }
        }
        true
    }

    /// Reject assignments whose requirement edges form a cycle.
    fn check_acyclic(
        &self,
        root: &Package,
        assignment: &BTreeMap<String, Version>,
    ) -> Result<(), ResolveError> {
        let mut visiting: Vec<String> = Vec::new();
        let mut done: BTreeSet<String> = BTreeSet::new();
        for name in root.requirements.keys() {
            self.walk_acyclic(name, assignment, &mut visiting, &mut done)?;
        }
        Ok(())
    }

    fn walk_acyclic(
        &self,
        name: &str,
        assignment: &BTreeMap<String, Version>,
        visiting: &mut Vec<String>,
        done: &mut BTreeSet<String>,
    ) -> Result<(), ResolveError> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(at) = visiting.iter().position(|n| n == name) {
            let mut cycle: Vec<String> = visiting[at..].to_vec();
            cycle.push(name.to_string());
            return Err(ResolveError::Cycle { cycle });
        }
        visiting.push(name.to_string());
        if let Some(&version) = assignment.get(name) {
            if let Ok(pkg) = self.index.get_version(name, version) {
                for sub in pkg.requirements.keys() {
                    self.walk_acyclic(sub, assignment, visiting, done)?;
                }
            }
        }
        visiting.pop();
        done.insert(name.to_string());
        Ok(())
    }
}

/// Fold a package's external references into the usage map.
fn merge_references(used: &mut UsedMembers, package: &Package) {
    for (name, paths) in package.external_references() {
        used.entry(name).or_default().extend(paths);
    }
}

/// Keep the work list ordered by package name (then requirer, for
/// determinism among same-name entries).
fn push_sorted(work: &mut Vec<Requirement>, req: Requirement) {
    let at = work
        .binary_search_by(|probe| {
            (probe.name.as_str(), probe.requirer.as_str())
                .cmp(&(req.name.as_str(), req.requirer.as_str()))
        })
        .unwrap_or_else(|at| at);
    work.insert(at, req);
}

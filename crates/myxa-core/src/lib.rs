//! Structural-compatibility package management.
//!
//! This crate provides:
//! - The recursive interface model for packages, modules, and members
//! - Structural diffing with breaking/non-breaking classification
//! - An index of published package versions (deep, immutable snapshots)
//! - Backtracking dependency resolution with selective major-crossing
//! - The publish gate tying detected breakage to required version bumps
//! - Per-dependency update planning
//!
//! The core is pure and synchronous: it never touches the filesystem, the
//! network, or the environment. Callers hand it an [`Index`] and decide
//! when to persist it.

mod diff;
mod index;
mod interface;
mod publish;
mod resolve;
mod update;
mod version;

pub use diff::{diff_packages, Change, ChangeKind, Diff, Severity};
pub use index::{Index, IndexError, DEFAULT_INDEX_NAME};
pub use interface::{
    Dep, DepReq, Import, InterfaceError, Member, MemberKind, Module, Package, PackageInfo, Param,
    Prim, Ty,
};
pub use publish::{publish, PublishError};
pub use resolve::{version_qualifies, ResolveError, Resolver};
pub use update::{apply_update, plan_update};
pub use version::{Version, VersionError};

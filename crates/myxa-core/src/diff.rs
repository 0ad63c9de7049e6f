//! Structural diffing of package interfaces.
//!
//! The engine walks two snapshots of a package in lockstep, descending
//! modules and then members, and classifies every difference as breaking
//! or non-breaking. Output order is part of the contract: changes are
//! sorted by their dotted path, so rendered diffs are stable across runs.

use crate::interface::{Member, MemberKind, Module, Package, Param, Ty};
use crate::version::Version;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Whether a change can break a consumer of the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Breaking,
    NonBreaking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breaking => write!(f, "breaking"),
            Self::NonBreaking => write!(f, "non-breaking"),
        }
    }
}

/// A single classified change between two versions of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Full dotted path of the changed element; may extend below a member
    /// (field, variant, or parameter name).
    pub path: String,
    /// Absolute path of the member (or module, or dependency entry) that
    /// owns the change.
    pub member: String,
    pub kind: ChangeKind,
}

impl Change {
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Every change the diff engine can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    ModuleAdded,
    ModuleRemoved,
    MemberAdded { kind: MemberKind },
    MemberRemoved { kind: MemberKind },
    MemberKindChanged { old: MemberKind, new: MemberKind },
    ParamAdded { name: String },
    ParamRemoved { name: String },
    ParamsReordered,
    ParamTypeChanged { old: String, new: String },
    ReturnTypeChanged { old: String, new: String },
    ConstTypeChanged { old: String, new: String },
    FieldAdded { name: String },
    FieldRemoved { name: String },
    FieldTypeChanged { old: String, new: String },
    VariantAdded { name: String },
    VariantRemoved { name: String },
    VariantPayloadChanged { old: Option<String>, new: Option<String> },
    DepAdded { name: String },
    DepRemoved { name: String },
    DepMajorChanged { old: Version, new: Version },
    DepMinorBumped { old: Version, new: Version },
    DepMinorLowered { old: Version, new: Version },
}

impl ChangeKind {
    /// The classification table. Deliberately exhaustive so a new change
    /// kind cannot ship without a severity decision.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            // Growing the surface without touching existing members is safe.
            ChangeKind::ModuleAdded
            | ChangeKind::MemberAdded { .. }
            | ChangeKind::DepMinorBumped { .. } => Severity::NonBreaking,

            // Everything else can invalidate an existing use. Enum variant
            // addition is here on purpose: consumers may match exhaustively.
            ChangeKind::ModuleRemoved
            | ChangeKind::MemberRemoved { .. }
            | ChangeKind::MemberKindChanged { .. }
            | ChangeKind::ParamAdded { .. }
            | ChangeKind::ParamRemoved { .. }
            | ChangeKind::ParamsReordered
            | ChangeKind::ParamTypeChanged { .. }
            | ChangeKind::ReturnTypeChanged { .. }
            | ChangeKind::ConstTypeChanged { .. }
            | ChangeKind::FieldAdded { .. }
            | ChangeKind::FieldRemoved { .. }
            | ChangeKind::FieldTypeChanged { .. }
            | ChangeKind::VariantAdded { .. }
            | ChangeKind::VariantRemoved { .. }
            | ChangeKind::VariantPayloadChanged { .. }
            | ChangeKind::DepAdded { .. }
            | ChangeKind::DepRemoved { .. }
            | ChangeKind::DepMajorChanged { .. }
            | ChangeKind::DepMinorLowered { .. } => Severity::Breaking,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::ModuleAdded => write!(f, "module added"),
            ChangeKind::ModuleRemoved => write!(f, "module removed"),
            ChangeKind::MemberAdded { kind } => write!(f, "{kind} added"),
            ChangeKind::MemberRemoved { kind } => write!(f, "{kind} removed"),
            ChangeKind::MemberKindChanged { old, new } => {
                write!(f, "changed from {old} to {new}")
            }
            ChangeKind::ParamAdded { name } => write!(f, "parameter '{name}' added"),
            ChangeKind::ParamRemoved { name } => write!(f, "parameter '{name}' removed"),
            ChangeKind::ParamsReordered => write!(f, "parameters reordered"),
            ChangeKind::ParamTypeChanged { old, new } => {
                write!(f, "parameter type changed from {old} to {new}")
            }
            ChangeKind::ReturnTypeChanged { old, new } => {
                write!(f, "return type changed from {old} to {new}")
            }
            ChangeKind::ConstTypeChanged { old, new } => {
                write!(f, "constant type changed from {old} to {new}")
            }
            ChangeKind::FieldAdded { name } => write!(f, "field '{name}' added"),
            ChangeKind::FieldRemoved { name } => write!(f, "field '{name}' removed"),
            ChangeKind::FieldTypeChanged { old, new } => {
                write!(f, "field type changed from {old} to {new}")
            }
            ChangeKind::VariantAdded { name } => write!(f, "variant '{name}' added"),
            ChangeKind::VariantRemoved { name } => write!(f, "variant '{name}' removed"),
            ChangeKind::VariantPayloadChanged { old, new } => write!(
                f,
                "variant payload changed from {} to {}",
                old.as_deref().unwrap_or("none"),
                new.as_deref().unwrap_or("none"),
            ),
            ChangeKind::DepAdded { name } => write!(f, "dependency '{name}' added"),
            ChangeKind::DepRemoved { name } => write!(f, "dependency '{name}' removed"),
            ChangeKind::DepMajorChanged { old, new } => {
                write!(f, "dependency major changed from {old} to {new}")
            }
            ChangeKind::DepMinorBumped { old, new } => {
                write!(f, "dependency bumped from {old} to {new}")
            }
            ChangeKind::DepMinorLowered { old, new } => {
                write!(f, "dependency lowered from {old} to {new}")
            }
        }
    }
}

/// An ordered list of classified changes between two package snapshots.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    changes: Vec<Change>,
}

impl Diff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// True when any change is classified breaking.
    #[must_use]
    pub fn is_breaking(&self) -> bool {
        self.changes
            .iter()
            .any(|change| change.severity() == Severity::Breaking)
    }

    /// True when any breaking change is owned by one of `members`.
    ///
    /// This is the restricted query behind selective major-crossing:
    /// breakage outside the member paths a depender actually uses does not
    /// disqualify a candidate version.
    #[must_use]
    pub fn is_breaking_for(&self, members: &BTreeSet<String>) -> bool {
        self.changes.iter().any(|change| {
            change.severity() == Severity::Breaking && members.contains(&change.member)
        })
    }

    /// The version the next publish must carry given these changes.
    #[must_use]
    pub fn required_bump(&self, old: Version) -> Version {
        if self.is_breaking() {
            old.bump_major()
        } else {
            old.bump_minor()
        }
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Compute the structural diff between two snapshots of a package.
///
/// `old` is typically the latest indexed version and `new` the working
/// draft. The walk is symmetric in shape: every element present on either
/// side is visited once.
#[must_use]
pub fn diff_packages(old: &Package, new: &Package) -> Diff {
    let mut walker = Walker::default();
    let root = old.info.name.clone();
    walker.diff_module(&old.root_module, &new.root_module, &root);
    walker.diff_deps(old, new, &root);
    walker.changes.sort_by(|a, b| a.path.cmp(&b.path));
    Diff {
        changes: walker.changes,
    }
}

#[derive(Default)]
struct Walker {
    changes: Vec<Change>,
}

impl Walker {
    fn push(&mut self, path: &str, member: &str, kind: ChangeKind) {
        self.changes.push(Change {
            path: path.to_string(),
            member: member.to_string(),
            kind,
        });
    }

    /// Record every member and module beneath `module` as added/removed.
    fn flood_module(&mut self, module: &Module, path: &str, removed: bool) {
        for (name, member) in &module.members {
            let member_path = format!("{path}.{name}");
            let kind = if removed {
                ChangeKind::MemberRemoved {
                    kind: member.kind(),
                }
            } else {
                ChangeKind::MemberAdded {
                    kind: member.kind(),
                }
            };
            self.push(&member_path, &member_path, kind);
        }
        for (name, child) in &module.modules {
            let child_path = format!("{path}.{name}");
            let kind = if removed {
                ChangeKind::ModuleRemoved
            } else {
                ChangeKind::ModuleAdded
            };
            self.push(&child_path, &child_path, kind);
            self.flood_module(child, &child_path, removed);
        }
    }

    fn diff_module(&mut self, old: &Module, new: &Module, path: &str) {
        for (name, old_member) in &old.members {
            let member_path = format!("{path}.{name}");
            match new.members.get(name) {
                None => self.push(
                    &member_path,
                    &member_path,
                    ChangeKind::MemberRemoved {
                        kind: old_member.kind(),
                    },
                ),
                Some(new_member) => self.diff_member(old_member, new_member, &member_path),
            }
        }
        for (name, new_member) in &new.members {
            if !old.members.contains_key(name) {
                let member_path = format!("{path}.{name}");
                self.push(
                    &member_path,
                    &member_path,
                    ChangeKind::MemberAdded {
                        kind: new_member.kind(),
                    },
                );
            }
        }

        for (name, old_child) in &old.modules {
            let child_path = format!("{path}.{name}");
            match new.modules.get(name) {
                None => {
                    self.push(&child_path, &child_path, ChangeKind::ModuleRemoved);
                    self.flood_module(old_child, &child_path, true);
                }
                Some(new_child) => self.diff_module(old_child, new_child, &child_path),
            }
        }
        for (name, new_child) in &new.modules {
            if !old.modules.contains_key(name) {
                let child_path = format!("{path}.{name}");
                self.push(&child_path, &child_path, ChangeKind::ModuleAdded);
                self.flood_module(new_child, &child_path, false);
            }
        }
    }

    fn diff_member(&mut self, old: &Member, new: &Member, path: &str) {
        match (old, new) {
            (
                Member::Func {
                    params: old_params,
                    ret: old_ret,
                },
                Member::Func {
                    params: new_params,
                    ret: new_ret,
                },
            ) => self.diff_func(old_params, old_ret, new_params, new_ret, path),
            (Member::Struct { fields: old_fields }, Member::Struct { fields: new_fields }) => {
                self.diff_struct(old_fields, new_fields, path);
            }
            (
                Member::Enum {
                    variants: old_variants,
                },
                Member::Enum {
                    variants: new_variants,
                },
            ) => self.diff_enum(old_variants, new_variants, path),
            (Member::Const { ty: old_ty }, Member::Const { ty: new_ty }) => {
                if old_ty != new_ty {
                    self.push(
                        path,
                        path,
                        ChangeKind::ConstTypeChanged {
                            old: old_ty.to_string(),
                            new: new_ty.to_string(),
                        },
                    );
                }
            }
            _ => self.push(
                path,
                path,
                ChangeKind::MemberKindChanged {
                    old: old.kind(),
                    new: new.kind(),
                },
            ),
        }
    }

    fn diff_func(
        &mut self,
        old_params: &[Param],
        old_ret: &Ty,
        new_params: &[Param],
        new_ret: &Ty,
        path: &str,
    ) {
        if old_ret != new_ret {
            self.push(
                path,
                path,
                ChangeKind::ReturnTypeChanged {
                    old: old_ret.to_string(),
                    new: new_ret.to_string(),
                },
            );
        }

        for param in old_params {
            let param_path = format!("{path}.{}", param.name);
            match new_params.iter().find(|p| p.name == param.name) {
                None => self.push(
                    &param_path,
                    path,
                    ChangeKind::ParamRemoved {
                        name: param.name.clone(),
                    },
                ),
                Some(new_param) => {
                    if param.ty != new_param.ty {
                        self.push(
                            &param_path,
                            path,
                            ChangeKind::ParamTypeChanged {
                                old: param.ty.to_string(),
                                new: new_param.ty.to_string(),
                            },
                        );
                    }
                }
            }
        }
        for param in new_params {
            if !old_params.iter().any(|p| p.name == param.name) {
                let param_path = format!("{path}.{}", param.name);
                self.push(
                    &param_path,
                    path,
                    ChangeKind::ParamAdded {
                        name: param.name.clone(),
                    },
                );
            }
        }

        // The relative order of surviving parameters must not change.
        let old_order: Vec<&str> = old_params
            .iter()
            .filter(|p| new_params.iter().any(|q| q.name == p.name))
            .map(|p| p.name.as_str())
            .collect();
        let new_order: Vec<&str> = new_params
            .iter()
            .filter(|p| old_params.iter().any(|q| q.name == p.name))
            .map(|p| p.name.as_str())
            .collect();
        if old_order != new_order {
            self.push(path, path, ChangeKind::ParamsReordered);
        }
    }

    fn diff_struct(
        &mut self,
        old_fields: &BTreeMap<String, Ty>,
        new_fields: &BTreeMap<String, Ty>,
        path: &str,
    ) {
        for (name, old_ty) in old_fields {
            let field_path = format!("{path}.{name}");
            match new_fields.get(name) {
                None => self.push(
                    &field_path,
                    path,
                    ChangeKind::FieldRemoved { name: name.clone() },
                ),
                Some(new_ty) => {
                    if old_ty != new_ty {
                        self.push(
                            &field_path,
                            path,
                            ChangeKind::FieldTypeChanged {
                                old: old_ty.to_string(),
                                new: new_ty.to_string(),
                            },
                        );
                    }
                }
            }
        }
        for name in new_fields.keys() {
            if !old_fields.contains_key(name) {
                let field_path = format!("{path}.{name}");
                self.push(
                    &field_path,
                    path,
                    ChangeKind::FieldAdded { name: name.clone() },
                );
            }
        }
    }

    fn diff_enum(
        &mut self,
        old_variants: &BTreeMap<String, Option<Ty>>,
        new_variants: &BTreeMap<String, Option<Ty>>,
        path: &str,
    ) {
        for (name, old_payload) in old_variants {
            let variant_path = format!("{path}.{name}");
            match new_variants.get(name) {
                None => self.push(
                    &variant_path,
                    path,
                    ChangeKind::VariantRemoved { name: name.clone() },
                ),
                Some(new_payload) => {
                    if old_payload != new_payload {
                        self.push(
                            &variant_path,
                            path,
                            ChangeKind::VariantPayloadChanged {
                                old: old_payload.as_ref().map(ToString::to_string),
                                new: new_payload.as_ref().map(ToString::to_string),
                            },
                        );
                    }
                }
            }
        }
        for name in new_variants.keys() {
            if !old_variants.contains_key(name) {
                let variant_path = format!("{path}.{name}");
                self.push(
                    &variant_path,
                    path,
                    ChangeKind::VariantAdded { name: name.clone() },
                );
            }
        }
    }

    fn diff_deps(&mut self, old: &Package, new: &Package, root: &str) {
        for (name, old_dep) in &old.deps {
            let dep_path = format!("{root}.deps.{name}");
            match new.deps.get(name) {
                None => self.push(
                    &dep_path,
                    &dep_path,
                    ChangeKind::DepRemoved { name: name.clone() },
                ),
                Some(new_dep) => {
                    let (old_v, new_v) = (old_dep.version, new_dep.version);
                    if old_v.major != new_v.major {
                        self.push(
                            &dep_path,
                            &dep_path,
                            ChangeKind::DepMajorChanged {
                                old: old_v,
                                new: new_v,
                            },
                        );
                    } else if new_v.minor > old_v.minor {
                        self.push(
                            &dep_path,
                            &dep_path,
                            ChangeKind::DepMinorBumped {
                                old: old_v,
                                new: new_v,
                            },
                        );
                    } else if new_v.minor < old_v.minor {
                        self.push(
                            &dep_path,
                            &dep_path,
                            ChangeKind::DepMinorLowered {
                                old: old_v,
                                new: new_v,
                            },
                        );
                    }
                }
            }
        }
        for name in new.deps.keys() {
            if !old.deps.contains_key(name) {
                let dep_path = format!("{root}.deps.{name}");
                self.push(
                    &dep_path,
                    &dep_path,
                    ChangeKind::DepAdded { name: name.clone() },
                );
            }
        }
    }
}

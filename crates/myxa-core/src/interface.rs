//! The package interface model.
//!
//! A package's interface is the complete typed public surface it exposes:
//! nested modules, their members (functions, structs, enums, constants), and
//! the types those members mention. Interfaces are authored and mutated
//! through this API rather than parsed from a source language.
//!
//! Members are addressed by absolute dotted paths of the form
//! `package.module.path.Member`; a member sitting directly in the root
//! module is addressed as `package.Member`.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Errors produced by interface validation.
#[derive(Error, Debug)]
pub enum InterfaceError {
    /// A package, module, member, or dependency name is not a valid identifier.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A member and a child module share a name within the same module.
    #[error("duplicate name '{name}' in {container}")]
    DuplicateName { container: String, name: String },

    /// A child module's `name` disagrees with the key it is stored under.
    #[error("module named '{found}' is stored under key '{key}'")]
    ModuleNameMismatch { key: String, found: String },

    /// The root module must carry the package's name.
    #[error("root module '{found}' must carry the package name '{package}'")]
    RootModuleName { package: String, found: String },

    /// A dependency entry's `name` disagrees with its map key.
    #[error("dependency entry named '{found}' is stored under key '{key}'")]
    DepNameMismatch { key: String, found: String },

    /// A reference string does not parse as an absolute member path.
    #[error("malformed reference '{name}': {reason}")]
    MalformedRef { name: String, reason: &'static str },

    /// A reference into this package points at nothing.
    #[error("unresolved reference '{target}' in {path}")]
    UnresolvedRef { path: String, target: String },

    /// A reference resolves to a member that is not a struct or enum.
    #[error("reference '{target}' in {path} does not point at a struct or enum")]
    RefNotData { path: String, target: String },

    /// A struct or enum reaches itself through its own package's references.
    #[error("recursive type reference through '{path}'")]
    RecursiveRef { path: String },

    /// A reference or import names a package that is not a declared dependency.
    #[error("'{package}' referenced in {path} is not a declared dependency")]
    UnknownRefPackage { path: String, package: String },

    /// A module imports members of its own package.
    #[error("module {path} imports its own package")]
    SelfImport { path: String },
}

/// A primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prim {
    Int,
    Str,
    Float,
    Bool,
    Null,
}

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "Int",
            Self::Str => "Str",
            Self::Float => "Float",
            Self::Bool => "Bool",
            Self::Null => "Null",
        };
        write!(f, "{name}")
    }
}

/// A type expression.
///
/// Types are compared structurally: containers are equal when their
/// constructors and all type arguments are recursively equal, and two
/// references are equal when their absolute names are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Ty {
    /// A primitive type.
    Prim { name: Prim },
    /// `List<T>`.
    List { arg: Box<Ty> },
    /// `Set<T>`.
    Set { arg: Box<Ty> },
    /// `Dict<K, V>`.
    Dict { key: Box<Ty>, value: Box<Ty> },
    /// `Tuple<T1, ..., Tn>`; arity and element order are significant.
    Tuple { args: Vec<Ty> },
    /// A named reference to a struct or enum, as `package.module.path.Member`.
    Ref { name: String },
}

impl Ty {
    pub const INT: Ty = Ty::Prim { name: Prim::Int };
    pub const STR: Ty = Ty::Prim { name: Prim::Str };
    pub const FLOAT: Ty = Ty::Prim { name: Prim::Float };
    pub const BOOL: Ty = Ty::Prim { name: Prim::Bool };
    pub const NULL: Ty = Ty::Prim { name: Prim::Null };

    /// A `List` of `arg`.
    #[must_use]
    pub fn list(arg: Ty) -> Ty {
        Ty::List { arg: Box::new(arg) }
    }

    /// A `Set` of `arg`.
    #[must_use]
    pub fn set(arg: Ty) -> Ty {
        Ty::Set { arg: Box::new(arg) }
    }

    /// A `Dict` from `key` to `value`.
    #[must_use]
    pub fn dict(key: Ty, value: Ty) -> Ty {
        Ty::Dict {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// A `Tuple` of the given element types.
    #[must_use]
    pub fn tuple(args: Vec<Ty>) -> Ty {
        Ty::Tuple { args }
    }

    /// A named reference to the member at the given absolute path.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Ty {
        Ty::Ref { name: name.into() }
    }

    fn collect_refs<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Ty::Prim { .. } => {}
            Ty::List { arg } | Ty::Set { arg } => arg.collect_refs(out),
            Ty::Dict { key, value } => {
                key.collect_refs(out);
                value.collect_refs(out);
            }
            Ty::Tuple { args } => {
                for arg in args {
                    arg.collect_refs(out);
                }
            }
            Ty::Ref { name } => {
                out.insert(name);
            }
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Prim { name } => write!(f, "{name}"),
            Ty::List { arg } => write!(f, "List<{arg}>"),
            Ty::Set { arg } => write!(f, "Set<{arg}>"),
            Ty::Dict { key, value } => write!(f, "Dict<{key}, {value}>"),
            Ty::Tuple { args } => {
                write!(f, "Tuple<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            Ty::Ref { name } => write!(f, "{name}"),
        }
    }
}

/// A named function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Ty,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A module member. Members carry no name of their own; they are named by
/// the key they are stored under in their module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Member {
    /// A function signature. Parameter order and names are significant.
    Func {
        params: Vec<Param>,
        #[serde(rename = "return")]
        ret: Ty,
    },
    /// A struct with named, typed fields.
    Struct { fields: BTreeMap<String, Ty> },
    /// An enum; each variant may carry one payload type.
    Enum { variants: BTreeMap<String, Option<Ty>> },
    /// A module-level typed constant.
    Const {
        #[serde(rename = "type")]
        ty: Ty,
    },
}

impl Member {
    /// A function member from `(name, type)` parameter pairs.
    #[must_use]
    pub fn func(params: Vec<(&str, Ty)>, ret: Ty) -> Member {
        Member::Func {
            params: params
                .into_iter()
                .map(|(name, ty)| Param::new(name, ty))
                .collect(),
            ret,
        }
    }

    /// A struct member from `(name, type)` field pairs.
    #[must_use]
    pub fn structure(fields: Vec<(&str, Ty)>) -> Member {
        Member::Struct {
            fields: fields
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect(),
        }
    }

    /// An enum member from `(name, payload)` variant pairs.
    #[must_use]
    pub fn enumeration(variants: Vec<(&str, Option<Ty>)>) -> Member {
        Member::Enum {
            variants: variants
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect(),
        }
    }

    /// A typed constant member.
    #[must_use]
    pub fn constant(ty: Ty) -> Member {
        Member::Const { ty }
    }

    /// The kind of this member.
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Func { .. } => MemberKind::Func,
            Member::Struct { .. } => MemberKind::Struct,
            Member::Enum { .. } => MemberKind::Enum,
            Member::Const { .. } => MemberKind::Const,
        }
    }

    /// Whether this member can be the target of a `Ref`.
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self, Member::Struct { .. } | Member::Enum { .. })
    }

    /// Collect every `Ref` name appearing in this member's types.
    pub fn collect_refs<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Member::Func { params, ret } => {
                for param in params {
                    param.ty.collect_refs(out);
                }
                ret.collect_refs(out);
            }
            Member::Struct { fields } => {
                for ty in fields.values() {
                    ty.collect_refs(out);
                }
            }
            Member::Enum { variants } => {
                for ty in variants.values().flatten() {
                    ty.collect_refs(out);
                }
            }
            Member::Const { ty } => ty.collect_refs(out),
        }
    }
}

/// The kind of a member, used in diagnostics and diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Func,
    Struct,
    Enum,
    Const,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Func => "function",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Const => "constant",
        };
        write!(f, "{name}")
    }
}

/// A consumption record naming members of another package.
///
/// Imports are how a package's use of plain functions and constants in its
/// dependencies becomes visible to the resolver; `Ref` only covers structs
/// and enums mentioned in type positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// The package the members come from.
    pub package: String,
    /// Module path inside that package; empty means its root module.
    #[serde(default)]
    pub path: Vec<String>,
    /// The member names consumed.
    pub members: Vec<String>,
}

impl Import {
    #[must_use]
    pub fn new(package: impl Into<String>, path: Vec<&str>, members: Vec<&str>) -> Self {
        Self {
            package: package.into(),
            path: path.into_iter().map(str::to_string).collect(),
            members: members.into_iter().map(str::to_string).collect(),
        }
    }

    /// Absolute member paths this import names.
    pub fn member_paths(&self) -> impl Iterator<Item = String> + '_ {
        let mut prefix = self.package.clone();
        for segment in &self.path {
            prefix.push('.');
            prefix.push_str(segment);
        }
        self.members
            .iter()
            .map(move |member| format!("{prefix}.{member}"))
    }
}

/// A named collection of members and child modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub modules: BTreeMap<String, Module>,
    #[serde(default)]
    pub members: BTreeMap<String, Member>,
}

impl Module {
    /// Create an empty module.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            modules: BTreeMap::new(),
            members: BTreeMap::new(),
        }
    }

    /// Insert or replace a member.
    pub fn insert_member(&mut self, name: impl Into<String>, member: Member) {
        self.members.insert(name.into(), member);
    }

    /// Insert or replace a child module under its own name.
    pub fn insert_module(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }

    /// Remove a member, returning it if present.
    pub fn remove_member(&mut self, name: &str) -> Option<Member> {
        self.members.remove(name)
    }

    /// Look up a member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Look up a member by name for mutation.
    pub fn member_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.members.get_mut(name)
    }
}

/// A locked dependency entry: a concrete version chosen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dep {
    pub name: String,
    pub version: Version,
}

impl Dep {
    #[must_use]
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

/// A declared dependency requirement: at least `min_version`, within its
/// major unless the resolver can justify a selective major-crossing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepReq {
    pub name: String,
    pub min_version: Version,
}

impl DepReq {
    #[must_use]
    pub fn new(name: impl Into<String>, min_version: Version) -> Self {
        Self {
            name: name.into(),
            min_version,
        }
    }
}

impl fmt::Display for DepReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~={}", self.name, self.min_version)
    }
}

/// Package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub description: String,
    pub version: Version,
}

/// A package: metadata, declared requirements, lock, and interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub info: PackageInfo,
    /// Declared requirements, keyed by dependency name.
    #[serde(default)]
    pub requirements: BTreeMap<String, DepReq>,
    /// The lock: concrete versions for every transitive requirement.
    #[serde(default)]
    pub deps: BTreeMap<String, Dep>,
    pub root_module: Module,
}

impl Package {
    /// Create a fresh draft at the initial version with an empty root module.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            info: PackageInfo {
                name: name.clone(),
                description: description.into(),
                version: Version::INITIAL,
            },
            requirements: BTreeMap::new(),
            deps: BTreeMap::new(),
            root_module: Module::new(name),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.info.version
    }

    /// Declare a requirement on another package.
    pub fn require(&mut self, req: DepReq) {
        self.requirements.insert(req.name.clone(), req);
    }

    /// Drop a requirement and any matching lock entry.
    pub fn unrequire(&mut self, name: &str) -> Option<DepReq> {
        self.deps.remove(name);
        self.requirements.remove(name)
    }

    /// Whether every declared requirement has a lock entry.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.requirements
            .keys()
            .all(|name| self.deps.contains_key(name))
    }

    /// Resolve an absolute member path within this package.
    ///
    /// Returns `None` when the path does not start with this package's name
    /// or does not lead to a member.
    #[must_use]
    pub fn member_at(&self, path: &str) -> Option<&Member> {
        let mut segments = path.split('.');
        if segments.next() != Some(self.info.name.as_str()) {
            return None;
        }
        let segments: Vec<&str> = segments.collect();
        let (member_name, module_path) = segments.split_last()?;
        let mut module = &self.root_module;
        for segment in module_path {
            module = module.modules.get(*segment)?;
        }
        module.members.get(*member_name)
    }

    /// Every absolute member path this package references in other
    /// packages, keyed by package name. Unions `Ref` targets and imports.
    #[must_use]
    pub fn external_references(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut out = self.external_ref_targets();
        for (package, paths) in self.import_targets() {
            out.entry(package).or_default().extend(paths);
        }
        out
    }

    /// `Ref` targets in other packages, keyed by package name.
    #[must_use]
    pub fn external_ref_targets(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for_each_member(&self.root_module, &self.info.name, &mut |_, member| {
            let mut refs = BTreeSet::new();
            member.collect_refs(&mut refs);
            for target in refs {
                if let Some(package) = ref_package(target) {
                    if package != self.info.name {
                        out.entry(package.to_string())
                            .or_default()
                            .insert(target.to_string());
                    }
                }
            }
        });
        out
    }

    /// Import targets, keyed by package name.
    #[must_use]
    pub fn import_targets(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for_each_module(&self.root_module, &self.info.name, &mut |_, module| {
            for import in &module.imports {
                out.entry(import.package.clone())
                    .or_default()
                    .extend(import.member_paths());
            }
        });
        out
    }

    /// Close a set of member paths over the `Ref`s appearing in their
    /// definitions within this package. Paths that do not resolve here are
    /// kept but not expanded.
    #[must_use]
    pub fn ref_closure(&self, seed: &BTreeSet<String>) -> BTreeSet<String> {
        let mut out = seed.clone();
        let mut queue: Vec<String> = seed.iter().cloned().collect();
        while let Some(path) = queue.pop() {
            let Some(member) = self.member_at(&path) else {
                continue;
            };
            let mut refs = BTreeSet::new();
            member.collect_refs(&mut refs);
            for target in refs {
                if ref_package(target) == Some(self.info.name.as_str())
                    && out.insert(target.to_string())
                {
                    queue.push(target.to_string());
                }
            }
        }
        out
    }

    /// Validate the structural integrity of this package.
    ///
    /// Checks names, container uniqueness, reference syntax, local
    /// reference resolution (including the ban on recursive local types),
    /// and that every foreign reference or import names a declared
    /// dependency. Cross-package existence is checked at publish time,
    /// when locked versions are known.
    ///
    /// # Errors
    ///
    /// Returns the first [`InterfaceError`] encountered.
    pub fn validate(&self) -> Result<(), InterfaceError> {
        validate_name(&self.info.name)?;
        if self.root_module.name != self.info.name {
            return Err(InterfaceError::RootModuleName {
                package: self.info.name.clone(),
                found: self.root_module.name.clone(),
            });
        }
        validate_module(&self.root_module, &self.info.name)?;
        self.validate_dep_tables()?;
        self.validate_refs()?;
        self.validate_imports()?;
        self.validate_local_acyclic()
    }

    fn validate_dep_tables(&self) -> Result<(), InterfaceError> {
        for (key, req) in &self.requirements {
            validate_name(key)?;
            if *key != req.name {
                return Err(InterfaceError::DepNameMismatch {
                    key: key.clone(),
                    found: req.name.clone(),
                });
            }
        }
        for (key, dep) in &self.deps {
            validate_name(key)?;
            if *key != dep.name {
                return Err(InterfaceError::DepNameMismatch {
                    key: key.clone(),
                    found: dep.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_refs(&self) -> Result<(), InterfaceError> {
        let mut result = Ok(());
        for_each_member(&self.root_module, &self.info.name, &mut |path, member| {
            if result.is_err() {
                return;
            }
            let mut refs = BTreeSet::new();
            member.collect_refs(&mut refs);
            for target in refs {
                result = self.validate_ref(&path, target);
                if result.is_err() {
                    return;
                }
            }
        });
        result
    }

    fn validate_ref(&self, path: &str, target: &str) -> Result<(), InterfaceError> {
        let package = parse_ref(target)?;
        if package == self.info.name {
            match self.member_at(target) {
                None => Err(InterfaceError::UnresolvedRef {
                    path: path.to_string(),
                    target: target.to_string(),
                }),
                Some(member) if !member.is_data() => Err(InterfaceError::RefNotData {
                    path: path.to_string(),
                    target: target.to_string(),
                }),
                Some(_) => Ok(()),
            }
        } else if self.requirements.contains_key(package) || self.deps.contains_key(package) {
            Ok(())
        } else {
            Err(InterfaceError::UnknownRefPackage {
                path: path.to_string(),
                package: package.to_string(),
            })
        }
    }

    fn validate_imports(&self) -> Result<(), InterfaceError> {
        let mut result = Ok(());
        for_each_module(&self.root_module, &self.info.name, &mut |path, module| {
            if result.is_err() {
                return;
            }
            for import in &module.imports {
                if import.package == self.info.name {
                    result = Err(InterfaceError::SelfImport {
                        path: path.to_string(),
                    });
                    return;
                }
                if !self.requirements.contains_key(&import.package)
                    && !self.deps.contains_key(&import.package)
                {
                    result = Err(InterfaceError::UnknownRefPackage {
                        path: path.to_string(),
                        package: import.package.clone(),
                    });
                    return;
                }
            }
        });
        result
    }

    /// Recursive type definitions within a single package are not
    /// supported; reject any local reference cycle.
    fn validate_local_acyclic(&self) -> Result<(), InterfaceError> {
        let mut local: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for_each_member(&self.root_module, &self.info.name, &mut |path, member| {
            let mut refs = BTreeSet::new();
            member.collect_refs(&mut refs);
            let targets = refs
                .into_iter()
                .filter(|target| ref_package(target) == Some(self.info.name.as_str()))
                .map(str::to_string)
                .collect();
            local.insert(path, targets);
        });

        // Iterative DFS with an explicit color map over the local ref graph.
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            Visiting,
            Done,
        }
        let mut colors: BTreeMap<&str, Color> = BTreeMap::new();
        for start in local.keys() {
            if colors.contains_key(start.as_str()) {
                continue;
            }
            let mut stack: Vec<(&str, bool)> = vec![(start.as_str(), false)];
            while let Some((node, exit)) = stack.pop() {
                if exit {
                    colors.insert(node, Color::Done);
                    continue;
                }
                match colors.get(node) {
                    Some(Color::Visiting) => {
                        return Err(InterfaceError::RecursiveRef {
                            path: node.to_string(),
                        });
                    }
                    Some(Color::Done) => continue,
                    None => {}
                }
                colors.insert(node, Color::Visiting);
                stack.push((node, true));
                if let Some(targets) = local.get(node) {
                    for target in targets {
                        match colors.get(target.as_str()) {
                            Some(Color::Visiting) => {
                                return Err(InterfaceError::RecursiveRef {
                                    path: target.clone(),
                                });
                            }
                            Some(Color::Done) => {}
                            None => stack.push((target.as_str(), false)),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Walk every member of `module` and its children, depth-first, handing the
/// callback the member's absolute path.
pub(crate) fn for_each_member<'a>(
    module: &'a Module,
    base: &str,
    f: &mut impl FnMut(String, &'a Member),
) {
    for (name, member) in &module.members {
        f(format!("{base}.{name}"), member);
    }
    for (name, child) in &module.modules {
        for_each_member(child, &format!("{base}.{name}"), f);
    }
}

/// Walk `module` and its children, handing the callback each module's
/// absolute path.
pub(crate) fn for_each_module<'a>(
    module: &'a Module,
    base: &str,
    f: &mut impl FnMut(&str, &'a Module),
) {
    f(base, module);
    for (name, child) in &module.modules {
        for_each_module(child, &format!("{base}.{name}"), f);
    }
}

/// The leading package segment of an absolute reference, if well-formed.
pub(crate) fn ref_package(target: &str) -> Option<&str> {
    let (package, rest) = target.split_once('.')?;
    if rest.is_empty() {
        return None;
    }
    Some(package)
}

fn parse_ref(target: &str) -> Result<&str, InterfaceError> {
    let segments: Vec<&str> = target.split('.').collect();
    if segments.len() < 2 {
        return Err(InterfaceError::MalformedRef {
            name: target.to_string(),
            reason: "expected at least '<package>.<member>'",
        });
    }
    for segment in &segments {
        if !is_valid_name(segment) {
            return Err(InterfaceError::MalformedRef {
                name: target.to_string(),
                reason: "segments must be identifiers",
            });
        }
    }
    Ok(segments[0])
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_name(name: &str) -> Result<(), InterfaceError> {
    if name.is_empty() {
        return Err(InterfaceError::InvalidName {
            name: name.to_string(),
            reason: "name cannot be empty",
        });
    }
    if !is_valid_name(name) {
        return Err(InterfaceError::InvalidName {
            name: name.to_string(),
            reason: "names must match [A-Za-z_][A-Za-z0-9_]*",
        });
    }
    Ok(())
}

fn validate_module(module: &Module, path: &str) -> Result<(), InterfaceError> {
    validate_name(&module.name)?;
    for name in module.members.keys() {
        validate_name(name)?;
        if module.modules.contains_key(name) {
            return Err(InterfaceError::DuplicateName {
                container: path.to_string(),
                name: name.clone(),
            });
        }
    }
    for (key, child) in &module.modules {
        if *key != child.name {
            return Err(InterfaceError::ModuleNameMismatch {
                key: key.clone(),
                found: child.name.clone(),
            });
        }
        validate_module(child, &format!("{path}.{key}"))?;
    }
    Ok(())
}

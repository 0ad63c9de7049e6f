//! Terminal rendering of interfaces, diffs, and index listings.

use myxa_core::{Diff, Index, Member, Module, Package, Severity};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Render a package header, its dependency tables, and its interface tree.
#[must_use]
pub fn render_package(package: &Package) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}=={}: {}",
        package.info.name, package.info.version, package.info.description
    );

    if !package.requirements.is_empty() {
        let _ = writeln!(out, "requirements:");
        for req in package.requirements.values() {
            let _ = writeln!(out, "{INDENT}{req}");
        }
    }
    if !package.deps.is_empty() {
        let _ = writeln!(out, "lock:");
        for dep in package.deps.values() {
            let _ = writeln!(out, "{INDENT}{dep}");
        }
    }

    let _ = writeln!(out, "interface:");
    render_module(&mut out, &package.root_module, 1);
    out
}

fn render_module(out: &mut String, module: &Module, depth: usize) {
    let pad = INDENT.repeat(depth);
    for import in &module.imports {
        let mut target = import.package.clone();
        for segment in &import.path {
            target.push('.');
            target.push_str(segment);
        }
        let _ = writeln!(out, "{pad}use {target} ({})", import.members.join(", "));
    }
    for (name, member) in &module.members {
        render_member(out, name, member, depth);
    }
    for (name, child) in &module.modules {
        let _ = writeln!(out, "{pad}mod {name}");
        render_module(out, child, depth + 1);
    }
}

fn render_member(out: &mut String, name: &str, member: &Member, depth: usize) {
    let pad = INDENT.repeat(depth);
    match member {
        Member::Func { params, ret } => {
            let params: Vec<String> = params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect();
            let _ = writeln!(out, "{pad}{name}({}) -> {ret}", params.join(", "));
        }
        Member::Struct { fields } => {
            let _ = writeln!(out, "{pad}struct {name}");
            let field_pad = INDENT.repeat(depth + 1);
            for (field, ty) in fields {
                let _ = writeln!(out, "{field_pad}{field}: {ty}");
            }
        }
        Member::Enum { variants } => {
            let _ = writeln!(out, "{pad}enum {name}");
            let variant_pad = INDENT.repeat(depth + 1);
            for (variant, payload) in variants {
                match payload {
                    Some(ty) => {
                        let _ = writeln!(out, "{variant_pad}{variant}({ty})");
                    }
                    None => {
                        let _ = writeln!(out, "{variant_pad}{variant}");
                    }
                }
            }
        }
        Member::Const { ty } => {
            let _ = writeln!(out, "{pad}const {name}: {ty}");
        }
    }
}

/// Render a diff, one line per change, breaking changes first in severity
/// label only; the path order itself is the engine's stable order.
#[must_use]
pub fn render_diff(diff: &Diff) -> String {
    let mut out = String::new();
    for change in diff.iter() {
        let label = match change.severity() {
            Severity::Breaking => "breaking    ",
            Severity::NonBreaking => "non-breaking",
        };
        let _ = writeln!(out, "{label}  {change}");
    }
    out
}

/// Render the index listing, optionally filtered to one package.
#[must_use]
pub fn render_index(index: &Index, filter: Option<&str>, show_versions: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "index '{}'", index.name);
    for (name, versions) in index.iter() {
        if filter.is_some_and(|f| f != name) {
            continue;
        }
        let _ = writeln!(out, "{INDENT}{name}");
        if show_versions {
            for (version, package) in versions {
                let _ = writeln!(
                    out,
                    "{INDENT}{INDENT}{version}: {}",
                    package.info.description
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use myxa_core::{diff_packages, Ty, Version};

    fn sample() -> Package {
        let mut pkg = Package::new("euler", "Useful math stuff");
        let mut math = Module::new("math");
        math.insert_member("pi", Member::constant(Ty::FLOAT));
        math.insert_member(
            "add",
            Member::func(vec![("a", Ty::INT), ("b", Ty::INT)], Ty::INT),
        );
        pkg.root_module.insert_module(math);
        pkg.root_module.insert_member(
            "Point",
            Member::structure(vec![("x", Ty::INT), ("y", Ty::INT)]),
        );
        pkg
    }

    #[test]
    fn package_rendering_includes_signatures() {
        let text = render_package(&sample());
        assert!(text.contains("euler==1.0: Useful math stuff"));
        assert!(text.contains("mod math"));
        assert!(text.contains("add(a: Int, b: Int) -> Int"));
        assert!(text.contains("const pi: Float"));
        assert!(text.contains("struct Point"));
    }

    #[test]
    fn diff_rendering_labels_severity() {
        let old = sample();
        let mut new = sample();
        new.root_module.remove_member("Point").unwrap();
        new.root_module
            .insert_member("tau", Member::constant(Ty::FLOAT));

        let text = render_diff(&diff_packages(&old, &new));
        assert!(text.contains("breaking"));
        assert!(text.contains("non-breaking"));
        assert!(text.contains("euler.Point"));
    }

    #[test]
    fn index_rendering_respects_filter_and_versions() {
        let mut index = Index::new("primary");
        let mut lib = Package::new("lib", "A library");
        lib.info.version = Version::new(1, 0);
        index.insert(lib).unwrap();
        index.insert(sample()).unwrap();

        let all = render_index(&index, None, true);
        assert!(all.contains("lib"));
        assert!(all.contains("euler"));
        assert!(all.contains("1.0"));

        let filtered = render_index(&index, Some("lib"), false);
        assert!(filtered.contains("lib"));
        assert!(!filtered.contains("euler"));
        assert!(!filtered.contains("1.0:"));
    }
}

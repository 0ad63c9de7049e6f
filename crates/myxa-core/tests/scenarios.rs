//! End-to-end scenarios exercising the model, diff engine, index,
//! resolver, update planner, and publish gate together.

use myxa_core::{
    apply_update, diff_packages, publish, Dep, DepReq, Import, Index, IndexError, Member, Package,
    PublishError, Resolver, Ty, Version,
};

fn euler() -> Package {
    let mut pkg = Package::new("euler", "A compilation of useful math stuff");
    pkg.root_module
        .insert_member("compute", Member::func(vec![("x", Ty::INT)], Ty::INT));
    pkg
}

fn lib(version: Version) -> Package {
    let mut pkg = Package::new("lib", "A library");
    pkg.info.version = version;
    pkg.root_module
        .insert_member("f", Member::func(vec![], Ty::INT));
    pkg.root_module
        .insert_member("g", Member::func(vec![], Ty::STR));
    pkg
}

fn app_requiring_lib(members: Vec<&str>) -> Package {
    let mut app = Package::new("app", "A fun app");
    app.require(DepReq::new("lib", Version::new(1, 0)));
    app.root_module
        .imports
        .push(Import::new("lib", vec![], members));
    app
}

#[test]
fn publish_fresh_package() {
    let mut index = Index::new("primary");
    publish(&euler(), &mut index).unwrap();

    assert!(index.contains_version("euler", Version::new(1, 0)));
    assert_eq!(index.latest("euler").unwrap().version(), Version::new(1, 0));
}

#[test]
fn added_parameter_forces_major_bump() {
    let mut index = Index::new("primary");
    publish(&euler(), &mut index).unwrap();

    let mut edited = euler();
    edited.root_module.insert_member(
        "compute",
        Member::func(vec![("x", Ty::INT), ("y", Ty::INT)], Ty::INT),
    );

    // `check` sees a breaking change.
    let old = index.latest("euler").unwrap();
    let diff = diff_packages(old, &edited);
    assert!(diff.is_breaking());

    // Publishing without a bump names the version that would be required.
    let err = publish(&edited, &mut index).unwrap_err();
    match err {
        PublishError::VersionBumpRequired { required, actual } => {
            assert_eq!(required, Version::new(2, 0));
            assert_eq!(actual, Version::new(1, 0));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    edited.info.version = Version::new(2, 0);
    publish(&edited, &mut index).unwrap();
    assert_eq!(index.latest("euler").unwrap().version(), Version::new(2, 0));
}

#[test]
fn struct_field_addition_is_breaking() {
    let mut old = Package::new("geo", "Geometry");
    old.root_module
        .insert_member("Point", Member::structure(vec![("x", Ty::INT)]));

    let mut new = old.clone();
    new.root_module.insert_member(
        "Point",
        Member::structure(vec![("x", Ty::INT), ("y", Ty::INT)]),
    );

    let diff = diff_packages(&old, &new);
    assert!(diff.is_breaking());
    assert_eq!(diff.len(), 1);
    assert_eq!(diff.changes()[0].path, "geo.Point.y");
}

#[test]
fn update_crosses_major_when_only_unused_member_broke() {
    let mut index = Index::new("primary");
    publish(&lib(Version::new(1, 0)), &mut index).unwrap();

    // lib 2.0 changes only `g`'s return type.
    let mut v2 = lib(Version::new(2, 0));
    v2.root_module
        .insert_member("g", Member::func(vec![], Ty::INT));
    publish(&v2, &mut index).unwrap();

    // `app` uses only `f`.
    let mut app = app_requiring_lib(vec!["f"]);
    Resolver::new(&index).lock(&mut app).unwrap();
    // The resolver already admits 2.0; force the lock back to 1.0 to show
    // that `update` performs the same crossing.
    app.deps
        .insert("lib".to_string(), Dep::new("lib", Version::new(1, 0)));

    let changed = apply_update(&mut app, &index).unwrap();
    assert!(changed);
    assert_eq!(app.deps["lib"].version, Version::new(2, 0));
}

#[test]
fn update_stays_put_when_used_member_broke() {
    let mut index = Index::new("primary");
    publish(&lib(Version::new(1, 0)), &mut index).unwrap();
    let mut v2 = lib(Version::new(2, 0));
    v2.root_module
        .insert_member("g", Member::func(vec![], Ty::INT));
    publish(&v2, &mut index).unwrap();

    // `app` uses both `f` and `g`.
    let mut app = app_requiring_lib(vec!["f", "g"]);
    Resolver::new(&index).lock(&mut app).unwrap();
    assert_eq!(app.deps["lib"].version, Version::new(1, 0));

    let changed = apply_update(&mut app, &index).unwrap();
    assert!(!changed);
    assert_eq!(app.deps["lib"].version, Version::new(1, 0));
}

#[test]
fn duplicate_publish_and_initial_version_scoping() {
    let mut index = Index::new("primary");

    // Publishing lib 1.0 twice: the second insert is a duplicate.
    let first = lib(Version::new(1, 0));
    publish(&first, &mut index).unwrap();
    let err = index.insert(first).unwrap_err();
    assert!(matches!(err, IndexError::AlreadyPublished { .. }));

    // Once a name has any published version, later publishes are governed
    // by the bump rule alone, not the initial-version rule.
    let mut v2 = lib(Version::new(2, 0));
    v2.root_module.remove_member("g").unwrap();
    publish(&v2, &mut index).unwrap();

    let mut v2_1 = v2.clone();
    v2_1.root_module
        .insert_member("pi", Member::constant(Ty::FLOAT));
    v2_1.info.version = Version::new(2, 1);
    publish(&v2_1, &mut index).unwrap();

    assert_eq!(index.latest("lib").unwrap().version(), Version::new(2, 1));
}

#[test]
fn diff_identity_is_empty_for_published_snapshots() {
    let mut index = Index::new("primary");
    publish(&euler(), &mut index).unwrap();

    let stored = index.latest("euler").unwrap();
    assert!(diff_packages(stored, stored).is_empty());
}

#[test]
fn lock_is_a_pure_function_of_its_inputs() {
    let mut index = Index::new("primary");
    publish(&lib(Version::new(1, 0)), &mut index).unwrap();
    let mut v1_1 = lib(Version::new(1, 1));
    v1_1.root_module
        .insert_member("h", Member::func(vec![], Ty::BOOL));
    publish(&v1_1, &mut index).unwrap();

    let app = app_requiring_lib(vec!["f"]);
    let resolver = Resolver::new(&index);
    let first = resolver.resolve(&app).unwrap();
    let second = resolver.resolve(&app).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["lib"].version, Version::new(1, 1));
}

#[test]
fn shared_dependency_resolves_to_a_single_version() {
    let mut index = Index::new("primary");
    publish(&lib(Version::new(1, 0)), &mut index).unwrap();

    let mut left = Package::new("left", "Uses lib");
    left.require(DepReq::new("lib", Version::new(1, 0)));
    left.root_module
        .imports
        .push(Import::new("lib", vec![], vec!["f"]));
    left.deps
        .insert("lib".to_string(), Dep::new("lib", Version::new(1, 0)));
    publish(&left, &mut index).unwrap();

    let mut right = Package::new("right", "Also uses lib");
    right.require(DepReq::new("lib", Version::new(1, 0)));
    right
        .root_module
        .imports
        .push(Import::new("lib", vec![], vec!["g"]));
    right
        .deps
        .insert("lib".to_string(), Dep::new("lib", Version::new(1, 0)));
    publish(&right, &mut index).unwrap();

    let mut app = Package::new("app", "An app");
    app.require(DepReq::new("left", Version::new(1, 0)));
    app.require(DepReq::new("right", Version::new(1, 0)));

    let deps = Resolver::new(&index).resolve(&app).unwrap();
    assert_eq!(deps.len(), 3);
    assert_eq!(deps["lib"].version, Version::new(1, 0));
}

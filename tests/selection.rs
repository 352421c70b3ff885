//! End-to-end resolution scenarios against the public API.

use slipway::{
    ArtifactDescriptor, AttributeSet, ConfigurationError, ConfigurationSet, SelectionError,
    VariantSelector,
};

fn jar(name: &str) -> ArtifactDescriptor {
    ArtifactDescriptor::file(name, "jar", format!("/out/{name}.jar"))
}

fn artifact_names(set: &slipway::ArtifactSet) -> Vec<&str> {
    set.iter().map(|d| d.identity().name.as_str()).collect()
}

/// The worked example: configuration `c` with base artifact `lib.jar`, an
/// `api` variant and a `runtime` variant carrying `lib-impl.jar`.
fn worked_example() -> (ConfigurationSet, slipway::ConfigurationId) {
    let mut set = ConfigurationSet::new();
    let c = set.create("c").unwrap();
    set.get_mut(c).add_artifact(jar("lib")).unwrap();
    set.get_mut(c)
        .variant_with("api", |v| v.set_attribute("usage", "api"))
        .unwrap();
    set.get_mut(c)
        .variant_with("runtime", |v| {
            v.set_attribute("usage", "runtime")?;
            v.add_artifact(jar("lib-impl"))
        })
        .unwrap();
    (set, c)
}

#[test]
fn runtime_request_selects_runtime_with_base_and_own_artifacts() {
    let (set, c) = worked_example();
    let selector = VariantSelector::default();

    let selected = selector
        .select(&set, c, &AttributeSet::of([("usage", "runtime")]))
        .unwrap();

    assert_eq!(selected.name.as_str(), "runtime");
    assert_eq!(selected.configuration.as_str(), "c");
    assert_eq!(artifact_names(&selected.artifacts), vec!["lib", "lib-impl"]);
}

#[test]
fn docs_request_fails_listing_both_candidates() {
    let (set, c) = worked_example();
    let selector = VariantSelector::default();

    let err = selector
        .select(&set, c, &AttributeSet::of([("usage", "docs")]))
        .unwrap_err();

    match &err {
        SelectionError::NoMatchingVariant { candidates, .. } => {
            let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["api", "runtime"]);
            assert!(candidates
                .iter()
                .all(|c| c.mismatches.iter().any(|m| m.attribute.as_str() == "usage")));
        }
        other => panic!("expected NoMatchingVariant, got {:?}", other),
    }

    // The structured payload renders without touching the graph again
    let rendered = err.to_diagnostic().format(false);
    assert!(rendered.contains("candidate `api`"));
    assert!(rendered.contains("candidate `runtime`"));
}

#[test]
fn extending_configuration_resolves_inherited_variant_with_unioned_bases() {
    let (mut set, c) = worked_example();
    let d = set.create("d").unwrap();
    set.extend_from(d, c).unwrap();
    set.get_mut(d).add_artifact(jar("d-extra")).unwrap();

    let selector = VariantSelector::default();
    let selected = selector
        .select(&set, d, &AttributeSet::of([("usage", "api")]))
        .unwrap();

    assert_eq!(selected.name.as_str(), "api");
    assert!(selected.inherited);
    assert_eq!(selected.declared_on.as_str(), "c");
    assert_eq!(artifact_names(&selected.artifacts), vec!["d-extra", "lib"]);
}

#[test]
fn base_artifacts_apply_retroactively_regardless_of_order() {
    let (mut set, c) = worked_example();
    let selector = VariantSelector::default();

    // Resolve once, then add another base artifact
    selector
        .select(&set, c, &AttributeSet::of([("usage", "api")]))
        .unwrap();
    set.get_mut(c).add_artifact(jar("late")).unwrap();

    let selected = selector
        .select(&set, c, &AttributeSet::of([("usage", "api")]))
        .unwrap();
    assert_eq!(artifact_names(&selected.artifacts), vec!["lib", "late"]);
}

#[test]
fn cycles_are_rejected_before_any_resolution() {
    let mut set = ConfigurationSet::new();
    let a = set.create("a").unwrap();
    let b = set.create("b").unwrap();
    let c = set.create("c").unwrap();
    set.extend_from(b, a).unwrap();
    set.extend_from(c, b).unwrap();

    let err = set.extend_from(a, c).unwrap_err();
    assert!(matches!(err, ConfigurationError::CyclicExtension { .. }));

    // The failed edge is not observable by resolution
    let selector = VariantSelector::default();
    set.get_mut(a)
        .variant_with("only", |v| v.set_attribute("usage", "api"))
        .unwrap();
    let selected = selector
        .select(&set, c, &AttributeSet::of([("usage", "api")]))
        .unwrap();
    assert_eq!(selected.declared_on.as_str(), "a");
}

#[test]
fn local_variant_shadows_inherited_at_any_depth() {
    let mut set = ConfigurationSet::new();
    let top = set.create("top").unwrap();
    let mid = set.create("mid").unwrap();
    let bottom = set.create("bottom").unwrap();
    set.extend_from(mid, top).unwrap();
    set.extend_from(bottom, mid).unwrap();

    set.get_mut(top)
        .variant_with("api", |v| v.set_attribute("usage", "api"))
        .unwrap();
    set.get_mut(bottom)
        .variant_with("api", |v| v.set_attribute("usage", "api"))
        .unwrap();

    let selector = VariantSelector::default();
    let selected = selector
        .select(&set, bottom, &AttributeSet::of([("usage", "api")]))
        .unwrap();

    assert_eq!(selected.declared_on.as_str(), "bottom");
    assert!(!selected.inherited);
}

#[test]
fn ambiguity_reports_identical_candidate_order_every_time() {
    let mut set = ConfigurationSet::new();
    let c = set.create("c").unwrap();
    for name in ["alpha", "beta", "gamma"] {
        set.get_mut(c)
            .variant_with(name, |v| v.set_attribute("usage", "api"))
            .unwrap();
    }

    let selector = VariantSelector::default();
    let requested = AttributeSet::of([("usage", "api")]);

    let mut orders = Vec::new();
    for _ in 0..3 {
        match selector.select(&set, c, &requested).unwrap_err() {
            SelectionError::AmbiguousVariant { candidates, .. } => {
                orders.push(
                    candidates
                        .iter()
                        .map(|c| c.name.as_str().to_string())
                        .collect::<Vec<_>>(),
                );
            }
            other => panic!("expected AmbiguousVariant, got {:?}", other),
        }
    }
    assert!(orders.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(orders[0], vec!["alpha", "beta", "gamma"]);
}

#[test]
fn adding_a_requested_attribute_only_narrows_the_candidate_set() {
    let mut set = ConfigurationSet::new();
    let c = set.create("c").unwrap();
    set.get_mut(c)
        .variant_with("debug", |v| {
            v.set_attribute("usage", "api")?;
            v.set_attribute("build-type", "debug")
        })
        .unwrap();
    set.get_mut(c)
        .variant_with("release", |v| {
            v.set_attribute("usage", "api")?;
            v.set_attribute("build-type", "release")
        })
        .unwrap();

    let selector = VariantSelector::default();

    // Broad request: both candidates tie
    let broad = AttributeSet::of([("usage", "api")]);
    assert!(matches!(
        selector.select(&set, c, &broad).unwrap_err(),
        SelectionError::AmbiguousVariant { .. }
    ));

    // Narrowed request: the set shrinks to one, never widens
    let narrow = AttributeSet::of([("usage", "api"), ("build-type", "debug")]);
    let selected = selector.select(&set, c, &narrow).unwrap();
    assert_eq!(selected.name.as_str(), "debug");
}

#[test]
fn frozen_subgraph_rejects_attribute_mutation_with_precise_error() {
    let (mut set, c) = worked_example();
    let selector = VariantSelector::default();

    selector
        .select(&set, c, &AttributeSet::of([("usage", "api")]))
        .unwrap();

    let err = set
        .get_mut(c)
        .variant_mut("api")
        .unwrap()
        .set_attribute("usage", "docs")
        .unwrap_err();

    match err {
        ConfigurationError::ConflictingAttribute {
            attribute,
            existing,
            requested,
        } => {
            assert_eq!(attribute.as_str(), "usage");
            assert_eq!(existing.to_string(), "api");
            assert_eq!(requested.to_string(), "docs");
        }
        other => panic!("expected ConflictingAttribute, got {:?}", other),
    }
}

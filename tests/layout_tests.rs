//! Bundle layout assertions against manifests read from YAML

use bundle_harness::layout::is_mismatch;
use bundle_harness::{
    ExpectedBundle, GraphManifest, HarnessError, NameMatcher, assert_bundle_layout,
    assert_bundles,
};

const GRAPH: &str = r#"
bundles:
  - type: js
    filePath: /dist/index.js
    entry: index
    assets:
      - { id: index, filePath: /src/index.js, env: { context: browser } }
      - { id: util, filePath: /src/util.js, env: { context: browser } }
  - type: js
    filePath: /dist/lazy.8f2a1c.js
    entry: lazy
    assets:
      - { id: lazy, filePath: /src/Lazy.js, env: { context: browser } }
  - type: css
    filePath: /dist/index.css
    entry: style
    assets:
      - { id: style, filePath: /src/app.css, env: { context: browser } }
"#;

fn graph() -> GraphManifest {
    GraphManifest::from_yaml(GRAPH).unwrap()
}

#[test]
fn test_matching_layout_in_any_order() {
    let expected = vec![
        ExpectedBundle::with_assets(["util.js", "index.js"]),
        ExpectedBundle::with_assets(["app.css"]),
        ExpectedBundle::with_assets(["Lazy.js"]),
    ];
    assert_bundle_layout(&graph(), &expected).unwrap();
    assert_bundles(&graph(), &expected);
}

#[test]
fn test_count_mismatch_is_reported_first() {
    let expected = vec![
        ExpectedBundle::with_assets(["nothing.js"]),
        ExpectedBundle::with_assets(["app.css"]),
    ];
    let err = assert_bundle_layout(&graph(), &expected).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::BundleCountMismatch {
            expected: 2,
            actual: 3
        }
    ));
}

#[test]
fn test_name_pattern_for_hashed_bundle() {
    let expected = vec![
        ExpectedBundle::with_assets(["index.js", "util.js"]).named("index.js"),
        ExpectedBundle::with_assets(["app.css"]).of_type("css"),
        ExpectedBundle::with_assets(["Lazy.js"]).named(NameMatcher::glob("lazy.*.js")),
    ];
    assert_bundle_layout(&graph(), &expected).unwrap();
}

#[test]
fn test_name_mismatch() {
    let expected = vec![
        ExpectedBundle::with_assets(["index.js", "util.js"]).named("main.js"),
        ExpectedBundle::with_assets(["app.css"]),
        ExpectedBundle::with_assets(["Lazy.js"]),
    ];
    let err = assert_bundle_layout(&graph(), &expected).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Bundle name mismatch: expected 'main.js', got 'index.js'"
    );
    assert!(is_mismatch(&err));
}

#[test]
fn test_type_mismatch() {
    let expected = vec![
        ExpectedBundle::with_assets(["index.js", "util.js"]),
        ExpectedBundle::with_assets(["app.css"]).of_type("js"),
        ExpectedBundle::with_assets(["Lazy.js"]),
    ];
    let err = assert_bundle_layout(&graph(), &expected).unwrap_err();
    assert!(matches!(err, HarnessError::BundleTypeMismatch { .. }));
}

#[test]
fn test_assets_mismatch() {
    let expected = vec![
        ExpectedBundle::with_assets(["index.js"]),
        ExpectedBundle::with_assets(["app.css"]),
        ExpectedBundle::with_assets(["Lazy.js"]),
    ];
    let err = assert_bundle_layout(&graph(), &expected).unwrap_err();
    assert!(matches!(err, HarnessError::BundleAssetsMismatch { .. }));
}

#[test]
fn test_invalid_glob_is_usage_error() {
    let expected = vec![
        ExpectedBundle::with_assets(["index.js", "util.js"]).named(NameMatcher::glob("[")),
        ExpectedBundle::with_assets(["app.css"]),
        ExpectedBundle::with_assets(["Lazy.js"]),
    ];
    let err = assert_bundle_layout(&graph(), &expected).unwrap_err();
    assert!(matches!(err, HarnessError::InvalidLayout { .. }));
}

#[test]
fn test_expected_layout_from_json() {
    let expected = ExpectedBundle::list_from_json(
        r#"[
            {"assets": ["index.js", "util.js"], "name": "index.js", "type": "js"},
            {"assets": ["app.css"]},
            {"assets": ["Lazy.js"], "name": {"glob": "lazy.*"}}
        ]"#,
    )
    .unwrap();
    assert_bundle_layout(&graph(), &expected).unwrap();
}

#[test]
#[should_panic(expected = "Expected 0 bundles, got 3")]
fn test_assert_bundles_panics_with_message() {
    assert_bundles(&graph(), &[]);
}

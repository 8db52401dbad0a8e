// integration tests for the wire and legacy formats

use crate::common::*;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use qtree::tree::{Connective, Tree, Value};
use qtree::validate::{self, IssueKind};
use qtree::wire::{self, legacy, WireError};

const BASIC: &str = r#"{"connective":"AND","negated":false,"children":[{"field":"status","operator":"equals","values":["active"]},{"field":"age","operator":"between","values":[18,65]}]}"#;

#[test]
fn test_basic_and_filter() {
    let registry = sample_registry();
    let mut tree = Tree::new();
    let root = tree.root();
    tree.add_condition(&registry, root, "status", "equals", vec!["active".into()], None)
        .unwrap();
    tree.add_condition(&registry, root, "age", "between", vec![18.into(), 65.into()], None)
        .unwrap();

    assert_eq!(wire::to_string(&tree), BASIC);
    assert!(validate::validate(&tree, &registry).ok);
}

#[test]
fn test_stale_field_reference_loads() {
    let registry = sample_registry();
    let tree = wire::from_str(
        r#"{"connective":"AND","negated":false,"children":[
            {"field":"legacy_score","operator":"greaterThan","values":[3]},
            {"field":"age","operator":"equals","values":[40]}
        ]}"#,
    )
    .unwrap();

    let result = validate::validate(&tree, &registry);
    assert!(!result.ok);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].kind, IssueKind::UnknownFieldReference);
    let stale = tree.children(tree.root())[0];
    assert_eq!(result.issues[0].node_id, stale);
}

#[test]
fn test_canonical_form_is_stable() {
    // key order, whitespace and missing flags do not survive normalization
    let loose = r#"{
        "children": [
            { "values": [18, 65], "operator": "between", "field": "age" },
            { "children": [{ "field": "name", "operator": "isEmpty", "values": [] }], "connective": "or" }
        ],
        "connective": "and"
    }"#;
    let once = wire::to_string(&wire::from_str(loose).unwrap());
    let twice = wire::to_string(&wire::from_str(&once).unwrap());

    assert_eq!(once, twice);
    assert_eq!(
        once,
        r#"{"connective":"AND","negated":false,"children":[{"field":"age","operator":"between","values":[18,65]},{"connective":"OR","negated":false,"children":[{"field":"name","operator":"isEmpty","values":[]}]}]}"#
    );
}

#[test]
fn test_malformed_payloads_report_path() {
    let cases = [
        (r#"[]"#, "$"),
        (r#"{"connective":"XOR","children":[]}"#, "$"),
        (r#"{"connective":"AND","children":[{"field":"a","operator":"eq"}]}"#, "$.children[0]"),
        (
            r#"{"connective":"AND","children":[{"field":"a","operator":"eq","values":[[1]]}]}"#,
            "$.children[0].values[0]",
        ),
    ];

    for (payload, path) in cases {
        match wire::from_str(payload) {
            Err(err @ WireError::MalformedPayload { .. }) => {
                assert!(err.path().starts_with(path), "{} -> {}", payload, err)
            }
            Ok(_) => panic!("{} should not load", payload),
        }
    }
}

#[test]
fn test_depth_limit() {
    let mut payload = r#"{"connective":"AND","children":[]}"#.to_string();
    for _ in 0..wire::MAX_DEPTH + 1 {
        payload = format!(r#"{{"connective":"AND","children":[{}]}}"#, payload);
    }
    assert!(wire::from_str(&payload).is_err());
}

#[test]
fn test_legacy_decode_into_session_tree() {
    let registry = sample_registry();
    let encoded = STANDARD.encode(
        serde_json::json!([
            { "key": "status", "comparator": "in", "value": ["active", "inactive"] },
            { "key": "age", "comparator": "greaterThan", "value": "21" },
            { "key": "verified", "comparator": "eq", "value": "1" }
        ])
        .to_string(),
    );

    let tree = legacy::decode(&encoded, &registry).unwrap();
    let values: Vec<Vec<Value>> = tree
        .children(tree.root())
        .iter()
        .map(|id| tree.condition(*id).unwrap().values.clone())
        .collect();

    assert_eq!(
        values,
        vec![
            vec!["active".into(), "inactive".into()],
            vec![Value::Number(21)],
            vec![Value::Bool(true)],
        ]
    );
    assert!(validate::validate(&tree, &registry).ok);
}

#[test]
fn test_legacy_encode_flat_tree() {
    let tree = wire::from_str(BASIC).unwrap();
    let encoded = legacy::encode(&tree).unwrap();
    let rules: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();

    assert_eq!(
        rules,
        serde_json::json!([
            { "key": "status", "comparator": "equals", "value": "active" },
            { "key": "age", "comparator": "between", "value": ["18", "65"] }
        ])
    );
}

#[test]
fn test_legacy_encode_rejects_or_root() {
    let tree = Tree::with_root(Connective::Or);
    assert!(matches!(
        legacy::encode(&tree),
        Err(legacy::LegacyError::NotFlat(_))
    ));
}

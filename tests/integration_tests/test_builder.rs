// integration tests for editing sessions through the public API

use crate::common::*;

use qtree::builder::{BuilderError, QueryBuilder};
use qtree::events::EventType;
use qtree::sort::{SortDirection, SortIssue, SortSpec};
use qtree::tree::{Connective, NodeId, TreeError, Value};
use qtree::validate::IssueKind;

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<qtree::events::Event>) -> Vec<qtree::events::Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn test_completeness_follows_edits() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let root = qb.root();
    assert!(!qb.is_complete());

    qb.add_condition(root, "status", "equals", vec!["active".into()], None)
        .unwrap();
    assert!(qb.is_complete());

    let group = qb.add_group(root, Connective::And, None).unwrap();
    assert!(!qb.is_complete());

    qb.add_condition(group, "age", "greaterThan", vec![21.into()], None)
        .unwrap();
    assert!(qb.is_complete());
}

#[test]
fn test_nested_session_produces_expected_wire() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let root = qb.root();
    qb.set_connective(root, Connective::Or).unwrap();

    let adults = qb.add_group(root, Connective::And, None).unwrap();
    qb.add_condition(adults, "age", "between", vec![18.into(), 65.into()], None)
        .unwrap();
    qb.add_condition(adults, "status", "in", vec!["active".into(), "inactive".into()], None)
        .unwrap();
    qb.set_negated(adults, true).unwrap();
    qb.add_condition(root, "name", "isEmpty", vec![], Some(0))
        .unwrap();

    assert_eq!(
        qb.wire().to_json(),
        serde_json::json!({
            "connective": "OR",
            "negated": false,
            "children": [
                { "field": "name", "operator": "isEmpty", "values": [] },
                {
                    "connective": "AND",
                    "negated": true,
                    "children": [
                        { "field": "age", "operator": "between", "values": [18, 65] },
                        { "field": "status", "operator": "in", "values": ["active", "inactive"] }
                    ]
                }
            ]
        })
    );
    assert!(qb.validation().ok);
}

#[test]
fn test_rejected_edits_leave_session_untouched() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let root = qb.root();
    let c = qb
        .add_condition(root, "age", "equals", vec![30.into()], None)
        .unwrap();
    let (_, mut rx) = qb.subscribe(vec![]);
    let before = qb.wire();

    let err = qb
        .add_condition(root, "agee", "equals", vec![1.into()], None)
        .unwrap_err();
    assert!(err.suggestions().contains(&"age".to_string()));

    assert_eq!(
        qb.add_condition(root, "status", "greaterThan", vec![1.into()], None),
        Err(TreeError::OperatorMismatch {
            field: "status".to_string(),
            operator: "greaterThan".to_string()
        })
    );
    assert!(matches!(
        qb.move_node(root, c, 0),
        Err(TreeError::CannotMoveRoot)
    ));
    assert!(matches!(
        qb.add_group(NodeId::from_raw(999), Connective::And, None),
        Err(TreeError::UnknownGroup(_))
    ));

    assert_eq!(qb.wire(), before);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_cyclic_move_is_rejected() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let root = qb.root();
    let outer = qb.add_group(root, Connective::And, None).unwrap();
    let inner = qb.add_group(outer, Connective::Or, None).unwrap();

    assert!(matches!(
        qb.move_node(outer, inner, 0),
        Err(TreeError::CyclicMove { .. })
    ));
    assert!(matches!(
        qb.move_node(outer, outer, 0),
        Err(TreeError::CyclicMove { .. })
    ));

    qb.move_node(inner, root, 0).unwrap();
    assert_eq!(qb.tree().children(root), &[inner, outer]);
}

#[test]
fn test_operator_change_clears_values_until_refilled() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let root = qb.root();
    let c = qb
        .add_condition(root, "age", "between", vec![18.into(), 65.into()], None)
        .unwrap();

    qb.set_operator(c, "equals").unwrap();
    assert!(qb.tree().condition(c).unwrap().values.is_empty());
    assert!(!qb.is_complete());
    assert!(qb.validation().has(IssueKind::ArityMismatch));

    qb.set_values(c, vec![40.into()]).unwrap();
    assert!(qb.validation().ok);
}

#[test]
fn test_event_stream_for_session() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let (_, mut all) = qb.subscribe(vec![]);
    let (_, mut applied) = qb.subscribe(vec!["filter.applied".to_string()]);

    qb.load(&serde_json::json!({
        "connective": "AND",
        "children": [{ "field": "status", "operator": "equals", "values": ["active"] }]
    }))
    .unwrap();
    let root = qb.root();
    qb.add_condition(root, "verified", "eq", vec![true.into()], None)
        .unwrap();
    qb.apply().unwrap();

    let events = drain(&mut all);
    let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![EventType::Ready, EventType::Changed, EventType::Applied]
    );
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert!(events.iter().all(|e| e.data.is_valid));
    assert_eq!(events[1].data.action, "add_condition");

    let applied_events = drain(&mut applied);
    assert_eq!(applied_events.len(), 1);
    assert_eq!(applied_events[0].data.wire_tree, qb.applied_wire());
}

#[test]
fn test_invalid_tree_cannot_be_applied() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let root = qb.root();
    qb.add_blank_condition(root, "age", None).unwrap();

    match qb.apply() {
        Err(BuilderError::NotSubmittable { issues }) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].kind, IssueKind::ArityMismatch);
        }
        other => panic!("expected NotSubmittable, got {:?}", other),
    }

    // an empty tree means no filtering and is accepted
    qb.clear();
    assert!(qb.apply().is_ok());
}

#[test]
fn test_undo_redo_across_structural_edits() {
    let mut qb = QueryBuilder::new(sample_registry_arc());
    let root = qb.root();
    let group = qb.add_group(root, Connective::Or, None).unwrap();
    qb.add_condition(group, "name", "starts", vec!["Jo".into()], None)
        .unwrap();
    let full = qb.wire();

    assert_eq!(qb.remove_node(group), Ok(2));
    assert!(qb.tree().children(root).is_empty());

    assert!(qb.undo());
    assert_eq!(qb.wire(), full);
    assert!(qb.redo());
    assert!(qb.tree().children(root).is_empty());
    assert!(!qb.redo());
}

#[test]
fn test_history_limit_from_config() {
    let config: qtree::config::Config = serde_json::from_value(sample_config_json()).unwrap();
    let mut qb = config.builder().unwrap();
    let root = qb.root();

    for i in 0..15 {
        qb.add_condition(root, "age", "equals", vec![Value::Number(i)], None)
            .unwrap();
    }

    let mut undone = 0;
    while qb.undo() {
        undone += 1;
    }
    assert_eq!(undone, 10);
    assert_eq!(qb.tree().children(root).len(), 5);
}

#[test]
fn test_sort_spec_against_catalog() {
    let registry = sample_registry();
    let mut sort = SortSpec::new();
    sort.toggle("age");
    sort.toggle("age");
    sort.set("created", SortDirection::Asc);
    sort.set("score", SortDirection::Desc);

    assert_eq!(sort.keys().len(), 3);
    assert_eq!(sort.keys()[0].direction, SortDirection::Desc);
    assert_eq!(
        sort.validate(&registry),
        vec![SortIssue::UnknownField("score".to_string())]
    );

    assert!(sort.remove("score"));
    assert!(sort.validate(&registry).is_empty());
}

// integration tests for the edit command

use crate::common::*;

const EMPTY: &str = r#"{"connective":"AND","negated":false,"children":[]}"#;

#[test]
fn test_edit_script_prints_events_then_result() {
    let config = sample_config();
    let script = r#"[
        { "op": "add_condition", "parent": 0, "field": "status", "operator": "equals", "values": ["active"] },
        { "op": "add_group", "parent": 0, "connective": "OR" },
        { "op": "add_condition", "parent": 2, "field": "age", "operator": "greaterThan", "values": [21] },
        { "op": "apply" }
    ]"#;
    let output = run_qtree(&config.path, &["--json", "edit", EMPTY, "--script", script]);

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 6);

    let types: Vec<&str> = lines[..5]
        .iter()
        .map(|l| l["params"]["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec![
            "filter.ready",
            "filter.changed",
            "filter.changed",
            "filter.changed",
            "filter.applied"
        ]
    );
    assert!(lines[..5].iter().all(|l| l["method"] == "event"));
    assert_eq!(lines[2]["params"]["data"]["isValid"], false);
    assert_eq!(lines[2]["params"]["data"]["issues"][0]["kind"], "EmptyGroup");
    assert_eq!(lines[4]["params"]["seq"], 5);

    let result = &lines[5]["result"];
    assert_eq!(result["valid"], true);
    assert_eq!(result["wireTree"]["children"][1]["connective"], "OR");
}

#[test]
fn test_edit_event_filter() {
    let config = sample_config();
    let script = r#"[
        { "op": "add_condition", "parent": 0, "field": "age", "operator": "equals", "values": [1] },
        { "op": "apply" }
    ]"#;
    let output = run_qtree(
        &config.path,
        &["--json", "edit", EMPTY, "--script", script, "--events", "filter.applied"],
    );

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["params"]["type"], "filter.applied");
}

#[test]
fn test_edit_unknown_event_pattern_is_invalid_args() {
    let config = sample_config();
    let output = run_qtree(
        &config.path,
        &["--json", "edit", EMPTY, "--script", "[]", "--events", "window.*"],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_edit_text_output() {
    let config = sample_config();
    let script = r#"[{ "op": "add_condition", "parent": 0, "field": "age", "operator": "equals", "values": [1] }]"#;
    let output = run_qtree(&config.path, &["--no-json", "edit", EMPTY, "--script", script]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("[1] filter.ready load"));
    assert!(lines[1].starts_with("[2] filter.changed add_condition (valid)"));
    assert_eq!(
        lines[2],
        r#"{"connective":"AND","negated":false,"children":[{"field":"age","operator":"equals","values":[1]}]}"#
    );
}

#[test]
fn test_rejected_intent_exits_edit_rejected() {
    let config = sample_config();
    let script = r#"[
        { "op": "add_condition", "parent": 0, "field": "age", "operator": "equals", "values": [1] },
        { "op": "add_condition", "parent": 0, "field": "agee", "operator": "equals", "values": [2] }
    ]"#;
    let output = run_qtree(&config.path, &["--json", "edit", EMPTY, "--script", script]);

    assert_eq!(output.status.code(), Some(5));
    let lines = json_lines(&output);
    // ready + one change, then the error
    assert_eq!(lines.len(), 3);
    let error = &lines[2]["error"];
    assert_eq!(error["code"], -32005);
    assert!(error["message"].as_str().unwrap().contains("intent 1"));
    assert_eq!(error["data"]["suggestions"], serde_json::json!(["age"]));
    assert_eq!(error["data"]["details"], "UnknownField");
}

#[test]
fn test_apply_of_invalid_tree_is_rejected() {
    let config = sample_config();
    let script = r#"[
        { "op": "add_blank_condition", "parent": 0, "field": "age" },
        { "op": "apply" }
    ]"#;
    let output = run_qtree(&config.path, &["--json", "edit", EMPTY, "--script", script]);

    assert_eq!(output.status.code(), Some(5));
    let lines = json_lines(&output);
    let error = &lines.last().unwrap()["error"];
    assert_eq!(error["data"]["issues"][0]["kind"], "ArityMismatch");
}

#[test]
fn test_edit_undo_redo() {
    let config = sample_config();
    let script = r#"[
        { "op": "add_condition", "parent": 0, "field": "age", "operator": "equals", "values": [1] },
        { "op": "add_condition", "parent": 0, "field": "age", "operator": "equals", "values": [2] },
        { "op": "undo" },
        { "op": "undo" },
        { "op": "redo" },
        { "op": "undo" },
        { "op": "undo" }
    ]"#;
    let output = run_qtree(&config.path, &["--json", "edit", EMPTY, "--script", script]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    // the last undo has nothing left and emits nothing
    assert_eq!(lines.len(), 1 + 6 + 1);
    assert_eq!(
        lines.last().unwrap()["result"]["wireTree"]["children"],
        serde_json::json!([])
    );
}

#[test]
fn test_edit_script_from_stdin() {
    let config = sample_config();
    let script = r#"[{ "op": "set_connective", "group": 0, "connective": "OR" }]"#;
    let output = run_qtree_with_stdin(
        &config.path,
        &["--json", "edit", EMPTY, "--script", "-", "--events", "filter.applied"],
        Some(script),
    );

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(json_output(&output)["result"]["wireTree"]["connective"], "OR");
}

#[test]
fn test_edit_both_inputs_from_stdin() {
    let config = sample_config();
    let output = run_qtree(&config.path, &["--json", "edit", "-", "--script", "-"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_edit_malformed_payload() {
    let config = sample_config();
    let output = run_qtree(&config.path, &["--json", "edit", "[1,2]", "--script", "[]"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_edit_bad_script() {
    let config = sample_config();
    let output = run_qtree(
        &config.path,
        &["--json", "edit", EMPTY, "--script", r#"[{"op":"explode"}]"#],
    );
    assert_eq!(output.status.code(), Some(2));
}

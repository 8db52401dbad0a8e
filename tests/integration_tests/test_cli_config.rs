// integration tests for the config command

use crate::common::*;
use std::fs;

#[test]
fn test_config_path_uses_flag() {
    let config = sample_config();
    let output = run_qtree(&config.path, &["--no-json", "config", "path"]);

    assert!(output.status.success());
    assert_eq!(stdout_of(&output).trim(), config.path.display().to_string());
}

#[test]
fn test_config_path_json() {
    let config = sample_config();
    let output = run_qtree(&config.path, &["--json", "config", "path"]);

    let json = json_output(&output);
    assert_eq!(json["result"]["exists"], true);
}

#[test]
fn test_config_show_roundtrips_settings() {
    let config = sample_config();
    let output = run_qtree(&config.path, &["config", "show"]);

    assert!(output.status.success());
    let shown: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(shown["settings"]["history_limit"], 10);
    // unset settings are filled with defaults
    assert_eq!(shown["settings"]["recent_events"], 100);
    assert_eq!(shown["settings"]["suggestion_distance"], 2);
    assert_eq!(shown["fields"].as_array().unwrap().len(), 5);
}

#[test]
fn test_config_accepts_json5() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            // trailing commas and comments are fine
            fields: [
                { name: "age", type: "number", operators: ["gt", "lt"], },
            ],
        }"#,
    )
    .unwrap();

    let output = run_qtree(&path, &["--json", "fields"]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(json_output(&output)["result"][0]["name"], "age");
}

#[test]
fn test_config_verify_valid() {
    let config = sample_config();
    let output = run_qtree(&config.path, &["--no-json", "config", "verify"]);

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Configuration is valid"));
}

#[test]
fn test_config_verify_reports_every_problem() {
    let config = write_config(&serde_json::json!({
        "fields": [
            { "name": "age", "type": "number", "operators": ["gt", "bogus"] },
            { "name": "age", "type": "text", "operators": [] },
            { "name": "flag", "type": "boolean", "operators": ["eq"], "options": [{ "value": "x" }] }
        ]
    }));
    let output = run_qtree(&config.path, &["--no-json", "config", "verify"]);

    assert_eq!(output.status.code(), Some(6));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("4 error(s)"), "stdout: {}", stdout);
    assert!(stdout.contains("unknown operator 'bogus'"));
    assert!(stdout.contains("duplicate field 'age'"));
    assert!(stdout.contains("declares no operators"));
    assert!(stdout.contains("only apply to enum fields"));
}

#[test]
fn test_invalid_catalog_is_config_error() {
    let config = write_config(&serde_json::json!({
        "fields": [{ "name": "age", "type": "number", "operators": ["bogus"] }]
    }));
    let output = run_qtree(&config.path, &["--json", "fields"]);

    assert_eq!(output.status.code(), Some(6));
    assert_eq!(json_output(&output)["error"]["code"], -32006);
}

#[test]
fn test_missing_explicit_config_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let output = run_qtree(&missing, &["--no-json", "fields"]);

    assert_eq!(output.status.code(), Some(6));
    assert!(stderr_of(&output).contains("not found"));
}

#[test]
fn test_config_schema_write() {
    let config = sample_config();
    let schema_path = config.dir.path().join("schema.json");
    let output = run_qtree(
        &config.path,
        &["config", "schema", "--write", schema_path.to_str().unwrap()],
    );

    assert!(output.status.success());
    let schema: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&schema_path).unwrap()).unwrap();
    assert_eq!(schema["title"], "qtree Configuration");
}

#[test]
fn test_completions_command() {
    let config = sample_config();
    let output = run_qtree(&config.path, &["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("qtree"));
}

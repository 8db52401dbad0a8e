// shared utilities for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::io::Write;
use std::sync::Arc;

use qtree::registry::{FieldDescriptor, FieldRegistry, FieldType};

/// catalog used across the library-level tests
pub fn sample_registry() -> FieldRegistry {
    FieldRegistry::new(vec![
        FieldDescriptor::new("status", FieldType::Enum, &["equals", "notEquals", "in", "nin"])
            .with_label("Status")
            .with_options(&[("active", "Active"), ("inactive", "Inactive")]),
        FieldDescriptor::new("age", FieldType::Number, &["equals", "greaterThan", "lessThan", "between"]),
        FieldDescriptor::new("name", FieldType::Text, &["equals", "starts", "isEmpty"]),
        FieldDescriptor::new("created", FieldType::Date, &["before", "after", "between"]),
        FieldDescriptor::new("verified", FieldType::Boolean, &["eq"]),
    ])
    .expect("sample registry is valid")
}

pub fn sample_registry_arc() -> Arc<FieldRegistry> {
    Arc::new(sample_registry())
}

/// the same catalog as a config document
pub fn sample_config_json() -> serde_json::Value {
    serde_json::json!({
        "fields": [
            {
                "name": "status",
                "label": "Status",
                "type": "enum",
                "operators": ["equals", "notEquals", "in", "nin"],
                "options": [
                    { "value": "active", "label": "Active" },
                    { "value": "inactive", "label": "Inactive" }
                ]
            },
            { "name": "age", "type": "number", "operators": ["equals", "greaterThan", "lessThan", "between"] },
            { "name": "name", "type": "text", "operators": ["equals", "starts", "isEmpty"] },
            { "name": "created", "type": "date", "operators": ["before", "after", "between"] },
            { "name": "verified", "type": "boolean", "operators": ["eq"] }
        ],
        "settings": { "history_limit": 10 }
    })
}

/// temp dir holding a config file; dropped with the dir
pub struct TestConfig {
    pub dir: tempfile::TempDir,
    pub path: PathBuf,
}

pub fn write_config(content: &serde_json::Value) -> TestConfig {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, serde_json::to_string_pretty(content).unwrap())
        .expect("Failed to write test config");
    TestConfig { dir, path }
}

pub fn sample_config() -> TestConfig {
    write_config(&sample_config_json())
}

pub fn qtree_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qtree"))
}

/// run qtree with a config file; the QTREE_CONFIG env var is cleared so the
/// host environment cannot leak in
pub fn run_qtree(config: &Path, args: &[&str]) -> Output {
    run_qtree_with_stdin(config, args, None)
}

pub fn run_qtree_with_stdin(config: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let mut cmd = Command::new(qtree_binary_path());
    cmd.arg("--config")
        .arg(config)
        .args(args)
        .env_remove("QTREE_CONFIG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().expect("Failed to execute qtree");
    if let Some(input) = stdin {
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");
    } else {
        drop(child.stdin.take());
    }
    child.wait_with_output().expect("Failed to wait for qtree")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// parse every stdout line as JSON
pub fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    stdout_of(output)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {}: {}", l, e)))
        .collect()
}

/// the single JSON-RPC document printed on stdout
pub fn json_output(output: &Output) -> serde_json::Value {
    let mut lines = json_lines(output);
    assert_eq!(lines.len(), 1, "expected one JSON line, got: {}", stdout_of(output));
    lines.remove(0)
}

//! output formatting for scriptable CLI output
//!
//! uses JSON-RPC 2.0 format for machine-readable output:
//! - success: {"jsonrpc": "2.0", "result": {...}, "id": null}
//! - error: {"jsonrpc": "2.0", "error": {"code": N, "message": "...", "data": {...}}, "id": null}
//! - events: {"jsonrpc": "2.0", "method": "event", "params": {...}}

use serde::Serialize;
use std::io::IsTerminal;

use crate::registry::FieldDescriptor;
use crate::tree::{NodeId, Tree};
use crate::validate::{Issue, IssueKind, ValidationResult};
use crate::wire::WireGroup;

/// JSON-RPC version constant
const JSONRPC_VERSION: &str = "2.0";

/// output mode determines how results are formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// human-readable text output
    Text,
    /// machine-readable JSON-RPC 2.0 output
    Json,
    /// no output on success (errors still go to stderr)
    Quiet,
}

impl OutputMode {
    /// determine output mode from CLI flags and environment
    ///
    /// priority: quiet > json > no_json > auto-detect
    pub fn from_flags(json: bool, no_json: bool, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        if json {
            return Self::Json;
        }
        if no_json {
            return Self::Text;
        }
        // auto-detect: JSON when stdout is not a TTY (piped)
        if !std::io::stdout().is_terminal() {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }
}

/// JSON-RPC 2.0 success response
#[derive(Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub result: T,
    /// null for CLI responses (no request id)
    pub id: Option<String>,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result,
            id: None,
        }
    }
}

/// JSON-RPC 2.0 error response
#[derive(Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    pub error: RpcError,
    pub id: Option<String>,
}

/// JSON-RPC 2.0 error object
#[derive(Serialize)]
pub struct RpcError {
    /// error code (qtree exit codes, offset by -32000 for app-specific errors)
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// additional error data
#[derive(Serialize, Default)]
pub struct ErrorData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<IssueData>>,
}

impl JsonRpcError {
    /// create error with standard JSON-RPC error code range
    /// qtree uses -32000 to -32099 for application errors (per JSON-RPC spec)
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            error: RpcError {
                code: to_jsonrpc_code(code),
                message: message.into(),
                data: None,
            },
            id: None,
        }
    }

    pub fn with_data(mut self, data: ErrorData) -> Self {
        self.error.data = Some(data);
        self
    }
}

/// convert qtree exit code to JSON-RPC error code
/// JSON-RPC reserves -32000 to -32099 for server/application errors
fn to_jsonrpc_code(code: i32) -> i32 {
    -32000 - code
}

// ============================================================================
// Result data structures
// ============================================================================

/// one validation issue, with enough context to show it to a user
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueData {
    pub node_id: NodeId,
    pub kind: IssueKind,
    pub message: String,
    /// the condition as text, absent for groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl IssueData {
    pub fn from_issue(issue: &Issue, tree: &Tree) -> Self {
        Self {
            node_id: issue.node_id,
            kind: issue.kind,
            message: issue.kind.description().to_string(),
            node: tree.condition(issue.node_id).map(|c| c.to_string()),
        }
    }

    pub fn collect(result: &ValidationResult, tree: &Tree) -> Vec<Self> {
        result
            .issues
            .iter()
            .map(|issue| Self::from_issue(issue, tree))
            .collect()
    }
}

/// result of `validate` and `edit`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterData {
    pub valid: bool,
    pub complete: bool,
    pub issues: Vec<IssueData>,
    pub wire_tree: WireGroup,
}

/// result of `fields`
#[derive(Serialize)]
pub struct FieldData<'a> {
    #[serde(flatten)]
    pub field: &'a FieldDescriptor,
    pub display_label: &'a str,
}

// ============================================================================
// Output functions
// ============================================================================

/// print JSON-RPC success response to stdout
pub fn print_json<T: Serialize>(data: &T) {
    let response = JsonRpcResponse::new(data);
    if let Ok(json) = serde_json::to_string(&response) {
        println!("{}", json);
    }
}

/// print JSON-RPC error to stdout
pub fn print_json_error(code: i32, message: &str) {
    print_json_error_with_data(code, message, ErrorData::default());
}

/// print JSON-RPC error with structured data
pub fn print_json_error_with_data(code: i32, message: &str, data: ErrorData) {
    let is_empty = data.suggestions.is_none() && data.details.is_none() && data.issues.is_none();
    let mut error = JsonRpcError::new(code, message);
    if !is_empty {
        error = error.with_data(data);
    }
    if let Ok(json) = serde_json::to_string(&error) {
        println!("{}", json);
    }
}

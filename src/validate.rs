//! validation engine
//!
//! full-tree, side-effect-free check of a tree against the field registry.
//! issues are ordinary data, not errors: an in-progress tree is allowed to be
//! invalid while the user keeps editing it.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::registry::{FieldDescriptor, FieldRegistry, FieldType, OperatorDescriptor, ValueShape};
use crate::tree::{Condition, Node, NodeId, Tree, Value};

/// kind of validity problem found at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    /// a group without children
    EmptyGroup,
    /// the operator is not in the field's operator set
    InvalidOperatorForField,
    /// the values do not match the operator's arity or shape
    ArityMismatch,
    /// the field is no longer in the registry
    UnknownFieldReference,
    /// a value does not fit the field's declared type or options
    InvalidValue,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::EmptyGroup => "EmptyGroup",
            IssueKind::InvalidOperatorForField => "InvalidOperatorForField",
            IssueKind::ArityMismatch => "ArityMismatch",
            IssueKind::UnknownFieldReference => "UnknownFieldReference",
            IssueKind::InvalidValue => "InvalidValue",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IssueKind::EmptyGroup => "group has no conditions",
            IssueKind::InvalidOperatorForField => "operator is not available for this field",
            IssueKind::ArityMismatch => "values do not match the operator",
            IssueKind::UnknownFieldReference => "field no longer exists, select another field",
            IssueKind::InvalidValue => "value does not match the field type",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// a single problem, keyed by the offending node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub node_id: NodeId,
    pub kind: IssueKind,
}

/// outcome of validating a whole tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub ok: bool,
    /// issues in pre-order of the nodes they concern
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn issues_for(&self, node: NodeId) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.node_id == node)
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }
}

/// validate every node of `tree` against `registry`
pub fn validate(tree: &Tree, registry: &FieldRegistry) -> ValidationResult {
    let mut issues = Vec::new();

    for id in tree.walk() {
        let kind = match tree.get(id) {
            Some(Node::Group(group)) if group.children.is_empty() => Some(IssueKind::EmptyGroup),
            Some(Node::Condition(condition)) => check_condition(condition, registry),
            _ => None,
        };
        if let Some(kind) = kind {
            issues.push(Issue { node_id: id, kind });
        }
    }

    ValidationResult {
        ok: issues.is_empty(),
        issues,
    }
}

/// at most one issue per condition, the most fundamental one first
fn check_condition(condition: &Condition, registry: &FieldRegistry) -> Option<IssueKind> {
    let Some(field) = registry.describe(&condition.field) else {
        return Some(IssueKind::UnknownFieldReference);
    };

    let op = match registry.operator(&condition.operator) {
        Some(op) if field.allows(&condition.operator) => op,
        _ => return Some(IssueKind::InvalidOperatorForField),
    };

    if !values_fit(op, Some(field.field_type), &condition.values) {
        return Some(IssueKind::ArityMismatch);
    }

    if condition.values.iter().any(|v| !value_fits_field(field, v)) {
        return Some(IssueKind::InvalidValue);
    }

    None
}

/// check value count against the operator's shape, and bound order for
/// ranges over orderable types
///
/// bounds that cannot be compared (wrong types) are left to the value check
pub fn values_fit(op: &OperatorDescriptor, field_type: Option<FieldType>, values: &[Value]) -> bool {
    if !op.accepts_count(values.len()) {
        return false;
    }

    if op.shape == ValueShape::Range {
        if let Some(field_type) = field_type.filter(FieldType::is_orderable) {
            if compare_values(field_type, &values[0], &values[1]) == Some(Ordering::Greater) {
                return false;
            }
        }
    }

    true
}

/// check one value against the field's declared type
pub fn value_fits_field(field: &FieldDescriptor, value: &Value) -> bool {
    match (field.field_type, value) {
        (_, Value::Null) => false,
        (FieldType::Number, Value::Number(_) | Value::UInt(_)) => true,
        (FieldType::Number, Value::Float(f)) => f.is_finite(),
        (FieldType::Boolean, Value::Bool(_)) => true,
        (FieldType::Date, Value::String(s)) => parse_date(s).is_some(),
        (FieldType::Text, Value::String(_)) => true,
        (FieldType::Reference, Value::String(_) | Value::Number(_) | Value::UInt(_)) => true,
        (FieldType::Enum, Value::String(s)) => {
            field.options.is_empty() || field.options.iter().any(|o| &o.value == s)
        }
        _ => false,
    }
}

fn compare_values(field_type: FieldType, a: &Value, b: &Value) -> Option<Ordering> {
    match field_type {
        FieldType::Number => a.as_f64()?.partial_cmp(&b.as_f64()?),
        FieldType::Date => {
            let a = parse_date(a.as_str()?)?;
            let b = parse_date(b.as_str()?)?;
            Some(a.cmp(&b))
        }
        _ => None,
    }
}

/// parse an ISO-8601 date or date-time; offsets are normalised to UTC
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

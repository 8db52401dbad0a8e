//! legacy flat filter format
//!
//! older clients exchange filters as base64-encoded JSON arrays of
//! `{ "key", "comparator", "value" }` rules, implicitly ANDed. values are
//! strings (or arrays of strings) and get coerced through the field's type
//! on the way in. only flat AND trees can be written back.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::registry::{FieldRegistry, FieldType, OperatorId};
use crate::tree::{Connective, Node, Tree, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegacyError {
    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("rule {index}: {message}")]
    Rule { index: usize, message: String },

    #[error("filter cannot be expressed as a flat rule list: {0}")]
    NotFlat(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LegacyRule {
    key: String,
    comparator: String,
    #[serde(default)]
    value: JsonValue,
}

/// decode a base64 legacy filter into a flat AND tree
///
/// like wire hydration, unknown keys and comparators load and are left to
/// validation; only broken encodings fail
pub fn decode(encoded: &str, registry: &FieldRegistry) -> Result<Tree, LegacyError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| LegacyError::Base64(e.to_string()))?;
    let rules: Vec<LegacyRule> =
        serde_json::from_slice(&bytes).map_err(|e| LegacyError::Json(e.to_string()))?;

    let mut tree = Tree::new();
    let root = tree.root();
    for (index, rule) in rules.into_iter().enumerate() {
        let field_type = registry.describe(&rule.key).map(|f| f.field_type);
        let values = rule_values(&rule.value, field_type)
            .map_err(|message| LegacyError::Rule { index, message })?;
        tree.push_condition(root, rule.key, OperatorId::from(rule.comparator), values);
    }

    log::debug!("decoded legacy filter with {} rules", tree.children(root).len());
    Ok(tree)
}

/// encode a flat AND tree in the legacy format
pub fn encode(tree: &Tree) -> Result<String, LegacyError> {
    let root = tree.root_group();
    if root.connective != Connective::And {
        return Err(LegacyError::NotFlat("root combines with OR".to_string()));
    }

    let mut rules = Vec::with_capacity(root.children.len());
    for child in &root.children {
        match tree.get(*child) {
            Some(Node::Condition(c)) => rules.push(LegacyRule {
                key: c.field.clone(),
                comparator: c.operator.to_string(),
                value: legacy_value(&c.values),
            }),
            _ => return Err(LegacyError::NotFlat("filter contains nested groups".to_string())),
        }
    }

    let json = serde_json::to_vec(&rules).map_err(|e| LegacyError::Json(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

fn rule_values(value: &JsonValue, field_type: Option<FieldType>) -> Result<Vec<Value>, String> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::String(s) if s.is_empty() => Ok(Vec::new()),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| scalar(item, field_type))
            .collect(),
        other => Ok(vec![scalar(other, field_type)?]),
    }
}

fn scalar(json: &JsonValue, field_type: Option<FieldType>) -> Result<Value, String> {
    match json {
        JsonValue::String(s) => Ok(coerce(s, field_type)),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            Err("value must be a string or a list of strings".to_string())
        }
        other => Value::from_json(other).ok_or_else(|| "unsupported value".to_string()),
    }
}

fn coerce(raw: &str, field_type: Option<FieldType>) -> Value {
    match field_type {
        Some(FieldType::Number) => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::Number(n)
            } else if let Ok(n) = raw.parse::<u64>() {
                Value::UInt(n)
            } else {
                // "NaN" and "inf" parse as floats but have no wire form
                match raw.parse::<f64>() {
                    Ok(f) if f.is_finite() => Value::Float(f),
                    _ => Value::from(raw),
                }
            }
        }
        Some(FieldType::Boolean) => match raw {
            "1" | "true" => Value::Bool(true),
            "0" | "false" => Value::Bool(false),
            _ => Value::from(raw),
        },
        _ => Value::from(raw),
    }
}

fn legacy_value(values: &[Value]) -> JsonValue {
    match values {
        [] => JsonValue::String(String::new()),
        [single] => JsonValue::String(legacy_scalar(single)),
        many => JsonValue::Array(
            many.iter()
                .map(|v| JsonValue::String(legacy_scalar(v)))
                .collect(),
        ),
    }
}

fn legacy_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => s.clone(),
    }
}

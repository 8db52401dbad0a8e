//! canonical wire format
//!
//! ```text
//! Group     := { "connective": "AND"|"OR", "negated": bool, "children": [ Group|Condition, ... ] }
//! Condition := { "field": string, "operator": string, "values": [ scalar, ... ] }
//! ```
//!
//! serialization is total and does not require a complete tree. hydration
//! rejects structurally broken payloads outright and accepts everything else,
//! unknown fields and mismatched operators included, leaving those to
//! validation. node ids are not part of the format.

pub mod legacy;
mod parser;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::registry::OperatorId;
use crate::tree::{Connective, Node, NodeId, Tree, Value};

pub use crate::tree::MAX_DEPTH;
pub use parser::{deserialize, from_str};

/// payload could not be hydrated into a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("malformed payload at {path}: {message}")]
    MalformedPayload { path: String, message: String },
}

impl WireError {
    pub fn malformed(message: impl Into<String>, path: impl Into<String>) -> Self {
        WireError::MalformedPayload {
            message: message.into(),
            path: path.into(),
        }
    }

    /// location of the problem, `$` is the root
    pub fn path(&self) -> &str {
        match self {
            WireError::MalformedPayload { path, .. } => path,
        }
    }
}

/// a group on the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireGroup {
    pub connective: Connective,
    pub negated: bool,
    pub children: Vec<WireNode>,
}

/// a condition on the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireCondition {
    pub field: String,
    pub operator: OperatorId,
    pub values: Vec<Value>,
}

/// either node shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireNode {
    Group(WireGroup),
    Condition(WireCondition),
}

impl WireGroup {
    pub fn to_json(&self) -> JsonValue {
        json!({
            "connective": self.connective.as_str(),
            "negated": self.negated,
            "children": self.children.iter().map(WireNode::to_json).collect::<Vec<_>>(),
        })
    }

    /// compact canonical JSON text
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

impl WireNode {
    pub fn to_json(&self) -> JsonValue {
        match self {
            WireNode::Group(group) => group.to_json(),
            WireNode::Condition(condition) => json!({
                "field": condition.field,
                "operator": condition.operator.as_str(),
                "values": condition.values.iter().map(Value::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

/// serialize a tree to its wire form
pub fn serialize(tree: &Tree) -> WireGroup {
    let root = tree.root_group();
    WireGroup {
        connective: root.connective,
        negated: false,
        children: serialize_children(tree, tree.root()),
    }
}

fn serialize_children(tree: &Tree, group: NodeId) -> Vec<WireNode> {
    tree.children(group)
        .iter()
        .filter_map(|child| match tree.get(*child)? {
            Node::Group(g) => Some(WireNode::Group(WireGroup {
                connective: g.connective,
                negated: g.negated,
                children: serialize_children(tree, g.id),
            })),
            Node::Condition(c) => Some(WireNode::Condition(WireCondition {
                field: c.field.clone(),
                operator: c.operator.clone(),
                values: c.values.clone(),
            })),
        })
        .collect()
}

/// serialize a tree straight to compact JSON text
pub fn to_string(tree: &Tree) -> String {
    serialize(tree).to_json_string()
}

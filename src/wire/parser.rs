//! payload parser - hydrates a tree from the wire format
//!
//! structural problems (wrong JSON types, missing keys, a node that is
//! neither shape) fail the whole load. registry problems do not: a payload
//! saved against an older field catalog still loads and is flagged by
//! validation instead. unknown keys are ignored.

use serde_json::{Map, Value as JsonValue};

use crate::registry::OperatorId;
use crate::tree::{Connective, NodeId, Tree, Value, MAX_DEPTH};

use super::WireError;

type JsonObject = Map<String, JsonValue>;

/// hydrate a tree from a JSON payload
///
/// ids are assigned in pre-order, starting with the root
pub fn deserialize(json: &JsonValue) -> Result<Tree, WireError> {
    let root = json
        .as_object()
        .ok_or_else(|| WireError::malformed(format!("expected object, got {}", type_name(json)), "$"))?;

    if !root.contains_key("children") {
        return Err(WireError::malformed("root payload must be a group", "$"));
    }

    let (connective, negated) = parse_group_flags(root, "$")?;
    if negated {
        return Err(WireError::malformed("root group cannot be negated", "$"));
    }

    let mut tree = Tree::with_root(connective);
    let parent = tree.root();
    parse_children(root, &mut tree, parent, "$", 0)?;

    log::debug!("hydrated tree with {} nodes", tree.len());
    Ok(tree)
}

/// hydrate a tree from JSON text
pub fn from_str(payload: &str) -> Result<Tree, WireError> {
    let json: JsonValue = serde_json::from_str(payload)
        .map_err(|e| WireError::malformed(format!("invalid JSON: {}", e), "$"))?;
    deserialize(&json)
}

fn parse_node(
    json: &JsonValue,
    tree: &mut Tree,
    parent: NodeId,
    path: &str,
    depth: usize,
) -> Result<(), WireError> {
    let obj = json.as_object().ok_or_else(|| {
        WireError::malformed(format!("expected object, got {}", type_name(json)), path)
    })?;

    match (obj.contains_key("children"), obj.contains_key("field")) {
        (true, true) => Err(WireError::malformed(
            "node has both 'children' and 'field'",
            path,
        )),
        (true, false) => {
            if depth >= MAX_DEPTH {
                return Err(WireError::malformed(
                    format!("groups nested deeper than {}", MAX_DEPTH),
                    path,
                ));
            }
            let (connective, negated) = parse_group_flags(obj, path)?;
            let group = tree.push_group(parent, connective, negated);
            parse_children(obj, tree, group, path, depth + 1)
        }
        (false, true) => parse_condition(obj, tree, parent, path),
        (false, false) => Err(WireError::malformed(
            "node is neither a group nor a condition",
            path,
        )),
    }
}

fn parse_group_flags(obj: &JsonObject, path: &str) -> Result<(Connective, bool), WireError> {
    let connective = match obj.get("connective") {
        Some(JsonValue::String(s)) => Connective::parse(s).ok_or_else(|| {
            WireError::malformed(format!("unknown connective: '{}'", s), path)
        })?,
        Some(other) => {
            return Err(WireError::malformed(
                format!("'connective' must be a string, got {}", type_name(other)),
                path,
            ))
        }
        None => return Err(WireError::malformed("group is missing 'connective'", path)),
    };

    // older payloads omit the flag on plain groups
    let negated = match obj.get("negated") {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(other) => {
            return Err(WireError::malformed(
                format!("'negated' must be a boolean, got {}", type_name(other)),
                path,
            ))
        }
    };

    Ok((connective, negated))
}

fn parse_children(
    obj: &JsonObject,
    tree: &mut Tree,
    group: NodeId,
    path: &str,
    depth: usize,
) -> Result<(), WireError> {
    let children = obj
        .get("children")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| WireError::malformed("'children' must be an array", path))?;

    for (i, child) in children.iter().enumerate() {
        let child_path = format!("{}.children[{}]", path, i);
        parse_node(child, tree, group, &child_path, depth)?;
    }
    Ok(())
}

fn parse_condition(
    obj: &JsonObject,
    tree: &mut Tree,
    parent: NodeId,
    path: &str,
) -> Result<(), WireError> {
    let field = require_str(obj, "field", path)?;
    let operator = require_str(obj, "operator", path)?;

    let values = match obj.get("values") {
        Some(JsonValue::Array(arr)) => parse_values(arr, path)?,
        Some(other) => {
            return Err(WireError::malformed(
                format!("'values' must be an array, got {}", type_name(other)),
                path,
            ))
        }
        None => return Err(WireError::malformed("condition is missing 'values'", path)),
    };

    tree.push_condition(parent, field.to_string(), OperatorId::from(operator), values);
    Ok(())
}

fn require_str<'a>(obj: &'a JsonObject, key: &str, path: &str) -> Result<&'a str, WireError> {
    match obj.get(key) {
        Some(JsonValue::String(s)) => Ok(s),
        Some(other) => Err(WireError::malformed(
            format!("'{}' must be a string, got {}", key, type_name(other)),
            path,
        )),
        None => Err(WireError::malformed(
            format!("condition is missing '{}'", key),
            path,
        )),
    }
}

fn parse_values(arr: &[JsonValue], path: &str) -> Result<Vec<Value>, WireError> {
    arr.iter()
        .enumerate()
        .map(|(i, v)| {
            Value::from_json(v).ok_or_else(|| {
                WireError::malformed(
                    format!("values must be scalars, got {}", type_name(v)),
                    format!("{}.values[{}]", path, i),
                )
            })
        })
        .collect()
}

fn type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

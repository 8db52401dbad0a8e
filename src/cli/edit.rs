//! edit scripts: JSON lists of builder intents, replayed against a session
//!
//! ```json
//! [
//!   { "op": "add_group", "parent": 0, "connective": "OR" },
//!   { "op": "add_condition", "parent": 3, "field": "age", "operator": "gt", "values": [18] },
//!   { "op": "undo" }
//! ]
//! ```

use serde::Deserialize;

use crate::builder::{BuilderError, QueryBuilder};
use crate::registry::OperatorId;
use crate::tree::{Connective, NodeId, Value};

/// one user intent, mirroring the builder's operations
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditIntent {
    AddCondition {
        parent: NodeId,
        field: String,
        operator: OperatorId,
        #[serde(default)]
        values: Vec<Value>,
        #[serde(default)]
        at: Option<usize>,
    },
    AddBlankCondition {
        parent: NodeId,
        field: String,
        #[serde(default)]
        at: Option<usize>,
    },
    AddGroup {
        parent: NodeId,
        #[serde(default)]
        connective: Connective,
        #[serde(default)]
        at: Option<usize>,
    },
    RemoveNode {
        id: NodeId,
    },
    MoveNode {
        id: NodeId,
        parent: NodeId,
        at: usize,
    },
    SetConnective {
        group: NodeId,
        connective: Connective,
    },
    SetNegated {
        group: NodeId,
        negated: bool,
    },
    SetOperator {
        condition: NodeId,
        operator: OperatorId,
    },
    SetValues {
        condition: NodeId,
        values: Vec<Value>,
    },
    SetField {
        condition: NodeId,
        field: String,
    },
    Clear,
    Reset,
    Undo,
    Redo,
    Apply,
}

impl EditIntent {
    pub fn name(&self) -> &'static str {
        match self {
            EditIntent::AddCondition { .. } => "add_condition",
            EditIntent::AddBlankCondition { .. } => "add_blank_condition",
            EditIntent::AddGroup { .. } => "add_group",
            EditIntent::RemoveNode { .. } => "remove_node",
            EditIntent::MoveNode { .. } => "move_node",
            EditIntent::SetConnective { .. } => "set_connective",
            EditIntent::SetNegated { .. } => "set_negated",
            EditIntent::SetOperator { .. } => "set_operator",
            EditIntent::SetValues { .. } => "set_values",
            EditIntent::SetField { .. } => "set_field",
            EditIntent::Clear => "clear",
            EditIntent::Reset => "reset",
            EditIntent::Undo => "undo",
            EditIntent::Redo => "redo",
            EditIntent::Apply => "apply",
        }
    }
}

/// parse a script: a JSON array of intents
pub fn parse_script(text: &str) -> Result<Vec<EditIntent>, serde_json::Error> {
    serde_json::from_str(text)
}

/// run one intent against the session
///
/// undo/redo with nothing to do are not failures, they just emit nothing
pub fn apply_intent(qb: &mut QueryBuilder, intent: EditIntent) -> Result<(), BuilderError> {
    match intent {
        EditIntent::AddCondition {
            parent,
            field,
            operator,
            values,
            at,
        } => {
            qb.add_condition(parent, &field, operator, values, at)?;
        }
        EditIntent::AddBlankCondition { parent, field, at } => {
            qb.add_blank_condition(parent, &field, at)?;
        }
        EditIntent::AddGroup {
            parent,
            connective,
            at,
        } => {
            qb.add_group(parent, connective, at)?;
        }
        EditIntent::RemoveNode { id } => {
            qb.remove_node(id)?;
        }
        EditIntent::MoveNode { id, parent, at } => qb.move_node(id, parent, at)?,
        EditIntent::SetConnective { group, connective } => qb.set_connective(group, connective)?,
        EditIntent::SetNegated { group, negated } => qb.set_negated(group, negated)?,
        EditIntent::SetOperator {
            condition,
            operator,
        } => {
            qb.set_operator(condition, operator)?;
        }
        EditIntent::SetValues { condition, values } => qb.set_values(condition, values)?,
        EditIntent::SetField { condition, field } => qb.set_field(condition, &field)?,
        EditIntent::Clear => {
            qb.clear();
        }
        EditIntent::Reset => qb.reset(),
        EditIntent::Undo => {
            qb.undo();
        }
        EditIntent::Redo => {
            qb.redo();
        }
        EditIntent::Apply => {
            qb.apply()?;
        }
    }
    Ok(())
}

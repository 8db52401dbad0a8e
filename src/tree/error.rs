//! contract errors of tree mutations

use thiserror::Error;

use super::types::NodeId;

/// a rejected mutation; the tree is left untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown group {0}")]
    UnknownGroup(NodeId),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("unknown condition {0}")]
    UnknownCondition(NodeId),

    #[error("unknown field '{field}'")]
    UnknownField {
        field: String,
        suggestions: Vec<String>,
    },

    #[error("operator '{operator}' is not valid for field '{field}'")]
    OperatorMismatch { field: String, operator: String },

    #[error("operator '{operator}' expects {expected} value(s), got {got}")]
    ArityMismatch {
        operator: String,
        expected: String,
        got: usize,
    },

    #[error("index {index} is out of bounds for a group with {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("the root group cannot be removed")]
    CannotRemoveRoot,

    #[error("the root group cannot be moved")]
    CannotMoveRoot,

    #[error("the root group cannot be negated")]
    CannotNegateRoot,

    #[error("cannot move {node} into {target}: target is the node itself or one of its descendants")]
    CyclicMove { node: NodeId, target: NodeId },

    #[error("groups cannot nest deeper than {max} levels (would reach {depth})")]
    TooDeep { depth: usize, max: usize },
}

impl TreeError {
    /// "did you mean" candidates, if any
    pub fn suggestions(&self) -> &[String] {
        match self {
            TreeError::UnknownField { suggestions, .. } => suggestions,
            _ => &[],
        }
    }

    /// stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            TreeError::UnknownGroup(_) => "UnknownGroup",
            TreeError::UnknownNode(_) => "UnknownNode",
            TreeError::UnknownCondition(_) => "UnknownCondition",
            TreeError::UnknownField { .. } => "UnknownField",
            TreeError::OperatorMismatch { .. } => "OperatorMismatch",
            TreeError::ArityMismatch { .. } => "ArityMismatch",
            TreeError::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            TreeError::CannotRemoveRoot => "CannotRemoveRoot",
            TreeError::CannotMoveRoot => "CannotMoveRoot",
            TreeError::CannotNegateRoot => "CannotNegateRoot",
            TreeError::CyclicMove { .. } => "CyclicMoveError",
            TreeError::TooDeep { .. } => "TooDeep",
        }
    }
}

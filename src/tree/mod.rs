//! expression tree model
//!
//! the recursive group/condition structure behind a filter:
//! - groups combine ordered children with AND/OR and may be negated
//! - conditions bind a field, an operator and zero or more values
//! - exactly one root group, never removed, never negated
//!
//! mutations are all-or-nothing: a `TreeError` means nothing changed.

mod error;
mod model;
mod types;

pub use error::TreeError;
pub use model::Tree;
pub use types::{Condition, Connective, Group, Node, NodeId, Value};

/// deepest group nesting level, counting the root as 0
pub const MAX_DEPTH: usize = 32;

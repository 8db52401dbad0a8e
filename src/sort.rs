//! sort keys that travel next to a filter
//!
//! wire form: `[{ "field": "created", "direction": "DESC" }, ...]`,
//! most significant key first.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::FieldRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// problem found in a sort spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field")]
pub enum SortIssue {
    UnknownField(String),
    DuplicateField(String),
}

impl fmt::Display for SortIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortIssue::UnknownField(field) => write!(f, "unknown sort field '{}'", field),
            SortIssue::DuplicateField(field) => write!(f, "field '{}' is sorted twice", field),
        }
    }
}

/// ordered list of sort keys
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// sort by `field`, replacing an existing key for it in place
    pub fn set(&mut self, field: &str, direction: SortDirection) {
        match self.keys.iter_mut().find(|k| k.field == field) {
            Some(key) => key.direction = direction,
            None => self.keys.push(SortKey {
                field: field.to_string(),
                direction,
            }),
        }
    }

    /// flip the direction of `field`, adding it ascending if absent
    pub fn toggle(&mut self, field: &str) {
        let direction = self
            .keys
            .iter()
            .find(|k| k.field == field)
            .map(|k| k.direction.reversed())
            .unwrap_or_default();
        self.set(field, direction);
    }

    /// returns false if `field` was not sorted
    pub fn remove(&mut self, field: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k.field != field);
        self.keys.len() != before
    }

    pub fn validate(&self, registry: &FieldRegistry) -> Vec<SortIssue> {
        let mut seen = HashSet::new();
        let mut issues = Vec::new();
        for key in &self.keys {
            if !seen.insert(key.field.as_str()) {
                issues.push(SortIssue::DuplicateField(key.field.clone()));
            } else if registry.describe(&key.field).is_none() {
                issues.push(SortIssue::UnknownField(key.field.clone()));
            }
        }
        issues
    }
}

impl From<Vec<SortKey>> for SortSpec {
    fn from(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }
}

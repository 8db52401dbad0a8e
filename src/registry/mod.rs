//! field registry: the read-only catalog of filterable fields
//!
//! maps a field name to its declared type and the ordered set of operators
//! that may be applied to it. built once, before any tree operation, then
//! shared (typically behind an `Arc`) for concurrent reads.

mod catalog;
mod types;

use std::collections::HashMap;

use strsim::levenshtein;
use thiserror::Error;

pub use catalog::builtin_operators;
pub use types::{EnumOption, FieldDescriptor, FieldType, OperatorDescriptor, OperatorId, ValueShape};

/// default maximum edit distance for "did you mean" suggestions
pub const DEFAULT_SUGGESTION_DISTANCE: usize = 2;

/// errors raised while building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    #[error("field '{0}' declares no operators")]
    EmptyOperatorSet(String),

    #[error("field '{field}' uses unknown operator '{operator}'")]
    UnknownOperator { field: String, operator: String },

    #[error("duplicate operator '{0}'")]
    DuplicateOperator(String),

    #[error("operator '{operator}': {reason}")]
    InvalidOperatorShape { operator: String, reason: String },
}

/// read-only lookup of field name -> descriptor -> operators
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
    field_index: HashMap<String, usize>,
    operators: Vec<OperatorDescriptor>,
    operator_index: HashMap<OperatorId, usize>,
    suggestion_distance: usize,
}

impl FieldRegistry {
    /// build a registry over the built-in operator catalog
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, RegistryError> {
        Self::with_operators(fields, Vec::new())
    }

    /// build a registry with extra operators on top of the built-in catalog
    ///
    /// an extra operator with the same id as a built-in one replaces it;
    /// two extra operators sharing an id is an error
    pub fn with_operators(
        fields: Vec<FieldDescriptor>,
        extra_operators: Vec<OperatorDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut operators = builtin_operators();
        let mut operator_index: HashMap<OperatorId, usize> = operators
            .iter()
            .enumerate()
            .map(|(i, op)| (op.id.clone(), i))
            .collect();

        let mut seen_extra = Vec::new();
        for op in extra_operators {
            if seen_extra.contains(&op.id) {
                return Err(RegistryError::DuplicateOperator(op.id.to_string()));
            }
            seen_extra.push(op.id.clone());
            op.check_shape()
                .map_err(|reason| RegistryError::InvalidOperatorShape {
                    operator: op.id.to_string(),
                    reason,
                })?;

            match operator_index.get(&op.id) {
                Some(&i) => operators[i] = op,
                None => {
                    operator_index.insert(op.id.clone(), operators.len());
                    operators.push(op);
                }
            }
        }

        let mut field_index = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            if field_index.insert(field.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateField(field.name.clone()));
            }
            if field.operators.is_empty() {
                return Err(RegistryError::EmptyOperatorSet(field.name.clone()));
            }
            if let Some(op) = field
                .operators
                .iter()
                .find(|op| !operator_index.contains_key(*op))
            {
                return Err(RegistryError::UnknownOperator {
                    field: field.name.clone(),
                    operator: op.to_string(),
                });
            }
        }

        log::debug!(
            "field registry built: {} fields, {} operators",
            fields.len(),
            operators.len()
        );

        Ok(Self {
            fields,
            field_index,
            operators,
            operator_index,
            suggestion_distance: DEFAULT_SUGGESTION_DISTANCE,
        })
    }

    /// set the maximum edit distance used by `suggest`
    pub fn with_suggestion_distance(mut self, distance: usize) -> Self {
        self.suggestion_distance = distance;
        self
    }

    /// look up a field by name
    pub fn describe(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    /// look up an operator in the catalog
    pub fn operator(&self, id: &OperatorId) -> Option<&OperatorDescriptor> {
        self.operator_index.get(id).map(|&i| &self.operators[i])
    }

    /// operators valid for a field, in the field's declared order
    ///
    /// empty when the field is unknown
    pub fn operators_for(&self, name: &str) -> Vec<&OperatorDescriptor> {
        match self.describe(name) {
            Some(field) => field
                .operators
                .iter()
                .filter_map(|id| self.operator(id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_operator_valid(&self, name: &str, operator: &OperatorId) -> bool {
        self.describe(name)
            .map(|field| field.allows(operator))
            .unwrap_or(false)
    }

    /// all fields, in catalog order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// the full operator catalog, built-ins first
    pub fn all_operators(&self) -> &[OperatorDescriptor] {
        &self.operators
    }

    /// field names close to `name`, nearest first
    pub fn suggest(&self, name: &str) -> Vec<String> {
        let query = name.to_lowercase();
        let mut scored: Vec<(usize, &str)> = self
            .fields
            .iter()
            .map(|f| (levenshtein(&query, &f.name.to_lowercase()), f.name.as_str()))
            .filter(|(distance, _)| *distance <= self.suggestion_distance)
            .collect();

        scored.sort_by_key(|(distance, _)| *distance);
        scored.into_iter().map(|(_, n)| n.to_string()).collect()
    }
}

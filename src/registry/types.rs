//! core types for the field registry

use std::fmt;

use serde::{Deserialize, Serialize};

/// declared type of a field, governs operators and value editors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    #[serde(alias = "bool")]
    Boolean,
    Enum,
    Reference,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Enum => "enum",
            FieldType::Reference => "reference",
        }
    }

    /// types whose values have a natural order (range operators check it)
    pub fn is_orderable(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// operator identifier as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(String);

impl OperatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OperatorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OperatorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// how an operator's values are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueShape {
    /// exactly `arity` values (0 or 1)
    Scalar,
    /// one or more values (set membership)
    List,
    /// exactly two values, lower bound first
    Range,
}

/// an operator from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDescriptor {
    pub id: OperatorId,
    #[serde(default)]
    pub label: String,
    pub arity: u8,
    #[serde(default = "default_shape")]
    pub shape: ValueShape,
}

fn default_shape() -> ValueShape {
    ValueShape::Scalar
}

impl OperatorDescriptor {
    pub fn new(id: &str, label: &str, arity: u8, shape: ValueShape) -> Self {
        Self {
            id: OperatorId::from(id),
            label: label.to_string(),
            arity,
            shape,
        }
    }

    /// check that the declared arity agrees with the shape
    pub fn check_shape(&self) -> Result<(), String> {
        match (self.shape, self.arity) {
            (ValueShape::Scalar, 0 | 1) | (ValueShape::List, 1) | (ValueShape::Range, 2) => Ok(()),
            (ValueShape::Scalar, n) => Err(format!("scalar operators take 0 or 1 values, not {}", n)),
            (ValueShape::List, n) => Err(format!("list operators must declare arity 1, not {}", n)),
            (ValueShape::Range, n) => Err(format!("range operators must declare arity 2, not {}", n)),
        }
    }

    /// check whether `count` values fit this operator's shape
    pub fn accepts_count(&self, count: usize) -> bool {
        match self.shape {
            ValueShape::Scalar => count == self.arity as usize,
            ValueShape::List => count >= 1,
            ValueShape::Range => count == 2,
        }
    }

    /// human description of the expected value count, used in error messages
    pub fn expected_count(&self) -> String {
        match self.shape {
            ValueShape::Scalar => self.arity.to_string(),
            ValueShape::List => "1 or more".to_string(),
            ValueShape::Range => "2 (ordered)".to_string(),
        }
    }
}

impl fmt::Display for OperatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.label)
        }
    }
}

/// a field from the externally supplied catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// display name, falls back to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// ordered operator ids valid for this field
    pub operators: Vec<OperatorId>,
    #[serde(default)]
    pub multivalue: bool,
    /// allowed values for enum fields (value, label), in presentation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<EnumOption>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType, operators: &[&str]) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type,
            operators: operators.iter().map(|op| OperatorId::from(*op)).collect(),
            multivalue: false,
            options: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| EnumOption {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect();
        self
    }

    pub fn multivalue(mut self) -> Self {
        self.multivalue = true;
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// first declared operator, used for blank conditions
    pub fn default_operator(&self) -> Option<&OperatorId> {
        self.operators.first()
    }

    pub fn allows(&self, operator: &OperatorId) -> bool {
        self.operators.contains(operator)
    }
}

/// one allowed value of an enum field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumOption {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

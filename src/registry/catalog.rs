//! built-in operator catalog

use super::types::{OperatorDescriptor, ValueShape};

/// (id, label, arity, shape) for every built-in operator
const BUILTIN: &[(&str, &str, u8, ValueShape)] = &[
    ("eq", "Equals", 1, ValueShape::Scalar),
    ("equals", "Equals", 1, ValueShape::Scalar),
    ("neq", "Not Equals", 1, ValueShape::Scalar),
    ("notEquals", "Not Equals", 1, ValueShape::Scalar),
    ("eqi", "Equals (Insensitive)", 1, ValueShape::Scalar),
    ("neqi", "Not Equals (Insensitive)", 1, ValueShape::Scalar),
    ("before", "Was Before", 1, ValueShape::Scalar),
    ("after", "Was After", 1, ValueShape::Scalar),
    ("in", "In", 1, ValueShape::List),
    ("nin", "Not In", 1, ValueShape::List),
    ("matchphrasepre", "Match Phrase Prefix", 1, ValueShape::Scalar),
    ("nmatchphrasepre", "Does Not Match Phrase Prefix", 1, ValueShape::Scalar),
    ("matchphrase", "Match Phrase", 1, ValueShape::Scalar),
    ("nmatchphrase", "Does Not Match Phrase", 1, ValueShape::Scalar),
    ("match", "Match", 1, ValueShape::Scalar),
    ("nmatch", "Does Not Match", 1, ValueShape::Scalar),
    ("starts", "Starts With", 1, ValueShape::Scalar),
    ("nstarts", "Does Not Start With", 1, ValueShape::Scalar),
    ("ends", "Ends With", 1, ValueShape::Scalar),
    ("nends", "Does Not End With", 1, ValueShape::Scalar),
    ("wild", "Wildcard Match", 1, ValueShape::Scalar),
    ("nwild", "Does Not Match Wildcard", 1, ValueShape::Scalar),
    ("like", "Like Match With", 1, ValueShape::Scalar),
    ("nlike", "Does Not Like Match With", 1, ValueShape::Scalar),
    ("fuzzy", "Fuzzy Match With", 1, ValueShape::Scalar),
    ("nfuzzy", "Does Not Match Fuzzy With", 1, ValueShape::Scalar),
    ("gte", "Greater Than or Equals", 1, ValueShape::Scalar),
    ("gt", "Greater Than", 1, ValueShape::Scalar),
    ("greaterThan", "Greater Than", 1, ValueShape::Scalar),
    ("lt", "Less Than", 1, ValueShape::Scalar),
    ("lessThan", "Less Than", 1, ValueShape::Scalar),
    ("lte", "Less Than or Equals", 1, ValueShape::Scalar),
    ("between", "Between", 2, ValueShape::Range),
    ("isEmpty", "Is Empty", 0, ValueShape::Scalar),
    ("isNotEmpty", "Is Not Empty", 0, ValueShape::Scalar),
];

/// all built-in operators, in catalog order
pub fn builtin_operators() -> Vec<OperatorDescriptor> {
    BUILTIN
        .iter()
        .map(|(id, label, arity, shape)| OperatorDescriptor::new(id, label, *arity, *shape))
        .collect()
}

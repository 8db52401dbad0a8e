use serde::{Deserialize, Serialize};

use crate::builder::QueryBuilder;
use crate::events::DEFAULT_RECENT_EVENTS;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::registry::{
    FieldDescriptor, FieldRegistry, OperatorDescriptor, RegistryError, DEFAULT_SUGGESTION_DISTANCE,
};

/// field catalog and session settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// operators added to (or replacing) the built-in catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operators: Vec<OperatorDescriptor>,
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// build the field registry described by this config
    pub fn registry(&self) -> Result<FieldRegistry, RegistryError> {
        let registry = FieldRegistry::with_operators(self.fields.clone(), self.operators.clone())?;
        Ok(registry.with_suggestion_distance(self.settings.suggestion_distance))
    }

    /// start a builder session over this config's registry and limits
    pub fn builder(&self) -> Result<QueryBuilder, RegistryError> {
        let registry = std::sync::Arc::new(self.registry()?);
        Ok(QueryBuilder::new(registry)
            .with_history_limit(self.settings.history_limit)
            .with_recent_events(self.settings.recent_events))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// undo steps kept per session
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// size of the recent-events buffer
    #[serde(default = "default_recent_events")]
    pub recent_events: usize,
    /// max edit distance for "did you mean" field suggestions
    #[serde(default = "default_suggestion_distance")]
    pub suggestion_distance: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_recent_events() -> usize {
    DEFAULT_RECENT_EVENTS
}

fn default_suggestion_distance() -> usize {
    DEFAULT_SUGGESTION_DISTANCE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            recent_events: DEFAULT_RECENT_EVENTS,
            suggestion_distance: DEFAULT_SUGGESTION_DISTANCE,
        }
    }
}

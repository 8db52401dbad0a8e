//! query builder session
//!
//! owns one tree and drives every change through the same path: apply the
//! mutation, re-validate, serialize, notify. failed mutations leave the tree
//! untouched and notify nobody.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::events::{Event, EventBus, EventData, EventType, DEFAULT_RECENT_EVENTS};
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::registry::{FieldRegistry, OperatorId};
use crate::tree::{Connective, NodeId, Tree, TreeError, Value};
use crate::validate::{self, Issue, ValidationResult};
use crate::wire::{self, legacy, WireGroup};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("filter cannot be applied: {} validation issue(s)", issues.len())]
    NotSubmittable { issues: Vec<Issue> },
}

pub struct QueryBuilder {
    registry: Arc<FieldRegistry>,
    tree: Tree,
    /// last applied (or loaded) tree, restored by `reset`
    applied: Tree,
    history: History<Tree>,
    events: EventBus,
    seq: u64,
}

impl QueryBuilder {
    /// start an empty session
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self {
            registry,
            tree: Tree::new(),
            applied: Tree::new(),
            history: History::new(DEFAULT_HISTORY_LIMIT),
            events: EventBus::with_recent_limit(DEFAULT_RECENT_EVENTS),
            seq: 0,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = History::new(limit);
        self
    }

    pub fn with_recent_events(mut self, limit: usize) -> Self {
        self.events = EventBus::with_recent_limit(limit);
        self
    }

    // ------------------------------------------------------------------
    // loading
    // ------------------------------------------------------------------

    /// replace the session tree with a wire payload and emit `filter.ready`
    pub fn load(&mut self, payload: &JsonValue) -> Result<(), wire::WireError> {
        let tree = wire::deserialize(payload).map_err(|e| {
            log::warn!("load rejected: {}", e);
            e
        })?;
        self.install(tree, "load");
        Ok(())
    }

    /// same as `load`, from a legacy base64 filter
    pub fn load_legacy(&mut self, encoded: &str) -> Result<(), legacy::LegacyError> {
        let tree = legacy::decode(encoded, &self.registry).map_err(|e| {
            log::warn!("legacy load rejected: {}", e);
            e
        })?;
        self.install(tree, "load_legacy");
        Ok(())
    }

    /// start from blank conditions for the given fields
    pub fn load_presets<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), TreeError> {
        let mut tree = Tree::new();
        let root = tree.root();
        for field in fields {
            tree.add_blank_condition(&self.registry, root, field.as_ref(), None)
                .map_err(|e| {
                    log::warn!("preset rejected: {}", e);
                    e
                })?;
        }
        self.install(tree, "load_presets");
        Ok(())
    }

    fn install(&mut self, tree: Tree, action: &str) {
        log::debug!("{}: {} nodes", action, tree.len());
        self.applied = tree.clone();
        self.tree = tree;
        self.history.clear();
        self.announce(EventType::Ready, action);
    }

    // ------------------------------------------------------------------
    // mutations
    // ------------------------------------------------------------------

    pub fn add_condition(
        &mut self,
        parent: NodeId,
        field: &str,
        operator: impl Into<OperatorId>,
        values: Vec<Value>,
        at: Option<usize>,
    ) -> Result<NodeId, TreeError> {
        let operator = operator.into();
        self.mutate("add_condition", |tree, registry| {
            tree.add_condition(registry, parent, field, operator, values, at)
        })
    }

    pub fn add_blank_condition(
        &mut self,
        parent: NodeId,
        field: &str,
        at: Option<usize>,
    ) -> Result<NodeId, TreeError> {
        self.mutate("add_blank_condition", |tree, registry| {
            tree.add_blank_condition(registry, parent, field, at)
        })
    }

    pub fn add_group(
        &mut self,
        parent: NodeId,
        connective: Connective,
        at: Option<usize>,
    ) -> Result<NodeId, TreeError> {
        self.mutate("add_group", |tree, _| tree.add_group(parent, connective, at))
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<usize, TreeError> {
        self.mutate("remove_node", |tree, _| tree.remove_node(id))
    }

    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId, at: usize) -> Result<(), TreeError> {
        self.mutate("move_node", |tree, _| tree.move_node(id, new_parent, at))
    }

    pub fn set_connective(&mut self, group: NodeId, connective: Connective) -> Result<(), TreeError> {
        self.mutate("set_connective", |tree, _| tree.set_connective(group, connective))
    }

    pub fn set_negated(&mut self, group: NodeId, negated: bool) -> Result<(), TreeError> {
        self.mutate("set_negated", |tree, _| tree.set_negated(group, negated))
    }

    /// returns true when the previous values were cleared
    pub fn set_operator(
        &mut self,
        condition: NodeId,
        operator: impl Into<OperatorId>,
    ) -> Result<bool, TreeError> {
        let operator = operator.into();
        self.mutate("set_operator", |tree, registry| {
            tree.set_operator(registry, condition, operator)
        })
    }

    pub fn set_values(&mut self, condition: NodeId, values: Vec<Value>) -> Result<(), TreeError> {
        self.mutate("set_values", |tree, _| tree.set_values(condition, values))
    }

    pub fn set_field(&mut self, condition: NodeId, field: &str) -> Result<(), TreeError> {
        self.mutate("set_field", |tree, registry| {
            tree.set_field(registry, condition, field)
        })
    }

    /// drop every condition and group under the root
    pub fn clear(&mut self) -> usize {
        self.history.push(self.tree.clone());
        let removed = self.tree.clear();
        log::debug!("clear: removed {} nodes", removed);
        self.announce(EventType::Changed, "clear");
        removed
    }

    /// restore the last applied tree
    pub fn reset(&mut self) {
        let previous = self.restore(self.applied.clone());
        self.history.push(previous);
        log::debug!("reset to applied filter");
        self.announce(EventType::Changed, "reset");
    }

    /// returns false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.tree.clone()) {
            Some(previous) => {
                self.restore(previous);
                log::debug!("undo");
                self.announce(EventType::Changed, "undo");
                true
            }
            None => false,
        }
    }

    /// returns false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.tree.clone()) {
            Some(next) => {
                self.restore(next);
                log::debug!("redo");
                self.announce(EventType::Changed, "redo");
                true
            }
            None => false,
        }
    }

    /// swap in a snapshot without rewinding id allocation, so an id handed
    /// out once never names a different node later
    fn restore(&mut self, mut snapshot: Tree) -> Tree {
        snapshot.reserve_ids_from(self.tree.next_id());
        std::mem::replace(&mut self.tree, snapshot)
    }

    /// commit the current tree as the applied filter
    ///
    /// an entirely empty tree is accepted and means "no filtering"
    pub fn apply(&mut self) -> Result<WireGroup, BuilderError> {
        let result = self.validation();
        if !result.ok && !self.tree.is_empty() {
            log::warn!("apply rejected: {} issues", result.issues.len());
            return Err(BuilderError::NotSubmittable {
                issues: result.issues,
            });
        }

        self.applied = self.tree.clone();
        log::debug!("applied filter");
        self.announce(EventType::Applied, "apply");
        Ok(wire::serialize(&self.applied))
    }

    fn mutate<R>(
        &mut self,
        action: &'static str,
        op: impl FnOnce(&mut Tree, &FieldRegistry) -> Result<R, TreeError>,
    ) -> Result<R, TreeError> {
        let before = self.tree.clone();
        match op(&mut self.tree, &*self.registry) {
            Ok(out) => {
                log::debug!("{} accepted", action);
                self.history.push(before);
                self.announce(EventType::Changed, action);
                Ok(out)
            }
            Err(e) => {
                log::warn!("{} rejected: {}", action, e);
                Err(e)
            }
        }
    }

    fn announce(&mut self, event_type: EventType, action: &str) {
        let result = validate::validate(&self.tree, &self.registry);
        self.seq += 1;
        let data = EventData {
            action: action.to_string(),
            wire_tree: wire::serialize(&self.tree),
            is_valid: result.ok,
            issues: result.issues,
        };
        self.events.emit(Event::new(event_type, self.seq, data));
    }

    // ------------------------------------------------------------------
    // reads
    // ------------------------------------------------------------------

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn registry(&self) -> &Arc<FieldRegistry> {
        &self.registry
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn validation(&self) -> ValidationResult {
        validate::validate(&self.tree, &self.registry)
    }

    pub fn is_complete(&self) -> bool {
        self.tree.is_complete(&self.registry)
    }

    pub fn wire(&self) -> WireGroup {
        wire::serialize(&self.tree)
    }

    pub fn applied_wire(&self) -> WireGroup {
        wire::serialize(&self.applied)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// sequence number of the last emitted event, 0 before any
    pub fn seq(&self) -> u64 {
        self.seq
    }

    // ------------------------------------------------------------------
    // subscriptions
    // ------------------------------------------------------------------

    /// subscribe to events matching `filters` (empty = all)
    pub fn subscribe(&mut self, filters: Vec<String>) -> (u64, mpsc::UnboundedReceiver<Event>) {
        self.events.subscribe(filters)
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn recent_events(&self) -> impl Iterator<Item = &Event> {
        self.events.recent()
    }
}

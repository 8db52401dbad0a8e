//! arena-backed expression tree and its mutation operations
//!
//! nodes live in a map keyed by `NodeId`; groups hold ordered child ids and a
//! separate id -> parent index answers ancestry questions without walking the
//! whole tree. every mutation checks all of its preconditions before touching
//! any state, so a failed call leaves the tree exactly as it was.

use std::collections::HashMap;

use crate::registry::{FieldDescriptor, FieldRegistry, OperatorDescriptor, OperatorId};
use crate::validate::values_fit;

use super::error::TreeError;
use super::types::{Condition, Connective, Group, Node, NodeId, Value};
use super::MAX_DEPTH;

/// a filter expression: exactly one root group and everything beneath it
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
    parents: HashMap<NodeId, NodeId>,
    next_id: u64,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// create an empty tree with an AND root
    pub fn new() -> Self {
        Self::with_root(Connective::And)
    }

    /// create an empty tree with the given root connective
    pub fn with_root(connective: Connective) -> Self {
        let root = NodeId::from_raw(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node::Group(Group {
                id: root,
                connective,
                negated: false,
                children: Vec::new(),
            }),
        );

        Self {
            root,
            nodes,
            parents: HashMap::new(),
            next_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // reads
    // ------------------------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_group(&self) -> &Group {
        match self.nodes.get(&self.root) {
            Some(Node::Group(g)) => g,
            _ => unreachable!("root is always a group"),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn group(&self, id: NodeId) -> Option<&Group> {
        self.nodes.get(&id).and_then(Node::as_group)
    }

    pub fn condition(&self, id: NodeId) -> Option<&Condition> {
        self.nodes.get(&id).and_then(Node::as_condition)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// parent group of a node; `None` for the root and unknown ids
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// children of a group; empty for conditions and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.group(id).map(|g| g.children.as_slice()).unwrap_or(&[])
    }

    /// number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// true when the root has no children
    pub fn is_empty(&self) -> bool {
        self.root_group().children.is_empty()
    }

    /// true if `ancestor` is `node` or lies on the path from `node` to the root
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// nesting depth (root = 0)
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// levels of groups nested below `id` (0 for a leaf group or a condition)
    fn group_height(&self, id: NodeId) -> usize {
        let base = self.depth(id);
        self.walk_from(id)
            .into_iter()
            .filter(|node| self.group(*node).is_some())
            .map(|node| self.depth(node) - base)
            .max()
            .unwrap_or(0)
    }

    /// all node ids in pre-order (parent before children, children in order)
    pub fn walk(&self) -> Vec<NodeId> {
        self.walk_from(self.root)
    }

    /// pre-order ids of the subtree rooted at `id`
    pub fn walk_from(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            // reversed so the first child is popped first
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// true iff every group has a child and every condition fits its operator
    pub fn is_complete(&self, registry: &FieldRegistry) -> bool {
        self.nodes.values().all(|node| match node {
            Node::Group(g) => !g.children.is_empty(),
            Node::Condition(c) => match registry.operator(&c.operator) {
                Some(op) => {
                    let field_type = registry.describe(&c.field).map(|f| f.field_type);
                    values_fit(op, field_type, &c.values)
                }
                None => false,
            },
        })
    }

    // ------------------------------------------------------------------
    // mutations
    // ------------------------------------------------------------------

    /// add a condition under `parent`, at `at` or appended
    pub fn add_condition(
        &mut self,
        registry: &FieldRegistry,
        parent: NodeId,
        field: &str,
        operator: impl Into<OperatorId>,
        values: Vec<Value>,
        at: Option<usize>,
    ) -> Result<NodeId, TreeError> {
        let operator = operator.into();
        let index = self.insertion_index(parent, at)?;
        let descriptor = resolve_field(registry, field)?;
        let op = resolve_operator(registry, descriptor, &operator)?;

        if !values_fit(op, Some(descriptor.field_type), &values) {
            return Err(TreeError::ArityMismatch {
                operator: operator.to_string(),
                expected: op.expected_count(),
                got: values.len(),
            });
        }

        Ok(self.insert_condition(parent, index, field.to_string(), operator, values))
    }

    /// add a condition for `field` using its first operator and no values
    ///
    /// the condition is incomplete unless that operator is nullary
    pub fn add_blank_condition(
        &mut self,
        registry: &FieldRegistry,
        parent: NodeId,
        field: &str,
        at: Option<usize>,
    ) -> Result<NodeId, TreeError> {
        let index = self.insertion_index(parent, at)?;
        let descriptor = resolve_field(registry, field)?;
        let operator = first_operator(descriptor)?;

        Ok(self.insert_condition(parent, index, field.to_string(), operator, Vec::new()))
    }

    /// add an empty child group under `parent`
    pub fn add_group(
        &mut self,
        parent: NodeId,
        connective: Connective,
        at: Option<usize>,
    ) -> Result<NodeId, TreeError> {
        let index = self.insertion_index(parent, at)?;
        let depth = self.depth(parent) + 1;
        if depth > MAX_DEPTH {
            return Err(TreeError::TooDeep {
                depth,
                max: MAX_DEPTH,
            });
        }
        Ok(self.insert_group(parent, index, connective, false))
    }

    /// remove a node and its whole subtree; returns the number of nodes removed
    pub fn remove_node(&mut self, id: NodeId) -> Result<usize, TreeError> {
        if id == self.root {
            return Err(TreeError::CannotRemoveRoot);
        }
        let parent = self.parent(id).ok_or(TreeError::UnknownNode(id))?;

        let doomed = self.walk_from(id);
        for node in &doomed {
            self.nodes.remove(node);
            self.parents.remove(node);
        }
        self.group_mut(parent).children.retain(|child| *child != id);

        Ok(doomed.len())
    }

    /// move a node (with its subtree) under `new_parent` at position `at`
    ///
    /// `at` is interpreted against the new parent's children after the node
    /// has been detached, so moving within the same group works as expected
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId, at: usize) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::CannotMoveRoot);
        }
        let old_parent = self.parent(id).ok_or(TreeError::UnknownNode(id))?;
        let target = self.group(new_parent).ok_or(TreeError::UnknownGroup(new_parent))?;

        if self.is_ancestor_or_self(id, new_parent) {
            return Err(TreeError::CyclicMove {
                node: id,
                target: new_parent,
            });
        }

        if self.group(id).is_some() {
            let depth = self.depth(new_parent) + 1 + self.group_height(id);
            if depth > MAX_DEPTH {
                return Err(TreeError::TooDeep {
                    depth,
                    max: MAX_DEPTH,
                });
            }
        }

        let len = if old_parent == new_parent {
            target.children.len() - 1
        } else {
            target.children.len()
        };
        if at > len {
            return Err(TreeError::IndexOutOfBounds { index: at, len });
        }

        self.group_mut(old_parent).children.retain(|child| *child != id);
        self.group_mut(new_parent).children.insert(at, id);
        self.parents.insert(id, new_parent);

        Ok(())
    }

    pub fn set_connective(&mut self, group: NodeId, connective: Connective) -> Result<(), TreeError> {
        if self.group(group).is_none() {
            return Err(TreeError::UnknownGroup(group));
        }
        self.group_mut(group).connective = connective;
        Ok(())
    }

    pub fn set_negated(&mut self, group: NodeId, negated: bool) -> Result<(), TreeError> {
        if self.group(group).is_none() {
            return Err(TreeError::UnknownGroup(group));
        }
        if group == self.root && negated {
            return Err(TreeError::CannotNegateRoot);
        }
        self.group_mut(group).negated = negated;
        Ok(())
    }

    /// change a condition's operator
    ///
    /// values that no longer fit the new operator are cleared rather than
    /// coerced; returns true when that happened
    pub fn set_operator(
        &mut self,
        registry: &FieldRegistry,
        condition: NodeId,
        operator: impl Into<OperatorId>,
    ) -> Result<bool, TreeError> {
        let operator = operator.into();
        let current = self
            .condition(condition)
            .ok_or(TreeError::UnknownCondition(condition))?;
        let descriptor = resolve_field(registry, &current.field)?;
        let op = resolve_operator(registry, descriptor, &operator)?;
        let keep = values_fit(op, Some(descriptor.field_type), &current.values);

        let target = self.condition_mut(condition);
        target.operator = operator;
        if !keep {
            target.values.clear();
        }
        Ok(!keep)
    }

    /// replace a condition's values
    ///
    /// accepted even when they do not fit the operator yet; the mismatch is
    /// reported by validation so partially entered values can be kept
    pub fn set_values(&mut self, condition: NodeId, values: Vec<Value>) -> Result<(), TreeError> {
        if self.condition(condition).is_none() {
            return Err(TreeError::UnknownCondition(condition));
        }
        self.condition_mut(condition).values = values;
        Ok(())
    }

    /// rebind a condition to another field at the same position
    ///
    /// the operator resets to the field's first operator and values are cleared
    pub fn set_field(
        &mut self,
        registry: &FieldRegistry,
        condition: NodeId,
        field: &str,
    ) -> Result<(), TreeError> {
        if self.condition(condition).is_none() {
            return Err(TreeError::UnknownCondition(condition));
        }
        let descriptor = resolve_field(registry, field)?;
        let operator = first_operator(descriptor)?;

        let target = self.condition_mut(condition);
        target.field = field.to_string();
        target.operator = operator;
        target.values.clear();
        Ok(())
    }

    /// remove every child of the root; returns the number of nodes removed
    pub fn clear(&mut self) -> usize {
        let removed = self.nodes.len() - 1;
        let root = self.root;
        self.nodes.retain(|id, _| *id == root);
        self.parents.clear();
        self.group_mut(root).children.clear();
        removed
    }

    // ------------------------------------------------------------------
    // unchecked construction, used when hydrating from a payload
    // ------------------------------------------------------------------

    /// append a group without registry checks
    pub(crate) fn push_group(&mut self, parent: NodeId, connective: Connective, negated: bool) -> NodeId {
        let index = self.children(parent).len();
        self.insert_group(parent, index, connective, negated)
    }

    /// append a condition without registry checks
    pub(crate) fn push_condition(
        &mut self,
        parent: NodeId,
        field: String,
        operator: OperatorId,
        values: Vec<Value>,
    ) -> NodeId {
        let index = self.children(parent).len();
        self.insert_condition(parent, index, field, operator, values)
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    fn insertion_index(&self, parent: NodeId, at: Option<usize>) -> Result<usize, TreeError> {
        let group = self.group(parent).ok_or(TreeError::UnknownGroup(parent))?;
        let len = group.children.len();
        match at {
            None => Ok(len),
            Some(index) if index <= len => Ok(index),
            Some(index) => Err(TreeError::IndexOutOfBounds { index, len }),
        }
    }

    /// next id this tree will hand out
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// never hand out an id below `n`, e.g. after restoring an older snapshot
    pub(crate) fn reserve_ids_from(&mut self, n: u64) {
        self.next_id = self.next_id.max(n);
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_group(&mut self, parent: NodeId, index: usize, connective: Connective, negated: bool) -> NodeId {
        let id = self.allocate_id();
        self.nodes.insert(
            id,
            Node::Group(Group {
                id,
                connective,
                negated,
                children: Vec::new(),
            }),
        );
        self.attach(parent, index, id);
        id
    }

    fn insert_condition(
        &mut self,
        parent: NodeId,
        index: usize,
        field: String,
        operator: OperatorId,
        values: Vec<Value>,
    ) -> NodeId {
        let id = self.allocate_id();
        self.nodes.insert(
            id,
            Node::Condition(Condition {
                id,
                field,
                operator,
                values,
            }),
        );
        self.attach(parent, index, id);
        id
    }

    fn attach(&mut self, parent: NodeId, index: usize, id: NodeId) {
        self.group_mut(parent).children.insert(index, id);
        self.parents.insert(id, parent);
    }

    // callers check existence first; a miss here is a broken arena
    fn group_mut(&mut self, id: NodeId) -> &mut Group {
        match self.nodes.get_mut(&id) {
            Some(Node::Group(g)) => g,
            _ => unreachable!("group {} checked before mutation", id),
        }
    }

    fn condition_mut(&mut self, id: NodeId) -> &mut Condition {
        match self.nodes.get_mut(&id) {
            Some(Node::Condition(c)) => c,
            _ => unreachable!("condition {} checked before mutation", id),
        }
    }
}

fn resolve_field<'r>(registry: &'r FieldRegistry, field: &str) -> Result<&'r FieldDescriptor, TreeError> {
    registry.describe(field).ok_or_else(|| TreeError::UnknownField {
        field: field.to_string(),
        suggestions: registry.suggest(field),
    })
}

fn resolve_operator<'r>(
    registry: &'r FieldRegistry,
    field: &FieldDescriptor,
    operator: &OperatorId,
) -> Result<&'r OperatorDescriptor, TreeError> {
    let mismatch = || TreeError::OperatorMismatch {
        field: field.name.clone(),
        operator: operator.to_string(),
    };
    if !field.allows(operator) {
        return Err(mismatch());
    }
    registry.operator(operator).ok_or_else(mismatch)
}

fn first_operator(field: &FieldDescriptor) -> Result<OperatorId, TreeError> {
    // registries reject fields without operators, so this only guards the type
    field
        .default_operator()
        .cloned()
        .ok_or_else(|| TreeError::OperatorMismatch {
            field: field.name.clone(),
            operator: String::new(),
        })
}

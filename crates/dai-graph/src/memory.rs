//! In-memory content graph for tests, snapshots, and embedding.
//!
//! [`InMemoryContentGraph`] stores all nodes in a `HashMap` behind a
//! `RwLock`. It answers [`ContentGraph`] queries through the capability
//! traits, so it never inspects entity type names.

use std::collections::HashMap;
use std::sync::RwLock;

use dai_types::EntityRef;

use crate::entity::{ContentNode, HasChildren, HasParent, IsRoot};
use crate::error::{GraphError, GraphResult};
use crate::traits::{ContentGraph, ParentLookup};

/// An in-memory implementation of [`ContentGraph`].
#[derive(Debug, Default)]
pub struct InMemoryContentGraph {
    nodes: RwLock<HashMap<EntityRef, ContentNode>>,
}

impl InMemoryContentGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a list of nodes. Later duplicates replace earlier
    /// ones.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = ContentNode>,
    {
        let map = nodes
            .into_iter()
            .map(|n| (n.entity().clone(), n))
            .collect();
        Self {
            nodes: RwLock::new(map),
        }
    }

    /// Insert or replace a node.
    pub fn insert(&self, node: impl Into<ContentNode>) -> GraphResult<()> {
        let node = node.into();
        let mut nodes = self.nodes.write().map_err(|_| GraphError::LockPoisoned)?;
        nodes.insert(node.entity().clone(), node);
        Ok(())
    }

    /// Remove a node. Returns `true` if it existed.
    ///
    /// Children are left in place, exactly as a content system deleting a
    /// host without cascading would leave them.
    pub fn remove(&self, entity: &EntityRef) -> GraphResult<bool> {
        let mut nodes = self.nodes.write().map_err(|_| GraphError::LockPoisoned)?;
        Ok(nodes.remove(entity).is_some())
    }

    /// Drop `child` from `parent`'s `field` without touching the child's own
    /// parent link. Returns `true` if the child was declared there.
    pub fn detach(&self, parent: &EntityRef, field: &str, child: &EntityRef) -> GraphResult<bool> {
        let mut nodes = self.nodes.write().map_err(|_| GraphError::LockPoisoned)?;
        let Some(node) = nodes.get_mut(parent) else {
            return Ok(false);
        };
        let children = match node {
            ContentNode::Root(r) => r.children.get_mut(field),
            ContentNode::Component(c) => c.children.get_mut(field),
        };
        let Some(children) = children else {
            return Ok(false);
        };
        let before = children.len();
        children.retain(|c| c != child);
        Ok(children.len() != before)
    }

    /// Snapshot of every node, sorted by entity reference.
    pub fn nodes(&self) -> GraphResult<Vec<ContentNode>> {
        let nodes = self.nodes.read().map_err(|_| GraphError::LockPoisoned)?;
        let mut all: Vec<ContentNode> = nodes.values().cloned().collect();
        all.sort_by(|a, b| a.entity().cmp(b.entity()));
        Ok(all)
    }

    /// Look up a node by reference.
    pub fn get(&self, entity: &EntityRef) -> GraphResult<Option<ContentNode>> {
        let nodes = self.nodes.read().map_err(|_| GraphError::LockPoisoned)?;
        Ok(nodes.get(entity).cloned())
    }

    pub fn len(&self) -> usize {
        self.nodes.read().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentGraph for InMemoryContentGraph {
    fn parent_of(&self, entity: &EntityRef) -> GraphResult<ParentLookup> {
        let nodes = self.nodes.read().map_err(|_| GraphError::LockPoisoned)?;
        let Some(node) = nodes.get(entity) else {
            return Ok(ParentLookup::NotFound);
        };
        if node.is_root() {
            return Ok(ParentLookup::Root);
        }
        Ok(match node.parent_link() {
            Some(link) => ParentLookup::Parent(link.clone()),
            None => ParentLookup::Unparented,
        })
    }

    fn declared_children(
        &self,
        parent: &EntityRef,
        field: &str,
    ) -> GraphResult<Option<Vec<EntityRef>>> {
        let nodes = self.nodes.read().map_err(|_| GraphError::LockPoisoned)?;
        Ok(nodes.get(parent).map(|n| n.children(field).to_vec()))
    }
}

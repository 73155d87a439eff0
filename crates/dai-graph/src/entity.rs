//! Capability traits and the entity kinds that implement them.
//!
//! Two kinds cover every content entity the inventory needs to reason about:
//!
//! - [`RootEntity`] -- pages, reusable blocks, menu links, media, users. It
//!   may declare children but never has a parent. Non-hierarchical kinds are
//!   simply roots with no child fields.
//! - [`ComponentEntity`] -- a nested content block. It declares a parent link
//!   and may declare children of its own.

use std::collections::BTreeMap;

use dai_types::EntityRef;
use serde::{Deserialize, Serialize};

/// A component's declared host: the parent entity and the field on the
/// parent that is supposed to list the component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentLink {
    pub parent: EntityRef,
    pub field: String,
}

impl ParentLink {
    pub fn new(parent: EntityRef, field: impl Into<String>) -> Self {
        Self {
            parent,
            field: field.into(),
        }
    }
}

/// Entities at the top of a hosting chain.
pub trait IsRoot {
    fn is_root(&self) -> bool;
}

/// Entities that declare child components per field.
pub trait HasChildren {
    /// Children currently declared in `field` (empty if none).
    fn children(&self, field: &str) -> &[EntityRef];

    /// Names of fields that declare at least one child.
    fn child_fields(&self) -> Vec<&str>;

    /// Returns `true` if `child` is currently declared in `field`.
    fn declares(&self, field: &str, child: &EntityRef) -> bool {
        self.children(field).contains(child)
    }
}

/// Entities that record the host they belong to.
pub trait HasParent {
    fn parent_link(&self) -> Option<&ParentLink>;
}

/// A root content entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootEntity {
    pub entity: EntityRef,
    /// Human-readable label, used in usage listings.
    #[serde(default)]
    pub label: String,
    /// Publication state. Recorded for display only; reachability is
    /// structural and ignores it.
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub children: BTreeMap<String, Vec<EntityRef>>,
}

fn default_published() -> bool {
    true
}

impl RootEntity {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            label: entity.to_string(),
            entity,
            published: true,
            children: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn with_child(mut self, field: impl Into<String>, child: EntityRef) -> Self {
        self.children.entry(field.into()).or_default().push(child);
        self
    }
}

/// A nested content component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntity {
    pub entity: EntityRef,
    /// The host recorded on the component itself. May be stale: the host is
    /// free to drop the component from its field without clearing this.
    #[serde(default)]
    pub parent: Option<ParentLink>,
    #[serde(default)]
    pub children: BTreeMap<String, Vec<EntityRef>>,
}

impl ComponentEntity {
    pub fn new(entity: EntityRef, parent: Option<ParentLink>) -> Self {
        Self {
            entity,
            parent,
            children: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, field: impl Into<String>, child: EntityRef) -> Self {
        self.children.entry(field.into()).or_default().push(child);
        self
    }
}

fn children_in<'a>(map: &'a BTreeMap<String, Vec<EntityRef>>, field: &str) -> &'a [EntityRef] {
    map.get(field).map(Vec::as_slice).unwrap_or(&[])
}

fn non_empty_fields(map: &BTreeMap<String, Vec<EntityRef>>) -> Vec<&str> {
    map.iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, _)| k.as_str())
        .collect()
}

impl IsRoot for RootEntity {
    fn is_root(&self) -> bool {
        true
    }
}

impl HasChildren for RootEntity {
    fn children(&self, field: &str) -> &[EntityRef] {
        children_in(&self.children, field)
    }

    fn child_fields(&self) -> Vec<&str> {
        non_empty_fields(&self.children)
    }
}

impl IsRoot for ComponentEntity {
    fn is_root(&self) -> bool {
        false
    }
}

impl HasChildren for ComponentEntity {
    fn children(&self, field: &str) -> &[EntityRef] {
        children_in(&self.children, field)
    }

    fn child_fields(&self) -> Vec<&str> {
        non_empty_fields(&self.children)
    }
}

impl HasParent for ComponentEntity {
    fn parent_link(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }
}

/// Any entity stored in the content graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentNode {
    Root(RootEntity),
    Component(ComponentEntity),
}

impl ContentNode {
    pub fn entity(&self) -> &EntityRef {
        match self {
            Self::Root(r) => &r.entity,
            Self::Component(c) => &c.entity,
        }
    }
}

impl IsRoot for ContentNode {
    fn is_root(&self) -> bool {
        match self {
            Self::Root(r) => r.is_root(),
            Self::Component(c) => c.is_root(),
        }
    }
}

impl HasChildren for ContentNode {
    fn children(&self, field: &str) -> &[EntityRef] {
        match self {
            Self::Root(r) => r.children(field),
            Self::Component(c) => c.children(field),
        }
    }

    fn child_fields(&self) -> Vec<&str> {
        match self {
            Self::Root(r) => r.child_fields(),
            Self::Component(c) => c.child_fields(),
        }
    }
}

impl HasParent for ContentNode {
    fn parent_link(&self) -> Option<&ParentLink> {
        match self {
            Self::Root(_) => None,
            Self::Component(c) => c.parent_link(),
        }
    }
}

impl From<RootEntity> for ContentNode {
    fn from(value: RootEntity) -> Self {
        Self::Root(value)
    }
}

impl From<ComponentEntity> for ContentNode {
    fn from(value: ComponentEntity) -> Self {
        Self::Component(value)
    }
}

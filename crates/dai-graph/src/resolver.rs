//! Reachability resolution: does a host entity hang off a live root?
//!
//! The walk is iterative. Each hop asks the graph for the current entity's
//! declared parent, then asks the *parent* whether it still lists the entity
//! in that field. Presence in storage alone is never enough: a component
//! whose host dropped it from the field is detached even though both still
//! exist.
//!
//! A visited set guards against parent links that loop, and a depth cutoff
//! bounds pathological chains. Both produce an orphan outcome rather than an
//! error.

use std::collections::HashSet;
use std::sync::Arc;

use dai_types::{EntityRef, OrphanReason};
use tracing::trace;

use crate::error::GraphResult;
use crate::traits::{ContentGraph, ParentLookup};

/// Default cap on parent hops before a chain is declared unresolvable.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// The outcome of resolving one host entity.
///
/// This is a closed set. Callers must match on it; there is no conversion to
/// `bool` or `Option` that could blur an orphan into a usage target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reachability {
    /// The host resolves to a live root. `hops` is the number of parent
    /// links followed (0 when the host is the root itself).
    Reachable { root: EntityRef, hops: usize },
    /// The host exists but its chain is broken. `at` is the entity whose
    /// link failed.
    Orphan { reason: OrphanReason, at: EntityRef },
    /// The host itself does not exist; there is nothing to attribute.
    NotFound,
}

impl Reachability {
    /// The root entity, only for [`Reachability::Reachable`].
    pub fn root(&self) -> Option<&EntityRef> {
        match self {
            Self::Reachable { root, .. } => Some(root),
            Self::Orphan { .. } | Self::NotFound => None,
        }
    }

    /// The orphan reason, only for [`Reachability::Orphan`].
    pub fn orphan_reason(&self) -> Option<OrphanReason> {
        match self {
            Self::Orphan { reason, .. } => Some(*reason),
            Self::Reachable { .. } | Self::NotFound => None,
        }
    }
}

/// Resolves host entities against a [`ContentGraph`].
#[derive(Clone)]
pub struct ReachabilityResolver {
    graph: Arc<dyn ContentGraph>,
    max_depth: usize,
}

impl std::fmt::Debug for ReachabilityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachabilityResolver")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl ReachabilityResolver {
    pub fn new(graph: Arc<dyn ContentGraph>) -> Self {
        Self::with_max_depth(graph, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(graph: Arc<dyn ContentGraph>, max_depth: usize) -> Self {
        Self { graph, max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve `host` to its root, or classify why it cannot be.
    ///
    /// Errors are reserved for backend failures; every structural outcome is
    /// a [`Reachability`] variant.
    pub fn resolve(&self, host: &EntityRef) -> GraphResult<Reachability> {
        let mut current = host.clone();
        let mut visited: HashSet<EntityRef> = HashSet::new();
        let mut hops = 0usize;

        loop {
            if !visited.insert(current.clone()) {
                trace!(host = %host, at = %current, "parent chain loops");
                return Ok(Reachability::Orphan {
                    reason: OrphanReason::Unresolvable,
                    at: current,
                });
            }

            let link = match self.graph.parent_of(&current)? {
                ParentLookup::Root => {
                    return Ok(Reachability::Reachable {
                        root: current,
                        hops,
                    });
                }
                ParentLookup::NotFound if hops == 0 => return Ok(Reachability::NotFound),
                // An ancestor vanished between the previous hop and this one.
                ParentLookup::NotFound | ParentLookup::Unparented => {
                    return Ok(Reachability::Orphan {
                        reason: OrphanReason::MissingParent,
                        at: current,
                    });
                }
                ParentLookup::Parent(link) => link,
            };

            if hops >= self.max_depth {
                trace!(host = %host, hops, "parent chain exceeds depth limit");
                return Ok(Reachability::Orphan {
                    reason: OrphanReason::Unresolvable,
                    at: current,
                });
            }

            match self.graph.declared_children(&link.parent, &link.field)? {
                None => {
                    return Ok(Reachability::Orphan {
                        reason: OrphanReason::MissingParent,
                        at: current,
                    });
                }
                Some(children) if !children.contains(&current) => {
                    return Ok(Reachability::Orphan {
                        reason: OrphanReason::Detached,
                        at: current,
                    });
                }
                Some(_) => {
                    current = link.parent;
                    hops += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ComponentEntity, ContentNode, ParentLink, RootEntity};
    use crate::memory::InMemoryContentGraph;

    fn e(t: &str, id: &str) -> EntityRef {
        EntityRef::new(t, id)
    }

    fn component(id: &str, parent: EntityRef, field: &str) -> ContentNode {
        ComponentEntity::new(e("paragraph", id), Some(ParentLink::new(parent, field))).into()
    }

    /// node/1 -> paragraph/10 (field_body) -> paragraph/11 (field_items)
    fn nested_graph() -> Arc<InMemoryContentGraph> {
        Arc::new(InMemoryContentGraph::from_nodes([
            RootEntity::new(e("node", "1"))
                .with_child("field_body", e("paragraph", "10"))
                .into(),
            ComponentEntity::new(
                e("paragraph", "10"),
                Some(ParentLink::new(e("node", "1"), "field_body")),
            )
            .with_child("field_items", e("paragraph", "11"))
            .into(),
            component("11", e("paragraph", "10"), "field_items"),
        ]))
    }

    fn resolver(graph: Arc<InMemoryContentGraph>) -> ReachabilityResolver {
        ReachabilityResolver::new(graph)
    }

    #[test]
    fn root_resolves_to_itself() {
        let r = resolver(nested_graph()).resolve(&e("node", "1")).unwrap();
        assert_eq!(
            r,
            Reachability::Reachable {
                root: e("node", "1"),
                hops: 0
            }
        );
    }

    #[test]
    fn nested_component_resolves_through_every_hop() {
        let r = resolver(nested_graph())
            .resolve(&e("paragraph", "11"))
            .unwrap();
        assert_eq!(r.root(), Some(&e("node", "1")));
        assert!(matches!(r, Reachability::Reachable { hops: 2, .. }));
    }

    #[test]
    fn detached_intermediate_component_orphans_the_leaf() {
        let graph = nested_graph();
        graph
            .detach(&e("node", "1"), "field_body", &e("paragraph", "10"))
            .unwrap();
        let r = resolver(graph).resolve(&e("paragraph", "11")).unwrap();
        assert_eq!(
            r,
            Reachability::Orphan {
                reason: OrphanReason::Detached,
                at: e("paragraph", "10")
            }
        );
        assert_eq!(r.root(), None);
    }

    #[test]
    fn deleted_host_is_missing_parent() {
        let graph = nested_graph();
        graph.remove(&e("node", "1")).unwrap();
        let r = resolver(graph).resolve(&e("paragraph", "11")).unwrap();
        assert_eq!(r.orphan_reason(), Some(OrphanReason::MissingParent));
    }

    #[test]
    fn unparented_component_is_missing_parent() {
        let graph = nested_graph();
        graph
            .insert(ComponentEntity::new(e("paragraph", "50"), None))
            .unwrap();
        let r = resolver(graph).resolve(&e("paragraph", "50")).unwrap();
        assert_eq!(r.orphan_reason(), Some(OrphanReason::MissingParent));
    }

    #[test]
    fn absent_host_is_not_found_not_orphan() {
        let r = resolver(nested_graph())
            .resolve(&e("paragraph", "404"))
            .unwrap();
        assert_eq!(r, Reachability::NotFound);
        assert_eq!(r.orphan_reason(), None);
    }

    #[test]
    fn field_mismatch_counts_as_detached() {
        let graph = nested_graph();
        // Recorded under field_body, but the page lists it elsewhere.
        graph
            .insert(
                RootEntity::new(e("node", "1")).with_child("field_sidebar", e("paragraph", "10")),
            )
            .unwrap();
        let r = resolver(graph).resolve(&e("paragraph", "10")).unwrap();
        assert_eq!(r.orphan_reason(), Some(OrphanReason::Detached));
    }

    #[test]
    fn cyclic_links_terminate_as_unresolvable() {
        let graph = Arc::new(InMemoryContentGraph::from_nodes([
            ComponentEntity::new(
                e("paragraph", "1"),
                Some(ParentLink::new(e("paragraph", "2"), "field_items")),
            )
            .with_child("field_items", e("paragraph", "2"))
            .into(),
            ComponentEntity::new(
                e("paragraph", "2"),
                Some(ParentLink::new(e("paragraph", "1"), "field_items")),
            )
            .with_child("field_items", e("paragraph", "1"))
            .into(),
        ]));
        let r = resolver(graph).resolve(&e("paragraph", "1")).unwrap();
        assert_eq!(r.orphan_reason(), Some(OrphanReason::Unresolvable));
    }

    #[test]
    fn depth_cutoff_is_enforced() {
        let r = ReachabilityResolver::with_max_depth(nested_graph(), 1)
            .resolve(&e("paragraph", "11"))
            .unwrap();
        assert_eq!(r.orphan_reason(), Some(OrphanReason::Unresolvable));

        let r = ReachabilityResolver::with_max_depth(nested_graph(), 2)
            .resolve(&e("paragraph", "11"))
            .unwrap();
        assert_eq!(r.root(), Some(&e("node", "1")));
    }

    #[test]
    fn unpublished_roots_are_still_reachable() {
        let graph = nested_graph();
        graph
            .insert(
                RootEntity::new(e("node", "1"))
                    .unpublished()
                    .with_child("field_body", e("paragraph", "10")),
            )
            .unwrap();
        let r = resolver(graph).resolve(&e("paragraph", "10")).unwrap();
        assert_eq!(r.root(), Some(&e("node", "1")));
    }

    #[test]
    fn non_hierarchical_entities_are_roots() {
        let graph = Arc::new(InMemoryContentGraph::from_nodes([RootEntity::new(e(
            "menu_link_content",
            "7",
        ))
        .into()]));
        let r = resolver(graph)
            .resolve(&e("menu_link_content", "7"))
            .unwrap();
        assert_eq!(r.root(), Some(&e("menu_link_content", "7")));
    }
}

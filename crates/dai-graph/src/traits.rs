//! The [`ContentGraph`] accessor boundary.
//!
//! The graph is owned by the content management system; the inventory only
//! reads it. Any backend (in-memory snapshot, database, remote API)
//! implements this trait.

use dai_types::EntityRef;

use crate::entity::ParentLink;
use crate::error::GraphResult;

/// What the graph knows about an entity's place in the hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentLookup {
    /// The entity exists and has no further parent indirection.
    Root,
    /// The entity exists and declares this parent.
    Parent(ParentLink),
    /// The entity exists as a component but records no parent at all.
    Unparented,
    /// The entity does not exist.
    NotFound,
}

/// Read-only access to the content graph.
///
/// Entity kinds are handled uniformly: implementations answer through the
/// capability traits in [`crate::entity`], never by matching on the entity
/// type name.
pub trait ContentGraph: Send + Sync {
    /// The current parent descriptor of `entity`.
    fn parent_of(&self, entity: &EntityRef) -> GraphResult<ParentLookup>;

    /// The children `parent` currently declares in `field`.
    ///
    /// Returns `Ok(None)` if `parent` does not exist, and `Ok(Some(vec![]))`
    /// if it exists but declares no children there (or cannot have any).
    fn declared_children(
        &self,
        parent: &EntityRef,
        field: &str,
    ) -> GraphResult<Option<Vec<EntityRef>>>;

    /// Returns `true` if `entity` exists.
    fn exists(&self, entity: &EntityRef) -> GraphResult<bool> {
        Ok(!matches!(self.parent_of(entity)?, ParentLookup::NotFound))
    }
}

//! Content graph access and reachability resolution.
//!
//! Content is a mutable parent/child graph: root entities (pages, reusable
//! blocks, menu links, media) host sub-components (nested content blocks),
//! which may host further sub-components. An asset reference found inside a
//! component only counts as *usage* if the component is still attached,
//! through every hop, to a live root.
//!
//! # Modules
//!
//! - [`entity`] -- Capability traits ([`IsRoot`], [`HasChildren`], [`HasParent`])
//!   and the closed set of entity kinds implementing them
//! - [`traits`] -- The [`ContentGraph`] accessor boundary
//! - [`memory`] -- [`InMemoryContentGraph`] for tests and snapshots
//! - [`resolver`] -- [`ReachabilityResolver`] and its [`Reachability`] outcome

pub mod entity;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod traits;

pub use entity::{ComponentEntity, ContentNode, HasChildren, HasParent, IsRoot, ParentLink, RootEntity};
pub use error::{GraphError, GraphResult};
pub use memory::InMemoryContentGraph;
pub use resolver::{Reachability, ReachabilityResolver, DEFAULT_MAX_DEPTH};
pub use traits::{ContentGraph, ParentLookup};

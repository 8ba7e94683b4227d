use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::{AppResult, DomainId, ResourceId};
use tessera_domain::{AncestorDomain, ClosureStrategy, DescendantDomain, InheritedAccessor};

use crate::authorization_ports::{HierarchyRepository, RecursiveHierarchyRepository};

mod iterative;
mod recursive;

#[cfg(test)]
mod tests;

pub use iterative::IterativeHierarchyClosure;
pub use recursive::RecursiveHierarchyClosure;

/// Transitive closures over the resource-inheritance and domain graphs.
///
/// Every implementation returns entries sorted by `(level, id)` with the
/// shortest hop count per node, so strategies are interchangeable.
#[async_trait]
pub trait HierarchyClosure: Send + Sync {
    /// Returns the accessor and every resource it transitively inherits from.
    async fn accessor_closure(&self, accessor_id: ResourceId)
    -> AppResult<Vec<InheritedAccessor>>;

    /// Returns the domain followed by its ancestors up to the root.
    async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>>;

    /// Returns the domain and all of its descendants.
    async fn descendant_domains(&self, domain_id: DomainId) -> AppResult<Vec<DescendantDomain>>;
}

/// Builds the closure implementation selected by `strategy`.
#[must_use]
pub fn hierarchy_closure_for<S>(
    strategy: ClosureStrategy,
    store: Arc<S>,
) -> Arc<dyn HierarchyClosure>
where
    S: HierarchyRepository + RecursiveHierarchyRepository + 'static,
{
    match strategy {
        ClosureStrategy::Recursive => Arc::new(RecursiveHierarchyClosure::new(store)),
        ClosureStrategy::Iterative => Arc::new(IterativeHierarchyClosure::new(store)),
    }
}

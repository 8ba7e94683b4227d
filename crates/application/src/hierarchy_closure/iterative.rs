use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::{AppResult, DomainId, ResourceId};
use tessera_domain::{AncestorDomain, DescendantDomain, InheritedAccessor};
use tracing::debug;

use crate::authorization_ports::HierarchyRepository;

use super::HierarchyClosure;

/// Breadth-first closure over single-hop store reads.
///
/// Each round fetches the neighbours of the current frontier; nodes already
/// visited are dropped, so cyclic edge sets terminate.
#[derive(Clone)]
pub struct IterativeHierarchyClosure {
    repository: Arc<dyn HierarchyRepository>,
}

impl IterativeHierarchyClosure {
    /// Creates an iterative closure over a hierarchy repository.
    #[must_use]
    pub fn new(repository: Arc<dyn HierarchyRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl HierarchyClosure for IterativeHierarchyClosure {
    async fn accessor_closure(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<InheritedAccessor>> {
        let mut visited = HashSet::from([accessor_id]);
        let mut closure = vec![InheritedAccessor::new(accessor_id, 0)];
        let mut frontier = vec![accessor_id];
        let mut level = 0;

        while !frontier.is_empty() {
            level += 1;
            let mut donors = self.repository.list_inherit_donors(&frontier).await?;
            donors.sort();
            donors.dedup();

            frontier = donors
                .into_iter()
                .filter(|donor| visited.insert(*donor))
                .collect();
            closure.extend(
                frontier
                    .iter()
                    .map(|donor| InheritedAccessor::new(*donor, level)),
            );
        }

        debug!(accessor = %accessor_id, size = closure.len(), "computed accessor closure");
        Ok(closure)
    }

    async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>> {
        let mut visited = HashSet::from([domain_id]);
        let mut ancestors = vec![AncestorDomain::new(domain_id, 0)];
        let mut current = domain_id;
        let mut level = 0;

        while let Some(parent_id) = self.repository.find_parent_domain(current).await? {
            if !visited.insert(parent_id) {
                break;
            }
            level += 1;
            ancestors.push(AncestorDomain::new(parent_id, level));
            current = parent_id;
        }

        Ok(ancestors)
    }

    async fn descendant_domains(&self, domain_id: DomainId) -> AppResult<Vec<DescendantDomain>> {
        let mut visited = HashSet::from([domain_id]);
        let mut descendants = vec![DescendantDomain::new(domain_id, 0)];
        let mut frontier = vec![domain_id];
        let mut level = 0;

        while !frontier.is_empty() {
            level += 1;
            let mut children = self.repository.list_child_domains(&frontier).await?;
            children.sort();
            children.dedup();

            frontier = children
                .into_iter()
                .filter(|child| visited.insert(*child))
                .collect();
            descendants.extend(
                frontier
                    .iter()
                    .map(|child| DescendantDomain::new(*child, level)),
            );
        }

        debug!(domain = %domain_id, size = descendants.len(), "computed descendant domains");
        Ok(descendants)
    }
}

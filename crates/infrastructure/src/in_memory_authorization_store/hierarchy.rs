use std::collections::BTreeMap;

use async_trait::async_trait;
use tessera_application::{HierarchyRepository, RecursiveHierarchyRepository};
use tessera_core::{AppResult, DomainId, ResourceId};
use tessera_domain::{AncestorDomain, DescendantDomain, InheritedAccessor};

use super::InMemoryAuthorizationStore;

impl InMemoryAuthorizationStore {
    async fn inherit_edges(&self) -> Vec<(ResourceId, ResourceId)> {
        self.resource_permissions
            .read()
            .await
            .iter()
            .filter(|(_, permissions)| permissions.iter().any(|permission| permission.is_inherit()))
            .map(|((accessor_id, accessed_id), _)| (*accessor_id, *accessed_id))
            .collect()
    }

    async fn parent_edges(&self) -> Vec<(DomainId, DomainId)> {
        self.domains
            .read()
            .await
            .values()
            .filter_map(|domain| domain.parent_id().map(|parent_id| (domain.id(), parent_id)))
            .collect()
    }
}

/// Shortest hop count from `seed` over the whole edge relation.
///
/// Relaxes every edge until a pass changes nothing, which terminates on
/// cyclic relations because levels only ever decrease.
fn fixed_point<N: Ord + Copy>(seed: N, edges: &[(N, N)]) -> Vec<(N, u32)> {
    let mut levels = BTreeMap::from([(seed, 0_u32)]);

    loop {
        let mut changed = false;
        for (from, to) in edges {
            let Some(from_level) = levels.get(from).copied() else {
                continue;
            };
            let candidate = from_level + 1;
            if levels.get(to).is_none_or(|current| candidate < *current) {
                levels.insert(*to, candidate);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut reached: Vec<(N, u32)> = levels.into_iter().collect();
    reached.sort_by_key(|(node, level)| (*level, *node));
    reached
}

#[async_trait]
impl HierarchyRepository for InMemoryAuthorizationStore {
    async fn list_inherit_donors(&self, accessor_ids: &[ResourceId]) -> AppResult<Vec<ResourceId>> {
        Ok(self
            .inherit_edges()
            .await
            .into_iter()
            .filter(|(accessor_id, _)| accessor_ids.contains(accessor_id))
            .map(|(_, donor_id)| donor_id)
            .collect())
    }

    async fn find_parent_domain(&self, domain_id: DomainId) -> AppResult<Option<DomainId>> {
        Ok(self
            .domains
            .read()
            .await
            .get(&domain_id)
            .and_then(|domain| domain.parent_id()))
    }

    async fn list_child_domains(&self, domain_ids: &[DomainId]) -> AppResult<Vec<DomainId>> {
        Ok(self
            .parent_edges()
            .await
            .into_iter()
            .filter(|(_, parent_id)| domain_ids.contains(parent_id))
            .map(|(child_id, _)| child_id)
            .collect())
    }
}

#[async_trait]
impl RecursiveHierarchyRepository for InMemoryAuthorizationStore {
    async fn accessor_closure(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<InheritedAccessor>> {
        let edges = self.inherit_edges().await;

        Ok(fixed_point(accessor_id, &edges)
            .into_iter()
            .map(|(resource_id, level)| InheritedAccessor::new(resource_id, level))
            .collect())
    }

    async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>> {
        let edges = self.parent_edges().await;

        Ok(fixed_point(domain_id, &edges)
            .into_iter()
            .map(|(ancestor_id, level)| AncestorDomain::new(ancestor_id, level))
            .collect())
    }

    async fn descendant_domains(&self, domain_id: DomainId) -> AppResult<Vec<DescendantDomain>> {
        let edges: Vec<(DomainId, DomainId)> = self
            .parent_edges()
            .await
            .into_iter()
            .map(|(child_id, parent_id)| (parent_id, child_id))
            .collect();

        Ok(fixed_point(domain_id, &edges)
            .into_iter()
            .map(|(descendant_id, level)| DescendantDomain::new(descendant_id, level))
            .collect())
    }
}

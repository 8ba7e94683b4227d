use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::{AppError, AppResult, DomainId, ResourceId};
use tessera_domain::{AncestorDomain, DescendantDomain, InheritedAccessor};
use tracing::debug;

use crate::authorization_ports::RecursiveHierarchyRepository;

use super::HierarchyClosure;

/// Closure evaluated by the store as a single fixed-point query.
#[derive(Clone)]
pub struct RecursiveHierarchyClosure {
    repository: Arc<dyn RecursiveHierarchyRepository>,
}

impl RecursiveHierarchyClosure {
    /// Creates a recursive closure over a store that evaluates closures natively.
    #[must_use]
    pub fn new(repository: Arc<dyn RecursiveHierarchyRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl HierarchyClosure for RecursiveHierarchyClosure {
    async fn accessor_closure(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<InheritedAccessor>> {
        let mut closure = self.repository.accessor_closure(accessor_id).await?;
        closure.sort();
        // Keep the shortest hop count per resource.
        let mut seen = HashSet::new();
        closure.retain(|entry| seen.insert(entry.resource_id));

        if closure.first() != Some(&InheritedAccessor::new(accessor_id, 0)) {
            return Err(AppError::Internal(format!(
                "accessor closure of resource {accessor_id} does not start at the accessor"
            )));
        }

        debug!(accessor = %accessor_id, size = closure.len(), "computed accessor closure");
        Ok(closure)
    }

    async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>> {
        let mut ancestors = self.repository.ancestor_domains(domain_id).await?;
        ancestors.sort();
        let mut seen = HashSet::new();
        ancestors.retain(|entry| seen.insert(entry.domain_id));

        if ancestors.first() != Some(&AncestorDomain::new(domain_id, 0)) {
            return Err(AppError::Internal(format!(
                "ancestor chain of domain {domain_id} does not start at the domain"
            )));
        }

        Ok(ancestors)
    }

    async fn descendant_domains(&self, domain_id: DomainId) -> AppResult<Vec<DescendantDomain>> {
        let mut descendants = self.repository.descendant_domains(domain_id).await?;
        descendants.sort();
        let mut seen = HashSet::new();
        descendants.retain(|entry| seen.insert(entry.domain_id));

        if descendants.first() != Some(&DescendantDomain::new(domain_id, 0)) {
            return Err(AppError::Internal(format!(
                "descendant closure of domain {domain_id} does not start at the domain"
            )));
        }

        debug!(domain = %domain_id, size = descendants.len(), "computed descendant domains");
        Ok(descendants)
    }
}

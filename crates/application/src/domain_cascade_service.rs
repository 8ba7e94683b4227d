use std::sync::Arc;

use tessera_core::{AppError, AppResult, NonEmptyString};
use tessera_domain::DescendantDomain;
use tracing::info;

use crate::authorization_ports::{DomainGrantRemover, ResourceDirectory};
use crate::hierarchy_closure::HierarchyClosure;

/// Orders a domain subtree for child-first removal.
#[derive(Clone)]
pub struct DomainCascadeService {
    directory: Arc<dyn ResourceDirectory>,
    closure: Arc<dyn HierarchyClosure>,
    remover: Arc<dyn DomainGrantRemover>,
}

impl DomainCascadeService {
    /// Creates a cascade service.
    #[must_use]
    pub fn new(
        directory: Arc<dyn ResourceDirectory>,
        closure: Arc<dyn HierarchyClosure>,
        remover: Arc<dyn DomainGrantRemover>,
    ) -> Self {
        Self {
            directory,
            closure,
            remover,
        }
    }

    /// Returns the domain and its descendants, ascending by level.
    ///
    /// Callers removing dependent rows must walk the list from the end.
    pub async fn descendants_by_level(
        &self,
        domain_name: &str,
    ) -> AppResult<Vec<DescendantDomain>> {
        let domain_name = NonEmptyString::required(domain_name, "domain name")?;
        let domain = self
            .directory
            .find_domain_by_name(domain_name.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("could not find domain '{domain_name}'")))?;

        self.closure.descendant_domains(domain.id()).await
    }

    /// Removes the domain-scoped grants of the whole subtree, deepest domains first.
    ///
    /// Returns the number of domains processed.
    pub async fn remove_domain_scoped_grants(&self, domain_name: &str) -> AppResult<usize> {
        let descendants = self.descendants_by_level(domain_name).await?;

        let mut removed_rows = 0;
        // Descending level: children before parents.
        for descendant in descendants.iter().rev() {
            removed_rows += self
                .remover
                .remove_domain_scoped_grants(descendant.domain_id)
                .await?;
        }

        info!(
            domain = domain_name,
            domains = descendants.len(),
            rows = removed_rows,
            "removed domain scoped grants"
        );
        Ok(descendants.len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tessera_core::{AppError, AppResult, DomainId, ResourceClassId, ResourceId};
    use tessera_domain::{
        AncestorDomain, DescendantDomain, Domain, InheritedAccessor, Resource, ResourceClass,
    };
    use tokio::sync::Mutex;

    use crate::authorization_ports::{DomainGrantRemover, ResourceDirectory};
    use crate::hierarchy_closure::HierarchyClosure;

    use super::DomainCascadeService;

    struct FakeTree {
        domains: HashMap<DomainId, Domain>,
    }

    impl FakeTree {
        fn new(domains: &[(i64, &str, Option<i64>)]) -> Self {
            let domains = domains
                .iter()
                .map(|(id, name, parent)| {
                    let domain = Domain::new(DomainId::new(*id), name, parent.map(DomainId::new))
                        .unwrap_or_else(|_| unreachable!());
                    (domain.id(), domain)
                })
                .collect();
            Self { domains }
        }
    }

    #[async_trait]
    impl ResourceDirectory for FakeTree {
        async fn find_resource(&self, _resource_id: ResourceId) -> AppResult<Option<Resource>> {
            Ok(None)
        }

        async fn find_resource_class(
            &self,
            _resource_class_id: ResourceClassId,
        ) -> AppResult<Option<ResourceClass>> {
            Ok(None)
        }

        async fn find_resource_class_by_name(
            &self,
            _name: &str,
        ) -> AppResult<Option<ResourceClass>> {
            Ok(None)
        }

        async fn list_resource_classes(&self) -> AppResult<Vec<ResourceClass>> {
            Ok(Vec::new())
        }

        async fn find_domain(&self, domain_id: DomainId) -> AppResult<Option<Domain>> {
            Ok(self.domains.get(&domain_id).cloned())
        }

        async fn find_domain_by_name(&self, name: &str) -> AppResult<Option<Domain>> {
            Ok(self
                .domains
                .values()
                .find(|domain| domain.name() == name)
                .cloned())
        }

        async fn list_resources_by_class(
            &self,
            _resource_class_id: ResourceClassId,
        ) -> AppResult<Vec<Resource>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl HierarchyClosure for FakeTree {
        async fn accessor_closure(
            &self,
            accessor_id: ResourceId,
        ) -> AppResult<Vec<InheritedAccessor>> {
            Ok(vec![InheritedAccessor::new(accessor_id, 0)])
        }

        async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>> {
            Ok(vec![AncestorDomain::new(domain_id, 0)])
        }

        async fn descendant_domains(
            &self,
            domain_id: DomainId,
        ) -> AppResult<Vec<DescendantDomain>> {
            let mut descendants = vec![DescendantDomain::new(domain_id, 0)];
            let mut index = 0;
            while index < descendants.len() {
                let current = descendants[index];
                let mut children: Vec<DomainId> = self
                    .domains
                    .values()
                    .filter(|domain| domain.parent_id() == Some(current.domain_id))
                    .map(Domain::id)
                    .collect();
                children.sort();
                descendants.extend(
                    children
                        .into_iter()
                        .map(|child| DescendantDomain::new(child, current.level + 1)),
                );
                index += 1;
            }
            descendants.sort();
            Ok(descendants)
        }
    }

    #[derive(Default)]
    struct RecordingRemover {
        removed: Mutex<Vec<DomainId>>,
    }

    #[async_trait]
    impl DomainGrantRemover for RecordingRemover {
        async fn remove_domain_scoped_grants(&self, domain_id: DomainId) -> AppResult<u64> {
            self.removed.lock().await.push(domain_id);
            Ok(2)
        }
    }

    fn tree() -> Arc<FakeTree> {
        Arc::new(FakeTree::new(&[
            (1, "root", None),
            (2, "parent", Some(1)),
            (3, "child1", Some(2)),
            (4, "child2", Some(2)),
            (5, "grandchild", Some(3)),
            (6, "sibling", Some(1)),
        ]))
    }

    #[tokio::test]
    async fn descendants_are_ascending_by_level() {
        let tree = tree();
        let service = DomainCascadeService::new(
            tree.clone(),
            tree,
            Arc::new(RecordingRemover::default()),
        );

        let descendants = service.descendants_by_level("parent").await;
        let levels: Vec<(i64, u32)> = descendants
            .unwrap_or_default()
            .into_iter()
            .map(|entry| (entry.domain_id.as_i64(), entry.level))
            .collect();
        assert_eq!(levels, vec![(2, 0), (3, 1), (4, 1), (5, 2)]);
    }

    #[tokio::test]
    async fn removal_walks_deepest_domains_first() {
        let tree = tree();
        let remover = Arc::new(RecordingRemover::default());
        let service = DomainCascadeService::new(tree.clone(), tree, remover.clone());

        let processed = service.remove_domain_scoped_grants("parent").await;
        assert_eq!(processed.ok(), Some(4));

        let removed: Vec<i64> = remover
            .removed
            .lock()
            .await
            .iter()
            .map(DomainId::as_i64)
            .collect();
        assert_eq!(removed, vec![5, 4, 3, 2]);
    }

    #[tokio::test]
    async fn unknown_domain_is_reported_before_removal() {
        let tree = tree();
        let remover = Arc::new(RecordingRemover::default());
        let service = DomainCascadeService::new(tree.clone(), tree, remover.clone());

        let result = service.remove_domain_scoped_grants("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(message))
            if message.contains("could not find domain")));
        assert!(remover.removed.lock().await.is_empty());
    }
}

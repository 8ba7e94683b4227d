use async_trait::async_trait;
use tessera_application::{DomainGrantRemover, GrantRepository};
use tessera_core::{AppResult, DomainId, ResourceClassId, ResourceId};
use tessera_domain::{
    ClassDomainGrant, DomainCreatePermission, DomainPermission, DomainScopedGrant,
    ResourceCreatePermission, ResourcePermission,
};

use super::{GlobalKey, InMemoryAuthorizationStore};

#[async_trait]
impl GrantRepository for InMemoryAuthorizationStore {
    async fn list_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
    ) -> AppResult<Vec<ResourcePermission>> {
        Ok(self
            .resource_permissions
            .read()
            .await
            .get(&(accessor_id, accessed_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
    ) -> AppResult<Vec<ResourcePermission>> {
        Ok(self
            .global_permissions
            .read()
            .await
            .get(&(accessor_id, resource_class_id, domain_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
    ) -> AppResult<Vec<ResourceCreatePermission>> {
        Ok(self
            .resource_create_permissions
            .read()
            .await
            .get(&(accessor_id, resource_class_id, domain_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_domain_permissions(
        &self,
        accessor_id: ResourceId,
        domain_id: DomainId,
    ) -> AppResult<Vec<DomainPermission>> {
        Ok(self
            .domain_permissions
            .read()
            .await
            .get(&(accessor_id, domain_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_domain_create_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<DomainCreatePermission>> {
        Ok(self
            .domain_create_permissions
            .read()
            .await
            .get(&accessor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_all_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<ClassDomainGrant<ResourcePermission>>> {
        let grants = self.global_permissions.read().await;
        Ok(scoped_grants(grants.iter(), accessor_id))
    }

    async fn list_all_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<ClassDomainGrant<ResourceCreatePermission>>> {
        let grants = self.resource_create_permissions.read().await;
        Ok(scoped_grants(grants.iter(), accessor_id))
    }

    async fn list_all_domain_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<DomainScopedGrant<DomainPermission>>> {
        let grants = self.domain_permissions.read().await;
        let mut held: Vec<_> = grants
            .iter()
            .filter(|((accessor, _), _)| *accessor == accessor_id)
            .flat_map(|((_, domain_id), permissions)| {
                permissions
                    .iter()
                    .map(move |permission| DomainScopedGrant::new(*domain_id, *permission))
            })
            .collect();
        held.sort_by_key(|grant| grant.domain_id);
        Ok(held)
    }
}

/// Flattens class and domain keyed grants of one accessor, ordered by domain then class.
fn scoped_grants<'a, P: Clone + 'a>(
    grants: impl Iterator<Item = (&'a GlobalKey, &'a Vec<P>)>,
    accessor_id: ResourceId,
) -> Vec<ClassDomainGrant<P>> {
    let mut held: Vec<_> = grants
        .filter(|((accessor, _, _), _)| *accessor == accessor_id)
        .flat_map(|((_, resource_class_id, domain_id), permissions)| {
            permissions.iter().map(move |permission| {
                ClassDomainGrant::new(*resource_class_id, *domain_id, permission.clone())
            })
        })
        .collect();
    held.sort_by_key(|grant| (grant.domain_id, grant.resource_class_id));
    held
}

#[async_trait]
impl DomainGrantRemover for InMemoryAuthorizationStore {
    async fn remove_domain_scoped_grants(&self, domain_id: DomainId) -> AppResult<u64> {
        let mut removed = 0;

        self.global_permissions
            .write()
            .await
            .retain(|(_, _, scoped), permissions| {
                if *scoped != domain_id {
                    return true;
                }
                removed += permissions.len();
                false
            });
        self.resource_create_permissions
            .write()
            .await
            .retain(|(_, _, scoped), permissions| {
                if *scoped != domain_id {
                    return true;
                }
                removed += permissions.len();
                false
            });
        self.domain_permissions
            .write()
            .await
            .retain(|(_, scoped), permissions| {
                if *scoped != domain_id {
                    return true;
                }
                removed += permissions.len();
                false
            });

        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

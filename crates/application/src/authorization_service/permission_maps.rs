use std::collections::BTreeMap;

use tessera_core::{AppError, AppResult, DomainId, ResourceClassId, ResourceId};
use tessera_domain::{
    ClassDomainGrant, DescendantDomain, EffectivePermission, InheritedAccessor, PermissionValue,
    ResourceClass, ResourceCreatePermission, ResourcePermission, merge_effective_permissions,
};
use tracing::debug;

use super::{AuthorizationService, SuperUserGrant};

/// Effective permissions keyed by domain name, then by resource class name.
pub type PermissionsByDomainAndClass<P> =
    BTreeMap<String, BTreeMap<String, Vec<EffectivePermission<P>>>>;

type DescendantCache = BTreeMap<DomainId, Vec<DescendantDomain>>;

impl AuthorizationService {
    /// Returns the resource-create permissions the accessor holds, for every domain and class.
    ///
    /// A grant on a domain is reported under that domain and each of its descendants,
    /// with `domain_level` counting the hops down from the granted domain.
    pub async fn effective_resource_create_permissions_map(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<PermissionsByDomainAndClass<ResourceCreatePermission>> {
        self.require_resource(accessor_id, "accessor").await?;
        let accessors = self.closure.accessor_closure(accessor_id).await?;

        let mut grants = Vec::new();
        for accessor in &accessors {
            let held = self
                .grants
                .list_all_resource_create_permissions(accessor.resource_id)
                .await?;
            grants.extend(held.into_iter().map(|grant| (accessor.inherit_level, grant)));
        }

        self.permission_map(
            accessor_id,
            &accessors,
            grants,
            ResourceClass::defined_resource_create_permissions,
        )
        .await
    }

    /// Returns the global resource permissions the accessor holds, for every domain and class.
    pub async fn effective_global_resource_permissions_map(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<PermissionsByDomainAndClass<ResourcePermission>> {
        self.require_resource(accessor_id, "accessor").await?;
        let accessors = self.closure.accessor_closure(accessor_id).await?;

        let mut grants = Vec::new();
        for accessor in &accessors {
            let held = self
                .grants
                .list_all_global_resource_permissions(accessor.resource_id)
                .await?;
            grants.extend(held.into_iter().map(|grant| (accessor.inherit_level, grant)));
        }

        self.permission_map(
            accessor_id,
            &accessors,
            grants,
            ResourceClass::defined_resource_permissions,
        )
        .await
    }

    async fn permission_map<P, F>(
        &self,
        accessor_id: ResourceId,
        accessors: &[InheritedAccessor],
        grants: Vec<(u32, ClassDomainGrant<P>)>,
        defined: F,
    ) -> AppResult<PermissionsByDomainAndClass<P>>
    where
        P: PermissionValue,
        F: Fn(&ResourceClass) -> Vec<P>,
    {
        let mut cache = DescendantCache::new();
        let mut collected: BTreeMap<(DomainId, ResourceClassId), Vec<EffectivePermission<P>>> =
            BTreeMap::new();
        for (inherit_level, grant) in grants {
            for descendant in self.subtree(&mut cache, grant.domain_id).await? {
                collected
                    .entry((descendant.domain_id, grant.resource_class_id))
                    .or_default()
                    .push(EffectivePermission::new(
                        grant.permission.clone(),
                        inherit_level,
                        descendant.level,
                    ));
            }
        }

        let classes = self.directory.list_resource_classes().await?;
        for (domain_id, grant) in self.super_user_domains(accessors, &mut cache).await? {
            for resource_class in &classes {
                collected.insert(
                    (domain_id, resource_class.id()),
                    grant.expand(defined(resource_class)),
                );
            }
        }

        let class_names: BTreeMap<ResourceClassId, &str> = classes
            .iter()
            .map(|resource_class| (resource_class.id(), resource_class.name()))
            .collect();
        let mut domain_names: BTreeMap<DomainId, String> = BTreeMap::new();
        for (domain_id, _) in collected.keys() {
            if domain_names.contains_key(domain_id) {
                continue;
            }
            let domain = self.directory.find_domain(*domain_id).await?.ok_or_else(|| {
                AppError::InvalidState(format!("granted domain {domain_id} does not exist"))
            })?;
            domain_names.insert(*domain_id, domain.name().to_owned());
        }

        let mut mapped: PermissionsByDomainAndClass<P> = BTreeMap::new();
        for ((domain_id, resource_class_id), permissions) in collected {
            let class_name = class_names.get(&resource_class_id).ok_or_else(|| {
                AppError::InvalidState(format!(
                    "granted resource class {resource_class_id} does not exist"
                ))
            })?;
            let domain_name = domain_names.get(&domain_id).cloned().unwrap_or_default();
            mapped
                .entry(domain_name)
                .or_default()
                .insert((*class_name).to_owned(), merge_effective_permissions(permissions));
        }

        debug!(
            accessor = %accessor_id,
            domains = mapped.len(),
            "resolved permission map"
        );
        Ok(mapped)
    }

    /// Every domain covered by a `*SUPER-USER` grant of the closure, with the closest grant.
    async fn super_user_domains(
        &self,
        accessors: &[InheritedAccessor],
        cache: &mut DescendantCache,
    ) -> AppResult<BTreeMap<DomainId, SuperUserGrant>> {
        let mut covered: BTreeMap<DomainId, SuperUserGrant> = BTreeMap::new();
        for accessor in accessors {
            let held = self
                .grants
                .list_all_domain_permissions(accessor.resource_id)
                .await?;
            for grant in held.iter().filter(|grant| grant.permission.is_super_user()) {
                for descendant in self.subtree(cache, grant.domain_id).await? {
                    let candidate = SuperUserGrant {
                        inherit_level: accessor.inherit_level,
                        domain_level: descendant.level,
                    };
                    covered
                        .entry(descendant.domain_id)
                        .and_modify(|closest| *closest = (*closest).min(candidate))
                        .or_insert(candidate);
                }
            }
        }

        Ok(covered)
    }

    async fn subtree(
        &self,
        cache: &mut DescendantCache,
        domain_id: DomainId,
    ) -> AppResult<Vec<DescendantDomain>> {
        if let Some(descendants) = cache.get(&domain_id) {
            return Ok(descendants.clone());
        }

        let descendants = self.closure.descendant_domains(domain_id).await?;
        cache.insert(domain_id, descendants.clone());
        Ok(descendants)
    }
}

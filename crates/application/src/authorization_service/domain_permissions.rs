use tessera_core::{AppError, AppResult, ResourceId};
use tessera_domain::{DomainPermission, EffectivePermission, merge_effective_permissions};
use tracing::info;

use super::{
    AuthorizationService, SuperUserGrant, all_satisfied, missing_permissions, require_requested,
};

impl AuthorizationService {
    /// Returns whether the accessor holds every requested permission on the domain.
    pub async fn has_domain_permissions(
        &self,
        accessor_id: ResourceId,
        domain_name: &str,
        requested: &[DomainPermission],
    ) -> AppResult<bool> {
        require_requested(requested)?;
        let effective = self
            .effective_domain_permissions(accessor_id, domain_name)
            .await?;

        Ok(all_satisfied(requested, &effective))
    }

    /// Fails with [`AppError::Forbidden`] unless every requested domain permission is held.
    pub async fn require_domain_permissions(
        &self,
        accessor_id: ResourceId,
        domain_name: &str,
        requested: &[DomainPermission],
    ) -> AppResult<()> {
        require_requested(requested)?;
        let effective = self
            .effective_domain_permissions(accessor_id, domain_name)
            .await?;
        if all_satisfied(requested, &effective) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "resource {accessor_id} is missing domain permission(s) {} on domain '{domain_name}'",
            missing_permissions(requested, &effective)
        )))
    }

    /// Returns the domain permissions the accessor holds on the domain, including those
    /// granted on its ancestors.
    ///
    /// A `*SUPER-USER` grant anywhere on the chain expands to every domain permission.
    pub async fn effective_domain_permissions(
        &self,
        accessor_id: ResourceId,
        domain_name: &str,
    ) -> AppResult<Vec<EffectivePermission<DomainPermission>>> {
        self.require_resource(accessor_id, "accessor").await?;
        let domain = self.require_domain(domain_name).await?;

        let accessors = self.closure.accessor_closure(accessor_id).await?;
        let ancestors = self.closure.ancestor_domains(domain.id()).await?;

        let mut collected = Vec::new();
        for accessor in &accessors {
            for ancestor in &ancestors {
                let permissions = self
                    .grants
                    .list_domain_permissions(accessor.resource_id, ancestor.domain_id)
                    .await?;
                collected.extend(permissions.into_iter().map(|permission| {
                    EffectivePermission::new(
                        permission,
                        accessor.inherit_level,
                        ancestor.domain_level,
                    )
                }));
            }
        }

        let super_user = collected
            .iter()
            .filter(|entry| entry.permission.is_super_user())
            .map(|entry| SuperUserGrant {
                inherit_level: entry.inherit_level,
                domain_level: entry.domain_level,
            })
            .min_by_key(|grant| (grant.inherit_level, grant.domain_level));
        if let Some(grant) = super_user {
            info!(
                accessor = %accessor_id,
                domain = %domain.id(),
                "super-user grant covers queried domain"
            );
            return Ok(grant.expand(DomainPermission::all_regrantable()));
        }

        Ok(merge_effective_permissions(collected))
    }
}

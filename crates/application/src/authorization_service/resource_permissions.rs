use tessera_core::{AppError, AppResult, ResourceId};
use tessera_domain::{
    EffectivePermission, ResourcePermission, is_grantable_from, merge_effective_permissions,
};
use tracing::debug;

use super::{AuthorizationService, all_satisfied, missing_permissions, require_requested};

impl AuthorizationService {
    /// Returns whether the accessor holds every requested permission on the accessed resource.
    pub async fn has_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
        requested: &[ResourcePermission],
    ) -> AppResult<bool> {
        require_requested(requested)?;
        let effective = self
            .checked_resource_permissions(accessor_id, accessed_id, requested)
            .await?;
        let granted = all_satisfied(requested, &effective);

        debug!(
            accessor = %accessor_id,
            accessed = %accessed_id,
            requested = requested.len(),
            granted,
            "resolved resource permission check"
        );
        Ok(granted)
    }

    /// Fails with [`AppError::Forbidden`] unless every requested permission is held.
    pub async fn require_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
        requested: &[ResourcePermission],
    ) -> AppResult<()> {
        require_requested(requested)?;
        let effective = self
            .checked_resource_permissions(accessor_id, accessed_id, requested)
            .await?;
        if all_satisfied(requested, &effective) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "resource {accessor_id} is missing permission(s) {} on resource {accessed_id}",
            missing_permissions(requested, &effective)
        )))
    }

    /// Returns the complete effective permission set of the accessor on the accessed resource.
    pub async fn effective_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
    ) -> AppResult<Vec<EffectivePermission<ResourcePermission>>> {
        self.checked_resource_permissions(accessor_id, accessed_id, &[])
            .await
    }

    /// Returns whether the grantor may grant every requested permission on the accessed resource.
    pub async fn can_grant_resource_permissions(
        &self,
        grantor_id: ResourceId,
        accessed_id: ResourceId,
        requested: &[ResourcePermission],
    ) -> AppResult<bool> {
        require_requested(requested)?;
        let effective = self
            .checked_resource_permissions(grantor_id, accessed_id, requested)
            .await?;

        Ok(requested.iter().all(|wanted| {
            effective
                .iter()
                .any(|held| is_grantable_from(wanted, &held.permission))
        }))
    }

    /// Returns whether the accessor holds every requested permission globally on the class
    /// in the domain, or in its own domain when no name is given.
    pub async fn has_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
        requested: &[ResourcePermission],
    ) -> AppResult<bool> {
        require_requested(requested)?;
        let effective = self
            .checked_global_permissions(accessor_id, resource_class_name, domain_name, requested)
            .await?;

        Ok(all_satisfied(requested, &effective))
    }

    /// Returns the global resource permissions the accessor holds on the class in the domain.
    pub async fn effective_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
    ) -> AppResult<Vec<EffectivePermission<ResourcePermission>>> {
        self.checked_global_permissions(accessor_id, resource_class_name, domain_name, &[])
            .await
    }

    /// Validates the arguments, then resolves.
    async fn checked_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
        requested: &[ResourcePermission],
    ) -> AppResult<Vec<EffectivePermission<ResourcePermission>>> {
        self.require_resource(accessor_id, "accessor").await?;
        let accessed = self.require_resource(accessed_id, "accessed").await?;
        let resource_class = self.require_resource_class_of(&accessed).await?;
        for permission in requested {
            resource_class.validate_resource_permission(permission)?;
        }

        let accessors = self.closure.accessor_closure(accessor_id).await?;
        self.resolve_resource_permissions(&accessors, &accessed, &resource_class)
            .await
    }

    async fn checked_global_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
        requested: &[ResourcePermission],
    ) -> AppResult<Vec<EffectivePermission<ResourcePermission>>> {
        let accessor = self.require_resource(accessor_id, "accessor").await?;
        let resource_class = self.require_resource_class(resource_class_name).await?;
        let domain = self.resolve_domain(&accessor, domain_name).await?;
        for permission in requested {
            resource_class.validate_resource_permission(permission)?;
        }

        let accessors = self.closure.accessor_closure(accessor_id).await?;
        let ancestors = self.closure.ancestor_domains(domain.id()).await?;
        if let Some(grant) = self.find_super_user(&accessors, &ancestors).await? {
            return Ok(grant.expand(resource_class.defined_resource_permissions()));
        }

        let collected = self
            .collect_global_permissions(&accessors, resource_class.id(), &ancestors)
            .await?;
        Ok(merge_effective_permissions(collected))
    }
}

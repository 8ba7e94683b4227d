use tessera_core::{AppError, AppResult, ResourceId};
use tessera_domain::{
    Domain, DomainCreatePermission, EffectivePermission, ResourceCreatePermission,
    merge_effective_permissions,
};
use tracing::debug;

use super::{AuthorizationService, all_satisfied, missing_permissions, require_requested};

impl AuthorizationService {
    /// Returns whether the accessor holds every requested resource-create permission
    /// for the class in the domain.
    ///
    /// Without a domain name the accessor's own domain is used.
    pub async fn has_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
        requested: &[ResourceCreatePermission],
    ) -> AppResult<bool> {
        require_requested(requested)?;
        let (domain, effective) = self
            .checked_resource_create_permissions(
                accessor_id,
                resource_class_name,
                domain_name,
                requested,
            )
            .await?;
        let granted = all_satisfied(requested, &effective);

        debug!(
            accessor = %accessor_id,
            resource_class = resource_class_name,
            domain = domain.name(),
            granted,
            "resolved resource create permission check"
        );
        Ok(granted)
    }

    /// Fails with [`AppError::Forbidden`] unless every requested resource-create permission
    /// is held.
    pub async fn require_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
        requested: &[ResourceCreatePermission],
    ) -> AppResult<()> {
        require_requested(requested)?;
        let (domain, effective) = self
            .checked_resource_create_permissions(
                accessor_id,
                resource_class_name,
                domain_name,
                requested,
            )
            .await?;
        if all_satisfied(requested, &effective) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "resource {accessor_id} is missing create permission(s) {} for resource class \
             '{resource_class_name}' in domain '{}'",
            missing_permissions(requested, &effective),
            domain.name()
        )))
    }

    /// Returns the resource-create permissions the accessor holds for the class in the domain.
    pub async fn effective_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
    ) -> AppResult<Vec<EffectivePermission<ResourceCreatePermission>>> {
        let (_, effective) = self
            .checked_resource_create_permissions(accessor_id, resource_class_name, domain_name, &[])
            .await?;
        Ok(effective)
    }

    /// Returns whether the accessor holds every requested domain-create permission.
    pub async fn has_domain_create_permissions(
        &self,
        accessor_id: ResourceId,
        requested: &[DomainCreatePermission],
    ) -> AppResult<bool> {
        require_requested(requested)?;
        let effective = self.effective_domain_create_permissions(accessor_id).await?;

        Ok(all_satisfied(requested, &effective))
    }

    /// Returns the domain-create permissions held by the accessor closure.
    ///
    /// Domain-create permissions carry no domain scope; `domain_level` is always `0`.
    pub async fn effective_domain_create_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<EffectivePermission<DomainCreatePermission>>> {
        self.require_resource(accessor_id, "accessor").await?;

        let accessors = self.closure.accessor_closure(accessor_id).await?;
        let mut collected = Vec::new();
        for accessor in &accessors {
            let permissions = self
                .grants
                .list_domain_create_permissions(accessor.resource_id)
                .await?;
            collected.extend(permissions.into_iter().map(|permission| {
                EffectivePermission::new(permission, accessor.inherit_level, 0)
            }));
        }

        Ok(merge_effective_permissions(collected))
    }

    async fn checked_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
        requested: &[ResourceCreatePermission],
    ) -> AppResult<(Domain, Vec<EffectivePermission<ResourceCreatePermission>>)> {
        let accessor = self.require_resource(accessor_id, "accessor").await?;
        let resource_class = self.require_resource_class(resource_class_name).await?;
        let domain = self.resolve_domain(&accessor, domain_name).await?;
        for permission in requested {
            resource_class.validate_resource_create_permission(permission)?;
        }

        let accessors = self.closure.accessor_closure(accessor_id).await?;
        let ancestors = self.closure.ancestor_domains(domain.id()).await?;
        if let Some(grant) = self.find_super_user(&accessors, &ancestors).await? {
            let expanded = grant.expand(resource_class.defined_resource_create_permissions());
            return Ok((domain, expanded));
        }

        let mut collected = Vec::new();
        for accessor in &accessors {
            for ancestor in &ancestors {
                let permissions = self
                    .grants
                    .list_resource_create_permissions(
                        accessor.resource_id,
                        resource_class.id(),
                        ancestor.domain_id,
                    )
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

        Ok((domain, merge_effective_permissions(collected)))
    }
}

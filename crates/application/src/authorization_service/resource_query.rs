use std::collections::HashSet;

use tessera_core::{AppResult, ResourceId};
use tessera_domain::{Resource, ResourcePermission};
use tracing::debug;

use super::{AuthorizationService, all_satisfied, require_requested};

impl AuthorizationService {
    /// Lists the resources of a class on which the accessor holds every requested permission.
    ///
    /// With a domain, only resources in that domain or its descendants are considered.
    /// Results are ordered by resource id.
    pub async fn resources_by_resource_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_name: &str,
        domain_name: Option<&str>,
        requested: &[ResourcePermission],
    ) -> AppResult<Vec<Resource>> {
        require_requested(requested)?;
        self.require_resource(accessor_id, "accessor").await?;
        let resource_class = self.require_resource_class(resource_class_name).await?;
        let domain = match domain_name {
            Some(name) => Some(self.require_domain(name).await?),
            None => None,
        };
        for permission in requested {
            resource_class.validate_resource_permission(permission)?;
        }

        let scope: Option<HashSet<_>> = match &domain {
            Some(domain) => Some(
                self.closure
                    .descendant_domains(domain.id())
                    .await?
                    .into_iter()
                    .map(|descendant| descendant.domain_id)
                    .collect(),
            ),
            None => None,
        };
        let accessors = self.closure.accessor_closure(accessor_id).await?;

        let candidates = self
            .directory
            .list_resources_by_class(resource_class.id())
            .await?;
        let mut matching = Vec::new();
        for resource in candidates {
            if scope
                .as_ref()
                .is_some_and(|scope| !scope.contains(&resource.domain_id()))
            {
                continue;
            }

            let effective = self
                .resolve_resource_permissions(&accessors, &resource, &resource_class)
                .await?;
            if all_satisfied(requested, &effective) {
                matching.push(resource);
            }
        }

        debug!(
            accessor = %accessor_id,
            resource_class = resource_class.name(),
            matches = matching.len(),
            "resolved resources by permission"
        );
        Ok(matching)
    }
}

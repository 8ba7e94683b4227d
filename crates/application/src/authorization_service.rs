use std::sync::Arc;

use tessera_core::{AppError, AppResult, NonEmptyString, ResourceClassId, ResourceId};
use tessera_domain::{
    AncestorDomain, Domain, EffectivePermission, InheritedAccessor, PermissionValue, Resource,
    ResourceClass, ResourcePermission, is_satisfied_by, merge_effective_permissions,
};
use tracing::info;

use crate::authorization_ports::{GrantRepository, ResourceDirectory};
use crate::hierarchy_closure::HierarchyClosure;

mod create_permissions;
mod domain_permissions;
mod permission_maps;
mod resource_permissions;
mod resource_query;

pub use permission_maps::PermissionsByDomainAndClass;


/// Effective-permission resolution over the resource and domain hierarchies.
///
/// Every operation validates its arguments before walking any closure and
/// reads the stores afresh; nothing is cached between calls.
#[derive(Clone)]
pub struct AuthorizationService {
    directory: Arc<dyn ResourceDirectory>,
    grants: Arc<dyn GrantRepository>,
    closure: Arc<dyn HierarchyClosure>,
}

/// Where a `*SUPER-USER` grant covering the queried domain was found.
///
/// Orders closest first: inheritance hops, then domain hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SuperUserGrant {
    inherit_level: u32,
    domain_level: u32,
}

impl SuperUserGrant {
    fn expand<P: PermissionValue>(self, permissions: Vec<P>) -> Vec<EffectivePermission<P>> {
        merge_effective_permissions(permissions.into_iter().map(|permission| {
            EffectivePermission::new(permission, self.inherit_level, self.domain_level)
        }))
    }
}

impl AuthorizationService {
    /// Creates a resolution service over the given stores and closure strategy.
    #[must_use]
    pub fn new(
        directory: Arc<dyn ResourceDirectory>,
        grants: Arc<dyn GrantRepository>,
        closure: Arc<dyn HierarchyClosure>,
    ) -> Self {
        Self {
            directory,
            grants,
            closure,
        }
    }

    async fn require_resource(&self, resource_id: ResourceId, role: &str) -> AppResult<Resource> {
        self.directory
            .find_resource(resource_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("could not find {role} resource {resource_id}"))
            })
    }

    async fn require_resource_class(&self, name: &str) -> AppResult<ResourceClass> {
        let name = NonEmptyString::required(name, "resource class name")?;
        self.directory
            .find_resource_class_by_name(name.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("could not find resource class '{name}'")))
    }

    async fn require_resource_class_of(&self, resource: &Resource) -> AppResult<ResourceClass> {
        let resource_class_id: ResourceClassId = resource.resource_class_id();
        self.directory
            .find_resource_class(resource_class_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "could not find resource class {resource_class_id} of resource {}",
                    resource.id()
                ))
            })
    }

    async fn require_domain(&self, name: &str) -> AppResult<Domain> {
        let name = NonEmptyString::required(name, "domain name")?;
        self.directory
            .find_domain_by_name(name.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("could not find domain '{name}'")))
    }

    /// Resolves the named domain, or the accessor's own domain when no name is given.
    async fn resolve_domain(
        &self,
        accessor: &Resource,
        domain_name: Option<&str>,
    ) -> AppResult<Domain> {
        let Some(name) = domain_name else {
            let domain_id = accessor.domain_id();
            return self.directory.find_domain(domain_id).await?.ok_or_else(|| {
                AppError::InvalidState(format!(
                    "domain {domain_id} of accessor resource {} does not exist",
                    accessor.id()
                ))
            });
        };

        self.require_domain(name).await
    }

    /// Finds the closest `*SUPER-USER` grant held by the closure on the chain.
    ///
    /// Both slices are sorted by level, so the first hit is the closest one.
    async fn find_super_user(
        &self,
        accessors: &[InheritedAccessor],
        ancestors: &[AncestorDomain],
    ) -> AppResult<Option<SuperUserGrant>> {
        for accessor in accessors {
            for ancestor in ancestors {
                let permissions = self
                    .grants
                    .list_domain_permissions(accessor.resource_id, ancestor.domain_id)
                    .await?;
                if permissions.iter().any(|permission| permission.is_super_user()) {
                    info!(
                        accessor = %accessor.resource_id,
                        domain = %ancestor.domain_id,
                        "super-user grant covers queried domain"
                    );
                    return Ok(Some(SuperUserGrant {
                        inherit_level: accessor.inherit_level,
                        domain_level: ancestor.domain_level,
                    }));
                }
            }
        }

        Ok(None)
    }

    /// Effective resource permissions of an accessor closure on one resource.
    async fn resolve_resource_permissions(
        &self,
        accessors: &[InheritedAccessor],
        resource: &Resource,
        resource_class: &ResourceClass,
    ) -> AppResult<Vec<EffectivePermission<ResourcePermission>>> {
        let ancestors = self.closure.ancestor_domains(resource.domain_id()).await?;
        if let Some(grant) = self.find_super_user(accessors, &ancestors).await? {
            return Ok(grant.expand(resource_class.defined_resource_permissions()));
        }

        let mut collected = Vec::new();
        for accessor in accessors {
            let direct = self
                .grants
                .list_resource_permissions(accessor.resource_id, resource.id())
                .await?;
            collected.extend(direct.into_iter().map(|permission| {
                EffectivePermission::new(permission, accessor.inherit_level, 0)
            }));
        }
        collected.extend(
            self.collect_global_permissions(accessors, resource_class.id(), &ancestors)
                .await?,
        );

        Ok(merge_effective_permissions(collected))
    }

    /// Global grants on the class, held on the chain and inherited downward.
    async fn collect_global_permissions(
        &self,
        accessors: &[InheritedAccessor],
        resource_class_id: ResourceClassId,
        ancestors: &[AncestorDomain],
    ) -> AppResult<Vec<EffectivePermission<ResourcePermission>>> {
        let mut collected = Vec::new();
        for accessor in accessors {
            for ancestor in ancestors {
                let permissions = self
                    .grants
                    .list_global_resource_permissions(
                        accessor.resource_id,
                        resource_class_id,
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

        Ok(collected)
    }
}

fn require_requested<P>(requested: &[P]) -> AppResult<()> {
    if requested.is_empty() {
        return Err(AppError::Required(
            "at least one requested permission required".to_owned(),
        ));
    }

    Ok(())
}

/// Conjunctive check: every requested permission is covered by some effective one.
fn all_satisfied<P: PermissionValue>(
    requested: &[P],
    effective: &[EffectivePermission<P>],
) -> bool {
    requested.iter().all(|wanted| {
        effective
            .iter()
            .any(|held| is_satisfied_by(wanted, &held.permission))
    })
}

fn missing_permissions<P: PermissionValue>(
    requested: &[P],
    effective: &[EffectivePermission<P>],
) -> String {
    requested
        .iter()
        .filter(|wanted| {
            !effective
                .iter()
                .any(|held| is_satisfied_by(*wanted, &held.permission))
        })
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

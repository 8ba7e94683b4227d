use std::collections::BTreeSet;

use serde::Serialize;
use tessera_core::{AppError, AppResult, DomainId, NonEmptyString, ResourceClassId, ResourceId};

use crate::{
    PermissionFamily, ResourceCreateGrant, ResourceCreatePermission, ResourcePermission,
    ResourcePermissionName, SystemPermission,
};

/// A resource: identity, class and owning domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Resource {
    id: ResourceId,
    resource_class_id: ResourceClassId,
    domain_id: DomainId,
}

impl Resource {
    /// Creates a resource descriptor.
    #[must_use]
    pub fn new(id: ResourceId, resource_class_id: ResourceClassId, domain_id: DomainId) -> Self {
        Self {
            id,
            resource_class_id,
            domain_id,
        }
    }

    /// Returns the resource identity.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns the class the resource belongs to.
    #[must_use]
    pub fn resource_class_id(&self) -> ResourceClassId {
        self.resource_class_id
    }

    /// Returns the domain owning the resource.
    #[must_use]
    pub fn domain_id(&self) -> DomainId {
        self.domain_id
    }
}

/// A named node of the domain tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Domain {
    id: DomainId,
    name: NonEmptyString,
    parent_id: Option<DomainId>,
}

impl Domain {
    /// Creates a validated domain descriptor.
    pub fn new(id: DomainId, name: &str, parent_id: Option<DomainId>) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::required(name, "domain name")?,
            parent_id,
        })
    }

    /// Returns the domain identity.
    #[must_use]
    pub fn id(&self) -> DomainId {
        self.id
    }

    /// Returns the trimmed domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the parent domain, `None` for a root.
    #[must_use]
    pub fn parent_id(&self) -> Option<DomainId> {
        self.parent_id
    }
}

/// A registered resource class and the custom permission names it defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceClass {
    id: ResourceClassId,
    name: NonEmptyString,
    is_authenticatable: bool,
    permission_names: BTreeSet<String>,
}

impl ResourceClass {
    /// Creates a validated resource class descriptor.
    ///
    /// Custom permission names are trimmed and must not use the reserved `*` prefix.
    pub fn new(
        id: ResourceClassId,
        name: &str,
        is_authenticatable: bool,
        permission_names: impl IntoIterator<Item = String>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::required(name, "resource class name")?;
        let permission_names = permission_names
            .into_iter()
            .map(|permission_name| {
                let permission_name =
                    NonEmptyString::required(permission_name.as_str(), "permission name")?;
                if SystemPermission::is_reserved_name(permission_name.as_str()) {
                    return Err(AppError::Validation(format!(
                        "custom permission name '{permission_name}' must not start with '*'"
                    )));
                }
                Ok(String::from(permission_name))
            })
            .collect::<AppResult<BTreeSet<_>>>()?;

        Ok(Self {
            id,
            name,
            is_authenticatable,
            permission_names,
        })
    }

    /// Returns the class identity.
    #[must_use]
    pub fn id(&self) -> ResourceClassId {
        self.id
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether resources of this class may carry credentials.
    #[must_use]
    pub fn is_authenticatable(&self) -> bool {
        self.is_authenticatable
    }

    /// Returns the custom permission names, sorted.
    pub fn permission_names(&self) -> impl Iterator<Item = &str> {
        self.permission_names.iter().map(String::as_str)
    }

    /// Fails unless the permission is defined for this class.
    pub fn validate_resource_permission(&self, permission: &ResourcePermission) -> AppResult<()> {
        match permission.permission_name() {
            ResourcePermissionName::System(system) => {
                if system.requires_authenticatable_class() && !self.is_authenticatable {
                    return Err(AppError::Validation(format!(
                        "permission '{}' is not valid for unauthenticatable resource class '{}'",
                        system.name(),
                        self.name
                    )));
                }
                Ok(())
            }
            ResourcePermissionName::Custom(name) => {
                if self.permission_names.contains(name.as_str()) {
                    return Ok(());
                }
                Err(AppError::Validation(format!(
                    "permission '{name}' is not defined for resource class '{}'",
                    self.name
                )))
            }
        }
    }

    /// Fails unless the wrapped post-create permission (if any) is defined for this class.
    pub fn validate_resource_create_permission(
        &self,
        permission: &ResourceCreatePermission,
    ) -> AppResult<()> {
        match permission.grant() {
            ResourceCreateGrant::Create => Ok(()),
            ResourceCreateGrant::PostCreate(post_create) => {
                self.validate_resource_permission(post_create)
            }
        }
    }

    /// Every resource permission defined for this class, with grant option.
    #[must_use]
    pub fn defined_resource_permissions(&self) -> Vec<ResourcePermission> {
        let system = SystemPermission::all_for(PermissionFamily::Resource)
            .filter(|system| self.is_authenticatable || !system.requires_authenticatable_class())
            .map(|system| ResourcePermission::from_system(system, true));
        let custom = self.permission_names.iter().filter_map(|name| {
            ResourcePermission::instance_with_grant_option(name.as_str()).ok()
        });

        system.chain(custom).collect()
    }

    /// Every resource-create permission defined for this class, with grant option on both levels.
    #[must_use]
    pub fn defined_resource_create_permissions(&self) -> Vec<ResourceCreatePermission> {
        let marker =
            ResourceCreatePermission::instance_with_grant_option(ResourceCreatePermission::CREATE);

        marker
            .into_iter()
            .chain(
                self.defined_resource_permissions()
                    .into_iter()
                    .map(ResourceCreatePermission::for_post_create_with_grant_option),
            )
            .collect()
    }
}

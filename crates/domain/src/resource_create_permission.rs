use std::fmt::{Display, Formatter};

use serde::Serialize;
use tessera_core::{AppError, AppResult, NonEmptyString};

use crate::{PermissionFamily, PermissionValue, ResourcePermission, SystemPermission};

/// What a resource-create permission carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "permission", rename_all = "snake_case")]
pub enum ResourceCreateGrant {
    /// The bare `*CREATE` marker.
    Create,
    /// Permission auto-granted to the creator on the new resource.
    PostCreate(ResourcePermission),
}

/// Permission to create resources of a class inside a domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceCreatePermission {
    grant: ResourceCreateGrant,
    with_grant_option: bool,
}

impl ResourceCreatePermission {
    /// `*CREATE` system permission name.
    pub const CREATE: &'static str = "*CREATE";

    /// Creates the system marker permission from its name, without grant option.
    pub fn instance(name: &str) -> AppResult<Self> {
        Self::system(name, false)
    }

    /// Creates the system marker permission from its name, with grant option.
    pub fn instance_with_grant_option(name: &str) -> AppResult<Self> {
        Self::system(name, true)
    }

    /// Wraps a post-create permission, without grant option.
    #[must_use]
    pub fn for_post_create(post_create: ResourcePermission) -> Self {
        Self {
            grant: ResourceCreateGrant::PostCreate(post_create),
            with_grant_option: false,
        }
    }

    /// Wraps a post-create permission, with grant option.
    #[must_use]
    pub fn for_post_create_with_grant_option(post_create: ResourcePermission) -> Self {
        Self {
            grant: ResourceCreateGrant::PostCreate(post_create),
            with_grant_option: true,
        }
    }

    /// Re-validates a stored row: either a `*CREATE` id or a post-create permission.
    pub fn from_stored(
        system_permission_id: Option<i64>,
        post_create: Option<ResourcePermission>,
        with_grant_option: bool,
    ) -> AppResult<Self> {
        match (system_permission_id, post_create) {
            (Some(id), None) => {
                SystemPermission::by_id(PermissionFamily::ResourceCreate, id)?;
                Ok(Self {
                    grant: ResourceCreateGrant::Create,
                    with_grant_option,
                })
            }
            (None, Some(post_create)) => Ok(Self {
                grant: ResourceCreateGrant::PostCreate(post_create),
                with_grant_option,
            }),
            (id, post_create) => Err(AppError::InvalidState(format!(
                "resource create permission must carry exactly one of a system id ({id:?}) \
                 or a post-create permission ({post_create:?})"
            ))),
        }
    }

    fn system(name: &str, with_grant_option: bool) -> AppResult<Self> {
        let name = NonEmptyString::required(name, "permission name")?;
        SystemPermission::by_name(PermissionFamily::ResourceCreate, name.as_str())?;

        Ok(Self {
            grant: ResourceCreateGrant::Create,
            with_grant_option,
        })
    }

    /// Returns the carried grant.
    #[must_use]
    pub fn grant(&self) -> &ResourceCreateGrant {
        &self.grant
    }

    /// Returns whether this is the `*CREATE` marker.
    #[must_use]
    pub fn is_system_permission(&self) -> bool {
        matches!(self.grant, ResourceCreateGrant::Create)
    }

    /// Returns the wrapped post-create permission, if any.
    #[must_use]
    pub fn post_create_permission(&self) -> Option<&ResourcePermission> {
        match &self.grant {
            ResourceCreateGrant::Create => None,
            ResourceCreateGrant::PostCreate(permission) => Some(permission),
        }
    }
}

impl PermissionValue for ResourceCreatePermission {
    fn family() -> PermissionFamily {
        PermissionFamily::ResourceCreate
    }

    fn is_with_grant_option(&self) -> bool {
        self.with_grant_option
    }

    fn regrantable(&self) -> Self {
        let grant = match &self.grant {
            ResourceCreateGrant::Create => ResourceCreateGrant::Create,
            ResourceCreateGrant::PostCreate(permission) => {
                ResourceCreateGrant::PostCreate(permission.regrantable())
            }
        };

        Self {
            grant,
            with_grant_option: true,
        }
    }

    fn equals_ignoring_grant_option(&self, other: &Self) -> bool {
        self.grant == other.grant
    }

    fn same_identity(&self, other: &Self) -> bool {
        match (&self.grant, &other.grant) {
            (ResourceCreateGrant::Create, ResourceCreateGrant::Create) => true,
            (ResourceCreateGrant::PostCreate(left), ResourceCreateGrant::PostCreate(right)) => {
                left.same_identity(right)
            }
            _ => false,
        }
    }

    fn post_create_grant_option(&self) -> Option<bool> {
        self.post_create_permission()
            .map(PermissionValue::is_with_grant_option)
    }
}

impl Display for ResourceCreatePermission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.grant {
            ResourceCreateGrant::Create => formatter.write_str(Self::CREATE)?,
            ResourceCreateGrant::PostCreate(permission) => write!(formatter, "[{permission}]")?,
        }
        if self.with_grant_option {
            formatter.write_str(" /G")?;
        }
        Ok(())
    }
}

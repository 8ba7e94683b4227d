use std::fmt::{Display, Formatter};

use serde::Serialize;
use tessera_core::{AppError, AppResult, NonEmptyString};

use crate::{PermissionFamily, PermissionValue, SystemPermission};

/// Permission held by an accessor on a domain. Domain permissions are always system permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DomainPermission {
    system: SystemPermission,
    with_grant_option: bool,
}

impl DomainPermission {
    /// `*SUPER-USER` system permission name.
    pub const SUPER_USER: &'static str = "*SUPER-USER";
    /// `*CREATE-CHILD-DOMAIN` system permission name.
    pub const CREATE_CHILD_DOMAIN: &'static str = "*CREATE-CHILD-DOMAIN";
    /// `*DELETE` system permission name.
    pub const DELETE: &'static str = "*DELETE";

    /// Creates a domain permission without grant option.
    pub fn instance(name: &str) -> AppResult<Self> {
        Self::build(name, false)
    }

    /// Creates a domain permission with grant option.
    pub fn instance_with_grant_option(name: &str) -> AppResult<Self> {
        Self::build(name, true)
    }

    /// Re-validates a stored permission, checking the id/name pairing.
    pub fn from_stored(system_permission_id: i64, with_grant_option: bool) -> AppResult<Self> {
        let system = SystemPermission::by_id(PermissionFamily::Domain, system_permission_id)?;
        Ok(Self {
            system,
            with_grant_option,
        })
    }

    /// Every domain permission, with grant option.
    #[must_use]
    pub fn all_regrantable() -> Vec<Self> {
        SystemPermission::all_for(PermissionFamily::Domain)
            .map(|system| Self {
                system,
                with_grant_option: true,
            })
            .collect()
    }

    fn build(name: &str, with_grant_option: bool) -> AppResult<Self> {
        let name = NonEmptyString::required(name, "permission name")?;
        let system = SystemPermission::by_name(PermissionFamily::Domain, name.as_str())?;

        Ok(Self {
            system,
            with_grant_option,
        })
    }

    /// Checks an externally supplied name/id pair against the registry.
    pub fn verify(
        name: &str,
        system_permission_id: i64,
        with_grant_option: bool,
    ) -> AppResult<Self> {
        let permission = Self::build(name, with_grant_option)?;
        if permission.system.id() != system_permission_id {
            return Err(AppError::InvalidState(format!(
                "invalid system permission id {system_permission_id} for domain permission '{}'",
                permission.name()
            )));
        }

        Ok(permission)
    }

    /// Returns the permission name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.system.name()
    }

    /// Returns the registered system permission.
    #[must_use]
    pub fn system_permission(&self) -> SystemPermission {
        self.system
    }

    /// Returns whether this is `*SUPER-USER`, regardless of grant option.
    #[must_use]
    pub fn is_super_user(&self) -> bool {
        self.system == SystemPermission::SUPER_USER
    }
}

impl PermissionValue for DomainPermission {
    fn family() -> PermissionFamily {
        PermissionFamily::Domain
    }

    fn is_with_grant_option(&self) -> bool {
        self.with_grant_option
    }

    fn regrantable(&self) -> Self {
        Self {
            system: self.system,
            with_grant_option: true,
        }
    }

    fn equals_ignoring_grant_option(&self, other: &Self) -> bool {
        self.system == other.system
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.system == other.system
    }
}

impl Display for DomainPermission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())?;
        if self.with_grant_option {
            formatter.write_str(" /G")?;
        }
        Ok(())
    }
}

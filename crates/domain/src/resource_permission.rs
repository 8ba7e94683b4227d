use std::fmt::{Display, Formatter};

use serde::Serialize;
use tessera_core::{AppError, AppResult, NonEmptyString};

use crate::{PermissionFamily, PermissionValue, SystemPermission};

/// Name of a resource permission: reserved system entry or class-scoped custom name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ResourcePermissionName {
    /// Registered system permission.
    System(SystemPermission),
    /// Application-defined name, valid only for the classes that define it.
    Custom(NonEmptyString),
}

/// Permission held by an accessor on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourcePermission {
    name: ResourcePermissionName,
    with_grant_option: bool,
}

impl ResourcePermission {
    /// `*INHERIT` system permission name.
    pub const INHERIT: &'static str = "*INHERIT";
    /// `*IMPERSONATE` system permission name.
    pub const IMPERSONATE: &'static str = "*IMPERSONATE";
    /// `*RESET-CREDENTIALS` system permission name.
    pub const RESET_CREDENTIALS: &'static str = "*RESET-CREDENTIALS";
    /// `*DELETE` system permission name.
    pub const DELETE: &'static str = "*DELETE";
    /// `*QUERY` system permission name.
    pub const QUERY: &'static str = "*QUERY";

    /// Creates a permission without grant option.
    pub fn instance(name: &str) -> AppResult<Self> {
        Self::build(name, false)
    }

    /// Creates a permission with grant option.
    pub fn instance_with_grant_option(name: &str) -> AppResult<Self> {
        Self::build(name, true)
    }

    /// Re-validates a stored permission, checking the id/name pairing.
    pub fn from_stored(
        system_permission_id: Option<i64>,
        name: &str,
        with_grant_option: bool,
    ) -> AppResult<Self> {
        let permission = Self::build(name, with_grant_option)?;
        if permission.system_permission_id() != system_permission_id {
            return Err(AppError::InvalidState(format!(
                "invalid system permission id {system_permission_id:?} \
                 for resource permission '{}'",
                permission.name()
            )));
        }

        Ok(permission)
    }

    pub(crate) fn from_system(system: SystemPermission, with_grant_option: bool) -> Self {
        Self {
            name: ResourcePermissionName::System(system),
            with_grant_option,
        }
    }

    fn build(name: &str, with_grant_option: bool) -> AppResult<Self> {
        let name = NonEmptyString::required(name, "permission name")?;
        let name = if SystemPermission::is_reserved_name(name.as_str()) {
            ResourcePermissionName::System(SystemPermission::by_name(
                PermissionFamily::Resource,
                name.as_str(),
            )?)
        } else {
            ResourcePermissionName::Custom(name)
        };

        Ok(Self {
            name,
            with_grant_option,
        })
    }

    /// Returns the permission name.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.name {
            ResourcePermissionName::System(system) => system.name(),
            ResourcePermissionName::Custom(name) => name.as_str(),
        }
    }

    /// Returns the tagged name.
    #[must_use]
    pub fn permission_name(&self) -> &ResourcePermissionName {
        &self.name
    }

    /// Returns the registered system permission, if this is one.
    #[must_use]
    pub fn system_permission(&self) -> Option<SystemPermission> {
        match &self.name {
            ResourcePermissionName::System(system) => Some(*system),
            ResourcePermissionName::Custom(_) => None,
        }
    }

    /// Returns the fixed system id, or `None` for custom permissions.
    #[must_use]
    pub fn system_permission_id(&self) -> Option<i64> {
        self.system_permission().map(|system| system.id())
    }

    /// Returns whether this is a reserved system permission.
    #[must_use]
    pub fn is_system_permission(&self) -> bool {
        self.system_permission().is_some()
    }

    /// Returns whether this is `*INHERIT`, regardless of grant option.
    #[must_use]
    pub fn is_inherit(&self) -> bool {
        self.system_permission() == Some(SystemPermission::INHERIT)
    }
}

impl PermissionValue for ResourcePermission {
    fn family() -> PermissionFamily {
        PermissionFamily::Resource
    }

    fn is_with_grant_option(&self) -> bool {
        self.with_grant_option
    }

    fn regrantable(&self) -> Self {
        Self {
            name: self.name.clone(),
            with_grant_option: true,
        }
    }

    fn equals_ignoring_grant_option(&self, other: &Self) -> bool {
        self.name == other.name
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Display for ResourcePermission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())?;
        if self.with_grant_option {
            formatter.write_str(" /G")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::AppError;

    use crate::{PermissionValue, SystemPermission};

    use super::{ResourcePermission, ResourcePermissionName};

    #[test]
    fn system_names_resolve_to_registry_entries() {
        let permission = ResourcePermission::instance(" *INHERIT ");
        assert!(permission.is_ok());

        let permission = permission.unwrap_or_else(|_| unreachable!());
        assert_eq!(
            permission.permission_name(),
            &ResourcePermissionName::System(SystemPermission::INHERIT)
        );
        assert_eq!(permission.system_permission_id(), Some(-101));
        assert!(permission.is_inherit());
    }

    #[test]
    fn custom_names_are_trimmed_and_case_sensitive() {
        let lower = ResourcePermission::instance("  edit");
        let upper = ResourcePermission::instance("EDIT");

        assert!(lower.is_ok() && upper.is_ok());
        let lower = lower.unwrap_or_else(|_| unreachable!());
        assert_eq!(lower.name(), "edit");
        assert_ne!(Some(lower), upper.ok());
    }

    #[test]
    fn blank_name_is_required_error() {
        let result = ResourcePermission::instance("   ");
        assert!(matches!(result, Err(AppError::Required(message)) if message.contains("required")));
    }

    #[test]
    fn unknown_reserved_name_is_rejected() {
        let result = ResourcePermission::instance("*SUPER-USER");
        assert!(matches!(result, Err(AppError::Validation(message))
            if message.contains("invalid system permission name")));
    }

    #[test]
    fn equality_includes_grant_option() {
        let plain = ResourcePermission::instance("edit").unwrap_or_else(|_| unreachable!());
        let grantable = ResourcePermission::instance_with_grant_option("edit")
            .unwrap_or_else(|_| unreachable!());

        assert_ne!(plain, grantable);
        assert!(plain.equals_ignoring_grant_option(&grantable));
        assert_eq!(plain.regrantable(), grantable);
    }

    #[test]
    fn from_stored_rejects_mismatched_id() {
        let valid = ResourcePermission::from_stored(Some(-104), "*DELETE", false);
        assert!(valid.is_ok());

        let mismatched = ResourcePermission::from_stored(Some(-101), "*DELETE", false);
        assert!(matches!(mismatched, Err(AppError::InvalidState(_))));

        let custom_with_id = ResourcePermission::from_stored(Some(-101), "edit", true);
        assert!(matches!(custom_with_id, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn display_marks_grant_option() {
        let permission = ResourcePermission::instance_with_grant_option("*QUERY")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(permission.to_string(), "*QUERY /G");
    }
}

use std::fmt::{Display, Formatter};

use serde::Serialize;
use tessera_core::{AppError, AppResult, NonEmptyString};

use crate::{DomainPermission, PermissionFamily, PermissionValue, SystemPermission};

/// What a domain-create permission carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "permission", rename_all = "snake_case")]
pub enum DomainCreateGrant {
    /// The bare `*CREATE` marker.
    Create,
    /// Permission auto-granted to the creator on the new domain.
    PostCreate(DomainPermission),
}

/// Permission to create domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DomainCreatePermission {
    grant: DomainCreateGrant,
    with_grant_option: bool,
}

impl DomainCreatePermission {
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

    /// Wraps a post-create domain permission, without grant option.
    #[must_use]
    pub fn for_post_create(post_create: DomainPermission) -> Self {
        Self {
            grant: DomainCreateGrant::PostCreate(post_create),
            with_grant_option: false,
        }
    }

    /// Wraps a post-create domain permission, with grant option.
    #[must_use]
    pub fn for_post_create_with_grant_option(post_create: DomainPermission) -> Self {
        Self {
            grant: DomainCreateGrant::PostCreate(post_create),
            with_grant_option: true,
        }
    }

    /// Re-validates a stored row: either a `*CREATE` id or a post-create permission.
    pub fn from_stored(
        system_permission_id: Option<i64>,
        post_create: Option<DomainPermission>,
        with_grant_option: bool,
    ) -> AppResult<Self> {
        match (system_permission_id, post_create) {
            (Some(id), None) => {
                SystemPermission::by_id(PermissionFamily::DomainCreate, id)?;
                Ok(Self {
                    grant: DomainCreateGrant::Create,
                    with_grant_option,
                })
            }
            (None, Some(post_create)) => Ok(Self::with_grant(
                DomainCreateGrant::PostCreate(post_create),
                with_grant_option,
            )),
            (id, post_create) => Err(AppError::InvalidState(format!(
                "domain create permission must carry exactly one of a system id ({id:?}) \
                 or a post-create permission ({post_create:?})"
            ))),
        }
    }

    /// Every domain-create permission, with grant option on both levels.
    #[must_use]
    pub fn all_regrantable() -> Vec<Self> {
        std::iter::once(Self::with_grant(DomainCreateGrant::Create, true))
            .chain(
                DomainPermission::all_regrantable()
                    .into_iter()
                    .map(|permission| {
                        Self::with_grant(DomainCreateGrant::PostCreate(permission), true)
                    }),
            )
            .collect()
    }

    fn with_grant(grant: DomainCreateGrant, with_grant_option: bool) -> Self {
        Self {
            grant,
            with_grant_option,
        }
    }

    fn system(name: &str, with_grant_option: bool) -> AppResult<Self> {
        let name = NonEmptyString::required(name, "permission name")?;
        SystemPermission::by_name(PermissionFamily::DomainCreate, name.as_str())?;

        Ok(Self::with_grant(DomainCreateGrant::Create, with_grant_option))
    }

    /// Returns the carried grant.
    #[must_use]
    pub fn grant(&self) -> DomainCreateGrant {
        self.grant
    }

    /// Returns the wrapped post-create permission, if any.
    #[must_use]
    pub fn post_create_permission(&self) -> Option<DomainPermission> {
        match self.grant {
            DomainCreateGrant::Create => None,
            DomainCreateGrant::PostCreate(permission) => Some(permission),
        }
    }
}

impl PermissionValue for DomainCreatePermission {
    fn family() -> PermissionFamily {
        PermissionFamily::DomainCreate
    }

    fn is_with_grant_option(&self) -> bool {
        self.with_grant_option
    }

    fn regrantable(&self) -> Self {
        let grant = match self.grant {
            DomainCreateGrant::Create => DomainCreateGrant::Create,
            DomainCreateGrant::PostCreate(permission) => {
                DomainCreateGrant::PostCreate(permission.regrantable())
            }
        };

        Self::with_grant(grant, true)
    }

    fn equals_ignoring_grant_option(&self, other: &Self) -> bool {
        self.grant == other.grant
    }

    fn same_identity(&self, other: &Self) -> bool {
        match (self.grant, other.grant) {
            (DomainCreateGrant::Create, DomainCreateGrant::Create) => true,
            (DomainCreateGrant::PostCreate(left), DomainCreateGrant::PostCreate(right)) => {
                left.same_identity(&right)
            }
            _ => false,
        }
    }

    fn post_create_grant_option(&self) -> Option<bool> {
        self.post_create_permission()
            .map(|permission| permission.is_with_grant_option())
    }
}

impl Display for DomainCreatePermission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.grant {
            DomainCreateGrant::Create => formatter.write_str(Self::CREATE)?,
            DomainCreateGrant::PostCreate(permission) => write!(formatter, "[{permission}]")?,
        }
        if self.with_grant_option {
            formatter.write_str(" /G")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::AppError;

    use crate::{DomainPermission, PermissionValue, is_grantable_from};

    use super::DomainCreatePermission;

    #[test]
    fn create_marker_resolves_in_domain_create_family() {
        assert!(DomainCreatePermission::instance("*CREATE").is_ok());
        assert!(matches!(
            DomainCreatePermission::instance("*SUPER-USER"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn from_stored_requires_exactly_one_payload() {
        let delete = DomainPermission::instance("*DELETE").unwrap_or_else(|_| unreachable!());

        assert!(DomainCreatePermission::from_stored(Some(-300), None, false).is_ok());
        assert!(DomainCreatePermission::from_stored(None, Some(delete), true).is_ok());
        assert!(matches!(
            DomainCreatePermission::from_stored(Some(-300), Some(delete), false),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            DomainCreatePermission::from_stored(Some(-100), None, false),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn grantable_post_create_requires_grantable_holder() {
        let delete = DomainPermission::instance("*DELETE").unwrap_or_else(|_| unreachable!());
        let held = DomainCreatePermission::for_post_create_with_grant_option(delete);
        let requested = DomainCreatePermission::for_post_create(delete.regrantable());

        assert!(!is_grantable_from(&requested, &held));
        assert!(is_grantable_from(&DomainCreatePermission::for_post_create(delete), &held));
    }

    #[test]
    fn all_regrantable_covers_marker_and_post_create_permissions() {
        let all = DomainCreatePermission::all_regrantable();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(PermissionValue::is_with_grant_option));
    }
}

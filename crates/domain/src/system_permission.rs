use std::fmt::{Display, Formatter};

use serde::Serialize;
use tessera_core::{AppError, AppResult};

/// The four permission families handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionFamily {
    /// Permissions held on a concrete resource (or globally on a class/domain pair).
    Resource,
    /// Permissions to create resources of a class in a domain.
    ResourceCreate,
    /// Permissions held on a domain.
    Domain,
    /// Permissions to create domains.
    DomainCreate,
}

impl PermissionFamily {
    /// Returns a stable label for messages and storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::ResourceCreate => "resource create",
            Self::Domain => "domain",
            Self::DomainCreate => "domain create",
        }
    }
}

impl Display for PermissionFamily {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A reserved permission with a fixed id and predefined semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SystemPermission {
    id: i64,
    name: &'static str,
    family: PermissionFamily,
}

impl SystemPermission {
    /// `*CREATE` marker of the resource-create family.
    pub const RESOURCE_CREATE: Self =
        Self::define(-100, "*CREATE", PermissionFamily::ResourceCreate);
    /// `*INHERIT`: the accessor inherits every permission of the accessed resource.
    pub const INHERIT: Self = Self::define(-101, "*INHERIT", PermissionFamily::Resource);
    /// `*IMPERSONATE`: authenticatable classes only.
    pub const IMPERSONATE: Self = Self::define(-102, "*IMPERSONATE", PermissionFamily::Resource);
    /// `*RESET-CREDENTIALS`: authenticatable classes only.
    pub const RESET_CREDENTIALS: Self =
        Self::define(-103, "*RESET-CREDENTIALS", PermissionFamily::Resource);
    /// `*DELETE` on a resource.
    pub const RESOURCE_DELETE: Self = Self::define(-104, "*DELETE", PermissionFamily::Resource);
    /// `*QUERY` on a resource.
    pub const QUERY: Self = Self::define(-105, "*QUERY", PermissionFamily::Resource);
    /// `*CREATE` marker of the domain-create family.
    pub const DOMAIN_CREATE: Self = Self::define(-300, "*CREATE", PermissionFamily::DomainCreate);
    /// `*SUPER-USER`: implies every permission inside the domain subtree.
    pub const SUPER_USER: Self = Self::define(-301, "*SUPER-USER", PermissionFamily::Domain);
    /// `*CREATE-CHILD-DOMAIN` on a domain.
    pub const CREATE_CHILD_DOMAIN: Self =
        Self::define(-302, "*CREATE-CHILD-DOMAIN", PermissionFamily::Domain);
    /// `*DELETE` on a domain.
    pub const DOMAIN_DELETE: Self = Self::define(-303, "*DELETE", PermissionFamily::Domain);

    const fn define(id: i64, name: &'static str, family: PermissionFamily) -> Self {
        Self { id, name, family }
    }

    /// Returns the fixed (negative) id.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the reserved name, including the leading `*`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the family this permission belongs to.
    #[must_use]
    pub fn family(&self) -> PermissionFamily {
        self.family
    }

    /// Returns whether only authenticatable resource classes accept this permission.
    #[must_use]
    pub fn requires_authenticatable_class(&self) -> bool {
        *self == Self::IMPERSONATE || *self == Self::RESET_CREDENTIALS
    }

    /// Returns the registered system permissions of one family, ordered by id descending.
    pub fn all_for(family: PermissionFamily) -> impl Iterator<Item = Self> {
        REGISTRY
            .iter()
            .copied()
            .filter(move |permission| permission.family == family)
    }

    /// Resolves a trimmed, case-sensitive name within a family.
    pub fn by_name(family: PermissionFamily, name: &str) -> AppResult<Self> {
        Self::all_for(family)
            .find(|permission| permission.name == name)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "invalid system permission name '{name}' for {family} permissions"
                ))
            })
    }

    /// Resolves a stored id within a family.
    pub fn by_id(family: PermissionFamily, id: i64) -> AppResult<Self> {
        Self::all_for(family)
            .find(|permission| permission.id == id)
            .ok_or_else(|| {
                AppError::InvalidState(format!(
                    "invalid system permission id {id} for {family} permissions"
                ))
            })
    }

    /// Returns whether a trimmed name uses the reserved system prefix.
    #[must_use]
    pub fn is_reserved_name(name: &str) -> bool {
        name.starts_with('*')
    }
}

const REGISTRY: [SystemPermission; 10] = [
    SystemPermission::RESOURCE_CREATE,
    SystemPermission::INHERIT,
    SystemPermission::IMPERSONATE,
    SystemPermission::RESET_CREDENTIALS,
    SystemPermission::RESOURCE_DELETE,
    SystemPermission::QUERY,
    SystemPermission::DOMAIN_CREATE,
    SystemPermission::SUPER_USER,
    SystemPermission::CREATE_CHILD_DOMAIN,
    SystemPermission::DOMAIN_DELETE,
];

//! Permission values, registries and hierarchy descriptors.

#![forbid(unsafe_code)]

mod domain_create_permission;
mod domain_permission;
mod effective;
mod hierarchy;
mod permission;
mod resource;
mod resource_create_permission;
mod resource_permission;
mod scoped_grant;
mod system_permission;

pub use domain_create_permission::{DomainCreateGrant, DomainCreatePermission};
pub use domain_permission::DomainPermission;
pub use effective::{EffectivePermission, merge_effective_permissions};
pub use hierarchy::{AncestorDomain, ClosureStrategy, DescendantDomain, InheritedAccessor};
pub use permission::{PermissionValue, is_grantable_from, is_satisfied_by};
pub use resource::{Domain, Resource, ResourceClass};
pub use resource_create_permission::{ResourceCreateGrant, ResourceCreatePermission};
pub use resource_permission::{ResourcePermission, ResourcePermissionName};
pub use scoped_grant::{ClassDomainGrant, DomainScopedGrant};
pub use system_permission::{PermissionFamily, SystemPermission};

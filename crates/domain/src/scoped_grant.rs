use serde::Serialize;
use tessera_core::{DomainId, ResourceClassId};

/// A stored grant scoped to a resource class within a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDomainGrant<P> {
    /// Class the grant applies to.
    pub resource_class_id: ResourceClassId,
    /// Domain the grant was made on.
    pub domain_id: DomainId,
    /// Granted permission.
    pub permission: P,
}

impl<P> ClassDomainGrant<P> {
    /// Creates a scoped grant.
    #[must_use]
    pub fn new(resource_class_id: ResourceClassId, domain_id: DomainId, permission: P) -> Self {
        Self {
            resource_class_id,
            domain_id,
            permission,
        }
    }
}

/// A stored domain permission and the domain it was granted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainScopedGrant<P> {
    /// Domain the grant was made on.
    pub domain_id: DomainId,
    /// Granted permission.
    pub permission: P,
}

impl<P> DomainScopedGrant<P> {
    /// Creates a domain-scoped grant.
    #[must_use]
    pub fn new(domain_id: DomainId, permission: P) -> Self {
        Self {
            domain_id,
            permission,
        }
    }
}

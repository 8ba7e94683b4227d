use async_trait::async_trait;
use tessera_core::{AppResult, DomainId, ResourceClassId, ResourceId};
use tessera_domain::{
    AncestorDomain, ClassDomainGrant, DescendantDomain, Domain, DomainCreatePermission,
    DomainPermission, DomainScopedGrant, InheritedAccessor, Resource, ResourceClass,
    ResourceCreatePermission, ResourcePermission,
};

/// Read access to resources, resource classes and domains.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Finds a resource by id.
    async fn find_resource(&self, resource_id: ResourceId) -> AppResult<Option<Resource>>;

    /// Finds a resource class by id.
    async fn find_resource_class(
        &self,
        resource_class_id: ResourceClassId,
    ) -> AppResult<Option<ResourceClass>>;

    /// Finds a resource class by its exact name.
    async fn find_resource_class_by_name(&self, name: &str) -> AppResult<Option<ResourceClass>>;

    /// Lists every registered resource class, ordered by id.
    async fn list_resource_classes(&self) -> AppResult<Vec<ResourceClass>>;

    /// Finds a domain by id.
    async fn find_domain(&self, domain_id: DomainId) -> AppResult<Option<Domain>>;

    /// Finds a domain by its exact name.
    async fn find_domain_by_name(&self, name: &str) -> AppResult<Option<Domain>>;

    /// Lists every resource of a class, ordered by id.
    async fn list_resources_by_class(
        &self,
        resource_class_id: ResourceClassId,
    ) -> AppResult<Vec<Resource>>;
}

/// Direct grant rows, one accessor at a time.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Lists permissions granted directly from `accessor_id` on `accessed_id`.
    async fn list_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
    ) -> AppResult<Vec<ResourcePermission>>;

    /// Lists global resource permissions granted on exactly this class and domain.
    async fn list_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
    ) -> AppResult<Vec<ResourcePermission>>;

    /// Lists resource-create permissions granted on exactly this class and domain.
    async fn list_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
    ) -> AppResult<Vec<ResourceCreatePermission>>;

    /// Lists domain permissions granted on exactly this domain.
    async fn list_domain_permissions(
        &self,
        accessor_id: ResourceId,
        domain_id: DomainId,
    ) -> AppResult<Vec<DomainPermission>>;

    /// Lists domain-create permissions held by the accessor.
    async fn list_domain_create_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<DomainCreatePermission>>;

    /// Lists every global resource permission granted to the accessor, in any class and domain.
    async fn list_all_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<ClassDomainGrant<ResourcePermission>>>;

    /// Lists every resource-create permission granted to the accessor, in any class and domain.
    async fn list_all_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<ClassDomainGrant<ResourceCreatePermission>>>;

    /// Lists every domain permission granted to the accessor, in any domain.
    async fn list_all_domain_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<DomainScopedGrant<DomainPermission>>>;
}

/// Single-hop hierarchy edges.
#[async_trait]
pub trait HierarchyRepository: Send + Sync {
    /// Lists the resources on which any of `accessor_ids` holds `*INHERIT`.
    async fn list_inherit_donors(&self, accessor_ids: &[ResourceId]) -> AppResult<Vec<ResourceId>>;

    /// Finds the parent of a domain, `None` for a root.
    async fn find_parent_domain(&self, domain_id: DomainId) -> AppResult<Option<DomainId>>;

    /// Lists the direct children of any of `domain_ids`.
    async fn list_child_domains(&self, domain_ids: &[DomainId]) -> AppResult<Vec<DomainId>>;
}

/// Store-native fixed-point evaluation of the hierarchy closures.
#[async_trait]
pub trait RecursiveHierarchyRepository: Send + Sync {
    /// Evaluates the `*INHERIT` closure of an accessor, including itself.
    async fn accessor_closure(&self, accessor_id: ResourceId)
    -> AppResult<Vec<InheritedAccessor>>;

    /// Evaluates the ancestor chain of a domain, including itself.
    async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>>;

    /// Evaluates the descendant closure of a domain, including itself.
    async fn descendant_domains(&self, domain_id: DomainId) -> AppResult<Vec<DescendantDomain>>;
}

/// Deletes grant rows scoped to one domain.
#[async_trait]
pub trait DomainGrantRemover: Send + Sync {
    /// Removes resource-create, global resource and domain permission rows of the domain.
    ///
    /// Returns the number of rows removed.
    async fn remove_domain_scoped_grants(&self, domain_id: DomainId) -> AppResult<u64>;
}

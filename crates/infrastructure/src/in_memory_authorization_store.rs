use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tessera_application::ResourceDirectory;
use tessera_core::{AppError, AppResult, DomainId, ResourceClassId, ResourceId};
use tessera_domain::{
    Domain, DomainCreatePermission, DomainPermission, PermissionValue, Resource, ResourceClass,
    ResourceCreatePermission, ResourcePermission,
};
use tokio::sync::RwLock;

mod grants;
mod hierarchy;


type GlobalKey = (ResourceId, ResourceClassId, DomainId);

/// In-memory authorization store implementing every store port.
///
/// Seeding methods validate references the way the relational schema would.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationStore {
    domains: RwLock<BTreeMap<DomainId, Domain>>,
    resource_classes: RwLock<BTreeMap<ResourceClassId, ResourceClass>>,
    resources: RwLock<BTreeMap<ResourceId, Resource>>,
    resource_permissions: RwLock<HashMap<(ResourceId, ResourceId), Vec<ResourcePermission>>>,
    global_permissions: RwLock<HashMap<GlobalKey, Vec<ResourcePermission>>>,
    resource_create_permissions: RwLock<HashMap<GlobalKey, Vec<ResourceCreatePermission>>>,
    domain_permissions: RwLock<HashMap<(ResourceId, DomainId), Vec<DomainPermission>>>,
    domain_create_permissions: RwLock<HashMap<ResourceId, Vec<DomainCreatePermission>>>,
}

impl InMemoryAuthorizationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a domain. The parent, if any, must already exist.
    pub async fn add_domain(&self, domain: Domain) -> AppResult<()> {
        let mut domains = self.domains.write().await;

        if domains.contains_key(&domain.id())
            || domains.values().any(|existing| existing.name() == domain.name())
        {
            return Err(AppError::Conflict(format!(
                "domain '{}' ({}) already exists",
                domain.name(),
                domain.id()
            )));
        }
        if let Some(parent_id) = domain.parent_id()
            && !domains.contains_key(&parent_id)
        {
            return Err(AppError::Conflict(format!(
                "parent domain {parent_id} of domain '{}' does not exist",
                domain.name()
            )));
        }

        domains.insert(domain.id(), domain);
        Ok(())
    }

    /// Adds a resource class.
    pub async fn add_resource_class(&self, resource_class: ResourceClass) -> AppResult<()> {
        let mut resource_classes = self.resource_classes.write().await;

        if resource_classes.contains_key(&resource_class.id())
            || resource_classes
                .values()
                .any(|existing| existing.name() == resource_class.name())
        {
            return Err(AppError::Conflict(format!(
                "resource class '{}' already exists",
                resource_class.name()
            )));
        }

        resource_classes.insert(resource_class.id(), resource_class);
        Ok(())
    }

    /// Adds a resource of an existing class to an existing domain.
    pub async fn add_resource(&self, resource: Resource) -> AppResult<()> {
        self.require_resource_class(resource.resource_class_id())
            .await?;
        self.require_domain(resource.domain_id()).await?;

        let mut resources = self.resources.write().await;
        if resources.contains_key(&resource.id()) {
            return Err(AppError::Conflict(format!(
                "resource {} already exists",
                resource.id()
            )));
        }

        resources.insert(resource.id(), resource);
        Ok(())
    }

    /// Grants permissions from `accessor_id` on `accessed_id`.
    ///
    /// A permission equal ignoring grant option to a held one replaces it.
    pub async fn grant_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
        permissions: Vec<ResourcePermission>,
    ) -> AppResult<()> {
        self.require_resource(accessor_id).await?;
        let accessed = self.require_resource(accessed_id).await?;
        let resource_class = self
            .require_resource_class(accessed.resource_class_id())
            .await?;
        for permission in &permissions {
            resource_class.validate_resource_permission(permission)?;
        }

        let mut grants = self.resource_permissions.write().await;
        upsert(
            grants.entry((accessor_id, accessed_id)).or_default(),
            permissions,
        );
        Ok(())
    }

    /// Grants global permissions on every resource of the class in the domain.
    pub async fn grant_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
        permissions: Vec<ResourcePermission>,
    ) -> AppResult<()> {
        self.require_resource(accessor_id).await?;
        let resource_class = self.require_resource_class(resource_class_id).await?;
        self.require_domain(domain_id).await?;
        for permission in &permissions {
            resource_class.validate_resource_permission(permission)?;
        }

        let mut grants = self.global_permissions.write().await;
        upsert(
            grants
                .entry((accessor_id, resource_class_id, domain_id))
                .or_default(),
            permissions,
        );
        Ok(())
    }

    /// Grants resource-create permissions for the class in the domain.
    pub async fn grant_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
        permissions: Vec<ResourceCreatePermission>,
    ) -> AppResult<()> {
        self.require_resource(accessor_id).await?;
        let resource_class = self.require_resource_class(resource_class_id).await?;
        self.require_domain(domain_id).await?;
        for permission in &permissions {
            resource_class.validate_resource_create_permission(permission)?;
        }

        let mut grants = self.resource_create_permissions.write().await;
        upsert(
            grants
                .entry((accessor_id, resource_class_id, domain_id))
                .or_default(),
            permissions,
        );
        Ok(())
    }

    /// Grants domain permissions on the domain.
    pub async fn grant_domain_permissions(
        &self,
        accessor_id: ResourceId,
        domain_id: DomainId,
        permissions: Vec<DomainPermission>,
    ) -> AppResult<()> {
        self.require_resource(accessor_id).await?;
        self.require_domain(domain_id).await?;

        let mut grants = self.domain_permissions.write().await;
        upsert(grants.entry((accessor_id, domain_id)).or_default(), permissions);
        Ok(())
    }

    /// Grants domain-create permissions.
    pub async fn grant_domain_create_permissions(
        &self,
        accessor_id: ResourceId,
        permissions: Vec<DomainCreatePermission>,
    ) -> AppResult<()> {
        self.require_resource(accessor_id).await?;

        let mut grants = self.domain_create_permissions.write().await;
        upsert(grants.entry(accessor_id).or_default(), permissions);
        Ok(())
    }

    async fn require_resource(&self, resource_id: ResourceId) -> AppResult<Resource> {
        self.resources
            .read()
            .await
            .get(&resource_id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("could not find resource {resource_id}")))
    }

    async fn require_resource_class(
        &self,
        resource_class_id: ResourceClassId,
    ) -> AppResult<ResourceClass> {
        self.resource_classes
            .read()
            .await
            .get(&resource_class_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("could not find resource class {resource_class_id}"))
            })
    }

    async fn require_domain(&self, domain_id: DomainId) -> AppResult<Domain> {
        self.domains
            .read()
            .await
            .get(&domain_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("could not find domain {domain_id}")))
    }
}

fn upsert<P: PermissionValue>(held: &mut Vec<P>, permissions: Vec<P>) {
    for permission in permissions {
        held.retain(|existing| !existing.equals_ignoring_grant_option(&permission));
        held.push(permission);
    }
}

#[async_trait]
impl ResourceDirectory for InMemoryAuthorizationStore {
    async fn find_resource(&self, resource_id: ResourceId) -> AppResult<Option<Resource>> {
        Ok(self.resources.read().await.get(&resource_id).copied())
    }

    async fn find_resource_class(
        &self,
        resource_class_id: ResourceClassId,
    ) -> AppResult<Option<ResourceClass>> {
        Ok(self
            .resource_classes
            .read()
            .await
            .get(&resource_class_id)
            .cloned())
    }

    async fn find_resource_class_by_name(&self, name: &str) -> AppResult<Option<ResourceClass>> {
        Ok(self
            .resource_classes
            .read()
            .await
            .values()
            .find(|resource_class| resource_class.name() == name)
            .cloned())
    }

    async fn list_resource_classes(&self) -> AppResult<Vec<ResourceClass>> {
        Ok(self.resource_classes.read().await.values().cloned().collect())
    }

    async fn find_domain(&self, domain_id: DomainId) -> AppResult<Option<Domain>> {
        Ok(self.domains.read().await.get(&domain_id).cloned())
    }

    async fn find_domain_by_name(&self, name: &str) -> AppResult<Option<Domain>> {
        Ok(self
            .domains
            .read()
            .await
            .values()
            .find(|domain| domain.name() == name)
            .cloned())
    }

    async fn list_resources_by_class(
        &self,
        resource_class_id: ResourceClassId,
    ) -> AppResult<Vec<Resource>> {
        Ok(self
            .resources
            .read()
            .await
            .values()
            .filter(|resource| resource.resource_class_id() == resource_class_id)
            .copied()
            .collect())
    }
}

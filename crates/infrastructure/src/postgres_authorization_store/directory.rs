use async_trait::async_trait;
use sqlx::FromRow;
use tessera_application::ResourceDirectory;
use tessera_core::{AppError, AppResult, DomainId, ResourceClassId, ResourceId};
use tessera_domain::{Domain, Resource, ResourceClass};

use super::PostgresAuthorizationStore;

#[derive(Debug, FromRow)]
struct ResourceRow {
    id: i64,
    resource_class_id: i64,
    domain_id: i64,
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        Resource::new(
            ResourceId::new(row.id),
            ResourceClassId::new(row.resource_class_id),
            DomainId::new(row.domain_id),
        )
    }
}

#[derive(Debug, FromRow)]
struct ResourceClassRow {
    id: i64,
    name: String,
    is_authenticatable: bool,
    permission_names: Vec<String>,
}

impl TryFrom<ResourceClassRow> for ResourceClass {
    type Error = AppError;

    fn try_from(row: ResourceClassRow) -> AppResult<Self> {
        ResourceClass::new(
            ResourceClassId::new(row.id),
            row.name.as_str(),
            row.is_authenticatable,
            row.permission_names,
        )
        .map_err(|error| {
            AppError::InvalidState(format!(
                "stored resource class '{}' is invalid: {error}",
                row.name
            ))
        })
    }
}

#[derive(Debug, FromRow)]
struct DomainRow {
    id: i64,
    name: String,
    parent_id: Option<i64>,
}

impl TryFrom<DomainRow> for Domain {
    type Error = AppError;

    fn try_from(row: DomainRow) -> AppResult<Self> {
        Domain::new(
            DomainId::new(row.id),
            row.name.as_str(),
            row.parent_id.map(DomainId::new),
        )
    }
}

const RESOURCE_CLASS_SELECT: &str = r#"
    SELECT
        classes.id,
        classes.name,
        classes.is_authenticatable,
        COALESCE(
            array_agg(permissions.permission_name ORDER BY permissions.permission_name)
                FILTER (WHERE permissions.permission_name IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS permission_names
    FROM resource_classes AS classes
    LEFT JOIN resource_class_permissions AS permissions
        ON permissions.resource_class_id = classes.id
"#;

impl PostgresAuthorizationStore {
    async fn find_resource_class_where(
        &self,
        predicate: &str,
        bind: ResourceClassFilter<'_>,
    ) -> AppResult<Option<ResourceClass>> {
        let sql = format!("{RESOURCE_CLASS_SELECT} WHERE {predicate} GROUP BY classes.id");
        let query = sqlx::query_as::<_, ResourceClassRow>(sql.as_str());
        let query = match bind {
            ResourceClassFilter::Id(id) => query.bind(id.as_i64()),
            ResourceClassFilter::Name(name) => query.bind(name),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find resource class: {error}"))
            })?;

        row.map(ResourceClass::try_from).transpose()
    }
}

enum ResourceClassFilter<'a> {
    Id(ResourceClassId),
    Name(&'a str),
}

#[async_trait]
impl ResourceDirectory for PostgresAuthorizationStore {
    async fn find_resource(&self, resource_id: ResourceId) -> AppResult<Option<Resource>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, resource_class_id, domain_id
            FROM resources
            WHERE id = $1
            "#,
        )
        .bind(resource_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find resource {resource_id}: {error}"))
        })?;

        Ok(row.map(Resource::from))
    }

    async fn find_resource_class(
        &self,
        resource_class_id: ResourceClassId,
    ) -> AppResult<Option<ResourceClass>> {
        self.find_resource_class_where(
            "classes.id = $1",
            ResourceClassFilter::Id(resource_class_id),
        )
        .await
    }

    async fn find_resource_class_by_name(&self, name: &str) -> AppResult<Option<ResourceClass>> {
        self.find_resource_class_where("classes.name = $1", ResourceClassFilter::Name(name))
            .await
    }

    async fn list_resource_classes(&self) -> AppResult<Vec<ResourceClass>> {
        let sql = format!("{RESOURCE_CLASS_SELECT} GROUP BY classes.id ORDER BY classes.id");
        let rows = sqlx::query_as::<_, ResourceClassRow>(sql.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list resource classes: {error}"))
            })?;

        rows.into_iter().map(ResourceClass::try_from).collect()
    }

    async fn find_domain(&self, domain_id: DomainId) -> AppResult<Option<Domain>> {
        let row = sqlx::query_as::<_, DomainRow>(
            r#"
            SELECT id, name, parent_id
            FROM domains
            WHERE id = $1
            "#,
        )
        .bind(domain_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find domain {domain_id}: {error}"))
        })?;

        row.map(Domain::try_from).transpose()
    }

    async fn find_domain_by_name(&self, name: &str) -> AppResult<Option<Domain>> {
        let row = sqlx::query_as::<_, DomainRow>(
            r#"
            SELECT id, name, parent_id
            FROM domains
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find domain '{name}': {error}")))?;

        row.map(Domain::try_from).transpose()
    }

    async fn list_resources_by_class(
        &self,
        resource_class_id: ResourceClassId,
    ) -> AppResult<Vec<Resource>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, resource_class_id, domain_id
            FROM resources
            WHERE resource_class_id = $1
            ORDER BY id
            "#,
        )
        .bind(resource_class_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list resources: {error}")))?;

        Ok(rows.into_iter().map(Resource::from).collect())
    }
}

use async_trait::async_trait;
use sqlx::FromRow;
use tessera_application::{HierarchyRepository, RecursiveHierarchyRepository};
use tessera_core::{AppError, AppResult, DomainId, ResourceId};
use tessera_domain::{AncestorDomain, DescendantDomain, InheritedAccessor};

use super::{PostgresAuthorizationStore, level_from_row};

#[derive(Debug, FromRow)]
struct ClosureRow {
    id: i64,
    level: i32,
}

#[async_trait]
impl HierarchyRepository for PostgresAuthorizationStore {
    async fn list_inherit_donors(&self, accessor_ids: &[ResourceId]) -> AppResult<Vec<ResourceId>> {
        let accessor_ids: Vec<i64> = accessor_ids.iter().map(|id| id.as_i64()).collect();
        let donors = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT accessed_id
            FROM grant_resource_permissions
            WHERE accessor_id = ANY($1)
                AND system_permission_id = -101
            ORDER BY accessed_id
            "#,
        )
        .bind(accessor_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list inherit donors: {error}")))?;

        Ok(donors.into_iter().map(ResourceId::new).collect())
    }

    async fn find_parent_domain(&self, domain_id: DomainId) -> AppResult<Option<DomainId>> {
        let parent_id = sqlx::query_scalar::<_, Option<i64>>(
            r#"
            SELECT parent_id
            FROM domains
            WHERE id = $1
            "#,
        )
        .bind(domain_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find parent of domain {domain_id}: {error}"))
        })?;

        Ok(parent_id.flatten().map(DomainId::new))
    }

    async fn list_child_domains(&self, domain_ids: &[DomainId]) -> AppResult<Vec<DomainId>> {
        let domain_ids: Vec<i64> = domain_ids.iter().map(|id| id.as_i64()).collect();
        let children = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM domains
            WHERE parent_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(domain_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list child domains: {error}")))?;

        Ok(children.into_iter().map(DomainId::new).collect())
    }
}

#[async_trait]
impl RecursiveHierarchyRepository for PostgresAuthorizationStore {
    async fn accessor_closure(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<InheritedAccessor>> {
        let rows = sqlx::query_as::<_, ClosureRow>(
            r#"
            WITH RECURSIVE closure (id, level, path) AS (
                SELECT $1::BIGINT, 0, ARRAY[$1::BIGINT]
                UNION ALL
                SELECT grants.accessed_id, closure.level + 1, closure.path || grants.accessed_id
                FROM closure
                INNER JOIN grant_resource_permissions AS grants
                    ON grants.accessor_id = closure.id
                    AND grants.system_permission_id = -101
                WHERE NOT grants.accessed_id = ANY(closure.path)
            )
            SELECT id, MIN(level) AS level
            FROM closure
            GROUP BY id
            ORDER BY level, id
            "#,
        )
        .bind(accessor_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to evaluate accessor closure of {accessor_id}: {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(InheritedAccessor::new(
                    ResourceId::new(row.id),
                    level_from_row(row.level, "inherit")?,
                ))
            })
            .collect()
    }

    async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>> {
        let rows = sqlx::query_as::<_, ClosureRow>(
            r#"
            WITH RECURSIVE ancestors (id, level, path) AS (
                SELECT $1::BIGINT, 0, ARRAY[$1::BIGINT]
                UNION ALL
                SELECT domains.parent_id, ancestors.level + 1, ancestors.path || domains.parent_id
                FROM ancestors
                INNER JOIN domains ON domains.id = ancestors.id
                WHERE domains.parent_id IS NOT NULL
                    AND NOT domains.parent_id = ANY(ancestors.path)
            )
            SELECT id, MIN(level) AS level
            FROM ancestors
            GROUP BY id
            ORDER BY level, id
            "#,
        )
        .bind(domain_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to evaluate ancestors of domain {domain_id}: {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(AncestorDomain::new(
                    DomainId::new(row.id),
                    level_from_row(row.level, "domain")?,
                ))
            })
            .collect()
    }

    async fn descendant_domains(&self, domain_id: DomainId) -> AppResult<Vec<DescendantDomain>> {
        let rows = sqlx::query_as::<_, ClosureRow>(
            r#"
            WITH RECURSIVE descendants (id, level, path) AS (
                SELECT $1::BIGINT, 0, ARRAY[$1::BIGINT]
                UNION ALL
                SELECT domains.id, descendants.level + 1, descendants.path || domains.id
                FROM descendants
                INNER JOIN domains ON domains.parent_id = descendants.id
                WHERE NOT domains.id = ANY(descendants.path)
            )
            SELECT id, MIN(level) AS level
            FROM descendants
            GROUP BY id
            ORDER BY level, id
            "#,
        )
        .bind(domain_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to evaluate descendants of domain {domain_id}: {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(DescendantDomain::new(
                    DomainId::new(row.id),
                    level_from_row(row.level, "domain")?,
                ))
            })
            .collect()
    }
}

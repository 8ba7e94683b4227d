use async_trait::async_trait;
use tessera_application::{DomainGrantRemover, GrantRepository};
use tessera_core::{AppError, AppResult, DomainId, ResourceClassId, ResourceId};
use tessera_domain::{
    ClassDomainGrant, DomainCreatePermission, DomainPermission, DomainScopedGrant,
    ResourceCreatePermission, ResourcePermission,
};
use tracing::info;

use super::{
    DomainCreatePermissionRow, DomainPermissionGrantRow, DomainPermissionRow,
    GlobalPermissionGrantRow, PostgresAuthorizationStore, ResourceCreateGrantRow,
    ResourceCreatePermissionRow, ResourcePermissionRow, decode_rows,
};

#[async_trait]
impl GrantRepository for PostgresAuthorizationStore {
    async fn list_resource_permissions(
        &self,
        accessor_id: ResourceId,
        accessed_id: ResourceId,
    ) -> AppResult<Vec<ResourcePermission>> {
        let rows = sqlx::query_as::<_, ResourcePermissionRow>(
            r#"
            SELECT system_permission_id, permission_name, is_with_grant_option
            FROM grant_resource_permissions
            WHERE accessor_id = $1
                AND accessed_id = $2
            ORDER BY permission_name
            "#,
        )
        .bind(accessor_id.as_i64())
        .bind(accessed_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load resource permissions: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn list_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
    ) -> AppResult<Vec<ResourcePermission>> {
        let rows = sqlx::query_as::<_, ResourcePermissionRow>(
            r#"
            SELECT system_permission_id, permission_name, is_with_grant_option
            FROM grant_global_resource_permissions
            WHERE accessor_id = $1
                AND resource_class_id = $2
                AND domain_id = $3
            ORDER BY permission_name
            "#,
        )
        .bind(accessor_id.as_i64())
        .bind(resource_class_id.as_i64())
        .bind(domain_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load global resource permissions: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn list_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
        resource_class_id: ResourceClassId,
        domain_id: DomainId,
    ) -> AppResult<Vec<ResourceCreatePermission>> {
        let rows = sqlx::query_as::<_, ResourceCreatePermissionRow>(
            r#"
            SELECT
                system_permission_id,
                post_create_system_permission_id,
                post_create_permission_name,
                post_create_is_with_grant_option,
                is_with_grant_option
            FROM grant_resource_create_permissions
            WHERE accessor_id = $1
                AND resource_class_id = $2
                AND domain_id = $3
            ORDER BY id
            "#,
        )
        .bind(accessor_id.as_i64())
        .bind(resource_class_id.as_i64())
        .bind(domain_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load resource create permissions: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn list_domain_permissions(
        &self,
        accessor_id: ResourceId,
        domain_id: DomainId,
    ) -> AppResult<Vec<DomainPermission>> {
        let rows = sqlx::query_as::<_, DomainPermissionRow>(
            r#"
            SELECT system_permission_id, is_with_grant_option
            FROM grant_domain_permissions
            WHERE accessor_id = $1
                AND domain_id = $2
            ORDER BY system_permission_id DESC
            "#,
        )
        .bind(accessor_id.as_i64())
        .bind(domain_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load domain permissions: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn list_domain_create_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<DomainCreatePermission>> {
        let rows = sqlx::query_as::<_, DomainCreatePermissionRow>(
            r#"
            SELECT
                system_permission_id,
                post_create_system_permission_id,
                post_create_is_with_grant_option,
                is_with_grant_option
            FROM grant_domain_create_permissions
            WHERE accessor_id = $1
            ORDER BY id
            "#,
        )
        .bind(accessor_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load domain create permissions: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn list_all_global_resource_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<ClassDomainGrant<ResourcePermission>>> {
        let rows = sqlx::query_as::<_, GlobalPermissionGrantRow>(
            r#"
            SELECT
                resource_class_id,
                domain_id,
                system_permission_id,
                permission_name,
                is_with_grant_option
            FROM grant_global_resource_permissions
            WHERE accessor_id = $1
            ORDER BY domain_id, resource_class_id, permission_name
            "#,
        )
        .bind(accessor_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load global resource permissions of resource {accessor_id}: {error}"
            ))
        })?;

        decode_rows(rows)
    }

    async fn list_all_resource_create_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<ClassDomainGrant<ResourceCreatePermission>>> {
        let rows = sqlx::query_as::<_, ResourceCreateGrantRow>(
            r#"
            SELECT
                resource_class_id,
                domain_id,
                system_permission_id,
                post_create_system_permission_id,
                post_create_permission_name,
                post_create_is_with_grant_option,
                is_with_grant_option
            FROM grant_resource_create_permissions
            WHERE accessor_id = $1
            ORDER BY domain_id, resource_class_id, id
            "#,
        )
        .bind(accessor_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load resource create permissions of resource {accessor_id}: {error}"
            ))
        })?;

        decode_rows(rows)
    }

    async fn list_all_domain_permissions(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<DomainScopedGrant<DomainPermission>>> {
        let rows = sqlx::query_as::<_, DomainPermissionGrantRow>(
            r#"
            SELECT domain_id, system_permission_id, is_with_grant_option
            FROM grant_domain_permissions
            WHERE accessor_id = $1
            ORDER BY domain_id, system_permission_id DESC
            "#,
        )
        .bind(accessor_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load domain permissions of resource {accessor_id}: {error}"
            ))
        })?;

        decode_rows(rows)
    }
}

#[async_trait]
impl DomainGrantRemover for PostgresAuthorizationStore {
    async fn remove_domain_scoped_grants(&self, domain_id: DomainId) -> AppResult<u64> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start grant removal transaction: {error}"))
        })?;

        let mut removed = 0;
        for table in [
            "grant_resource_create_permissions",
            "grant_global_resource_permissions",
            "grant_domain_permissions",
        ] {
            let result = sqlx::query(format!("DELETE FROM {table} WHERE domain_id = $1").as_str())
                .bind(domain_id.as_i64())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to remove {table} rows for domain {domain_id}: {error}"
                    ))
                })?;
            removed += result.rows_affected();
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit grant removal: {error}"))
        })?;

        info!(domain = %domain_id, rows = removed, "removed domain scoped grant rows");
        Ok(removed)
    }
}

use tessera_core::{AppError, AppResult, DomainId, ResourceClassId};
use tessera_domain::{
    ClassDomainGrant, DomainCreatePermission, DomainPermission, DomainScopedGrant,
    ResourceCreatePermission, ResourcePermission,
};

use sqlx::{FromRow, PgPool};

mod directory;
mod grants;
mod hierarchy;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed authorization store.
///
/// Implements the single-hop hierarchy reads and their `WITH RECURSIVE`
/// counterparts, so either closure strategy can run against it.
#[derive(Clone)]
pub struct PostgresAuthorizationStore {
    pool: PgPool,
}

impl PostgresAuthorizationStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ResourcePermissionRow {
    system_permission_id: Option<i64>,
    permission_name: String,
    is_with_grant_option: bool,
}

impl TryFrom<ResourcePermissionRow> for ResourcePermission {
    type Error = AppError;

    fn try_from(row: ResourcePermissionRow) -> AppResult<Self> {
        ResourcePermission::from_stored(
            row.system_permission_id,
            row.permission_name.as_str(),
            row.is_with_grant_option,
        )
    }
}

#[derive(Debug, FromRow)]
struct ResourceCreatePermissionRow {
    system_permission_id: Option<i64>,
    post_create_system_permission_id: Option<i64>,
    post_create_permission_name: Option<String>,
    post_create_is_with_grant_option: Option<bool>,
    is_with_grant_option: bool,
}

impl TryFrom<ResourceCreatePermissionRow> for ResourceCreatePermission {
    type Error = AppError;

    fn try_from(row: ResourceCreatePermissionRow) -> AppResult<Self> {
        let post_create = row
            .post_create_permission_name
            .map(|name| {
                ResourcePermission::from_stored(
                    row.post_create_system_permission_id,
                    name.as_str(),
                    row.post_create_is_with_grant_option.unwrap_or(false),
                )
            })
            .transpose()?;

        ResourceCreatePermission::from_stored(
            row.system_permission_id,
            post_create,
            row.is_with_grant_option,
        )
    }
}

#[derive(Debug, FromRow)]
struct DomainPermissionRow {
    system_permission_id: i64,
    is_with_grant_option: bool,
}

impl TryFrom<DomainPermissionRow> for DomainPermission {
    type Error = AppError;

    fn try_from(row: DomainPermissionRow) -> AppResult<Self> {
        DomainPermission::from_stored(row.system_permission_id, row.is_with_grant_option)
    }
}

#[derive(Debug, FromRow)]
struct DomainCreatePermissionRow {
    system_permission_id: Option<i64>,
    post_create_system_permission_id: Option<i64>,
    post_create_is_with_grant_option: Option<bool>,
    is_with_grant_option: bool,
}

impl TryFrom<DomainCreatePermissionRow> for DomainCreatePermission {
    type Error = AppError;

    fn try_from(row: DomainCreatePermissionRow) -> AppResult<Self> {
        let post_create = row
            .post_create_system_permission_id
            .map(|id| {
                DomainPermission::from_stored(
                    id,
                    row.post_create_is_with_grant_option.unwrap_or(false),
                )
            })
            .transpose()?;

        DomainCreatePermission::from_stored(
            row.system_permission_id,
            post_create,
            row.is_with_grant_option,
        )
    }
}

#[derive(Debug, FromRow)]
struct GlobalPermissionGrantRow {
    resource_class_id: i64,
    domain_id: i64,
    #[sqlx(flatten)]
    permission: ResourcePermissionRow,
}

impl TryFrom<GlobalPermissionGrantRow> for ClassDomainGrant<ResourcePermission> {
    type Error = AppError;

    fn try_from(row: GlobalPermissionGrantRow) -> AppResult<Self> {
        Ok(ClassDomainGrant::new(
            ResourceClassId::new(row.resource_class_id),
            DomainId::new(row.domain_id),
            ResourcePermission::try_from(row.permission)?,
        ))
    }
}

#[derive(Debug, FromRow)]
struct ResourceCreateGrantRow {
    resource_class_id: i64,
    domain_id: i64,
    #[sqlx(flatten)]
    permission: ResourceCreatePermissionRow,
}

impl TryFrom<ResourceCreateGrantRow> for ClassDomainGrant<ResourceCreatePermission> {
    type Error = AppError;

    fn try_from(row: ResourceCreateGrantRow) -> AppResult<Self> {
        Ok(ClassDomainGrant::new(
            ResourceClassId::new(row.resource_class_id),
            DomainId::new(row.domain_id),
            ResourceCreatePermission::try_from(row.permission)?,
        ))
    }
}

#[derive(Debug, FromRow)]
struct DomainPermissionGrantRow {
    domain_id: i64,
    #[sqlx(flatten)]
    permission: DomainPermissionRow,
}

impl TryFrom<DomainPermissionGrantRow> for DomainScopedGrant<DomainPermission> {
    type Error = AppError;

    fn try_from(row: DomainPermissionGrantRow) -> AppResult<Self> {
        Ok(DomainScopedGrant::new(
            DomainId::new(row.domain_id),
            DomainPermission::try_from(row.permission)?,
        ))
    }
}

fn decode_rows<R, P>(rows: Vec<R>) -> AppResult<Vec<P>>
where
    P: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(P::try_from).collect()
}

fn level_from_row(level: i32, what: &str) -> AppResult<u32> {
    u32::try_from(level)
        .map_err(|error| AppError::Internal(format!("invalid {what} level {level}: {error}")))
}

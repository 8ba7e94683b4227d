use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tessera_application::{
    DomainGrantRemover, GrantRepository, HierarchyClosure, IterativeHierarchyClosure,
    RecursiveHierarchyClosure, ResourceDirectory,
};
use tessera_core::{DomainId, ResourceClassId, ResourceId};
use tessera_domain::{InheritedAccessor, ResourceCreatePermission};

use super::PostgresAuthorizationStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres authorization store tests: {error}");
    }

    Some(pool)
}

/// Id block unique to one test run; `tag` separates tests running concurrently.
fn id_base(tag: i64) -> i64 {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros())
        .unwrap_or_default();
    i64::try_from(micros).unwrap_or_default() * 1_000 + tag * 100
}

async fn execute(pool: &PgPool, sql: &str, binds: &[i64]) {
    let query = binds
        .iter()
        .fold(sqlx::query(sql), |query, value| query.bind(*value));
    let result = query.execute(pool).await;
    assert!(result.is_ok(), "{sql}: {result:?}");
}

async fn insert_domain(pool: &PgPool, id: i64, parent_id: Option<i64>) {
    let insert = sqlx::query(
        r#"
            INSERT INTO domains (id, name, parent_id)
            VALUES ($1, $2, $3)
            "#,
    )
    .bind(id)
    .bind(format!("domain-{id}"))
    .bind(parent_id)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

async fn insert_class(pool: &PgPool, id: i64, permission_names: &[&str]) {
    let insert = sqlx::query(
        r#"
            INSERT INTO resource_classes (id, name, is_authenticatable)
            VALUES ($1, $2, TRUE)
            "#,
    )
    .bind(id)
    .bind(format!("class-{id}"))
    .execute(pool)
    .await;
    assert!(insert.is_ok());

    for name in permission_names {
        let insert = sqlx::query(
            r#"
                INSERT INTO resource_class_permissions (resource_class_id, permission_name)
                VALUES ($1, $2)
                "#,
        )
        .bind(id)
        .bind(*name)
        .execute(pool)
        .await;
        assert!(insert.is_ok());
    }
}

async fn insert_inherit(pool: &PgPool, accessor_id: i64, donor_id: i64) {
    execute(
        pool,
        r#"
            INSERT INTO grant_resource_permissions
                (accessor_id, accessed_id, system_permission_id, permission_name)
            VALUES ($1, $2, -101, '*INHERIT')
            "#,
        &[accessor_id, donor_id],
    )
    .await;
}

#[tokio::test]
async fn recursive_accessor_closure_matches_iterative_on_cycles() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let base = id_base(1);
    insert_domain(&pool, base, None).await;
    insert_class(&pool, base, &[]).await;
    for offset in 1..=4 {
        execute(
            &pool,
            "INSERT INTO resources (id, resource_class_id, domain_id) VALUES ($1, $2, $2)",
            &[base + offset, base],
        )
        .await;
    }
    for (accessor, donor) in [(1, 2), (2, 3), (3, 1), (1, 3), (3, 4)] {
        insert_inherit(&pool, base + accessor, base + donor).await;
    }

    let store = Arc::new(PostgresAuthorizationStore::new(pool));
    let recursive = RecursiveHierarchyClosure::new(store.clone());
    let iterative = IterativeHierarchyClosure::new(store);
    let start = ResourceId::new(base + 1);

    let native = recursive.accessor_closure(start).await;
    let walked = iterative.accessor_closure(start).await;
    assert!(native.is_ok());
    assert_eq!(native.as_ref().ok(), walked.as_ref().ok());
    assert_eq!(
        native.unwrap_or_default(),
        vec![
            InheritedAccessor::new(ResourceId::new(base + 1), 0),
            InheritedAccessor::new(ResourceId::new(base + 2), 1),
            InheritedAccessor::new(ResourceId::new(base + 3), 1),
            InheritedAccessor::new(ResourceId::new(base + 4), 2),
        ]
    );
}

#[tokio::test]
async fn domain_closures_follow_parent_links() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let base = id_base(2);
    insert_domain(&pool, base, None).await;
    insert_domain(&pool, base + 1, Some(base)).await;
    insert_domain(&pool, base + 2, Some(base)).await;
    insert_domain(&pool, base + 3, Some(base + 1)).await;

    let store = Arc::new(PostgresAuthorizationStore::new(pool));
    let recursive = RecursiveHierarchyClosure::new(store.clone());
    let iterative = IterativeHierarchyClosure::new(store);

    let ancestors = recursive.ancestor_domains(DomainId::new(base + 3)).await;
    let ids: Vec<(i64, u32)> = ancestors
        .unwrap_or_default()
        .into_iter()
        .map(|ancestor| (ancestor.domain_id.as_i64(), ancestor.domain_level))
        .collect();
    assert_eq!(ids, vec![(base + 3, 0), (base + 1, 1), (base, 2)]);

    let native = recursive.descendant_domains(DomainId::new(base)).await;
    let walked = iterative.descendant_domains(DomainId::new(base)).await;
    assert_eq!(native.as_ref().ok(), walked.as_ref().ok());
    let levels: Vec<u32> = native
        .unwrap_or_default()
        .into_iter()
        .map(|descendant| descendant.level)
        .collect();
    assert_eq!(levels, vec![0, 1, 1, 2]);

    let unknown = recursive.ancestor_domains(DomainId::new(base + 99)).await;
    assert_eq!(unknown.map(|chain| chain.len()).ok(), Some(1));
}

#[tokio::test]
async fn stored_grants_decode_and_cascade_removal_counts_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let base = id_base(3);
    insert_domain(&pool, base, None).await;
    insert_domain(&pool, base + 1, Some(base)).await;
    insert_class(&pool, base, &["edit", "read"]).await;
    execute(
        &pool,
        "INSERT INTO resources (id, resource_class_id, domain_id) VALUES ($1, $2, $2)",
        &[base + 10, base],
    )
    .await;
    let accessor = base + 10;
    execute(
        &pool,
        r#"
            INSERT INTO grant_resource_create_permissions
                (accessor_id, resource_class_id, domain_id,
                 system_permission_id, is_with_grant_option)
            VALUES ($1, $2, $3, -100, TRUE)
            "#,
        &[accessor, base, base + 1],
    )
    .await;
    execute(
        &pool,
        r#"
            INSERT INTO grant_resource_create_permissions
                (accessor_id, resource_class_id, domain_id, post_create_permission_name)
            VALUES ($1, $2, $3, 'edit')
            "#,
        &[accessor, base, base + 1],
    )
    .await;
    execute(
        &pool,
        r#"
            INSERT INTO grant_global_resource_permissions
                (accessor_id, resource_class_id, domain_id, permission_name)
            VALUES ($1, $2, $3, 'read')
            "#,
        &[accessor, base, base + 1],
    )
    .await;
    execute(
        &pool,
        r#"
            INSERT INTO grant_domain_permissions (accessor_id, domain_id, system_permission_id)
            VALUES ($1, $2, -301)
            "#,
        &[accessor, base],
    )
    .await;

    let store = PostgresAuthorizationStore::new(pool);
    let class = store
        .find_resource_class_by_name(format!("class-{base}").as_str())
        .await
        .ok()
        .flatten();
    assert_eq!(
        class.map(|class| class.permission_names().collect::<Vec<_>>().join(",")),
        Some("edit,read".to_owned())
    );

    let create = store
        .list_resource_create_permissions(
            ResourceId::new(accessor),
            ResourceClassId::new(base),
            DomainId::new(base + 1),
        )
        .await
        .unwrap_or_default();
    assert_eq!(create.len(), 2);
    assert!(create.contains(
        &ResourceCreatePermission::instance_with_grant_option(ResourceCreatePermission::CREATE)
            .unwrap_or_else(|_| unreachable!())
    ));

    let super_user = store
        .list_domain_permissions(ResourceId::new(accessor), DomainId::new(base))
        .await
        .unwrap_or_default();
    assert!(super_user.iter().any(|permission| permission.is_super_user()));

    let all_create = store
        .list_all_resource_create_permissions(ResourceId::new(accessor))
        .await
        .unwrap_or_default();
    assert_eq!(all_create.len(), 2);
    assert!(all_create.iter().all(|grant| {
        grant.domain_id == DomainId::new(base + 1)
            && grant.resource_class_id == ResourceClassId::new(base)
    }));
    let all_global = store
        .list_all_global_resource_permissions(ResourceId::new(accessor))
        .await
        .unwrap_or_default();
    assert_eq!(
        all_global
            .iter()
            .map(|grant| grant.permission.to_string())
            .collect::<Vec<_>>(),
        vec!["read".to_owned()]
    );
    let all_domain = store
        .list_all_domain_permissions(ResourceId::new(accessor))
        .await
        .unwrap_or_default();
    assert_eq!(all_domain.len(), 1);
    assert_eq!(all_domain[0].domain_id, DomainId::new(base));
    assert!(all_domain[0].permission.is_super_user());

    let classes = store.list_resource_classes().await.unwrap_or_default();
    assert!(
        classes
            .iter()
            .any(|class| class.id() == ResourceClassId::new(base))
    );

    let removed = store.remove_domain_scoped_grants(DomainId::new(base + 1)).await;
    assert_eq!(removed.ok(), Some(3));
    let untouched = store
        .list_domain_permissions(ResourceId::new(accessor), DomainId::new(base))
        .await
        .unwrap_or_default();
    assert_eq!(untouched.len(), 1);
}

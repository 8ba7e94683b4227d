//! Tessera operator command line.

#![forbid(unsafe_code)]

mod cli_config;
mod command;

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tessera_application::{AuthorizationService, DomainCascadeService, hierarchy_closure_for};
use tessera_core::{AppError, AppResult};
use tessera_domain::DescendantDomain;
use tessera_infrastructure::PostgresAuthorizationStore;
use tracing::info;

use crate::cli_config::{CliConfig, init_tracing};
use crate::command::{Cli, CliCommand};

#[derive(Debug, Serialize)]
struct DescendantsReport<'a> {
    domain: &'a str,
    descendants: Vec<DescendantDomain>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let Cli { command } = Cli::parse();
    init_tracing();

    let config = CliConfig::load()?;
    let pool = connect_pool(&config).await?;

    info!(
        closure_strategy = config.closure_strategy.as_str(),
        max_connections = config.max_connections,
        "tessera-cli started"
    );

    let store = Arc::new(PostgresAuthorizationStore::new(pool.clone()));
    let closure = hierarchy_closure_for(config.closure_strategy, store.clone());

    match command {
        CliCommand::Migrate => {
            run_migrations(&pool).await?;
            info!("migrations applied");
        }
        CliCommand::ResourcePermissions {
            accessor_id,
            accessed_id,
        } => {
            let service = AuthorizationService::new(store.clone(), store, closure);
            let permissions = service
                .effective_resource_permissions(accessor_id, accessed_id)
                .await?;
            print_json(&permissions)?;
        }
        CliCommand::CheckResource {
            accessor_id,
            accessed_id,
            requested,
        } => {
            let service = AuthorizationService::new(store.clone(), store, closure);
            let granted = service
                .has_resource_permissions(accessor_id, accessed_id, &requested)
                .await?;
            print_json(&granted)?;
        }
        CliCommand::CreatePermissions {
            accessor_id,
            resource_class,
            domain,
        } => {
            let service = AuthorizationService::new(store.clone(), store, closure);
            match resource_class {
                Some(resource_class) => {
                    let permissions = service
                        .effective_resource_create_permissions(
                            accessor_id,
                            resource_class.as_str(),
                            domain.as_deref(),
                        )
                        .await?;
                    print_json(&permissions)?;
                }
                None => {
                    let permissions = service
                        .effective_resource_create_permissions_map(accessor_id)
                        .await?;
                    print_json(&permissions)?;
                }
            }
        }
        CliCommand::Descendants { domain_name } => {
            let cascade = DomainCascadeService::new(store.clone(), closure, store);
            let descendants = cascade.descendants_by_level(domain_name.as_str()).await?;
            print_json(&DescendantsReport {
                domain: domain_name.as_str(),
                descendants,
            })?;
        }
    }

    Ok(())
}

async fn connect_pool(config: &CliConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render output: {error}")))?;
    println!("{rendered}");
    Ok(())
}

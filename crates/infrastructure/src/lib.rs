//! Storage adapters for the authorization ports.

#![forbid(unsafe_code)]

mod in_memory_authorization_store;
mod postgres_authorization_store;

pub use in_memory_authorization_store::InMemoryAuthorizationStore;
pub use postgres_authorization_store::PostgresAuthorizationStore;

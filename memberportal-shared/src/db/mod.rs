/// PostgreSQL access
///
/// - `pool`: connection pool with health checks
/// - `migrations`: embedded schema migrations
///
/// Queries themselves live in [`crate::storage::postgres`].

pub mod migrations;
pub mod pool;

pub use pool::{close_pool, create_pool, health_check, DatabaseConfig};

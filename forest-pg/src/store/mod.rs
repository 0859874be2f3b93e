//! Accès au store PostgreSQL/PostGIS (pool, préconditions)

pub mod pool;
pub mod preflight;

pub use pool::{create_pool, test_connection, DatabaseConfig};
pub use preflight::{check_tables, table_count, truncate_table, REQUIRED_TABLES};

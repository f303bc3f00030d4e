//! # lumen-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `RoutineRepository` port defined in `lumen-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `lumen-app` (for port traits) and `lumen-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod pool;
mod routine_repo;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use routine_repo::SqliteRoutineRepository;

//! Participant storage: connection pool, schema migrations and the store itself

pub mod db;
pub mod migrations;
pub mod participants;

// Re-exports for convenience
pub use db::{create_pool, get_connection, shutdown_pool, DbConnection, DbPool};
pub use participants::{ParticipantStore, SqliteParticipantStore};

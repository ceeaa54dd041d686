//! Store error taxonomy, directly modeled on the teacher's `StateError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("migration failed at version {version}: {message}")]
    Migration { version: i64, message: String },

    #[error("a concurrent writer already holds the store lock at {path}")]
    StoreLocked { path: String },

    #[error("sync_config could not acquire the schema lock")]
    SchemaLocked,

    #[error("source '{0}' is not present in the dimension")]
    UnknownSource(String),

    #[error("skill '{0}' is not present in the dimension")]
    UnknownSkill(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<surrealdb::Error> for StoreError {
    fn from(e: surrealdb::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

//! Database-specific error types and conversions.

use rankit_core::error::RankError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Failed to decode row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Store state inconsistent: {0}")]
    Inconsistent(String),

    #[error("Uniqueness violated: {entity}")]
    Conflict { entity: String },
}

impl From<DbError> for RankError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RankError::NotFound { entity, id },
            DbError::Conflict { entity } => RankError::AlreadyExists { entity },
            DbError::Surreal(e) => RankError::StoreUnavailable(e.to_string()),
            other => RankError::Database(other.to_string()),
        }
    }
}

//! Error types for the rankit system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Rating score must be between 1 and 5, got {score}")]
    InvalidScore { score: i64 },

    #[error("Group owner cannot leave the group")]
    OwnerCannotLeave,

    #[error("Group owner cannot be removed")]
    CannotRemoveOwner,

    #[error("Admins cannot be kicked; they must leave voluntarily")]
    CannotRemoveAdmin,

    #[error("Already a member of this group")]
    AlreadyMember,

    #[error("Not a member of this group")]
    NotAMember,

    #[error("Backing store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),
}

pub type RankResult<T> = Result<T, RankError>;

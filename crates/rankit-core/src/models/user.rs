//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Stored lowercased and trimmed.
    pub email: String,
    /// Argon2id PHC-format hash. Opaque to everything but rankit-auth.
    pub password_hash: String,
    /// Denormalized list of groups this user belongs to.
    pub groups_joined: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Already hashed; raw passwords never reach the repository layer.
    pub password_hash: String,
}

//! Rating domain model — one user's 1–5 score for one item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most one rating exists per (user, item) pair; a second submission
/// from the same user updates the existing record in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: Uuid,
    /// Carried for group-scoped queries and cascade deletion.
    pub group_id: Uuid,
    pub item_id: Uuid,
    pub score: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRating {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub item_id: Uuid,
    pub score: u8,
}

/// Outcome of a rating upsert, fed into the item statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingChange {
    /// `None` on a user's first rating of the item.
    pub previous: Option<u8>,
    pub score: u8,
}

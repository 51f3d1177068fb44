//! Group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ranking community. The creator owns the group and is always present
/// in both `members` and `admins`; `member_count` equals `members.len()`
/// after every completed membership mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    pub members: Vec<Uuid>,
    pub admins: Vec<Uuid>,
    pub member_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admins.contains(&user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub description: String,
    /// Becomes the sole member and admin of the new group.
    pub owner_id: Uuid,
}

/// A group annotated with the viewing user's relationship to it,
/// as returned by discovery and "my groups" listings.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub group: Group,
    pub is_member: bool,
    pub is_admin: bool,
}

//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The backing store is assumed to
//! offer atomic single-record read-modify-write operations but no
//! cross-record transactions; every method here maps to at most one
//! atomic mutation per record.

use uuid::Uuid;

use crate::error::RankResult;
use crate::models::{
    group::{CreateGroup, Group},
    item::{CreateItem, Item, SortKey},
    rating::{Rating, RatingChange, SubmitRating},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    /// Create a user. Duplicate username or email fails with
    /// `AlreadyExists` (enforced by a unique index, not check-then-insert).
    fn create(&self, input: CreateUser) -> impl Future<Output = RankResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RankResult<User>> + Send;
    fn get_by_username(&self, username: &str) -> impl Future<Output = RankResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = RankResult<User>> + Send;
    /// Record a group in the user's denormalized groups_joined list.
    /// Idempotent.
    fn add_group(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = RankResult<()>> + Send;
    /// Remove a group from groups_joined. Idempotent.
    fn remove_group(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = RankResult<()>> + Send;
}

pub trait GroupRepository: Send + Sync {
    /// Create a group with the owner as its sole member and admin and
    /// member_count = 1, in a single insert.
    fn create(&self, input: CreateGroup) -> impl Future<Output = RankResult<Group>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RankResult<Group>> + Send;
    /// Paginated listing, newest first. `search` filters by
    /// case-insensitive substring on name or description.
    fn search(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> impl Future<Output = RankResult<PaginatedResult<Group>>> + Send;
    /// Groups the user is a member of, newest first.
    fn get_user_groups(&self, user_id: Uuid) -> impl Future<Output = RankResult<Vec<Group>>> + Send;
    fn is_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = RankResult<bool>> + Send;
    fn is_admin(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = RankResult<bool>> + Send;
    /// Add a member. The membership insert and member_count increment
    /// happen in one conditional atomic update, so adding an existing
    /// member never double-increments. Returns false if the user was
    /// already a member.
    fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = RankResult<bool>> + Send;
    /// Remove a member (and their admin entry, if any), decrementing
    /// member_count in the same atomic update. Returns false if the user
    /// was not a member. Never removes the owner.
    fn remove_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = RankResult<bool>> + Send;
    /// Delete the group record and confirm it is gone.
    fn delete(&self, id: Uuid) -> impl Future<Output = RankResult<()>> + Send;
}

pub trait ItemRepository: Send + Sync {
    fn create(&self, input: CreateItem) -> impl Future<Output = RankResult<Item>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RankResult<Item>> + Send;
    fn update(
        &self,
        id: Uuid,
        name: String,
        description: String,
    ) -> impl Future<Output = RankResult<Item>> + Send;
    /// All items of a group in the order given by `sort`.
    fn list_by_group(
        &self,
        group_id: Uuid,
        sort: SortKey,
    ) -> impl Future<Output = RankResult<Vec<Item>>> + Send;
    /// Page through item ids across all groups, for reconciliation sweeps.
    fn list_ids(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RankResult<Vec<Uuid>>> + Send;
    /// Atomically fold a rating change into the item's running counters:
    /// first rating increments count and sum, a resubmission adjusts the
    /// sum by (new - previous). This is a store-level atomic add, never a
    /// whole-record read-modify-write.
    fn apply_rating(
        &self,
        id: Uuid,
        change: RatingChange,
    ) -> impl Future<Output = RankResult<()>> + Send;
    /// Read the post-increment counters and write the derived average.
    /// Deliberately a separate step from `apply_rating`; concurrent
    /// refreshes converge to the same value.
    fn refresh_average(&self, id: Uuid) -> impl Future<Output = RankResult<Item>> + Send;
    /// Overwrite the counters and average outright (reconciliation).
    fn set_stats(
        &self,
        id: Uuid,
        rating_count: u64,
        rating_sum: i64,
    ) -> impl Future<Output = RankResult<()>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RankResult<()>> + Send;
    /// Delete every item of a group, returning how many were removed.
    fn delete_by_group(&self, group_id: Uuid) -> impl Future<Output = RankResult<u64>> + Send;
}

pub trait RatingRepository: Send + Sync {
    /// Insert or update the caller's rating for an item. The record
    /// identity is derived from the (user, item) pair, so two concurrent
    /// first submissions cannot both insert; the loser of that race falls
    /// back to an update.
    fn upsert(
        &self,
        input: SubmitRating,
    ) -> impl Future<Output = RankResult<RatingChange>> + Send;
    fn get(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> impl Future<Output = RankResult<Option<Rating>>> + Send;
    /// All of one user's ratings within a group (leaderboard annotation).
    fn list_for_user_in_group(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = RankResult<Vec<Rating>>> + Send;
    /// Ground truth for an item's statistics: (count, sum of scores).
    fn stats_for_item(
        &self,
        item_id: Uuid,
    ) -> impl Future<Output = RankResult<(u64, i64)>> + Send;
    fn delete_by_item(&self, item_id: Uuid) -> impl Future<Output = RankResult<u64>> + Send;
    fn delete_by_group(&self, group_id: Uuid) -> impl Future<Output = RankResult<u64>> + Send;
}

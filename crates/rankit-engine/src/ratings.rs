//! Rating ledger orchestration — the submit-rating flow.
//!
//! The flow is: validate, authorize, upsert the rating record, then fold
//! the change into the item's counters and refresh the derived average.
//! The upsert and the statistics update are not wrapped in a transaction;
//! a crash between them leaves a bounded inconsistency window that the
//! reconciliation pass repairs from the rating ledger, which is the
//! source of truth.

use rankit_core::error::{RankError, RankResult};
use rankit_core::models::item::Item;
use rankit_core::models::rating::{Rating, SubmitRating};
use rankit_core::repository::{GroupRepository, ItemRepository, RatingRepository};
use rankit_core::validate::validate_score;
use tracing::info;
use uuid::Uuid;

pub struct RatingService<G: GroupRepository, I: ItemRepository, R: RatingRepository> {
    groups: G,
    items: I,
    ratings: R,
}

impl<G: GroupRepository, I: ItemRepository, R: RatingRepository> RatingService<G, I, R> {
    pub fn new(groups: G, items: I, ratings: R) -> Self {
        Self {
            groups,
            items,
            ratings,
        }
    }

    /// Submit a 1–5 rating for an item. A user's second submission for
    /// the same item updates their rating in place: the item's
    /// rating_sum shifts by (new - old) and rating_count is unchanged.
    ///
    /// Returns the item with refreshed statistics.
    pub async fn submit_rating(
        &self,
        user: Uuid,
        group_id: Uuid,
        item_id: Uuid,
        score: i64,
    ) -> RankResult<Item> {
        // Validation and authorization happen before any mutation.
        let score = validate_score(score)?;

        let item = self.items.get_by_id(item_id).await?;
        if item.group_id != group_id {
            return Err(RankError::NotFound {
                entity: "item".into(),
                id: item_id.to_string(),
            });
        }

        let group = self.groups.get_by_id(group_id).await?;
        if !group.is_member(user) {
            return Err(RankError::NotAuthorized {
                reason: "must be a group member to rate items".into(),
            });
        }

        let change = self
            .ratings
            .upsert(SubmitRating {
                user_id: user,
                group_id,
                item_id,
                score,
            })
            .await?;

        // Atomic counter add, then the best-effort average refresh. A
        // failure between the upsert above and this point is healed by
        // the reconciliation sweep.
        self.items.apply_rating(item_id, change).await?;
        let item = self.items.refresh_average(item_id).await?;

        info!(
            item_id = %item_id,
            user = %user,
            score,
            previous = ?change.previous,
            "rating submitted"
        );
        Ok(item)
    }

    /// The caller's own rating for an item, if any.
    pub async fn get_rating(&self, user: Uuid, item_id: Uuid) -> RankResult<Option<Rating>> {
        self.ratings.get(user, item_id).await
    }
}

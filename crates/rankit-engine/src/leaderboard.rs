//! Leaderboard view — a pure read-side projection over item statistics.
//!
//! Ordering is delegated to the store's sort; this module only attaches
//! 1-based rank positions and the viewer's own scores. Ties are broken
//! by the sort's stable tiebreak and receive distinct consecutive ranks,
//! never shared ranks.

use std::collections::HashMap;

use rankit_core::error::RankResult;
use rankit_core::models::item::{Item, SortKey};
use rankit_core::repository::{GroupRepository, ItemRepository, RatingRepository};
use serde::Serialize;
use uuid::Uuid;

/// One leaderboard entry: an item, its 1-based position, and the
/// viewer's own score when a viewer is given.
#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    pub rank: u64,
    pub item: Item,
    pub viewer_score: Option<u8>,
}

pub struct LeaderboardService<G: GroupRepository, I: ItemRepository, R: RatingRepository> {
    groups: G,
    items: I,
    ratings: R,
}

impl<G: GroupRepository, I: ItemRepository, R: RatingRepository> LeaderboardService<G, I, R> {
    pub fn new(groups: G, items: I, ratings: R) -> Self {
        Self {
            groups,
            items,
            ratings,
        }
    }

    /// All items of a group in leaderboard order. Zero-rated items are
    /// included and sort last under the `rating` key.
    pub async fn rank(
        &self,
        group_id: Uuid,
        sort: SortKey,
        viewer: Option<Uuid>,
    ) -> RankResult<Vec<RankedItem>> {
        // Surface NotFound for a missing group rather than an empty board.
        self.groups.get_by_id(group_id).await?;

        let items = self.items.list_by_group(group_id, sort).await?;

        let viewer_scores: HashMap<Uuid, u8> = match viewer {
            Some(user) => self
                .ratings
                .list_for_user_in_group(user, group_id)
                .await?
                .into_iter()
                .map(|r| (r.item_id, r.score))
                .collect(),
            None => HashMap::new(),
        };

        Ok(items
            .into_iter()
            .zip(1u64..)
            .map(|(item, rank)| RankedItem {
                rank,
                viewer_score: viewer_scores.get(&item.id).copied(),
                item,
            })
            .collect())
    }
}

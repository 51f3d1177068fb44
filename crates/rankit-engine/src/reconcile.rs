//! Reconciliation pass — repairs item statistics from the rating ledger.
//!
//! The submit-rating flow updates the rating record and the item's
//! counters in two steps without a transaction. A crash between the two
//! leaves counters that disagree with the ledger; this pass recomputes
//! count and sum from the ratings (the source of truth) and overwrites
//! any item that drifted. It runs periodically and is a required part of
//! the design, not optional cleanup.

use rankit_core::error::{RankError, RankResult};
use rankit_core::models::item::Item;
use rankit_core::repository::{ItemRepository, Pagination, RatingRepository};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct Reconciler<I: ItemRepository, R: RatingRepository> {
    items: I,
    ratings: R,
    page_size: u64,
}

impl<I: ItemRepository, R: RatingRepository> Reconciler<I, R> {
    pub fn new(items: I, ratings: R, page_size: u64) -> Self {
        Self {
            items,
            ratings,
            page_size,
        }
    }

    /// Recompute one item's statistics from its ratings. Returns true if
    /// the stored statistics had drifted and were repaired.
    pub async fn reconcile_item(&self, item_id: Uuid) -> RankResult<bool> {
        let (count, sum) = self.ratings.stats_for_item(item_id).await?;

        let item = match self.items.get_by_id(item_id).await {
            Ok(item) => item,
            // Deleted out from under the sweep; nothing to repair.
            Err(RankError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };

        let expected_avg = Item::average(sum, count);
        if item.rating_count == count
            && item.rating_sum == sum
            && item.avg_rating == expected_avg
        {
            return Ok(false);
        }

        warn!(
            item_id = %item_id,
            stored_count = item.rating_count,
            stored_sum = item.rating_sum,
            actual_count = count,
            actual_sum = sum,
            "item statistics drifted from rating ledger; repairing"
        );
        self.items.set_stats(item_id, count, sum).await?;
        Ok(true)
    }

    /// Reconcile every item in the store, paging through ids. Returns
    /// the number of items repaired.
    pub async fn sweep(&self) -> RankResult<u64> {
        let mut repaired = 0u64;
        let mut offset = 0u64;

        loop {
            let ids = self
                .items
                .list_ids(Pagination {
                    offset,
                    limit: self.page_size,
                })
                .await?;
            let page_len = ids.len() as u64;

            for id in ids {
                if self.reconcile_item(id).await? {
                    repaired += 1;
                }
            }

            if page_len < self.page_size {
                break;
            }
            offset += page_len;
        }

        debug!(repaired, "reconciliation sweep finished");
        Ok(repaired)
    }
}

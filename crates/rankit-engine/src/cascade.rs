//! Cascade deletion coordinator.
//!
//! Dependents are removed before their parents: ratings first, then
//! items, then the group record. If a step fails partway, no rating can
//! be left pointing at an already-deleted parent without cleanup having
//! been attempted first. Group deletion reports success only once the
//! group record is confirmed gone, then scrubs the deleted group from
//! every former member's denormalized group list.

use rankit_core::error::{RankError, RankResult};
use rankit_core::repository::{
    GroupRepository, ItemRepository, RatingRepository, UserRepository,
};
use tracing::info;
use uuid::Uuid;

pub struct CascadeService<G, I, R, U>
where
    G: GroupRepository,
    I: ItemRepository,
    R: RatingRepository,
    U: UserRepository,
{
    groups: G,
    items: I,
    ratings: R,
    users: U,
}

impl<G, I, R, U> CascadeService<G, I, R, U>
where
    G: GroupRepository,
    I: ItemRepository,
    R: RatingRepository,
    U: UserRepository,
{
    pub fn new(groups: G, items: I, ratings: R, users: U) -> Self {
        Self {
            groups,
            items,
            ratings,
            users,
        }
    }

    /// Delete a group and everything in it. Owner only.
    pub async fn delete_group(&self, group_id: Uuid, actor: Uuid) -> RankResult<()> {
        let group = self.groups.get_by_id(group_id).await?;
        if !group.is_owner(actor) {
            return Err(RankError::NotAuthorized {
                reason: "only the group owner can delete the group".into(),
            });
        }

        let ratings_removed = self.ratings.delete_by_group(group_id).await?;
        let items_removed = self.items.delete_by_group(group_id).await?;
        self.groups.delete(group_id).await?;

        // Former members still list the group in groups_joined; drop it
        // so no user points at a record that no longer exists.
        for member in &group.members {
            self.users.remove_group(*member, group_id).await?;
        }

        info!(
            group_id = %group_id,
            items_removed,
            ratings_removed,
            "group deleted"
        );
        Ok(())
    }

    /// Delete an item and its ratings. Requires admin of the owning group.
    pub async fn delete_item(&self, item_id: Uuid, actor: Uuid) -> RankResult<()> {
        let item = self.items.get_by_id(item_id).await?;

        if !self.groups.is_admin(item.group_id, actor).await? {
            return Err(RankError::NotAuthorized {
                reason: "only group admins can delete items".into(),
            });
        }

        let ratings_removed = self.ratings.delete_by_item(item_id).await?;
        self.items.delete(item_id).await?;

        info!(item_id = %item_id, ratings_removed, "item deleted");
        Ok(())
    }
}

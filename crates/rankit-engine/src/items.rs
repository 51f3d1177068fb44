//! Item catalog — adding, editing and fetching the things being ranked.

use rankit_core::error::{RankError, RankResult};
use rankit_core::models::item::{CreateItem, Item};
use rankit_core::repository::{GroupRepository, ItemRepository, RatingRepository};
use rankit_core::validate::sanitize;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;

/// An item paired with the viewing user's own score, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub item: Item,
    pub viewer_score: Option<u8>,
}

pub struct ItemService<G: GroupRepository, I: ItemRepository, R: RatingRepository> {
    groups: G,
    items: I,
    ratings: R,
    config: EngineConfig,
}

impl<G: GroupRepository, I: ItemRepository, R: RatingRepository> ItemService<G, I, R> {
    pub fn new(groups: G, items: I, ratings: R, config: EngineConfig) -> Self {
        Self {
            groups,
            items,
            ratings,
            config,
        }
    }

    fn validated_name(&self, name: &str) -> RankResult<String> {
        let name = sanitize(name, self.config.item_name_max_len);
        if name.chars().count() < self.config.item_name_min_len {
            return Err(RankError::Validation {
                message: format!(
                    "Item name must be at least {} characters",
                    self.config.item_name_min_len
                ),
            });
        }
        Ok(name)
    }

    /// Add an item to a group. Requires membership; the description is
    /// optional. Statistics start at zero.
    pub async fn add_item(
        &self,
        group_id: Uuid,
        name: &str,
        description: &str,
        creator: Uuid,
    ) -> RankResult<Item> {
        let group = self.groups.get_by_id(group_id).await?;
        if !group.is_member(creator) {
            return Err(RankError::NotAuthorized {
                reason: "must be a group member to add items".into(),
            });
        }

        let name = self.validated_name(name)?;
        let description = sanitize(description, self.config.description_max_len);

        let item = self
            .items
            .create(CreateItem {
                group_id,
                name,
                description,
                added_by: creator,
            })
            .await?;

        info!(item_id = %item.id, group_id = %group_id, "item added");
        Ok(item)
    }

    /// Edit an item's name and description. Only the group owner may edit.
    pub async fn edit_item(
        &self,
        group_id: Uuid,
        item_id: Uuid,
        name: &str,
        description: &str,
        actor: Uuid,
    ) -> RankResult<Item> {
        let group = self.groups.get_by_id(group_id).await?;
        if !group.is_owner(actor) {
            return Err(RankError::NotAuthorized {
                reason: "only the group owner can edit items".into(),
            });
        }

        let item = self.items.get_by_id(item_id).await?;
        if item.group_id != group_id {
            // Scoped lookup: an item from another group is not visible here.
            return Err(RankError::NotFound {
                entity: "item".into(),
                id: item_id.to_string(),
            });
        }

        let name = self.validated_name(name)?;
        let description = sanitize(description, self.config.description_max_len);

        self.items.update(item_id, name, description).await
    }

    /// Fetch a single item, attaching the viewer's own rating if present.
    pub async fn get_item(&self, item_id: Uuid, viewer: Option<Uuid>) -> RankResult<ItemView> {
        let item = self.items.get_by_id(item_id).await?;

        let viewer_score = match viewer {
            Some(user) => self
                .ratings
                .get(user, item_id)
                .await?
                .map(|r| r.score),
            None => None,
        };

        Ok(ItemView { item, viewer_score })
    }
}

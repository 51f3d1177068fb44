//! SurrealDB implementation of [`ItemRepository`].
//!
//! Rating statistics are folded in with store-level atomic adds
//! (`rating_count += 1`, `rating_sum += $delta`), never by rewriting the
//! whole record, so concurrent submissions for the same item cannot lose
//! updates. The derived average is refreshed in a separate step that
//! reads the post-increment counters.

use chrono::{DateTime, Utc};
use rankit_core::error::RankResult;
use rankit_core::models::item::{CreateItem, Item, SortKey};
use rankit_core::models::rating::RatingChange;
use rankit_core::repository::{ItemRepository, Pagination};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, parse_uuid, with_conflict_retry};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct ItemRow {
    group_id: String,
    name: String,
    description: String,
    added_by: String,
    rating_count: u64,
    rating_sum: i64,
    avg_rating: f64,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, id: Uuid) -> Result<Item, DbError> {
        Ok(Item {
            id,
            group_id: parse_uuid(&self.group_id, "group")?,
            name: self.name,
            description: self.description,
            added_by: parse_uuid(&self.added_by, "user")?,
            rating_count: self.rating_count,
            rating_sum: self.rating_sum,
            avg_rating: self.avg_rating,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct ItemRowWithId {
    record_id: String,
    group_id: String,
    name: String,
    description: String,
    added_by: String,
    rating_count: u64,
    rating_sum: i64,
    avg_rating: f64,
    created_at: DateTime<Utc>,
}

impl ItemRowWithId {
    fn try_into_item(self) -> Result<Item, DbError> {
        let id = parse_uuid(&self.record_id, "item")?;
        Ok(Item {
            id,
            group_id: parse_uuid(&self.group_id, "group")?,
            name: self.name,
            description: self.description,
            added_by: parse_uuid(&self.added_by, "user")?,
            rating_count: self.rating_count,
            rating_sum: self.rating_sum,
            avg_rating: self.avg_rating,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatsRow {
    rating_count: u64,
    rating_sum: i64,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    record_id: String,
}

/// SurrealDB implementation of the Item repository.
#[derive(Clone)]
pub struct SurrealItemRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealItemRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ItemRepository for SurrealItemRepository<C> {
    async fn create(&self, input: CreateItem) -> RankResult<Item> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::thing('item', $id) SET \
                 group_id = $group_id, \
                 name = $name, description = $description, \
                 added_by = $added_by, \
                 rating_count = 0, rating_sum = 0, avg_rating = 0.0",
            )
            .bind(("id", id_str.clone()))
            .bind(("group_id", input.group_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("added_by", input.added_by.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "item".into(),
            id: id_str,
        })?;

        Ok(row.into_item(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RankResult<Item> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('item', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "item".into(),
            id: id_str,
        })?;

        Ok(row.into_item(id)?)
    }

    async fn update(&self, id: Uuid, name: String, description: String) -> RankResult<Item> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::thing('item', $id) SET \
                 name = $name, description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", name))
            .bind(("description", description))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "item".into(),
            id: id_str,
        })?;

        Ok(row.into_item(id)?)
    }

    async fn list_by_group(&self, group_id: Uuid, sort: SortKey) -> RankResult<Vec<Item>> {
        // Creation order is the stable tiebreak for equal ratings, so
        // equal items keep a deterministic leaderboard position.
        let order = match sort {
            SortKey::Rating => "avg_rating DESC, rating_count DESC, created_at ASC",
            SortKey::New => "created_at DESC",
            SortKey::Name => "name ASC",
        };

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM item \
             WHERE group_id = $group_id \
             ORDER BY {order}"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list_ids(&self, pagination: Pagination) -> RankResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, created_at FROM item \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        let ids = rows
            .iter()
            .map(|row| parse_uuid(&row.record_id, "item"))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(ids)
    }

    async fn apply_rating(&self, id: Uuid, change: RatingChange) -> RankResult<()> {
        let id_str = id.to_string();

        // Concurrent submissions for one item contend on its record, so
        // the store's retryable conflict is retried here.
        let updated: Vec<ItemRow> = with_conflict_retry(|| {
            let db = self.db.clone();
            let id = id_str.clone();
            Box::pin(async move {
                let mut result = match change.previous {
                    // First rating: count and sum move together in one
                    // atomic add.
                    None => {
                        db.query(
                            "UPDATE type::thing('item', $id) SET \
                             rating_count += 1, rating_sum += $score",
                        )
                        .bind(("id", id))
                        .bind(("score", change.score as i64))
                        .await?
                    }
                    // Resubmission: only the sum shifts, by (new - old).
                    Some(previous) => {
                        db.query("UPDATE type::thing('item', $id) SET rating_sum += $delta")
                            .bind(("id", id))
                            .bind(("delta", change.score as i64 - previous as i64))
                            .await?
                    }
                };
                Ok(result.take(0)?)
            })
        })
        .await?;

        if updated.is_empty() {
            return Err(DbError::NotFound {
                entity: "item".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn refresh_average(&self, id: Uuid) -> RankResult<Item> {
        let id_str = id.to_string();

        // Read the post-increment counters, then write the average. Not
        // atomic with the increment; concurrent refreshes converge. The
        // whole read-then-write retries as a unit on a write conflict so
        // the rewritten average reflects a fresh read.
        let rows: Vec<ItemRow> = with_conflict_retry(|| {
            let db = self.db.clone();
            let id = id_str.clone();
            Box::pin(async move {
                let mut result = db
                    .query("SELECT rating_count, rating_sum FROM type::thing('item', $id)")
                    .bind(("id", id.clone()))
                    .await?;

                let stats: Vec<StatsRow> = result.take(0)?;
                let stats = stats.into_iter().next().ok_or_else(|| DbError::NotFound {
                    entity: "item".into(),
                    id: id.clone(),
                })?;

                let avg = Item::average(stats.rating_sum, stats.rating_count);

                let mut result = db
                    .query("UPDATE type::thing('item', $id) SET avg_rating = $avg")
                    .bind(("id", id))
                    .bind(("avg", avg))
                    .await?;
                Ok(result.take(0)?)
            })
        })
        .await?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "item".into(),
            id: id_str,
        })?;

        Ok(row.into_item(id)?)
    }

    async fn set_stats(&self, id: Uuid, rating_count: u64, rating_sum: i64) -> RankResult<()> {
        let id_str = id.to_string();
        let avg = Item::average(rating_sum, rating_count);

        let updated: Vec<ItemRow> = with_conflict_retry(|| {
            let db = self.db.clone();
            let id = id_str.clone();
            Box::pin(async move {
                let mut result = db
                    .query(
                        "UPDATE type::thing('item', $id) SET \
                         rating_count = $count, rating_sum = $sum, avg_rating = $avg",
                    )
                    .bind(("id", id))
                    .bind(("count", rating_count))
                    .bind(("sum", rating_sum))
                    .bind(("avg", avg))
                    .await?;
                Ok(result.take(0)?)
            })
        })
        .await?;
        if updated.is_empty() {
            return Err(DbError::NotFound {
                entity: "item".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RankResult<()> {
        self.db
            .query("DELETE type::thing('item', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_by_group(&self, group_id: Uuid) -> RankResult<u64> {
        let group_str = group_id.to_string();

        let mut result = self
            .db
            .query("SELECT count() AS total FROM item WHERE group_id = $group_id GROUP ALL")
            .query("DELETE item WHERE group_id = $group_id")
            .bind(("group_id", group_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(count_rows.first().map(|r| r.total).unwrap_or(0))
    }
}

//! SurrealDB implementation of [`RatingRepository`].
//!
//! A rating's record id is derived deterministically from the
//! (user, item) pair, so the one-rating-per-pair invariant is enforced
//! by record identity: a concurrent second insert fails at the store and
//! falls back to an in-place update. The unique index on the same pair
//! backs this up at the schema level.

use chrono::{DateTime, Utc};
use rankit_core::error::RankResult;
use rankit_core::models::rating::{Rating, RatingChange, SubmitRating};
use rankit_core::repository::RatingRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, is_unique_violation, parse_uuid, with_conflict_retry};

/// Deterministic record id for the (user, item) pair.
fn rating_key(user_id: Uuid, item_id: Uuid) -> String {
    format!("{user_id}_{item_id}")
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    user_id: String,
    group_id: String,
    item_id: String,
    score: u8,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RatingRow {
    fn try_into_rating(self) -> Result<Rating, DbError> {
        Ok(Rating {
            user_id: parse_uuid(&self.user_id, "user")?,
            group_id: parse_uuid(&self.group_id, "group")?,
            item_id: parse_uuid(&self.item_id, "item")?,
            score: self.score,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ItemStatsRow {
    total: u64,
    sum: i64,
}

/// SurrealDB implementation of the Rating repository.
#[derive(Clone)]
pub struct SurrealRatingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRatingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn current_score(&self, key: &str) -> Result<Option<u8>, DbError> {
        let mut result = self
            .db
            .query("SELECT VALUE score FROM type::thing('rating', $rid)")
            .bind(("rid", key.to_owned()))
            .await?;
        let scores: Vec<u8> = result.take(0)?;
        Ok(scores.into_iter().next())
    }

    async fn update_score(&self, key: &str, score: u8) -> Result<(), DbError> {
        let key = key.to_owned();
        with_conflict_retry(|| {
            let db = self.db.clone();
            let rid = key.clone();
            Box::pin(async move {
                db.query(
                    "UPDATE type::thing('rating', $rid) SET \
                     score = $score, updated_at = time::now()",
                )
                .bind(("rid", rid))
                .bind(("score", score as i64))
                .await?
                .check()?;
                Ok(())
            })
        })
        .await
    }
}

impl<C: Connection> RatingRepository for SurrealRatingRepository<C> {
    async fn upsert(&self, input: SubmitRating) -> RankResult<RatingChange> {
        let key = rating_key(input.user_id, input.item_id);

        if let Some(previous) = self.current_score(&key).await? {
            self.update_score(&key, input.score).await?;
            return Ok(RatingChange {
                previous: Some(previous),
                score: input.score,
            });
        }

        let created = with_conflict_retry(|| {
            let db = self.db.clone();
            let rid = key.clone();
            let user = input.user_id.to_string();
            let group = input.group_id.to_string();
            let item = input.item_id.to_string();
            Box::pin(async move {
                db.query(
                    "CREATE type::thing('rating', $rid) SET \
                     user_id = $user_id, group_id = $group_id, \
                     item_id = $item_id, score = $score",
                )
                .bind(("rid", rid))
                .bind(("user_id", user))
                .bind(("group_id", group))
                .bind(("item_id", item))
                .bind(("score", input.score as i64))
                .await?
                .check()?;
                Ok(())
            })
        })
        .await;

        match created {
            Ok(()) => Ok(RatingChange {
                previous: None,
                score: input.score,
            }),
            // Lost the insert race against a concurrent first submission:
            // the record now exists, so read its score and update instead.
            Err(DbError::Surreal(e)) if is_unique_violation(&e) => {
                let previous = self.current_score(&key).await?.ok_or_else(|| {
                    DbError::Inconsistent(format!("rating {key} vanished during upsert"))
                })?;
                self.update_score(&key, input.score).await?;
                Ok(RatingChange {
                    previous: Some(previous),
                    score: input.score,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, user_id: Uuid, item_id: Uuid) -> RankResult<Option<Rating>> {
        let key = rating_key(user_id, item_id);

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('rating', $rid)")
            .bind(("rid", key))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RatingRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_rating()?)),
            None => Ok(None),
        }
    }

    async fn list_for_user_in_group(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> RankResult<Vec<Rating>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM rating \
                 WHERE user_id = $user_id AND group_id = $group_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RatingRow> = result.take(0).map_err(DbError::from)?;
        let ratings = rows
            .into_iter()
            .map(|row| row.try_into_rating())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(ratings)
    }

    async fn stats_for_item(&self, item_id: Uuid) -> RankResult<(u64, i64)> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total, math::sum(score) AS sum FROM rating \
                 WHERE item_id = $item_id GROUP ALL",
            )
            .bind(("item_id", item_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemStatsRow> = result.take(0).map_err(DbError::from)?;
        // No rows means no ratings at all.
        Ok(rows
            .first()
            .map(|r| (r.total, r.sum))
            .unwrap_or((0, 0)))
    }

    async fn delete_by_item(&self, item_id: Uuid) -> RankResult<u64> {
        let item_str = item_id.to_string();

        let mut result = self
            .db
            .query("SELECT count() AS total FROM rating WHERE item_id = $item_id GROUP ALL")
            .query("DELETE rating WHERE item_id = $item_id")
            .bind(("item_id", item_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(count_rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn delete_by_group(&self, group_id: Uuid) -> RankResult<u64> {
        let group_str = group_id.to_string();

        let mut result = self
            .db
            .query("SELECT count() AS total FROM rating WHERE group_id = $group_id GROUP ALL")
            .query("DELETE rating WHERE group_id = $group_id")
            .bind(("group_id", group_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(count_rows.first().map(|r| r.total).unwrap_or(0))
    }
}

//! SurrealDB implementation of [`GroupRepository`].
//!
//! Membership mutations are single conditional `UPDATE` statements so the
//! member-set change and the `member_count` adjustment land atomically on
//! the group record; two users joining at once cannot lose an update and
//! re-adding an existing member never double-increments.

use chrono::{DateTime, Utc};
use rankit_core::error::RankResult;
use rankit_core::models::group::{CreateGroup, Group};
use rankit_core::repository::{GroupRepository, PaginatedResult, Pagination};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, parse_uuid, parse_uuid_list, with_conflict_retry};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct GroupRow {
    name: String,
    description: String,
    created_by: String,
    members: Vec<String>,
    admins: Vec<String>,
    member_count: u64,
    created_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Result<Group, DbError> {
        Ok(Group {
            id,
            name: self.name,
            description: self.description,
            created_by: parse_uuid(&self.created_by, "owner")?,
            members: parse_uuid_list(self.members, "member")?,
            admins: parse_uuid_list(self.admins, "admin")?,
            member_count: self.member_count,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct GroupRowWithId {
    record_id: String,
    name: String,
    description: String,
    created_by: String,
    members: Vec<String>,
    admins: Vec<String>,
    member_count: u64,
    created_at: DateTime<Utc>,
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = parse_uuid(&self.record_id, "group")?;
        Ok(Group {
            id,
            name: self.name,
            description: self.description,
            created_by: parse_uuid(&self.created_by, "owner")?,
            members: parse_uuid_list(self.members, "member")?,
            admins: parse_uuid_list(self.admins, "admin")?,
            member_count: self.member_count,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Fails with `NotFound` unless the group record exists.
    async fn ensure_exists(&self, id_str: &str) -> Result<(), DbError> {
        let mut result = self
            .db
            .query("SELECT VALUE meta::id(id) FROM type::thing('group', $id)")
            .bind(("id", id_str.to_owned()))
            .await?;
        let found: Vec<String> = result.take(0)?;
        if found.is_empty() {
            return Err(DbError::NotFound {
                entity: "group".into(),
                id: id_str.to_owned(),
            });
        }
        Ok(())
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> RankResult<Group> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let owner_str = input.owner_id.to_string();

        // The owner is the sole member and admin from the first write;
        // there is never a group record that violates owner ∈ members.
        let mut result = self
            .db
            .query(
                "CREATE type::thing('group', $id) SET \
                 name = $name, description = $description, \
                 created_by = $owner, \
                 members = [$owner], admins = [$owner], \
                 member_count = 1",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("owner", owner_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RankResult<Group> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('group', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id)?)
    }

    async fn search(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> RankResult<PaginatedResult<Group>> {
        let filter = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let condition = if filter.is_some() {
            "WHERE string::lowercase(name) CONTAINS $q \
             OR string::lowercase(description) CONTAINS $q"
        } else {
            ""
        };

        // type::table keeps the table name unambiguous next to the
        // GROUP ALL clause.
        let count_query =
            format!("SELECT count() AS total FROM type::table('group') {condition} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM type::table('group') {condition} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(count_query)
            .query(list_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(q) = filter {
            builder = builder.bind(("q", q));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<GroupRowWithId> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_user_groups(&self, user_id: Uuid) -> RankResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::table('group') \
                 WHERE $user INSIDE members \
                 ORDER BY created_at DESC",
            )
            .bind(("user", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> RankResult<bool> {
        let mut result = self
            .db
            .query("SELECT VALUE $user INSIDE members FROM type::thing('group', $id)")
            .bind(("id", group_id.to_string()))
            .bind(("user", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<bool> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().unwrap_or(false))
    }

    async fn is_admin(&self, group_id: Uuid, user_id: Uuid) -> RankResult<bool> {
        let mut result = self
            .db
            .query("SELECT VALUE $user INSIDE admins FROM type::thing('group', $id)")
            .bind(("id", group_id.to_string()))
            .bind(("user", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<bool> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().unwrap_or(false))
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> RankResult<bool> {
        let id_str = group_id.to_string();
        let user_str = user_id.to_string();

        // Conditional update: the append and the counter increment only
        // happen when the user is not yet a member, in one atomic write.
        // Concurrent joins on the same group contend on this record, so
        // the store's retryable conflict is retried here.
        let updated: Vec<GroupRow> = with_conflict_retry(|| {
            let db = self.db.clone();
            let id = id_str.clone();
            let user = user_str.clone();
            Box::pin(async move {
                let mut result = db
                    .query(
                        "UPDATE type::thing('group', $id) SET \
                         members += $user, member_count += 1 \
                         WHERE $user NOTINSIDE members",
                    )
                    .bind(("id", id))
                    .bind(("user", user))
                    .await?;
                Ok(result.take(0)?)
            })
        })
        .await?;

        if !updated.is_empty() {
            return Ok(true);
        }

        // No row updated: either the group is missing or the user was
        // already a member.
        self.ensure_exists(&id_str).await?;
        Ok(false)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> RankResult<bool> {
        let id_str = group_id.to_string();
        let user_str = user_id.to_string();

        // The owner guard is enforced by the engine before this call;
        // the WHERE clause keeps the invariant even if a caller skips it.
        let updated: Vec<GroupRow> = with_conflict_retry(|| {
            let db = self.db.clone();
            let id = id_str.clone();
            let user = user_str.clone();
            Box::pin(async move {
                let mut result = db
                    .query(
                        "UPDATE type::thing('group', $id) SET \
                         members -= $user, admins -= $user, member_count -= 1 \
                         WHERE $user INSIDE members AND created_by != $user",
                    )
                    .bind(("id", id))
                    .bind(("user", user))
                    .await?;
                Ok(result.take(0)?)
            })
        })
        .await?;

        if !updated.is_empty() {
            return Ok(true);
        }

        self.ensure_exists(&id_str).await?;
        Ok(false)
    }

    async fn delete(&self, id: Uuid) -> RankResult<()> {
        let id_str = id.to_string();

        self.db
            .query("DELETE type::thing('group', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        // The cascade coordinator must only report success once the group
        // record is confirmed gone.
        let mut result = self
            .db
            .query("SELECT VALUE meta::id(id) FROM type::thing('group', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let remaining: Vec<String> = result.take(0).map_err(DbError::from)?;
        if !remaining.is_empty() {
            return Err(DbError::Inconsistent(format!(
                "group {id_str} still present after delete"
            ))
            .into());
        }

        Ok(())
    }
}

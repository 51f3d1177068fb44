//! SurrealDB implementation of [`UserRepository`].
//!
//! Duplicate usernames and emails are rejected by the unique indexes, not
//! by a check-then-insert; the repository maps the index violation to
//! `AlreadyExists`. Passwords arrive already hashed — raw credentials
//! never reach this crate.

use chrono::{DateTime, Utc};
use rankit_core::error::RankResult;
use rankit_core::models::user::{CreateUser, User};
use rankit_core::repository::UserRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{is_unique_violation, parse_uuid, parse_uuid_list, with_conflict_retry};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct UserRow {
    username: String,
    email: String,
    password_hash: String,
    groups_joined: Vec<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            groups_joined: parse_uuid_list(self.groups_joined, "group")?,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct UserRowWithId {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    groups_joined: Vec<String>,
    created_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid(&self.record_id, "user")?;
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            groups_joined: parse_uuid_list(self.groups_joined, "group")?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_field(&self, field: &'static str, value: String) -> RankResult<User> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user WHERE {field} = $value"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("value", value.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: value,
        })?;

        Ok(row.try_into_user()?)
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> RankResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let created = self
            .db
            .query(
                "CREATE type::thing('user', $id) SET \
                 username = $username, email = $email, \
                 password_hash = $password_hash, \
                 groups_joined = []",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .await
            .map_err(DbError::from)?
            .check();

        let mut result = match created {
            Ok(response) => response,
            Err(e) if is_unique_violation(&e) => {
                return Err(DbError::Conflict {
                    entity: "user".into(),
                }
                .into());
            }
            Err(e) => return Err(DbError::from(e).into()),
        };

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RankResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_username(&self, username: &str) -> RankResult<User> {
        self.get_by_field("username", username.to_owned()).await
    }

    async fn get_by_email(&self, email: &str) -> RankResult<User> {
        self.get_by_field("email", email.trim().to_lowercase()).await
    }

    async fn add_group(&self, user_id: Uuid, group_id: Uuid) -> RankResult<()> {
        let id_str = user_id.to_string();
        let group_str = group_id.to_string();

        let updated: Vec<UserRow> = with_conflict_retry(|| {
            let db = self.db.clone();
            let id = id_str.clone();
            let group = group_str.clone();
            Box::pin(async move {
                let mut result = db
                    .query(
                        "UPDATE type::thing('user', $id) SET \
                         groups_joined += $group \
                         WHERE $group NOTINSIDE groups_joined",
                    )
                    .bind(("id", id))
                    .bind(("group", group))
                    .await?;
                Ok(result.take(0)?)
            })
        })
        .await?;

        if updated.is_empty() {
            // Either the user is missing or the group was already listed;
            // only the former is an error.
            let mut check = self
                .db
                .query("SELECT VALUE meta::id(id) FROM type::thing('user', $id)")
                .bind(("id", id_str.clone()))
                .await
                .map_err(DbError::from)?;
            let found: Vec<String> = check.take(0).map_err(DbError::from)?;
            if found.is_empty() {
                return Err(DbError::NotFound {
                    entity: "user".into(),
                    id: id_str,
                }
                .into());
            }
        }

        Ok(())
    }

    async fn remove_group(&self, user_id: Uuid, group_id: Uuid) -> RankResult<()> {
        let id_str = user_id.to_string();
        let group_str = group_id.to_string();

        with_conflict_retry(|| {
            let db = self.db.clone();
            let id = id_str.clone();
            let group = group_str.clone();
            Box::pin(async move {
                db.query(
                    "UPDATE type::thing('user', $id) SET \
                     groups_joined -= $group",
                )
                .bind(("id", id))
                .bind(("group", group))
                .await?
                .check()?;
                Ok(())
            })
        })
        .await?;

        Ok(())
    }
}

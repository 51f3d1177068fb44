//! SurrealDB repository implementations.

mod group;
mod item;
mod rating;
mod user;

pub use group::SurrealGroupRepository;
pub use item::SurrealItemRepository;
pub use rating::SurrealRatingRepository;
pub use user::SurrealUserRepository;

use std::pin::Pin;

use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

/// Attempts allowed for one statement before a write conflict is fatal.
const CONFLICT_RETRY_LIMIT: u32 = 16;

type OpFuture<T> = Pin<Box<dyn Future<Output = Result<T, DbError>> + Send>>;

/// Whether the store rejected a statement with its retryable
/// optimistic-transaction conflict, as opposed to a real failure.
fn is_write_conflict(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("read or write conflict") || msg.contains("transaction can be retried")
}

/// Run a write, retrying the store's documented retryable conflict up to
/// [`CONFLICT_RETRY_LIMIT`] times. Every other error passes through
/// untouched, including unique-index violations.
async fn with_conflict_retry<T: 'static>(
    mut op: impl FnMut() -> OpFuture<T>,
) -> Result<T, DbError> {
    let mut attempt = 0;
    loop {
        match op().await {
            Err(DbError::Surreal(e)) if is_write_conflict(&e) && attempt < CONFLICT_RETRY_LIMIT => {
                attempt += 1;
                debug!(attempt, "write conflict reported by store, retrying");
            }
            other => return other,
        }
    }
}

/// Parse a stored string record id back into a UUID.
fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

fn parse_uuid_list(values: Vec<String>, what: &str) -> Result<Vec<Uuid>, DbError> {
    values.iter().map(|v| parse_uuid(v, what)).collect()
}

/// Whether a store error reports a duplicate record id or unique index
/// violation. SurrealDB has no dedicated error variant for either, so
/// this matches on the message text.
fn is_unique_violation(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("already exists") || msg.contains("already contains")
}

/// Row struct for count queries.
#[derive(Debug, serde::Deserialize)]
struct CountRow {
    total: u64,
}

//! Item domain model — the things being ranked inside a group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An item carries denormalized rating statistics. The invariant is that
/// `rating_count` and `rating_sum` reflect exactly the set of rating
/// records pointing at this item once all in-flight submissions settle;
/// the reconciliation pass repairs any window left by a crash between the
/// rating upsert and the statistics update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub description: String,
    pub added_by: Uuid,
    pub rating_count: u64,
    pub rating_sum: i64,
    /// `round(rating_sum / rating_count, 2)`, or exactly 0.0 when unrated.
    pub avg_rating: f64,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Average of `sum` over `count`, rounded to two decimal places.
    /// A count of zero yields exactly 0.0, never a division error.
    pub fn average(sum: i64, count: u64) -> f64 {
        if count == 0 {
            0.0
        } else {
            (sum as f64 / count as f64 * 100.0).round() / 100.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    pub group_id: Uuid,
    pub name: String,
    pub description: String,
    pub added_by: Uuid,
}

/// Sort keys for listing the items of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Best rated first: avg_rating desc, rating_count desc, then
    /// creation order as the stable tiebreak. Unrated items sort last.
    #[default]
    Rating,
    /// Newest first.
    New,
    /// Lexicographic by name.
    Name,
}

impl SortKey {
    /// Parse a query-string value, falling back to `Rating`.
    pub fn parse(s: &str) -> Self {
        match s {
            "new" => SortKey::New,
            "name" => SortKey::Name,
            _ => SortKey::Rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_zero_count_is_exactly_zero() {
        assert_eq!(Item::average(0, 0), 0.0);
        // Stale sum with zero count must still not divide.
        assert_eq!(Item::average(7, 0), 0.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        assert_eq!(Item::average(10, 3), 3.33);
        assert_eq!(Item::average(11, 3), 3.67);
        assert_eq!(Item::average(5, 1), 5.0);
    }

    #[test]
    fn sort_key_parse_defaults_to_rating() {
        assert_eq!(SortKey::parse("new"), SortKey::New);
        assert_eq!(SortKey::parse("name"), SortKey::Name);
        assert_eq!(SortKey::parse("rating"), SortKey::Rating);
        assert_eq!(SortKey::parse("bogus"), SortKey::Rating);
    }
}

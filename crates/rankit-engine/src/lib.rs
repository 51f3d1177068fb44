//! rankit engine — rating aggregation and membership-consistency core.
//!
//! The services here hold the invariants the rest of the system relies
//! on: membership and member_count stay in step, item statistics track
//! the rating ledger, deletion never strands dependents, and every
//! authorization check runs before any mutation. All services are
//! generic over the `rankit-core` repository traits.

pub mod cascade;
pub mod config;
pub mod items;
pub mod leaderboard;
pub mod membership;
pub mod ratings;
pub mod reconcile;

pub use cascade::CascadeService;
pub use config::EngineConfig;
pub use items::{ItemService, ItemView};
pub use leaderboard::{LeaderboardService, RankedItem};
pub use membership::MembershipService;
pub use ratings::RatingService;
pub use reconcile::Reconciler;

//! Domain models for rankit.
//!
//! These are the core types shared across all crates.

pub mod group;
pub mod item;
pub mod rating;
pub mod user;

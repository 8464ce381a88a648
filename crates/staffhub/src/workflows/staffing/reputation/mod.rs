//! Reputation Engine: average rating, red-flag count, and ban state derived from reviews.

pub mod cache;
pub mod engine;
pub(crate) mod gate;
pub mod policy;
pub mod service;

pub use cache::ReputationCache;
pub use engine::{AverageRating, ReputationEngine, SeekerReputation};
pub use policy::BanPolicy;
pub use service::{
    RatingEntry, RatingSubmission, RedFlagEntry, RedFlagSubmission, ReputationService,
    SeekerStats,
};

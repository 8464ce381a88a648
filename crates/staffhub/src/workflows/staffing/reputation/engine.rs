use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::super::domain::Review;
use super::policy::BanPolicy;

/// Mean star rating, or the explicit absence of any rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageRating {
    NoRatings,
    Stars(f64),
}

impl AverageRating {
    pub fn from_stars<I>(stars: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = stars
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), stars| {
                (sum + u64::from(stars), count + 1)
            });
        if count == 0 {
            AverageRating::NoRatings
        } else {
            AverageRating::Stars(sum as f64 / count as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            AverageRating::NoRatings => None,
            AverageRating::Stars(value) => Some(value),
        }
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AverageRating::NoRatings => f.write_str("no ratings"),
            AverageRating::Stars(value) => write!(f, "{value:.1}"),
        }
    }
}

impl Serialize for AverageRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AverageRating::NoRatings => serializer.serialize_str("no ratings"),
            AverageRating::Stars(value) => serializer.serialize_f64(*value),
        }
    }
}

/// Derived standing of one seeker on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerReputation {
    pub avg_rating: AverageRating,
    pub rating_count: u32,
    pub red_flag_count: u32,
    pub is_banned: bool,
    /// Only reported while the ban is in force.
    pub banned_until: Option<NaiveDate>,
}

/// Stateless evaluator; everything is recomputed from the review rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReputationEngine {
    policy: BanPolicy,
}

impl ReputationEngine {
    pub fn new(policy: BanPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> BanPolicy {
        self.policy
    }

    pub fn assess(&self, reviews: &[Review], today: NaiveDate) -> SeekerReputation {
        let stars: Vec<u8> = reviews.iter().filter_map(Review::stars).collect();
        let flag_dates: Vec<NaiveDate> = reviews
            .iter()
            .filter(|review| review.is_red_flag())
            .map(|review| review.reviewed_on)
            .collect();

        let banned_until = self
            .policy
            .ban_end(&flag_dates)
            .filter(|until| today < *until);

        SeekerReputation {
            avg_rating: AverageRating::from_stars(stars.iter().copied()),
            rating_count: stars.len() as u32,
            red_flag_count: flag_dates.len() as u32,
            is_banned: banned_until.is_some(),
            banned_until,
        }
    }
}

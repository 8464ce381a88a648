use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use super::super::domain::SeekerId;
use super::engine::SeekerReputation;

struct CachedReputation {
    stored_at: Instant,
    as_of: NaiveDate,
    reputation: SeekerReputation,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<SeekerId, CachedReputation>,
    /// Bumped by every invalidation; a `put` computed under an older generation is dropped.
    generations: HashMap<SeekerId, u64>,
}

/// Server-side memo of computed reputations. Entries expire after `ttl`, are dropped when a new
/// review lands for the seeker, and never serve a different evaluation date.
pub struct ReputationCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl ReputationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Token to read before loading reviews and hand back to [`ReputationCache::put`].
    pub fn generation(&self, seeker_id: &SeekerId) -> u64 {
        self.state()
            .generations
            .get(seeker_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn get(&self, seeker_id: &SeekerId, as_of: NaiveDate) -> Option<SeekerReputation> {
        let state = self.state();
        let cached = state.entries.get(seeker_id)?;
        if cached.as_of != as_of || cached.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(cached.reputation.clone())
    }

    pub fn put(
        &self,
        seeker_id: SeekerId,
        generation: u64,
        as_of: NaiveDate,
        reputation: SeekerReputation,
    ) {
        if self.ttl.is_zero() {
            return;
        }
        let mut state = self.state();
        let current = state.generations.get(&seeker_id).copied().unwrap_or_default();
        if current != generation {
            return;
        }
        state.entries.insert(
            seeker_id,
            CachedReputation {
                stored_at: Instant::now(),
                as_of,
                reputation,
            },
        );
    }

    pub fn invalidate(&self, seeker_id: &SeekerId) {
        let mut state = self.state();
        state.entries.remove(seeker_id);
        *state.generations.entry(seeker_id.clone()).or_default() += 1;
    }

    // A panic mid-insert cannot leave an entry half-written, so a poisoned map is still usable.
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::staffing::reputation::AverageRating;

    fn reputation(flags: u32) -> SeekerReputation {
        SeekerReputation {
            avg_rating: AverageRating::NoRatings,
            rating_count: 0,
            red_flag_count: flags,
            is_banned: false,
            banned_until: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    #[test]
    fn serves_fresh_entries_for_the_same_day() {
        let cache = ReputationCache::new(Duration::from_secs(300));
        let seeker = SeekerId::from("seeker-7");
        cache.put(seeker.clone(), cache.generation(&seeker), today(), reputation(1));

        assert_eq!(cache.get(&seeker, today()), Some(reputation(1)));
        assert_eq!(cache.get(&seeker, today().succ_opt().expect("next day")), None);
    }

    #[test]
    fn invalidation_and_zero_ttl_force_recompute() {
        let cache = ReputationCache::new(Duration::from_secs(300));
        let seeker = SeekerId::from("seeker-7");
        cache.put(seeker.clone(), cache.generation(&seeker), today(), reputation(1));
        cache.invalidate(&seeker);
        assert_eq!(cache.get(&seeker, today()), None);

        let disabled = ReputationCache::new(Duration::ZERO);
        disabled.put(seeker.clone(), 0, today(), reputation(2));
        assert_eq!(disabled.get(&seeker, today()), None);
    }

    #[test]
    fn stale_computation_is_not_cached_after_invalidation() {
        let cache = ReputationCache::new(Duration::from_secs(300));
        let seeker = SeekerId::from("seeker-7");

        let before_review = cache.generation(&seeker);
        cache.invalidate(&seeker);
        cache.put(seeker.clone(), before_review, today(), reputation(0));
        assert_eq!(cache.get(&seeker, today()), None);

        cache.put(seeker.clone(), cache.generation(&seeker), today(), reputation(1));
        assert_eq!(cache.get(&seeker, today()), Some(reputation(1)));
    }
}

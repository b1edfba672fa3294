//! Update-decision policy for the polling scheduler
//!
//! A pure function of the configured strategy, the store's freshness state,
//! and the current time. TTL arithmetic itself lives in the store; this
//! module only interprets the remaining freshness.

use crate::cache::WeatherStore;
use crate::config::PollingStrategy;

/// Decides whether a polling tick should refresh `city` at `now_ms`
///
/// - `Strict`: always refresh.
/// - `ExpiredOnly`: refresh iff the entry is absent or no longer valid.
/// - `PreemptiveEpsilon`: refresh if absent, or once remaining freshness
///   drops to or below `max(0, epsilon)`. With epsilon 0 this is exactly
///   `ExpiredOnly`.
pub fn should_update(
    strategy: PollingStrategy,
    store: &WeatherStore,
    city: &str,
    now_ms: i64,
    epsilon_ms: i64,
) -> bool {
    match strategy {
        PollingStrategy::Strict => true,
        PollingStrategy::ExpiredOnly => match store.remaining_ttl_at(city, now_ms) {
            None => true,
            Some(remaining) => remaining <= 0,
        },
        PollingStrategy::PreemptiveEpsilon => match store.remaining_ttl_at(city, now_ms) {
            None => true,
            Some(remaining) => remaining <= epsilon_ms.max(0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiVersion;
    use crate::provider::{Coordinates, WeatherPayload, WeatherV30};

    const TTL_MINUTES: u64 = 10;
    const TTL_MS: i64 = TTL_MINUTES as i64 * 60_000;

    fn store_with_entry(fetched_at: i64) -> WeatherStore {
        let store = WeatherStore::new(10, TTL_MINUTES).unwrap();
        let payload = WeatherPayload::V30(WeatherV30 {
            lat: Some(0.0),
            lon: Some(0.0),
            timezone: None,
            timezone_offset: None,
            current: None,
        });
        store
            .put(
                "london",
                Coordinates::new(0.0, 0.0).unwrap(),
                payload,
                ApiVersion::V30,
                fetched_at,
            )
            .expect("put should succeed");
        store
    }

    #[test]
    fn test_strict_always_updates() {
        let store = store_with_entry(1_000);
        assert!(should_update(PollingStrategy::Strict, &store, "london", 1_001, 0));
        assert!(should_update(PollingStrategy::Strict, &store, "absent", 1_001, 0));
    }

    #[test]
    fn test_expired_only_fresh_entry_skipped() {
        let store = store_with_entry(0);
        assert!(!should_update(
            PollingStrategy::ExpiredOnly,
            &store,
            "london",
            TTL_MS - 1,
            0
        ));
    }

    #[test]
    fn test_expired_only_updates_at_and_after_expiry() {
        let store = store_with_entry(0);
        assert!(should_update(
            PollingStrategy::ExpiredOnly,
            &store,
            "london",
            TTL_MS,
            0
        ));
        assert!(should_update(
            PollingStrategy::ExpiredOnly,
            &store,
            "london",
            TTL_MS + 1,
            0
        ));
    }

    #[test]
    fn test_expired_only_absent_entry_updates() {
        let store = store_with_entry(0);
        assert!(should_update(
            PollingStrategy::ExpiredOnly,
            &store,
            "nowhere",
            1,
            0
        ));
    }

    #[test]
    fn test_preemptive_updates_inside_epsilon_margin() {
        let store = store_with_entry(0);
        let epsilon = 2 * 60_000;

        // Remaining freshness above epsilon: skip
        assert!(!should_update(
            PollingStrategy::PreemptiveEpsilon,
            &store,
            "london",
            TTL_MS - epsilon - 1,
            epsilon
        ));
        // Remaining freshness exactly epsilon: refresh
        assert!(should_update(
            PollingStrategy::PreemptiveEpsilon,
            &store,
            "london",
            TTL_MS - epsilon,
            epsilon
        ));
        // Already expired: refresh
        assert!(should_update(
            PollingStrategy::PreemptiveEpsilon,
            &store,
            "london",
            TTL_MS + 1,
            epsilon
        ));
    }

    #[test]
    fn test_preemptive_absent_entry_updates() {
        let store = store_with_entry(0);
        assert!(should_update(
            PollingStrategy::PreemptiveEpsilon,
            &store,
            "nowhere",
            1,
            60_000
        ));
    }

    #[test]
    fn test_preemptive_with_zero_epsilon_matches_expired_only() {
        let store = store_with_entry(0);
        for now_ms in [0, 1, TTL_MS - 1, TTL_MS, TTL_MS + 1, 10 * TTL_MS] {
            assert_eq!(
                should_update(PollingStrategy::PreemptiveEpsilon, &store, "london", now_ms, 0),
                should_update(PollingStrategy::ExpiredOnly, &store, "london", now_ms, 0),
                "strategies diverged at now_ms={now_ms}"
            );
        }
    }

    #[test]
    fn test_preemptive_negative_epsilon_clamped_to_zero() {
        let store = store_with_entry(0);
        assert!(!should_update(
            PollingStrategy::PreemptiveEpsilon,
            &store,
            "london",
            TTL_MS - 1,
            -5_000
        ));
        assert!(should_update(
            PollingStrategy::PreemptiveEpsilon,
            &store,
            "london",
            TTL_MS,
            -5_000
        ));
    }
}

use chrono::{Duration, Utc};
use support_gateway::ratelimit::{window_allow, MemoryRateLimitStore, RateLimitStore};

#[test]
fn three_per_second_rejects_the_fourth() {
    let now = Utc::now();
    let mut entry = None;
    let mut results = Vec::new();

    for _ in 0..4 {
        let (next, allowed) = window_allow(entry.as_ref(), 3, 1000, now);
        entry = Some(next);
        results.push(allowed);
    }

    assert_eq!(results, vec![true, true, true, false]);
}

#[test]
fn call_after_window_elapses_is_allowed_again() {
    let now = Utc::now();
    let mut entry = None;

    for _ in 0..4 {
        let (next, _) = window_allow(entry.as_ref(), 3, 1000, now);
        entry = Some(next);
    }

    let (next, allowed) = window_allow(entry.as_ref(), 3, 1000, now + Duration::milliseconds(1000));
    assert!(allowed);
    assert_eq!(next.count, 1);
}

#[test]
fn window_is_anchored_at_first_use() {
    let now = Utc::now();
    let (entry, _) = window_allow(None, 3, 1000, now);

    // Still inside the first window 999ms later, even though calls paused.
    let (entry, _) = window_allow(Some(&entry), 3, 1000, now + Duration::milliseconds(999));
    assert_eq!(entry.reset_at, now + Duration::milliseconds(1000));
}

#[tokio::test]
async fn store_tracks_keys_independently() {
    let store = MemoryRateLimitStore::new();

    for _ in 0..3 {
        assert!(store.allow("initiate:s1", 3, 60_000).await.unwrap());
    }
    assert!(!store.allow("initiate:s1", 3, 60_000).await.unwrap());
    assert!(store.allow("initiate:s2", 3, 60_000).await.unwrap());
    assert!(store.allow("ip:10.0.0.1", 3, 60_000).await.unwrap());
}

#[test]
fn sweeper_reclaims_expired_entries_only() {
    let store = MemoryRateLimitStore::new();
    let now = Utc::now();

    store.apply("short", 3, 1000, now);
    store.apply("long", 3, 120_000, now);

    assert_eq!(store.sweep_expired(now + Duration::milliseconds(2000)), 1);
    assert_eq!(store.sweep_expired(now + Duration::milliseconds(2000)), 0);
}

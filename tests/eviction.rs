//! Integration tests for bounded key storage and idle sweeping.

use event_bucket_throttle::infrastructure::mocks::MockClock;
use event_bucket_throttle::EventThrottle;
use std::sync::Arc;
use std::time::Duration;

fn bounded(max_keys: usize, clock: &MockClock) -> EventThrottle {
    EventThrottle::builder()
        .with_capacity(1)
        .with_total_capacity(1_000)
        .with_fill_per_second(1.0)
        .with_max_keys(max_keys)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap()
}

#[test]
fn test_key_count_never_exceeds_limit() {
    let clock = MockClock::at_secs(0);
    let throttle = bounded(5, &clock);

    for i in 0..100 {
        throttle.take(&format!("key{}", i));
        assert!(throttle.key_count() <= 5);
    }

    assert_eq!(throttle.key_count(), 5);
    assert_eq!(throttle.metrics().keys_evicted(), 95);
}

#[test]
fn test_least_recently_used_key_is_evicted() {
    let clock = MockClock::at_secs(0);
    let throttle = bounded(3, &clock);

    throttle.take("a");
    throttle.take("b");
    throttle.take("c");
    // Touch "a" so "b" becomes the oldest
    throttle.take("a");
    throttle.take("d");

    assert!(throttle.available_tokens("a").is_some());
    assert_eq!(throttle.available_tokens("b"), None);
    assert!(throttle.available_tokens("c").is_some());
    assert!(throttle.available_tokens("d").is_some());
}

#[test]
fn test_least_recently_used_key_is_evicted_from_large_table() {
    let clock = MockClock::at_secs(0);
    let throttle = bounded(200, &clock);

    for i in 0..200 {
        throttle.take(&format!("k{}", i));
    }
    for i in (0..200).filter(|i| *i != 150) {
        throttle.take(&format!("k{}", i));
    }
    throttle.take("new");

    assert_eq!(throttle.key_count(), 200);
    assert_eq!(throttle.available_tokens("k150"), None);
    for i in (0..200).filter(|i| *i != 150) {
        // Drained buckets stay drained: a new key never resets a recent one
        assert_eq!(throttle.available_tokens(&format!("k{}", i)), Some(0), "k{}", i);
    }
}

#[test]
fn test_introspection_does_not_refresh_recency() {
    let clock = MockClock::at_secs(0);
    let throttle = bounded(2, &clock);

    throttle.take("a");
    throttle.take("b");
    assert!(throttle.available_tokens("a").is_some());
    throttle.take("c");

    assert_eq!(throttle.available_tokens("a"), None);
}

#[test]
fn test_ledger_survives_eviction() {
    let clock = MockClock::at_secs(0);
    let throttle = bounded(2, &clock);

    assert!(throttle.take("x"));
    assert!(!throttle.take("x"));
    throttle.take("y");
    throttle.take("z");
    assert_eq!(throttle.available_tokens("x"), None);

    assert_eq!(throttle.throttled_count("x"), 1);
    assert_eq!(throttle.throttled_total(), 1);

    // An evicted key comes back with a full bucket
    assert!(throttle.take("x"));
}

#[test]
fn test_sweep_idle() {
    let clock = MockClock::at_secs(1_000);
    let throttle = EventThrottle::builder()
        .with_capacity(5)
        .with_total_capacity(1_000)
        .with_fill_per_second(1.0)
        .with_unlimited_keys()
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    for i in 0..10 {
        let key = format!("old{}", i);
        throttle.take(&key);
        throttle.take(&key);
    }
    clock.advance(Duration::from_secs(300));
    for i in 0..4 {
        let key = format!("new{}", i);
        throttle.take(&key);
        throttle.take(&key);
    }

    assert_eq!(throttle.sweep_idle(Duration::from_secs(600)), 0);
    assert_eq!(throttle.sweep_idle(Duration::from_secs(300)), 10);
    assert_eq!(throttle.key_count(), 4);
    assert_eq!(throttle.metrics().keys_evicted(), 10);
}

#[test]
fn test_sweep_idle_reclaims_keys_checked_once() {
    let clock = MockClock::at_secs(0);
    let throttle = EventThrottle::builder()
        .with_capacity(1)
        .with_total_capacity(10)
        .with_fill_per_second(1.0)
        .with_unlimited_keys()
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    for i in 0..1_000 {
        throttle.take(&format!("once{}", i));
    }
    clock.advance(Duration::from_secs(30));
    throttle.take("recent");

    clock.advance(Duration::from_secs(86_400 - 30));
    assert_eq!(throttle.sweep_idle(Duration::from_secs(86_400)), 1_000);
    assert_eq!(throttle.key_count(), 1);
    assert!(throttle.available_tokens("recent").is_some());
}

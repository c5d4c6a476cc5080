//! Integration tests for the tiered cache.

use std::sync::Arc;

use tiered_cache::{CacheError, Reclaim, TieredCache};

#[test]
fn test_overflow_membership_before_and_after_reclaim() {
    let cache: TieredCache<i32, String> = TieredCache::new(2).unwrap();

    cache.put(1, "One".to_string());
    assert_eq!(cache.size(), 1);
    cache.put(2, "Two".to_string());
    assert_eq!(cache.size(), 2);

    // Key 1 overflows into the weak tier.
    cache.put(3, "Three".to_string());
    assert_eq!(cache.size(), 3);

    let hot = cache.hot_keys();
    assert_eq!(hot, vec![3, 2]);
    assert!(!hot.contains(&1));

    // Still discoverable until reclaimed.
    let keys = cache.key_set();
    assert!(keys.contains(&1));
    assert!(keys.contains(&2));
    assert!(keys.contains(&3));

    assert_eq!(cache.reclaim(), 1);
    let keys = cache.key_set();
    assert!(!keys.contains(&1));
    assert_eq!(keys.len(), 2);
    assert_eq!(cache.size(), 2);
}

#[test]
fn test_demoted_key_is_a_promote_hit() {
    let cache: TieredCache<i32, String> = TieredCache::new(2).unwrap();
    cache.put(1, "One".to_string());
    cache.put(2, "Two".to_string());
    cache.put(3, "Three".to_string());

    let value = cache.get(&1).expect("overflow entry should still be alive");
    assert_eq!(value.as_str(), "One");

    // 1 is hot again; 2 was the least recently used and moved down.
    assert_eq!(cache.hot_keys(), vec![1, 3]);
    assert_eq!(cache.size(), 3);

    let stats = cache.stats();
    assert_eq!(stats.overflow_hits, 1);
    assert_eq!(stats.demotions, 2);
}

#[test]
fn test_size_shrinks_after_reclaim() {
    let capacity = 2;
    let n = 10_000;
    let cache: TieredCache<i32, String> = TieredCache::new(capacity).unwrap();

    for i in 0..n {
        cache.put(i, format!("Value of {i}"));
    }
    let size = cache.size();
    assert_eq!(size, n as usize);

    cache.reclaim();
    let after = cache.size();
    assert!(after < size);
    assert!(after <= capacity);
}

#[test]
fn test_size_is_not_cached() {
    let cache: TieredCache<i32, String> = TieredCache::new(1).unwrap();
    cache.put(1, "One".to_string());
    let held = cache.get(&1).unwrap();
    cache.put(2, "Two".to_string());
    cache.reclaim();

    // The caller's clone keeps the overflow value alive.
    assert_eq!(cache.size(), 2);

    // Dropping it changes the answer with no cache call in between.
    drop(held);
    assert_eq!(cache.size(), 1);
    assert!(!cache.contains_key(&1));
}

#[test]
fn test_held_value_survives_reclaim_and_promotes() {
    let cache: TieredCache<&'static str, Vec<u8>> = TieredCache::new(1).unwrap();
    let shared = Arc::new(vec![1u8, 2, 3]);
    cache.put_shared("a", Arc::clone(&shared));
    cache.put("b", vec![9]);

    assert_eq!(cache.reclaim(), 0);

    let promoted = cache.get("a").unwrap();
    assert!(Arc::ptr_eq(&promoted, &shared));
    assert_eq!(cache.hot_keys(), vec!["a"]);
}

#[test]
fn test_remove_is_idempotent() {
    let cache: TieredCache<i32, String> = TieredCache::new(2).unwrap();
    assert!(!cache.remove(&42));
    assert_eq!(cache.size(), 0);

    cache.put(1, "One".to_string());
    cache.put(2, "Two".to_string());
    cache.put(3, "Three".to_string());

    // Hot entry.
    assert!(cache.remove(&3));
    assert!(!cache.remove(&3));
    // Overflow entry.
    assert!(cache.remove(&1));
    assert!(!cache.remove(&1));

    assert_eq!(cache.key_set().into_iter().collect::<Vec<_>>(), vec![2]);
    assert_eq!(cache.stats().removals, 2);
}

#[test]
fn test_miss_is_not_an_error() {
    let ints: TieredCache<i32, String> = TieredCache::new(1).unwrap();
    assert!(ints.get(&7).is_none());

    let strings: TieredCache<String, i32> = TieredCache::new(1).unwrap();
    assert!(strings.get("never inserted").is_none());

    let tuples: TieredCache<(u8, char), ()> = TieredCache::new(1).unwrap();
    assert!(tuples.get(&(0, 'x')).is_none());

    assert_eq!(ints.stats().misses, 1);
}

#[test]
fn test_invalid_capacity() {
    assert_eq!(
        TieredCache::<i32, i32>::new(0).unwrap_err(),
        CacheError::InvalidConfiguration("capacity must be at least 1, got 0".to_string())
    );
    assert!(TieredCache::<i32, i32>::new(1).is_ok());
}

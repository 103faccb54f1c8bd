use super::*;

#[test]
fn test_same_name_same_reference() {
    let cache = ReferenceCache::new();
    let a = cache.lexical("Foo");
    let b = cache.lexical("Foo");
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(&**a.name(), "Foo");
    assert!(!Arc::ptr_eq(&a, &cache.lexical("Bar")));
}

#[test]
fn test_shared_across_threads() {
    let cache = ReferenceCache::new();
    let here = cache.lexical("Shared");
    let there = std::thread::scope(|s| s.spawn(|| cache.lexical("Shared")).join());
    let there = there.unwrap_or_else(|_| panic!("worker panicked"));
    assert!(Arc::ptr_eq(&here, &there));
}

#[test]
fn test_distinct_caches_do_not_share() {
    let one = ReferenceCache::new();
    let two = ReferenceCache::new();
    assert!(!Arc::ptr_eq(&one.lexical("X"), &two.lexical("X")));
}

#[test]
fn test_purge_drops_dead_entries() {
    let cache = ReferenceCache::new();
    let kept = cache.lexical("kept");
    let _ = cache.lexical("dropped");
    cache.clear_local();
    cache.purge();
    assert_eq!(cache.shared_len(), 1);
    assert!(Arc::ptr_eq(&kept, &cache.lexical("kept")));
}

#[test]
fn test_dropped_cache_releases_its_references() {
    let handles: Vec<Weak<LexicalReference>> = (0..100)
        .map(|_| {
            let cache = ReferenceCache::new();
            Arc::downgrade(&cache.lexical("x"))
        })
        .collect();
    assert!(handles.iter().all(|weak| weak.upgrade().is_none()));
    LOCAL.with(|local| assert!(local.borrow().is_empty()));
}

#[test]
fn test_local_tier_does_not_keep_references_alive() {
    let cache = ReferenceCache::new();
    let weak = Arc::downgrade(&cache.lexical("gone"));
    assert!(weak.upgrade().is_none());

    let again = cache.lexical("gone");
    assert_eq!(&**again.name(), "gone");
    assert!(Arc::ptr_eq(&again, &cache.lexical("gone")));
}

#[test]
fn test_dead_shared_entries_are_swept_as_the_cache_grows() {
    let cache = ReferenceCache::new();
    for i in 0..(REFERENCE_CACHE_PURGE_THRESHOLD * 2) {
        let _ = cache.lexical(&format!("name{i}"));
    }
    assert!(cache.shared_len() < REFERENCE_CACHE_PURGE_THRESHOLD);

    let kept: Vec<_> = (0..10).map(|i| cache.lexical(&format!("kept{i}"))).collect();
    cache.purge();
    assert_eq!(cache.shared_len(), kept.len());
}

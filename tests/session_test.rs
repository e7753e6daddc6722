//! Session registry concurrency tests.

use dubforge::session::SessionRegistry;
use std::sync::Arc;

#[tokio::test]
async fn concurrent_duplicate_cancels_accept_exactly_one() {
    let registry = Arc::new(SessionRegistry::new());
    registry.register("abc123");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move { registry.cancel("abc123") }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
    assert!(registry.is_cancelled("abc123"));
}

#[tokio::test]
async fn registry_tracks_many_sessions_independently() {
    let registry = Arc::new(SessionRegistry::new());

    let mut handles = Vec::new();
    for i in 0..32 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("job{:04}", i);
            registry.register(&id);
            if i % 2 == 0 {
                registry.cancel(&id);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(registry.len(), 32);
    let cancelled = registry
        .list_active()
        .iter()
        .filter(|r| r.cancelled)
        .count();
    assert_eq!(cancelled, 16);
}

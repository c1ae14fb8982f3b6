//! Integration tests for the in-process backend, driven with explicit
//! timestamps through the `Backend` trait.

#![cfg(feature = "memory")]

use std::sync::Arc;
use std::time::Duration;

use freqlimit::{Backend, EvictionConfig, FreqLimitParams, Key, MemoryBackend};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9
}

#[tokio::test]
async fn test_sequential_spacing() {
    let backend = MemoryBackend::new();
    let params = FreqLimitParams::new(2, 1.0).unwrap();
    let key = Key::from("k");

    assert_eq!(backend.reserve(&key, 0.0, &params).await.unwrap(), 0.0);
    assert!(close(backend.reserve(&key, 0.0, &params).await.unwrap(), 0.5));
    assert!(close(backend.reserve(&key, 0.5, &params).await.unwrap(), 0.5));
    assert!(close(backend.reserve(&key, 1.5, &params).await.unwrap(), 0.0));
}

#[tokio::test]
async fn test_schedule_unaffected_by_other_keys() {
    let backend = MemoryBackend::new();
    let params = FreqLimitParams::new(1, 1.0).unwrap();
    let k1 = Key::from("k1");
    let k2 = Key::from("k2");

    backend.reserve(&k2, 0.0, &params).await.unwrap();

    // hammer k1; k2's schedule must not move
    for _ in 0..5 {
        backend.reserve(&k1, 0.0, &params).await.unwrap();
    }

    let delay = backend.reserve(&k2, 1.0, &params).await.unwrap();
    assert!(close(delay, 0.0), "k2 schedule shifted: {delay}");
}

#[tokio::test]
async fn test_each_reserver_observes_its_predecessor() {
    let backend = Arc::new(MemoryBackend::new());
    let params = FreqLimitParams::new(10, 1.0).unwrap();
    let key = Key::from("serial");

    // concurrent reservers at one instant serialize into distinct slots
    let mut handles = Vec::new();
    for _ in 0..10 {
        let backend = Arc::clone(&backend);
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            backend.reserve(&key, 0.0, &params).await.unwrap()
        }));
    }

    let mut delays = Vec::new();
    for handle in handles {
        delays.push(handle.await.unwrap());
    }
    delays.sort_by(f64::total_cmp);

    for (i, delay) in delays.iter().enumerate() {
        let expected = i as f64 * 0.1;
        assert!(
            (delay - expected).abs() < 1e-9,
            "delay {i} was {delay}, expected {expected}"
        );
    }
}

#[tokio::test]
async fn test_idle_eviction_end_to_end() {
    let backend =
        MemoryBackend::with_eviction(EvictionConfig::after_idle(Duration::from_millis(50)))
            .unwrap();
    let params = FreqLimitParams::new(1, 1.0).unwrap();

    backend.reserve(&Key::from("k1"), 0.0, &params).await.unwrap();
    backend.reserve(&Key::from("k2"), 0.0, &params).await.unwrap();
    assert_eq!(backend.len(), 2);

    backend.reserve(&Key::from("k1"), 0.1, &params).await.unwrap();

    assert!(backend.contains(&Key::from("k1")));
    assert!(!backend.contains(&Key::from("k2")));
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn test_evicted_key_restarts_cold() {
    let backend =
        MemoryBackend::with_eviction(EvictionConfig::after_idle(Duration::from_millis(50)))
            .unwrap();
    let params = FreqLimitParams::new(1, 1.0).unwrap();
    let key = Key::from("cold");

    backend.reserve(&key, 0.0, &params).await.unwrap();

    // after eviction the key owes nothing from its old schedule
    let delay = backend.reserve(&key, 10.0, &params).await.unwrap();
    assert_eq!(delay, 0.0);
}

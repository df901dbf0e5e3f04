//! Integration tests for the soft-capped resource pool.
//!
//! These exercise reuse, overflow discarding, draining on close and the
//! interplay between concurrent releases and close.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use cistern_pool::{BoxError, Pool, PoolError, Resource, ResourcePool};

/// Connection stand-in that counts how often it was closed.
#[derive(Debug)]
struct TestConnection {
    id: usize,
    close_calls: AtomicUsize,
    closed_total: Arc<AtomicUsize>,
}

impl Resource for TestConnection {
    fn close(&mut self) -> Result<(), BoxError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed_total.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory state shared between a test and its pool.
#[derive(Default)]
struct Tracker {
    created: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl Tracker {
    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

fn tracked_pool(target_size: usize) -> (Arc<ResourcePool<TestConnection>>, Arc<Tracker>) {
    let tracker = Arc::new(Tracker::default());
    let factory_tracker = Arc::clone(&tracker);
    let pool = ResourcePool::new(target_size, move || {
        let id = factory_tracker.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok::<_, BoxError>(TestConnection {
            id,
            close_calls: AtomicUsize::new(0),
            closed_total: Arc::clone(&factory_tracker.closed),
        })
    })
    .expect("valid pool size");
    (Arc::new(pool), tracker)
}

#[test]
fn test_any_positive_size_constructs() {
    for size in [1, 2, 7, 64, 1024] {
        let (pool, _) = tracked_pool(size);
        assert_eq!(pool.target_size(), size);
    }
}

#[test]
fn test_zero_size_is_invalid() {
    let err = ResourcePool::new(0, || Err::<TestConnection, _>("unused")).unwrap_err();
    assert!(matches!(err, PoolError::InvalidSize(0)));
}

#[test]
fn test_sequential_reuse_calls_factory_once() {
    let (pool, tracker) = tracked_pool(3);

    let conn = pool.acquire().unwrap();
    pool.release(conn);
    let conn = pool.acquire().unwrap();

    assert_eq!(conn.id, 1);
    assert_eq!(tracker.created(), 1);
}

#[test]
fn test_target_size_two_scenario() {
    let (pool, tracker) = tracked_pool(2);

    let conns: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
    assert_eq!(tracker.created(), 3);

    for conn in conns {
        pool.release(conn);
    }
    assert_eq!(pool.idle_count(), 2);
    assert_eq!(tracker.closed(), 1);

    pool.close();
    assert_eq!(pool.idle_count(), 0);
    assert_eq!(tracker.closed(), 3);

    let stats = pool.stats();
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.drained, 2);
    assert_eq!(stats.outstanding(), 0);
}

#[test]
fn test_concurrent_release_keeps_target_size_idle() {
    const TARGET: usize = 4;
    const RELEASERS: usize = 32;

    let (pool, tracker) = tracked_pool(TARGET);
    let conns: Vec<_> = (0..RELEASERS).map(|_| pool.acquire().unwrap()).collect();
    let barrier = Arc::new(Barrier::new(RELEASERS));

    let handles: Vec<_> = conns
        .into_iter()
        .map(|conn| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.release(conn);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(pool.idle_count(), TARGET);
    assert_eq!(tracker.closed(), RELEASERS - TARGET);
}

#[test]
fn test_close_drains_each_idle_resource_once() {
    let (pool, _) = tracked_pool(3);

    let conns: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
    for conn in conns {
        pool.release(conn);
    }

    pool.close();
    pool.close();

    assert_eq!(pool.stats().drained, 3);
    assert_eq!(pool.stats().close_failures, 0);
    assert!(matches!(pool.acquire(), Err(PoolError::Closed)));
}

#[test]
fn test_release_after_close_closes_resource() {
    let (pool, tracker) = tracked_pool(2);
    let conn = pool.acquire().unwrap();
    pool.close();

    pool.release(conn);

    assert_eq!(pool.idle_count(), 0);
    assert_eq!(tracker.closed(), 1);
    assert_eq!(pool.stats().discarded, 1);
}

#[test]
fn test_factory_error_is_surfaced_without_retry() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let pool = ResourcePool::new(2, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err::<TestConnection, _>("database unreachable")
    })
    .unwrap();

    let err = pool.acquire().unwrap_err();
    assert!(err.is_factory());
    assert!(err.to_string().contains("resource creation"));
    assert!(err.to_string().contains("database unreachable"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(pool.stats().factory_failures, 1);
}

struct FailingClose {
    attempts: Arc<AtomicUsize>,
}

impl Resource for FailingClose {
    fn close(&mut self) -> Result<(), BoxError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err("broken pipe".into())
    }
}

#[test]
fn test_close_failure_does_not_stop_drain() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let shared = Arc::clone(&attempts);
    let pool = ResourcePool::new(3, move || {
        Ok::<_, BoxError>(FailingClose {
            attempts: Arc::clone(&shared),
        })
    })
    .unwrap();

    let conns: Vec<_> = (0..3).map(|_| pool.acquire().unwrap_or_else(|e| panic!("{e}"))).collect();
    for conn in conns {
        pool.release(conn);
    }
    pool.close();

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(pool.stats().close_failures, 3);
}

#[test]
fn test_release_racing_close_never_leaks() {
    for _ in 0..50 {
        let (pool, tracker) = tracked_pool(4);
        let conns: Vec<_> = (0..8).map(|_| pool.acquire().unwrap()).collect();
        let barrier = Arc::new(Barrier::new(conns.len() + 1));

        let mut handles: Vec<_> = conns
            .into_iter()
            .map(|conn| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    pool.release(conn);
                })
            })
            .collect();

        let closer = {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.close();
            })
        };
        handles.push(closer);
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.idle_count(), 0);
        assert_eq!(tracker.closed(), 8);
        assert_eq!(pool.stats().closed(), 8);
    }
}

#[test]
fn test_each_resource_closed_exactly_once() {
    let (pool, _) = tracked_pool(2);
    let conns: Vec<_> = (0..5).map(|_| pool.acquire().unwrap()).collect();
    let mut probes = Vec::new();

    for conn in conns {
        pool.release(conn);
    }
    // Pull the idle survivors back out to inspect them.
    while pool.idle_count() > 0 {
        probes.push(pool.acquire().unwrap());
    }
    for probe in &probes {
        assert_eq!(probe.close_calls.load(Ordering::SeqCst), 0);
    }
    pool.close();
    for probe in probes {
        pool.release(probe);
    }

    let stats = pool.stats();
    assert_eq!(stats.closed(), 5);
    assert_eq!(stats.outstanding(), 0);
}

#[test]
fn test_checkout_under_contention() {
    let (pool, tracker) = tracked_pool(2);
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..100 {
                    let conn = pool.checkout().unwrap();
                    assert!(conn.id > 0);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    assert!(pool.idle_count() <= 2);
    assert_eq!(stats.reused + stats.created, 16 * 100);
    assert_eq!(stats.outstanding(), 0);

    pool.close();
    assert_eq!(tracker.closed(), tracker.created());
}

#[test]
fn test_concurrent_closers_drain_once() {
    for _ in 0..50 {
        let (pool, tracker) = tracked_pool(4);
        let conns: Vec<_> = (0..6).map(|_| pool.acquire().unwrap()).collect();
        let barrier = Arc::new(Barrier::new(conns.len() + 2));

        let mut handles: Vec<_> = conns
            .into_iter()
            .map(|conn| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    pool.release(conn);
                })
            })
            .collect();

        for _ in 0..2 {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                pool.close();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(stats.drained + stats.discarded, tracker.created());
        assert_eq!(tracker.closed(), tracker.created());
    }
}

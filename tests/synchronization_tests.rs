use lrumem::{Limits, SafeCache};
use once_cell::sync::Lazy;
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
#[serial]
fn test_guard_holds_lock_across_threads() {
    static CACHE: Lazy<SafeCache<i32, char>> = Lazy::new(SafeCache::new);
    CACHE.set(1, 'a');
    CACHE.set(2, 'b');
    CACHE.set(3, 'c');

    let reader = thread::spawn(|| {
        {
            // Holding this guard keeps the writer blocked while we sleep.
            let ret = CACHE.get(&1);
            assert_eq!(*ret, Some('a'));
            assert_eq!(CACHE.get(&2), Some('b'));
            assert_eq!(CACHE.get(&3), Some('c'));
            thread::sleep(Duration::from_millis(400));
            assert_eq!(CACHE.get(&1), Some('a'));
            assert_eq!(CACHE.get(&2), Some('b'));
            assert_eq!(CACHE.get(&3), Some('c'));
        }
        // Guard dropped: the writer gets the lock.
        thread::sleep(Duration::from_millis(400));
        assert_eq!(CACHE.get(&1), Some('x'));
        assert_eq!(CACHE.get(&2), Some('y'));
        assert_eq!(CACHE.get(&3), Some('z'));
    });
    let writer = thread::spawn(|| {
        thread::sleep(Duration::from_millis(200));
        CACHE.set(1, 'x');
        CACHE.set(2, 'y');
        CACHE.set(3, 'z');
    });
    reader.join().unwrap();
    writer.join().unwrap();
}

#[test]
#[serial]
fn test_lock_composes_calls_atomically() {
    let cache: Arc<SafeCache<u32, u32>> = Arc::new(SafeCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..100 {
                    let _section = cache.lock();
                    let current = cache.get(&0).unwrap_or(0);
                    cache.set(0, current + 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.get(&0), Some(800));
}

/// Extracts the item number from a line of the cache output.
fn item_num(line: &str) -> &str {
    line.split(':').next().unwrap_or_default()
}

#[test]
#[serial]
fn test_display_is_not_interleaved() {
    static CACHE: Lazy<SafeCache<i32, i32>> = Lazy::new(SafeCache::new);
    static OUT: Lazy<Mutex<String>> = Lazy::new(|| Mutex::new(String::new()));
    for n in 0..256 {
        CACHE.set(n, n);
    }

    let print = || {
        let text = CACHE.to_string();
        OUT.lock().unwrap().push_str(&text);
    };
    let t1 = thread::spawn(print);
    let t2 = thread::spawn(print);
    t1.join().unwrap();
    t2.join().unwrap();

    let out = OUT.lock().unwrap();
    let lines: Vec<&str> = out
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .collect();
    assert_eq!(lines.len(), 512);
    for n in 0..256 {
        assert_eq!(item_num(lines[n]), n.to_string());
        assert_eq!(item_num(lines[n + 256]), n.to_string());
    }
}

#[test]
#[serial]
fn test_concurrent_writers_respect_maxsize() {
    let cache: Arc<SafeCache<u64, u64>> = Arc::new(SafeCache::with_limits(64, lrumem::UNBOUNDED));
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let mut rng = fastrand::Rng::with_seed(t);
                for _ in 0..1000 {
                    let key = rng.u64(0..256);
                    if rng.bool() {
                        cache.set(key, key * 2);
                    } else if let Some(value) = cache.get(&key).into_inner() {
                        assert_eq!(value, key * 2);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let stats = cache.stats();
    assert!(stats.currsize <= 64);
    assert_eq!(stats.currsize, cache.iter().len());
}

#[test]
#[serial]
fn test_limits_from_env() {
    std::env::set_var("LRUMEM_TEST_MAXSIZE", "2");
    std::env::set_var("LRUMEM_TEST_MAXMEM", "1KB");
    let limits = Limits::from_env("LRUMEM_TEST").unwrap();
    std::env::remove_var("LRUMEM_TEST_MAXSIZE");
    std::env::remove_var("LRUMEM_TEST_MAXMEM");

    assert_eq!(limits.maxsize, Some(2));
    assert_eq!(limits.maxmem, Some(1024));

    let cache: SafeCache<u8, u8> = lrumem::CacheBuilder::new().limits(limits).build_safe();
    for n in 0..5 {
        cache.set(n, n);
    }
    assert_eq!(cache.size(), 2);
    assert_eq!(cache.maxmem(), 1024);

    std::env::set_var("LRUMEM_TEST_MAXSIZE", "many");
    assert!(Limits::from_env("LRUMEM_TEST").is_err());
    std::env::remove_var("LRUMEM_TEST_MAXSIZE");
}

//! Example: putting a cache in front of a slow user store.
//!
//! Cache limits come from `USERS_MAXSIZE` / `USERS_MAXMEM`, e.g.
//! `USERS_MAXSIZE=100 USERS_MAXMEM=64KB cargo run --example user_cache`.
//! Set `RUST_LOG=lrumem_core=trace` to watch evictions.

use lrumem_core::{ByteCodec, CacheBuilder, CodecError, ItemText, Limits, SafeCache};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: u64,
    name: String,
}

impl ByteCodec for User {
    fn encode(&self, out: &mut Vec<u8>) {
        self.id.encode(out);
        self.name.encode(out);
    }

    fn decode(chunk: &[u8]) -> Result<Self, CodecError> {
        if chunk.len() < 8 {
            return Err(CodecError::InvalidLength {
                type_name: "User",
                expected: 8,
                actual: chunk.len(),
            });
        }
        let (id, name) = chunk.split_at(8);
        Ok(User {
            id: u64::decode(id)?,
            name: String::decode(name)?,
        })
    }
}

impl ItemText for User {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{id={}, name={}}}", self.id, self.name)
    }
}

// Fake database.
static DB: Lazy<Mutex<HashMap<u64, User>>> = Lazy::new(|| Mutex::new(HashMap::new()));

static CACHE: Lazy<SafeCache<u64, User>> = Lazy::new(|| {
    let limits = Limits::from_env("USERS").unwrap_or_default();
    CacheBuilder::new()
        .limits(limits)
        .value_cost(|user: &User| user.name.capacity())
        .build_safe()
});

fn save_user_db(user: &User) {
    println!("DB: save User id={}", user.id);
    DB.lock().insert(user.id, user.clone());
}

fn load_user_db(id: u64) -> Option<User> {
    println!("DB: load User id={}", id);
    DB.lock().get(&id).cloned()
}

fn find_user(id: u64) -> Option<User> {
    // The guard keeps the cache locked while we decide what to do.
    let cached = CACHE.get(&id);
    if let Some(user) = cached.as_ref() {
        println!("  No DB request, User {} loaded from the cache!", user.id);
        return Some(user.clone());
    }
    let user = load_user_db(id)?;
    CACHE.set(id, user.clone());
    Some(user)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lrumem_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== User Cache Example ===\n");

    println!("1. POST /user/new:");
    for (id, name) in [(123, "John Smith"), (124, "Jane Doe"), (125, "Max Mustermann")] {
        let user = User {
            id,
            name: name.to_string(),
        };
        save_user_db(&user);
        CACHE.set(user.id, user);
    }

    println!("\n2. GET /user/123 (cached):");
    let _ = find_user(123);

    println!("\n3. GET /user/126 (unknown):");
    if find_user(126).is_none() {
        println!("  404 Not Found");
    }

    println!("\nCache contents:\n{}", *CACHE);

    // Dump to a file, shrink the cache and reload it.
    let path = std::env::temp_dir().join("lrumem_user_cache.bin");
    CACHE.dump_into(BufWriter::new(File::create(&path)?))?;
    info!(path = %path.display(), "dumped cache");

    CACHE.flush();
    CACHE.set_maxsize(1);
    CACHE.load_from(BufReader::new(File::open(&path)?))?;
    println!("After reload with maxsize 1:\n{}", *CACHE);

    // Binding the guard keeps the lock held while the value is used.
    let user = CACHE.get(&123);
    match user.as_ref() {
        Some(user) => println!("\nValue at key 123: {{{} {}}}", user.id, user.name),
        None => println!("\nKey 123 was evicted by the smaller limit"),
    }
    drop(user);

    std::fs::remove_file(&path)?;
    println!("\n=== User Cache Example Complete ===");
    Ok(())
}

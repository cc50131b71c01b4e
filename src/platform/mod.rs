//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Seeds
//! - Storage (LocalStorage on web, a JSON file natively)

use crate::persistence::KeyValueStore;

/// Wall-clock milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Wall-clock milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Seed for a session without a configured one
#[cfg(target_arch = "wasm32")]
pub fn fresh_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn fresh_seed() -> u64 {
    rand::random()
}

/// The store progression and settings live in
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn KeyValueStore> {
    Box::new(crate::persistence::LocalStore)
}

/// The store progression and settings live in; `path` overrides the file
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store(path: Option<&str>) -> Box<dyn KeyValueStore> {
    let path = path.unwrap_or("swarm-survivor-save.json");
    Box::new(crate::persistence::FileStore::open(path))
}

//! Session info caching.
//!
//! Session info changes rarely but is large, so sections are decoded lazily
//! and cached per key. The cache follows the writer's update counter
//! ("generation"):
//!
//! 1. When the generation moves, every entry's current value is demoted to
//!    last-known-good. Nothing is discarded.
//! 2. A request for a key whose section is missing returns last-known-good.
//! 3. If the section's raw bytes equal the bytes behind last-known-good, that
//!    value is promoted back without decoding. The counter can advance with
//!    no change to a given section.
//! 4. Otherwise the section is sanitized and parsed. Success replaces both
//!    current and last-known-good; failure returns last-known-good.
//!
//! With background decoding enabled, step 4 runs on tokio's blocking pool.
//! At most one decode is in flight per key, and a finished decode commits
//! only if the generation is still the one it was dispatched for. Each entry
//! has its own lock, so different keys decode concurrently.

use crate::yaml_utils::{find_section, sanitize_section};
use crate::{Result, TelemetryError};
use serde_yaml_ng::Value as YamlValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

const NO_GENERATION: i64 = i64::MIN;

#[derive(Debug, Default)]
struct SectionEntry {
    raw: Option<Vec<u8>>,
    current: Option<Arc<YamlValue>>,
    last_good: Option<Arc<YamlValue>>,
    update: Option<i32>,
    in_flight: Option<i32>,
}

#[derive(Debug)]
struct CacheShared {
    generation: AtomicI64,
    closed: AtomicBool,
    decodes: AtomicU64,
    background: bool,
    entries: Mutex<HashMap<String, Arc<Mutex<SectionEntry>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Per-key cache of decoded session info sections.
#[derive(Debug, Clone)]
pub struct SessionInfoCache {
    shared: Arc<CacheShared>,
}

impl Default for SessionInfoCache {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SessionInfoCache {
    /// Create a cache; `background` moves decoding onto tokio's blocking pool.
    pub fn new(background: bool) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                generation: AtomicI64::new(NO_GENERATION),
                closed: AtomicBool::new(false),
                decodes: AtomicU64::new(0),
                background,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Decoded value of section `key` in `region` at `generation`.
    ///
    /// Returns `None` only when no value has ever been decoded for `key`.
    pub fn get(&self, key: &str, generation: i32, region: &[u8]) -> Option<Arc<YamlValue>> {
        let entry = {
            let mut entries = lock(&self.shared.entries);
            self.observe_generation(&entries, generation);
            entries.entry(key.to_string()).or_default().clone()
        };
        let mut guard = lock(&entry);

        if let Some(current) = &guard.current {
            trace!(key, "Session info cache hit");
            return Some(current.clone());
        }

        let Some(section) = find_section(region, key) else {
            trace!(key, "Session info section not found");
            return guard.last_good.clone();
        };

        if guard.last_good.is_some() && guard.raw.as_deref() == Some(section) {
            trace!(key, generation, "Session info section unchanged, reusing last value");
            guard.current = guard.last_good.clone();
            return guard.current.clone();
        }

        if self.shared.background {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                if guard.in_flight.is_none() {
                    guard.in_flight = Some(generation);
                    let shared = self.shared.clone();
                    let entry = entry.clone();
                    let key = key.to_string();
                    let bytes = section.to_vec();
                    debug!(key = %key, generation, "Dispatching background session info decode");
                    handle.spawn_blocking(move || {
                        let decoded = decode_counted(&shared, &key, &bytes);
                        commit(&shared, &entry, &key, generation, bytes, decoded);
                    });
                }
                return guard.last_good.clone();
            }
        }

        guard.raw = Some(section.to_vec());
        match decode_counted(&self.shared, key, section) {
            Ok(value) => {
                let value = Arc::new(value);
                guard.current = Some(value.clone());
                guard.last_good = Some(value.clone());
                guard.update = Some(generation);
                debug!(key, generation, "Decoded session info section");
                Some(value)
            }
            Err(err) => {
                warn!(key, generation, error = %err, "Session info decode failed, using last good value");
                guard.last_good.clone()
            }
        }
    }

    fn observe_generation(
        &self,
        entries: &HashMap<String, Arc<Mutex<SectionEntry>>>,
        generation: i32,
    ) {
        let previous = self.shared.generation.swap(i64::from(generation), Ordering::SeqCst);
        if previous == i64::from(generation) {
            return;
        }

        debug!(previous, generation, "Session info generation changed");
        for entry in entries.values() {
            let mut entry = lock(entry);
            if let Some(current) = entry.current.take() {
                entry.last_good = Some(current);
            }
        }
    }

    /// Generation at which `key` was last successfully decoded.
    pub fn update_for(&self, key: &str) -> Option<i32> {
        let entries = lock(&self.shared.entries);
        entries.get(key).and_then(|entry| lock(entry).update)
    }

    /// Number of section decodes attempted so far.
    pub fn decode_count(&self) -> u64 {
        self.shared.decodes.load(Ordering::SeqCst)
    }

    /// Drop all cached state; in-flight decodes are discarded on completion.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        lock(&self.shared.entries).clear();
        self.shared.generation.store(NO_GENERATION, Ordering::SeqCst);
    }
}

fn decode_counted(shared: &CacheShared, key: &str, raw: &[u8]) -> Result<YamlValue> {
    shared.decodes.fetch_add(1, Ordering::SeqCst);
    decode_section(key, raw)
}

/// Sanitize and parse one section, returning the value under `key`.
pub fn decode_section(key: &str, raw: &[u8]) -> Result<YamlValue> {
    let text = sanitize_section(key, raw);
    let document: YamlValue = serde_yaml_ng::from_str(&text).map_err(|e| TelemetryError::Parse {
        context: format!("session info section {key}"),
        details: e.to_string(),
    })?;

    match document.get(key) {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Err(TelemetryError::Parse {
            context: format!("session info section {key}"),
            details: "section is empty".to_string(),
        }),
    }
}

/// Apply a background decode result if its generation is still current.
fn commit(
    shared: &CacheShared,
    entry: &Mutex<SectionEntry>,
    key: &str,
    generation: i32,
    raw: Vec<u8>,
    decoded: Result<YamlValue>,
) {
    let mut guard = lock(entry);
    if guard.in_flight == Some(generation) {
        guard.in_flight = None;
    }

    let current_generation = shared.generation.load(Ordering::SeqCst);
    if shared.closed.load(Ordering::SeqCst) || current_generation != i64::from(generation) {
        debug!(key, generation, current_generation, "Discarding stale session info decode");
        return;
    }

    guard.raw = Some(raw);
    match decoded {
        Ok(value) => {
            let value = Arc::new(value);
            guard.current = Some(value.clone());
            guard.last_good = Some(value);
            guard.update = Some(generation);
            debug!(key, generation, "Committed background session info decode");
        }
        Err(err) => {
            warn!(key, generation, error = %err, "Background session info decode failed");
        }
    }
}

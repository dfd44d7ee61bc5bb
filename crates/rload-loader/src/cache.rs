//! Single-flight load cache
//!
//! Maps a resolved URL to the shared future of its load. Every request for
//! a URL that is already present awaits the same future, so a component is
//! fetched and built once however many times it is requested.
//!
//! Each entry also records the URLs its load is waiting on. A request that
//! would wait on a pending load which itself (transitively) waits on the
//! requester is refused with the cycle instead of deadlocking.

use crate::component::Component;
use crate::error::LoadError;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

pub type LoadResult = Result<Arc<Component>, LoadError>;

/// An in-flight or completed load that any number of callers can await.
pub type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

struct CacheEntry {
    /// Distinguishes this entry from later entries for the same URL
    generation: u64,
    load: SharedLoad,
    /// URLs this load has requested as imports
    waiting_on: FxHashSet<String>,
}

impl CacheEntry {
    fn is_pending(&self) -> bool {
        self.load.peek().is_none()
    }
}

#[derive(Default)]
pub struct LoadCache {
    entries: RwLock<FxHashMap<String, CacheEntry>>,
    next_generation: AtomicU64,
}

impl LoadCache {
    pub fn new() -> Self {
        LoadCache::default()
    }

    /// Return the load for `url`, starting one with `start` if there is
    /// none. `start` receives the generation of the new entry.
    ///
    /// `chain` lists the URLs being built on the way to this request,
    /// outermost first; its last element is the requester. The request is
    /// recorded as an edge from the requester to `url`. If `url` is pending
    /// and waits, directly or through other pending loads, on a URL of
    /// `chain`, nothing is recorded and the cycle is returned instead.
    ///
    /// Lookup, cycle check and insertion happen under one write lock, so
    /// concurrent callers for the same URL always share a single load.
    pub fn get_or_start<F>(
        &self,
        url: &str,
        chain: &[String],
        start: F,
    ) -> Result<SharedLoad, Vec<String>>
    where
        F: FnOnce(u64) -> BoxFuture<'static, LoadResult>,
    {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(e) => e.into_inner(),
        };

        let existing = match entries.get(url) {
            Some(entry) => {
                if entry.is_pending() {
                    if let Some(cycle) = find_cycle(&entries, url, chain) {
                        trace!(url, "refusing to wait on a cyclic load");
                        return Err(cycle);
                    }
                }
                trace!(url, "load cache hit");
                Some(entry.load.clone())
            }
            None => None,
        };

        if let Some(requester) = chain.last() {
            if let Some(entry) = entries.get_mut(requester) {
                entry.waiting_on.insert(url.to_string());
            }
        }

        if let Some(load) = existing {
            return Ok(load);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let load = start(generation).shared();
        entries.insert(
            url.to_string(),
            CacheEntry {
                generation,
                load: load.clone(),
                waiting_on: FxHashSet::default(),
            },
        );
        trace!(url, generation, "load cache miss");
        Ok(load)
    }

    /// Remove the entry for `url` if it is still the one of `generation`.
    pub fn evict(&self, url: &str, generation: u64) -> bool {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(e) => e.into_inner(),
        };
        let current = entries.get(url).is_some_and(|entry| entry.generation == generation);
        if current {
            entries.remove(url);
            trace!(url, generation, "evicted failed load");
        }
        current
    }

    pub fn contains(&self, url: &str) -> bool {
        match self.entries.read() {
            Ok(entries) => entries.contains_key(url),
            Err(e) => e.into_inner().contains_key(url),
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(e) => e.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(e) => e.into_inner().clear(),
        }
    }
}

/// A path of pending loads from `url` to a URL of `chain`, closed into a
/// cycle that starts and ends at that chain URL.
fn find_cycle(
    entries: &FxHashMap<String, CacheEntry>,
    url: &str,
    chain: &[String],
) -> Option<Vec<String>> {
    let mut visited = FxHashSet::default();
    let mut paths = vec![vec![url.to_string()]];

    while let Some(path) = paths.pop() {
        let Some(last) = path.last() else {
            continue;
        };
        if let Some(index) = chain.iter().position(|u| u == last) {
            let mut cycle = chain[index..].to_vec();
            cycle.extend(path);
            return Some(cycle);
        }
        if !visited.insert(last.clone()) {
            continue;
        }
        let Some(entry) = entries.get(last) else {
            continue;
        };
        if !entry.is_pending() {
            continue;
        }
        for next in &entry.waiting_on {
            let mut extended = path.clone();
            extended.push(next.clone());
            paths.push(extended);
        }
    }
    None
}

//! Memo of final pipeline decisions.

use crate::platform::{Environment, Platform};
use crate::resolution::Resolution;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

/// Everything a pipeline decision depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionCacheKey {
    pub origin: PathBuf,
    pub specifier: String,
    pub platform: Option<Platform>,
    pub environment: Option<Environment>,
    pub dev: bool,
    /// [`ResolutionContext::settings_fingerprint`] of the request.
    ///
    /// [`ResolutionContext::settings_fingerprint`]: crate::context::ResolutionContext::settings_fingerprint
    pub settings: u64,
    /// Path-mapping generation the decision was made under.
    pub generation: u64,
}

/// Cache of final resolutions.
pub trait ResolutionCache: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &ResolutionCacheKey) -> Option<Resolution>;

    fn set(&self, key: ResolutionCacheKey, value: Resolution);
}

/// No-op cache implementation (always misses).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResolutionCache for NoCache {
    fn get(&self, _key: &ResolutionCacheKey) -> Option<Resolution> {
        None
    }

    fn set(&self, _key: ResolutionCacheKey, _value: Resolution) {}
}

#[derive(Debug, Default)]
struct MemoryState {
    generation: u64,
    entries: FxHashMap<ResolutionCacheKey, Resolution>,
}

/// In-memory cache. Entries from an older generation are dropped wholesale
/// the first time a newer generation is written.
#[derive(Debug, Default)]
pub struct MemoryResolutionCache {
    state: RwLock<MemoryState>,
}

impl MemoryResolutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResolutionCache for MemoryResolutionCache {
    fn get(&self, key: &ResolutionCacheKey) -> Option<Resolution> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(key)
            .cloned()
    }

    fn set(&self, key: ResolutionCacheKey, value: Resolution) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if key.generation > state.generation {
            state.entries.clear();
            state.generation = key.generation;
        } else if key.generation < state.generation {
            return;
        }
        state.entries.insert(key, value);
    }
}

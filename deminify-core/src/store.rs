//! Per-URL caches for function maps and source maps
//!
//! Global invariants enforced:
//! - A cached map is never mutated; readers share it through `Arc`
//! - A given key is built at most once, even under concurrent first access
//! - Failures are cached as absent values, not retried

use crate::function_map::{build_function_map, FunctionMap};
use crate::parser::SyntaxTreeProvider;
use crate::provider::{SourceCodeProvider, SourceMapProvider};
use crate::source_map::{source_map_from_text, SourceMap};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimal key-value capability a store needs from its backing cache
pub trait KeyValueCache<V>: Send + Sync {
    fn lookup(&self, key: &str) -> Option<V>;
    fn insert(&self, key: &str, value: V);
}

/// Thread-safe `HashMap`-backed cache
#[derive(Debug)]
pub struct InMemoryCache<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> InMemoryCache<V> {
    pub fn new() -> Self {
        InMemoryCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<V> Default for InMemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> KeyValueCache<V> for InMemoryCache<V> {
    fn lookup(&self, key: &str) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    fn insert(&self, key: &str, value: V) {
        self.entries.write().insert(key.to_string(), value);
    }
}

/// Memoizes a build step per key on top of any [`KeyValueCache`]
///
/// Concurrent callers asking for the same missing key wait on a per-key lock
/// while the first one builds; callers for other keys are not blocked.
pub struct SingleFlight<V, C = InMemoryCache<V>> {
    cache: C,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    _value: std::marker::PhantomData<fn() -> V>,
}

impl<V: Clone + Send + Sync> SingleFlight<V> {
    pub fn new() -> Self {
        Self::with_cache(InMemoryCache::new())
    }
}

impl<V: Clone + Send + Sync> Default for SingleFlight<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, C: KeyValueCache<V>> SingleFlight<V, C> {
    pub fn with_cache(cache: C) -> Self {
        SingleFlight {
            cache,
            in_flight: Mutex::new(HashMap::new()),
            _value: std::marker::PhantomData,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Return the cached value for `key`, running `build` only if nobody has yet
    pub fn get_or_build<F>(&self, key: &str, build: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.cache.lookup(key) {
            return value;
        }

        let key_lock = self
            .in_flight
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone();
        let _guard = key_lock.lock();

        // Someone else may have finished while we waited
        if let Some(value) = self.cache.lookup(key) {
            return value;
        }

        let value = build();
        self.cache.insert(key, value.clone());
        self.in_flight.lock().remove(key);
        value
    }
}

/// Function maps by minified-source URL
pub trait FunctionMapStore: Send + Sync {
    fn get_function_map_for_url(&self, url: &str) -> Option<Arc<FunctionMap>>;
}

/// Source maps by minified-source URL
///
/// A returned map may be in the failed-to-parse state; `None` means no source
/// map could be obtained at all.
pub trait SourceMapStore: Send + Sync {
    fn get_source_map_for_url(&self, url: &str) -> Option<Arc<SourceMap>>;
}

/// Builds function maps from fetched source code and caches them per URL
pub struct CachingFunctionMapStore {
    source_code_provider: Arc<dyn SourceCodeProvider>,
    syntax_tree_provider: Arc<dyn SyntaxTreeProvider>,
    cache: SingleFlight<Option<Arc<FunctionMap>>>,
}

impl CachingFunctionMapStore {
    pub fn new(
        source_code_provider: Arc<dyn SourceCodeProvider>,
        syntax_tree_provider: Arc<dyn SyntaxTreeProvider>,
    ) -> Self {
        CachingFunctionMapStore {
            source_code_provider,
            syntax_tree_provider,
            cache: SingleFlight::new(),
        }
    }

    fn build(&self, url: &str) -> Option<Arc<FunctionMap>> {
        let source = match self.source_code_provider.get_source_code(url) {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, url = %url, "No source code available");
                return None;
            }
        };

        let tree = match self.syntax_tree_provider.parse(&source, url) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to parse source code");
                return None;
            }
        };

        let function_map = build_function_map(&tree);
        debug!(url = %url, functions = function_map.len(), "Built function map");
        Some(Arc::new(function_map))
    }
}

impl FunctionMapStore for CachingFunctionMapStore {
    fn get_function_map_for_url(&self, url: &str) -> Option<Arc<FunctionMap>> {
        self.cache.get_or_build(url, || self.build(url))
    }
}

/// Decodes fetched source maps and caches them per URL
pub struct CachingSourceMapStore {
    source_map_provider: Arc<dyn SourceMapProvider>,
    cache: SingleFlight<Option<Arc<SourceMap>>>,
}

impl CachingSourceMapStore {
    pub fn new(source_map_provider: Arc<dyn SourceMapProvider>) -> Self {
        CachingSourceMapStore {
            source_map_provider,
            cache: SingleFlight::new(),
        }
    }

    fn build(&self, url: &str) -> Option<Arc<SourceMap>> {
        match self.source_map_provider.get_source_map_contents_for_url(url) {
            Ok(contents) => {
                let source_map = source_map_from_text(&contents);
                debug!(url = %url, mappings = source_map.len(), "Loaded source map");
                Some(Arc::new(source_map))
            }
            Err(e) => {
                warn!(error = %e, url = %url, "No source map available");
                None
            }
        }
    }
}

impl SourceMapStore for CachingSourceMapStore {
    fn get_source_map_for_url(&self, url: &str) -> Option<Arc<SourceMap>> {
        self.cache.get_or_build(url, || self.build(url))
    }
}

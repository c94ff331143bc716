//! Bounded cache of compiled lexers keyed by syntax configuration

use super::tokenizer::Lexer;
use crate::config::compile_time::lexer::CACHE_CAPACITY;
use crate::config::runtime::preferences;
use crate::environment::SyntaxConfig;
use crate::log_debug;
use crate::syntax::SyntaxResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Least-recently-used map from configuration to compiled lexer.
///
/// Lookups and inserts take the lock; building happens outside it, so two
/// threads racing on the same configuration may both build and the later
/// insert wins. Both lexers are equivalent.
#[derive(Debug)]
pub struct LexerCache {
    entries: Mutex<LruCache<SyntaxConfig, Arc<Lexer>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for LexerCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY)
    }
}

impl LexerCache {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<SyntaxConfig, Arc<Lexer>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_or_build(&self, config: &SyntaxConfig) -> SyntaxResult<Arc<Lexer>> {
        let cached = self.lock().get(config).cloned();
        if let Some(lexer) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            if preferences().lexical.log_cache_activity {
                log_debug!("Lexer cache hit", "entries" => self.len());
            }
            return Ok(lexer);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let lexer = Arc::new(Lexer::new(config)?);
        let evicted = self.insert(config, Arc::clone(&lexer));
        if preferences().lexical.log_cache_activity {
            log_debug!("Lexer cache miss",
                "entries" => self.len(),
                "evicted" => evicted
            );
        }
        Ok(lexer)
    }

    /// Store a lexer; true when another config had to make room for it
    fn insert(&self, config: &SyntaxConfig, lexer: Arc<Lexer>) -> bool {
        // push also hands back the old entry when this key was already present
        self.lock()
            .push(config.clone(), lexer)
            .is_some_and(|(key, _)| key != *config)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

// engine.rs - Compiled-pattern cache.
//
// The source library's `onig_new`/`onig_free` pair leans on a global
// region allocator that the caller must start and tear down explicitly
// (`start_engine`/`cleanup_engine`). Rust's ownership model makes that
// unnecessary: a `Pattern` is an ordinary `Arc`-counted value that is
// freed when the last `Regex` holding it drops. What's worth keeping
// from the source design is the cache — recompiling an identical
// pattern string is wasted work — so `Engine` keeps one, guarded by a
// `Mutex` rather than the source's global locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::atom::Core;
use crate::error::RegexError;
use crate::factory;
use crate::parser;

/// A compiled pattern: its match graph plus the metadata needed to
/// build an API-facing `Captures` view (group count, name table).
#[derive(Debug)]
pub struct Pattern {
    pub source: Vec<u8>,
    pub root: Core,
    pub names: HashMap<String, i32>,
    pub max_group: i32,
}

impl Pattern {
    pub fn compile(source: &[u8]) -> Result<Pattern, RegexError> {
        let parsed = parser::parse(source)?;
        let root = factory::build(&parsed.tokens);
        Ok(Pattern {
            source: source.to_vec(),
            root,
            names: parsed.names,
            max_group: parsed.max_group,
        })
    }

    pub fn group_for_name(&self, name: &str) -> Option<i32> {
        self.names.get(name).copied()
    }
}

/// A cache of compiled patterns, keyed by their exact source bytes.
#[derive(Default)]
pub struct Engine {
    cache: Mutex<HashMap<Vec<u8>, Arc<Pattern>>>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Compile `source`, or return the cached pattern from a previous
    /// call with identical source bytes.
    pub fn compile(&self, source: &[u8]) -> Result<Arc<Pattern>, RegexError> {
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(source)
        {
            return Ok(hit.clone());
        }
        let pattern = Arc::new(Pattern::compile(source)?);
        self.cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(source.to_vec(), pattern.clone());
        Ok(pattern)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// The process-wide pattern cache used by [`crate::Regex::new`].
pub fn global() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::new)
}

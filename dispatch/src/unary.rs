//! Single dispatch: `(operation, operand type) -> handler`.
//!
//! Resolution walks the operand's ancestor chain nearest-first and returns the
//! first type with a handler registered for the operation. Results (including
//! misses) are memoized per `(operation, concrete type)` until the next
//! registration.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tessel_dispatch::{Classify, TypeHierarchy, TypeKey, UnaryRegistry};
//!
//! struct Shape(&'static str);
//!
//! impl Classify for Shape {
//!     fn type_key(&self) -> TypeKey {
//!         TypeKey::new(self.0)
//!     }
//! }
//!
//! let hierarchy = Arc::new(TypeHierarchy::from_edges([("shape", None), ("circle", Some("shape"))]).unwrap());
//! let registry: UnaryRegistry<Shape, (), &'static str> = UnaryRegistry::new(hierarchy);
//! registry.register("describe", "shape", |_, _| "some shape");
//!
//! assert_eq!(registry.dispatch("describe", &Shape("circle"), &()).unwrap(), "some shape");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use snafu::OptionExt;

use crate::cache::ResolutionCache;
use crate::error::{DispatchNotFoundSnafu, Result};
use crate::{Classify, DispatchKey, TypeHierarchy, TypeKey};

/// Handler stored in a [`UnaryRegistry`]: called with the operand and the
/// caller-supplied context.
pub type UnaryHandler<T, C, R> = Arc<dyn Fn(&T, &C) -> R + Send + Sync>;

type Table<T, C, R> = HashMap<DispatchKey, HashMap<TypeKey, UnaryHandler<T, C, R>>>;

/// Dispatch table keyed by operation and a single operand type.
///
/// # Thread Safety
///
/// The table and the cache sit behind separate `parking_lot::RwLock`s.
/// Dispatch takes read locks only on a cache hit; a miss resolves under the
/// table read lock and then briefly takes the cache write lock. Registration
/// takes the table write lock and clears the cache while still holding it, so
/// a resolution computed against the old table can never land in the cache
/// after the clear.
pub struct UnaryRegistry<T: ?Sized, C: ?Sized, R> {
    hierarchy: Arc<TypeHierarchy>,
    table: RwLock<Table<T, C, R>>,
    cache: RwLock<ResolutionCache<(DispatchKey, TypeKey), Option<UnaryHandler<T, C, R>>>>,
}

impl<T: ?Sized, C: ?Sized, R> UnaryRegistry<T, C, R> {
    pub fn new(hierarchy: Arc<TypeHierarchy>) -> Self {
        Self { hierarchy, table: RwLock::new(HashMap::new()), cache: RwLock::new(ResolutionCache::new()) }
    }

    pub fn hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.hierarchy
    }

    /// Register `handler` for the exact `(key, ty)` pair.
    ///
    /// A second registration for the same pair replaces the first. Every call
    /// clears the resolution cache. Returns the stored handler.
    pub fn register<F>(&self, key: impl Into<DispatchKey>, ty: impl Into<TypeKey>, handler: F) -> UnaryHandler<T, C, R>
    where
        F: Fn(&T, &C) -> R + Send + Sync + 'static,
    {
        let (key, ty) = (key.into(), ty.into());
        let handler: UnaryHandler<T, C, R> = Arc::new(handler);

        let mut table = self.table.write();
        let replaced = table.entry(key.clone()).or_default().insert(ty.clone(), Arc::clone(&handler)).is_some();
        self.cache.write().clear();

        tracing::debug!(key = %key, ty = %ty, replaced, "registered unary handler");
        handler
    }

    /// Find the most specific handler for `ty` without calling it.
    pub fn resolve(&self, key: impl Into<DispatchKey>, ty: impl Into<TypeKey>) -> Result<UnaryHandler<T, C, R>> {
        let (key, ty) = (key.into(), ty.into());
        let generation = self.hierarchy.generation();
        let cache_key = (key, ty);

        if let Some(cached) = self.cache.read().get(&cache_key, generation) {
            let (key, ty) = cache_key.clone();
            return cached.clone().context(DispatchNotFoundSnafu { key, types: vec![ty] });
        }

        let table = self.table.read();
        let (key, ty) = &cache_key;
        let chain = self.hierarchy.ancestors(ty);
        let found = table
            .get(key)
            .and_then(|handlers| chain.iter().find_map(|ancestor| handlers.get(ancestor).map(|h| (ancestor, h))));

        let resolved = match found {
            Some((matched, handler)) => {
                tracing::trace!(key = %key, ty = %ty, matched = %matched, "resolved unary handler");
                Some(Arc::clone(handler))
            }
            None => {
                tracing::trace!(key = %key, ty = %ty, chain_len = chain.len(), "no unary handler in ancestor chain");
                None
            }
        };

        self.cache.write().insert(cache_key.clone(), resolved.clone(), generation);
        drop(table);

        let (key, ty) = cache_key;
        resolved.context(DispatchNotFoundSnafu { key, types: vec![ty] })
    }

    /// Resolve a handler for `operand`'s concrete type and call it.
    pub fn dispatch(&self, key: impl Into<DispatchKey>, operand: &T, ctx: &C) -> Result<R>
    where
        T: Classify,
    {
        let handler = self.resolve(key, operand.type_key())?;
        Ok(handler(operand, ctx))
    }

    /// Whether a handler is registered for exactly `(key, ty)` (ancestors are not consulted).
    pub fn has_handler(&self, key: impl Into<DispatchKey>, ty: impl Into<TypeKey>) -> bool {
        let (key, ty) = (key.into(), ty.into());
        self.table.read().get(&key).is_some_and(|handlers| handlers.contains_key(&ty))
    }

    /// Operations with at least one registered handler.
    pub fn keys(&self) -> Vec<DispatchKey> {
        let mut keys: Vec<_> = self.table.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of memoized resolutions (hits and misses).
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

//! Dual dispatch: `(operation, left type, right type) -> handler`.
//!
//! # Resolution
//!
//! Let `left` and `right` be the ancestor chains of the two operand types,
//! nearest first. Every registered pair `(l, r)` with `l` in `left` and `r` in
//! `right` is a candidate, ranked by its positions `(i, j)` in the chains.
//! The winner must be minimal both when ranking by `(i, j)` and when ranking
//! by `(j, i)`. If the two rankings pick different candidates neither is more
//! specific than the other, and dispatch fails with
//! [`Error::AmbiguousDispatch`](crate::Error::AmbiguousDispatch) naming the
//! pair that would settle it.
//!
//! Ambiguity is never cached: a later registration can resolve it, and a
//! later registration can also introduce it, so it is re-checked on every
//! cache miss.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;
use snafu::OptionExt;

use crate::cache::ResolutionCache;
use crate::error::{AmbiguousDispatchSnafu, DispatchNotFoundSnafu, Result};
use crate::{Classify, DispatchKey, TypeHierarchy, TypeKey};

/// Handler stored in a [`BinaryRegistry`].
pub type BinaryHandler<X, Y, C, R> = Arc<dyn Fn(&X, &Y, &C) -> R + Send + Sync>;

type Table<X, Y, C, R> = HashMap<DispatchKey, HashMap<(TypeKey, TypeKey), BinaryHandler<X, Y, C, R>>>;

/// Dispatch table keyed by operation and a pair of operand types.
///
/// Locking discipline is the same as [`UnaryRegistry`](crate::UnaryRegistry).
pub struct BinaryRegistry<X: ?Sized, Y: ?Sized, C: ?Sized, R> {
    hierarchy: Arc<TypeHierarchy>,
    table: RwLock<Table<X, Y, C, R>>,
    #[allow(clippy::type_complexity)]
    cache: RwLock<ResolutionCache<(DispatchKey, TypeKey, TypeKey), Option<BinaryHandler<X, Y, C, R>>>>,
}

impl<X: ?Sized, Y: ?Sized, C: ?Sized, R> BinaryRegistry<X, Y, C, R> {
    pub fn new(hierarchy: Arc<TypeHierarchy>) -> Self {
        Self { hierarchy, table: RwLock::new(HashMap::new()), cache: RwLock::new(ResolutionCache::new()) }
    }

    pub fn hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.hierarchy
    }

    /// Register `handler` for the exact `(key, left, right)` triple.
    ///
    /// Same overwrite and cache-clearing rules as [`UnaryRegistry::register`](crate::UnaryRegistry::register).
    pub fn register<F>(
        &self,
        key: impl Into<DispatchKey>,
        left: impl Into<TypeKey>,
        right: impl Into<TypeKey>,
        handler: F,
    ) -> BinaryHandler<X, Y, C, R>
    where
        F: Fn(&X, &Y, &C) -> R + Send + Sync + 'static,
    {
        let (key, left, right) = (key.into(), left.into(), right.into());
        let handler: BinaryHandler<X, Y, C, R> = Arc::new(handler);

        let mut table = self.table.write();
        let replaced =
            table.entry(key.clone()).or_default().insert((left.clone(), right.clone()), Arc::clone(&handler)).is_some();
        self.cache.write().clear();

        tracing::debug!(key = %key, left = %left, right = %right, replaced, "registered binary handler");
        handler
    }

    /// Find the most specific handler for `(left, right)` without calling it.
    pub fn resolve(
        &self,
        key: impl Into<DispatchKey>,
        left: impl Into<TypeKey>,
        right: impl Into<TypeKey>,
    ) -> Result<BinaryHandler<X, Y, C, R>> {
        let (key, left, right) = (key.into(), left.into(), right.into());
        let generation = self.hierarchy.generation();
        let cache_key = (key, left, right);

        if let Some(cached) = self.cache.read().get(&cache_key, generation) {
            let (key, left, right) = cache_key.clone();
            return cached.clone().context(DispatchNotFoundSnafu { key, types: vec![left, right] });
        }

        let table = self.table.read();
        let (key, left, right) = &cache_key;
        let left_chain = self.hierarchy.ancestors(left);
        let right_chain = self.hierarchy.ancestors(right);

        // Candidates as (rank_left, rank_right, handler).
        let mut candidates: SmallVec<[(usize, usize, &BinaryHandler<X, Y, C, R>); 4]> = SmallVec::new();
        if let Some(handlers) = table.get(key) {
            for (i, l) in left_chain.iter().enumerate() {
                for (j, r) in right_chain.iter().enumerate() {
                    if let Some(handler) = handlers.get(&(l.clone(), r.clone())) {
                        candidates.push((i, j, handler));
                    }
                }
            }
        }

        let by_left = candidates.iter().min_by_key(|(i, j, _)| (*i, *j));
        let by_right = candidates.iter().min_by_key(|(i, j, _)| (*j, *i));

        let resolved = match (by_left, by_right) {
            (Some(&(i1, j1, handler)), Some(&(i2, j2, _))) => {
                if (i1, j1) != (i2, j2) {
                    tracing::debug!(
                        key = %key,
                        left = %left,
                        right = %right,
                        candidates = candidates.len(),
                        "ambiguous binary dispatch"
                    );
                    return AmbiguousDispatchSnafu {
                        key: key.clone(),
                        left_first: (left_chain[i1].clone(), right_chain[j1].clone()),
                        right_first: (left_chain[i2].clone(), right_chain[j2].clone()),
                        suggested: (left_chain[i1].clone(), right_chain[j2].clone()),
                    }
                    .fail();
                }
                tracing::trace!(
                    key = %key,
                    left = %left,
                    right = %right,
                    matched_left = %left_chain[i1],
                    matched_right = %right_chain[j1],
                    "resolved binary handler"
                );
                Some(Arc::clone(handler))
            }
            _ => None,
        };
        drop(candidates);

        self.cache.write().insert(cache_key.clone(), resolved.clone(), generation);
        drop(table);

        let (key, left, right) = cache_key;
        resolved.context(DispatchNotFoundSnafu { key, types: vec![left, right] })
    }

    /// Resolve a handler for the operands' concrete types and call it.
    pub fn dispatch(&self, key: impl Into<DispatchKey>, left: &X, right: &Y, ctx: &C) -> Result<R>
    where
        X: Classify,
        Y: Classify,
    {
        let handler = self.resolve(key, left.type_key(), right.type_key())?;
        Ok(handler(left, right, ctx))
    }

    /// Whether a handler is registered for exactly `(key, left, right)`.
    pub fn has_handler(&self, key: impl Into<DispatchKey>, left: impl Into<TypeKey>, right: impl Into<TypeKey>) -> bool {
        let (key, pair) = (key.into(), (left.into(), right.into()));
        self.table.read().get(&key).is_some_and(|handlers| handlers.contains_key(&pair))
    }

    pub fn keys(&self) -> Vec<DispatchKey> {
        let mut keys: Vec<_> = self.table.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

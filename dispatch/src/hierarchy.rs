//! Single-inheritance type taxonomy.
//!
//! Every declared type has at most one parent, so its ancestors form a linear
//! chain ending at a root. Chains are computed once, when the type is declared,
//! and never change afterwards: a parent must be declared before its children
//! and a type cannot be moved under a different parent.
//!
//! # Thread Safety
//!
//! Declarations take a write lock; chain lookups take a read lock and return a
//! shared `Arc<[TypeKey]>`, so dispatchers never hold the lock while walking.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use snafu::{OptionExt, ensure};

use crate::error::{ConflictingParentSnafu, Result, UnknownParentSnafu};
use crate::TypeKey;

/// Registry of declared types and their cached ancestor chains.
#[derive(Debug, Default)]
pub struct TypeHierarchy {
    /// Type -> chain nearest-first (the type itself at index 0, root last).
    chains: RwLock<HashMap<TypeKey, Arc<[TypeKey]>>>,
    /// Bumped on every new declaration so resolution caches can notice growth.
    generation: AtomicU64,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from `(type, parent)` pairs, parents listed first.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Result<Self> {
        let hierarchy = Self::new();
        for (ty, parent) in edges {
            match parent {
                Some(parent) => hierarchy.declare(ty, parent)?,
                None => hierarchy.declare_root(ty)?,
            }
        }
        Ok(hierarchy)
    }

    /// Declare a type with no parent.
    pub fn declare_root(&self, ty: impl Into<TypeKey>) -> Result<()> {
        self.insert(ty.into(), None)
    }

    /// Declare `ty` as a direct child of `parent`.
    ///
    /// Re-declaring an existing type with the same parent is a no-op.
    pub fn declare(&self, ty: impl Into<TypeKey>, parent: impl Into<TypeKey>) -> Result<()> {
        self.insert(ty.into(), Some(parent.into()))
    }

    fn insert(&self, ty: TypeKey, parent: Option<TypeKey>) -> Result<()> {
        let mut chains = self.chains.write();

        if let Some(existing) = chains.get(&ty) {
            let existing = existing.get(1).cloned();
            ensure!(existing == parent, ConflictingParentSnafu { ty, existing, requested: parent });
            return Ok(());
        }

        let chain: Arc<[TypeKey]> = match &parent {
            None => Arc::from(vec![ty.clone()]),
            Some(parent) => {
                let parent_chain = chains.get(parent).context(UnknownParentSnafu { ty: ty.clone(), parent: parent.clone() })?;
                std::iter::once(ty.clone()).chain(parent_chain.iter().cloned()).collect()
            }
        };

        tracing::trace!(ty = %ty, depth = chain.len(), "declared type");
        chains.insert(ty, chain);
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Ancestor chain of `ty`, nearest first and including `ty` itself.
    ///
    /// An undeclared type is treated as a root with no ancestors.
    pub fn ancestors(&self, ty: &TypeKey) -> Arc<[TypeKey]> {
        self.chains.read().get(ty).cloned().unwrap_or_else(|| Arc::from(vec![ty.clone()]))
    }

    /// Direct parent of `ty`, if it is declared and not a root.
    pub fn parent(&self, ty: &TypeKey) -> Option<TypeKey> {
        self.chains.read().get(ty).and_then(|chain| chain.get(1).cloned())
    }

    /// Whether `ancestor` appears in the chain of `ty` (every type is a subtype of itself).
    pub fn is_subtype(&self, ty: &TypeKey, ancestor: &TypeKey) -> bool {
        self.ancestors(ty).contains(ancestor)
    }

    pub fn contains(&self, ty: &TypeKey) -> bool {
        self.chains.read().contains_key(ty)
    }

    pub fn len(&self) -> usize {
        self.chains.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.read().is_empty()
    }

    /// Monotonic counter of declarations.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

//! Named rewrite passes backed by a single-dispatch registry.
//!
//! A pass owns a [`DispatchKey`] (its name) inside a [`PassRegistry`] that may
//! be shared with other passes. Handlers are registered per node kind; the
//! most specific registered kind in the node's taxonomy chain wins, and a node
//! with no handler passes through unchanged.

use std::sync::Arc;

use tessel_dispatch::{DispatchKey, TypeKey, UnaryRegistry};

use crate::error::{Error, Result};
use crate::rewrite::engine::rewrite_bottom_up;
use crate::{Expr, node_hierarchy};

/// What a pass handler returns: `Some(replacement)`, or `None` to keep the node.
pub type PassOutput = Result<Option<Arc<Expr>>>;

/// Registry shared by passes over context `C`. One dispatch table per pass name.
pub type PassRegistry<C> = UnaryRegistry<Arc<Expr>, C, PassOutput>;

/// Create an empty registry over the process-wide node taxonomy.
pub fn pass_registry<C: ?Sized>() -> Arc<PassRegistry<C>> {
    Arc::new(UnaryRegistry::new(node_hierarchy()))
}

pub struct RewritePass<C: ?Sized> {
    name: DispatchKey,
    registry: Arc<PassRegistry<C>>,
}

impl<C: ?Sized> Clone for RewritePass<C> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), registry: Arc::clone(&self.registry) }
    }
}

impl<C: ?Sized> RewritePass<C> {
    pub fn new(name: impl Into<DispatchKey>, registry: Arc<PassRegistry<C>>) -> Self {
        Self { name: name.into(), registry }
    }

    /// A pass with its own private registry.
    pub fn standalone(name: impl Into<DispatchKey>) -> Self {
        Self::new(name, pass_registry())
    }

    pub fn name(&self) -> &DispatchKey {
        &self.name
    }

    pub fn registry(&self) -> &Arc<PassRegistry<C>> {
        &self.registry
    }

    /// Handle nodes of `kind` (or any subtype without a closer handler).
    pub fn register<F>(&self, kind: impl Into<TypeKey>, handler: F) -> &Self
    where
        F: Fn(&Arc<Expr>, &C) -> PassOutput + Send + Sync + 'static,
    {
        self.registry.register(self.name.clone(), kind, handler);
        self
    }

    /// Apply this pass to a single node, without visiting its children.
    pub fn apply_node(&self, node: &Arc<Expr>, ctx: &C) -> PassOutput {
        match self.registry.dispatch(self.name.clone(), node, ctx) {
            Ok(output) => output,
            Err(err) if err.is_not_found() => Ok(None),
            Err(source) => Err(Error::Dispatch { source }),
        }
    }

    /// Apply this pass to every node of `root`, children first.
    #[tracing::instrument(skip_all, fields(pass = %self.name, root.id = root.id))]
    pub fn run(&self, root: &Arc<Expr>, ctx: &C) -> Result<Arc<Expr>> {
        let result = rewrite_bottom_up(root, |node| self.apply_node(node, ctx))?;
        tracing::debug!(result.id = result.id, changed = !Arc::ptr_eq(&result, root), "pass complete");
        Ok(result)
    }
}

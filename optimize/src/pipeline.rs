//! Desugar → Deoptimize → Optimize, each a full bottom-up rewrite.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tessel_ir::{Expr, ShapeProvider, pass_registry};
use tracing::debug;

use crate::{OptimizerConfig, Pass, Registry, Result, deoptimize_pass, desugar_pass, optimize_pass};

/// The three passes over one private registry.
///
/// Each pipeline owns its registry, so pipelines built with different
/// configurations never see each other's handlers.
#[derive(Clone)]
pub struct Pipeline {
    config: OptimizerConfig,
    registry: Arc<Registry>,
    desugar: Pass,
    deoptimize: Pass,
    optimize: Pass,
}

impl Pipeline {
    pub fn new(config: OptimizerConfig) -> Self {
        let registry = pass_registry();
        let desugar = desugar_pass(&registry);
        let deoptimize = deoptimize_pass(&registry);
        let optimize = optimize_pass(&registry, config);
        Self { config, registry, desugar, deoptimize, optimize }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Passes in the order [`run`](Self::run) applies them. Optimize is
    /// omitted when disabled.
    pub fn stages(&self) -> impl Iterator<Item = &Pass> {
        let optimize = self.config.enabled.then_some(&self.optimize);
        [&self.desugar, &self.deoptimize].into_iter().chain(optimize)
    }

    /// Rewrite `root`. `shapes` supplies dimension cardinalities to Optimize.
    ///
    /// Stops at the first error; no partially rewritten tree is returned.
    #[tracing::instrument(skip_all, fields(root.id = root.id, optimize = self.config.enabled))]
    pub fn run(&self, root: &Arc<Expr>, shapes: &(dyn ShapeProvider + 'static)) -> Result<Arc<Expr>> {
        let mut current = Arc::clone(root);
        for pass in self.stages() {
            current = pass.run(&current, shapes)?;
            debug!(pass = %pass.name(), tree = %current.tree(), "stage complete");
        }
        Ok(current)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("config", &self.config).finish_non_exhaustive()
    }
}

static DEFAULT_PIPELINE: Lazy<Pipeline> = Lazy::new(|| Pipeline::new(OptimizerConfig::from_env()));

/// Process-wide pipeline, configured from the environment on first use.
pub fn default_pipeline() -> &'static Pipeline {
    &DEFAULT_PIPELINE
}

/// Run the default pipeline over `root`.
pub fn apply_optimizer(root: &Arc<Expr>, shapes: &(dyn ShapeProvider + 'static)) -> Result<Arc<Expr>> {
    default_pipeline().run(root, shapes)
}

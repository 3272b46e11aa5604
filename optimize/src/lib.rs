//! Rewrite pipeline for tessel expression trees.
//!
//! Trees go through three passes, each a full bottom-up rewrite:
//!
//! 1. **Desugar** turns `Unary`/`Binary` input nodes into `Elementwise` nodes
//! 2. **Deoptimize** merges nested nodes sharing an associative operator into
//!    the widest single reduction-of-product
//! 3. **Optimize** splits every wide reduction-of-product into a chain of
//!    pairwise contractions picked by a contraction path search
//!
//! # Module Organization
//!
//! - [`config`] - [`OptimizerConfig`], builder and environment overrides
//! - [`desugar`] / [`deoptimize`] / [`contract`] - The three passes
//! - [`path`] - Contraction path search, cost model and materialization
//! - [`pipeline`] - [`Pipeline`] and the process-wide default instance
//!
//! # Example
//!
//! ```
//! use tessel_ir::{Expr, Operand, PointwiseOp, ReduceOp, SizeDict, dims};
//! use tessel_optimize::apply_optimizer;
//!
//! let x = Expr::leaf(Operand::new("X", dims(["a", "b"])));
//! let y = Expr::leaf(Operand::new("Y", dims(["b", "c"])));
//! let z = Expr::leaf(Operand::new("Z", dims(["c", "d"])));
//! let product = Expr::try_elementwise(PointwiseOp::Mul, [x, y, z]).unwrap();
//! let root = Expr::try_reduce(ReduceOp::Add, product, dims(["b", "c"])).unwrap();
//!
//! let sizes: SizeDict = [("a", 3), ("b", 4), ("c", 5), ("d", 6)].into_iter().collect();
//! let optimized = apply_optimizer(&root, &sizes).unwrap();
//! assert_eq!(optimized.free_dims(), &dims(["a", "d"]));
//! ```

use tessel_ir::{PassRegistry, RewritePass, ShapeProvider};

pub mod config;
pub mod contract;
pub mod deoptimize;
pub mod desugar;
pub mod path;
pub mod pipeline;


pub use config::{CostFn, OptimizerConfig, PathStrategy};
pub use contract::optimize_pass;
pub use deoptimize::deoptimize_pass;
pub use desugar::desugar_pass;
pub use path::{ContractionPath, PathStep, find_path, materialize};
pub use pipeline::{Pipeline, apply_optimizer, default_pipeline};
pub use tessel_ir::{Error, Result};

/// Registry shared by the pipeline's passes. Handlers receive the shape provider.
pub type Registry = PassRegistry<dyn ShapeProvider>;

/// A pass of the pipeline.
pub type Pass = RewritePass<dyn ShapeProvider>;

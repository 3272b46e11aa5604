//! Tree rewriting: the bottom-up engine and named passes built on it.

pub mod engine;
pub mod pass;

pub use engine::rewrite_bottom_up;
pub use pass::{PassOutput, PassRegistry, RewritePass, pass_registry};

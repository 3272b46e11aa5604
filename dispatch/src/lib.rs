//! Dynamic dispatch over an open, single-inheritance type taxonomy.
//!
//! # Module Organization
//!
//! - [`key`] - Operation and type identifiers, the [`Classify`] trait
//! - [`hierarchy`] - Declared types and their cached ancestor chains
//! - [`unary`] - Single dispatch on one operand type
//! - [`binary`] - Dual dispatch on two operand types with ambiguity detection
//! - [`error`] - Error types and result handling
//!
//! Registries are plain values: construct as many isolated instances as needed
//! (one per test, one per pipeline) and share them behind an `Arc`.

mod cache;

pub mod binary;
pub mod error;
pub mod hierarchy;
pub mod key;
pub mod unary;


pub use binary::{BinaryHandler, BinaryRegistry};
pub use error::{Error, Result};
pub use hierarchy::TypeHierarchy;
pub use key::{Classify, DispatchKey, TypeKey};
pub use unary::{UnaryHandler, UnaryRegistry};

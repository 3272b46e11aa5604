//! Node taxonomy used for dispatch.
//!
//! ```text
//! expr
//! ├── leaf
//! ├── pointwise
//! │   ├── unary
//! │   ├── binary
//! │   └── elementwise
//! └── reduce
//! ```
//!
//! Passes register handlers against any of these names; a handler registered
//! on `pointwise` applies to all three pointwise forms unless a more specific
//! one is registered.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tessel_dispatch::{TypeHierarchy, TypeKey};

/// Root of the taxonomy.
pub const EXPR: &str = "expr";
/// Abstract parent of every node that applies a [`PointwiseOp`](crate::PointwiseOp).
pub const POINTWISE: &str = "pointwise";

/// Concrete node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::EnumIter, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Leaf,
    Unary,
    Binary,
    Elementwise,
    Reduce,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Direct parent in the taxonomy.
    pub const fn parent(self) -> &'static str {
        match self {
            Self::Unary | Self::Binary | Self::Elementwise => POINTWISE,
            Self::Leaf | Self::Reduce => EXPR,
        }
    }
}

impl From<NodeKind> for TypeKey {
    fn from(kind: NodeKind) -> Self {
        TypeKey::new(kind.as_str())
    }
}

static NODE_HIERARCHY: Lazy<Arc<TypeHierarchy>> = Lazy::new(|| {
    use strum::IntoEnumIterator;

    let abstract_kinds = [(EXPR, None), (POINTWISE, Some(EXPR))];
    let concrete = NodeKind::iter().map(|kind| (kind.as_str(), Some(kind.parent())));
    let hierarchy = TypeHierarchy::from_edges(abstract_kinds.into_iter().chain(concrete))
        .expect("node taxonomy declares parents before children");
    Arc::new(hierarchy)
});

/// Process-wide taxonomy shared by every pass registry.
pub fn node_hierarchy() -> Arc<TypeHierarchy> {
    Arc::clone(&NODE_HIERARCHY)
}

//! Named dimensions and their cardinalities.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use snafu::{OptionExt, ensure};

use crate::error::{InvalidCardinalitySnafu, Result, ShapeMetadataMissingSnafu};

/// Dimension identifier. Dimensions are matched by name across operands.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dim(Arc<str>);

impl Dim {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Dim {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Dim {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&Dim> for Dim {
    fn from(dim: &Dim) -> Self {
        dim.clone()
    }
}

/// Ordered set of dimensions. Ordering keeps rendering and tracing deterministic.
pub type DimSet = BTreeSet<Dim>;

/// Build a [`DimSet`] from anything convertible to [`Dim`].
///
/// ```
/// let ab = tessel_ir::dims(["a", "b"]);
/// assert_eq!(ab.len(), 2);
/// ```
pub fn dims<D: Into<Dim>>(names: impl IntoIterator<Item = D>) -> DimSet {
    names.into_iter().map(Into::into).collect()
}

/// Source of dimension cardinalities.
///
/// Implemented by whatever performs shape inference for the leaves of a tree.
/// Returning `None` means the cardinality is not known yet.
pub trait ShapeProvider: Send + Sync {
    fn cardinality(&self, dim: &Dim) -> Option<u64>;
}

impl ShapeProvider for HashMap<Dim, u64> {
    fn cardinality(&self, dim: &Dim) -> Option<u64> {
        self.get(dim).copied()
    }
}

/// Cardinalities of the dimensions involved in one contraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeDict(HashMap<Dim, u64>);

impl SizeDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dimension in `dims` gets cardinality `size`.
    pub fn uniform<'a>(dims: impl IntoIterator<Item = &'a Dim>, size: u64) -> Self {
        Self(dims.into_iter().map(|d| (d.clone(), size)).collect())
    }

    /// Look up every dimension in `dims` through `shapes`.
    ///
    /// Fails on the first dimension (in set order) that is unknown or has
    /// zero cardinality.
    pub fn collect<'a>(dims: impl IntoIterator<Item = &'a Dim>, shapes: &dyn ShapeProvider) -> Result<Self> {
        let mut sizes = HashMap::new();
        for dim in dims {
            let size = shapes.cardinality(dim).context(ShapeMetadataMissingSnafu { dim: dim.clone() })?;
            ensure!(size > 0, InvalidCardinalitySnafu { dim: dim.clone() });
            sizes.insert(dim.clone(), size);
        }
        Ok(Self(sizes))
    }

    pub fn insert(&mut self, dim: impl Into<Dim>, size: u64) -> Option<u64> {
        self.0.insert(dim.into(), size)
    }

    pub fn get(&self, dim: &Dim) -> Option<u64> {
        self.0.get(dim).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of elements in a tensor spanning `dims`.
    ///
    /// Unknown dimensions count as 1; the product saturates instead of
    /// overflowing.
    pub fn size_of<'a>(&self, dims: impl IntoIterator<Item = &'a Dim>) -> u64 {
        dims.into_iter().fold(1u64, |acc, d| acc.saturating_mul(self.get(d).unwrap_or(1)))
    }
}

impl ShapeProvider for SizeDict {
    fn cardinality(&self, dim: &Dim) -> Option<u64> {
        self.get(dim)
    }
}

impl<D: Into<Dim>> FromIterator<(D, u64)> for SizeDict {
    fn from_iter<I: IntoIterator<Item = (D, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(d, s)| (d.into(), s)).collect())
    }
}

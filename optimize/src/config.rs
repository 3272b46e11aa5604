//! Optimizer configuration types.
//!
//! Typed configuration with a bon builder, plus environment variable fallbacks.

use bon::bon;

// ============================================================================
// PATH SEARCH
// ============================================================================

/// How the contraction order is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(strum::Display, strum::EnumString)]
pub enum PathStrategy {
    /// Repeatedly combine the cheapest pair (default).
    #[default]
    #[strum(serialize = "greedy")]
    Greedy,

    /// Combine operands left to right, in input order.
    ///
    /// Useful as a baseline when debugging or bisecting regressions.
    #[strum(serialize = "sequential")]
    Sequential,
}

/// Cost the greedy search minimizes when picking a pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(strum::Display, strum::EnumString)]
pub enum CostFn {
    /// `size(a ∪ b) - size(a) - size(b)`: memory the naive product of the pair
    /// adds over keeping both operands (default).
    #[default]
    #[strum(serialize = "memory-removed")]
    MemoryRemoved,

    /// Size of the pair's result after its reductions are applied.
    #[strum(serialize = "size")]
    ResultSize,
}

// ============================================================================
// TOP-LEVEL CONFIGURATION
// ============================================================================

/// Configuration for the rewrite pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Whether the Optimize stage runs at all. Desugar and Deoptimize always run.
    pub enabled: bool,
    pub strategy: PathStrategy,
    pub cost: CostFn,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { enabled: true, strategy: PathStrategy::default(), cost: CostFn::default() }
    }
}

#[bon]
impl OptimizerConfig {
    /// Create an optimizer configuration with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = true)] enabled: bool,
        #[builder(default)] strategy: PathStrategy,
        #[builder(default)] cost: CostFn,
    ) -> Self {
        Self { enabled, strategy, cost }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `TESSEL_NOOPT` - Skip the Optimize stage if set
    /// * `TESSEL_PATH` - `greedy` (default) or `sequential`
    /// * `TESSEL_COST` - `memory-removed` (default) or `size`
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup("TESSEL_NOOPT").is_none();
        let strategy = lookup("TESSEL_PATH").and_then(|s| s.parse().ok()).unwrap_or_default();
        let cost = lookup("TESSEL_COST").and_then(|s| s.parse().ok()).unwrap_or_default();

        Self { enabled, strategy, cost }
    }
}

// ============================================================================
// TESTS
// ============================================================================

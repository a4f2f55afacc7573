//! Configuration for the hybrid scheduler and its budget policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, HybridResult};

/// Fixed per-round limit handed to each strategy invocation
const DEFAULT_ROUND_LIMIT: Duration = Duration::from_secs(20);

/// Pause between skipped rounds while the run is interrupted
const DEFAULT_INTERRUPT_POLL: Duration = Duration::from_millis(10);

/// Per-goal budget parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Budget floor for goals behind shallow branch logic
    pub base: Duration,
    /// Extra budget per branch in the goal's dependency chain
    pub per_branch: Duration,
    /// Chains with at least this many branches get the default budget
    pub branch_threshold: usize,
    /// Budget for deep chains and for goals without a chain
    pub default_budget: Duration,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(50_000),
            per_branch: Duration::from_millis(5_000),
            branch_threshold: 10,
            default_budget: Duration::from_millis(100_000),
        }
    }
}

/// Configuration for a hybrid generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub budget: BudgetConfig,
    /// Upper bound on a single strategy round
    pub round_limit: Duration,
    /// Seed of the strategy selection RNG
    pub seed: u64,
    pub interrupt_poll_interval: Duration,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            budget: BudgetConfig::default(),
            round_limit: DEFAULT_ROUND_LIMIT,
            seed: 0,
            interrupt_poll_interval: DEFAULT_INTERRUPT_POLL,
        }
    }
}

impl HybridConfig {
    /// Parse a (possibly partial) JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> HybridResult<Self> {
        let config: HybridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_round_limit(mut self, round_limit: Duration) -> Self {
        self.round_limit = round_limit;
        self
    }

    pub fn validate(&self) -> HybridResult<()> {
        if self.round_limit.is_zero() {
            return Err(HybridError::InvalidConfig(
                "round_limit must be greater than 0".to_string(),
            ));
        }
        if self.interrupt_poll_interval.is_zero() {
            return Err(HybridError::InvalidConfig(
                "interrupt_poll_interval must be greater than 0".to_string(),
            ));
        }
        if self.budget.default_budget.is_zero() {
            return Err(HybridError::InvalidConfig(
                "budget.default_budget must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

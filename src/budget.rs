//! Adaptive per-goal time budget.
//!
//! Goals behind shallow branch logic get a budget that grows linearly with
//! the length of their dependency chain. Deep chains, and goals that cannot
//! be decomposed into a chain at all, get the flat default.

use std::time::Duration;

use crate::config::BudgetConfig;
use crate::fitness::GoalFitness;

#[derive(Debug, Clone, Default)]
pub struct BudgetPolicy {
    config: BudgetConfig,
}

impl BudgetPolicy {
    pub fn new(config: BudgetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Total wall-clock budget for solving `goal`
    pub fn compute_budget(&self, goal: &dyn GoalFitness) -> Duration {
        match goal.branch_goal() {
            Some(branch_goal) => self.budget_for_chain(branch_goal.chain.branch_count()),
            None => self.config.default_budget,
        }
    }

    /// Budget for a chain of `branch_count` branches
    pub fn budget_for_chain(&self, branch_count: usize) -> Duration {
        if branch_count >= self.config.branch_threshold {
            return self.config.default_budget;
        }
        let per_branch = self
            .config
            .per_branch
            .saturating_mul(u32::try_from(branch_count).unwrap_or(u32::MAX));
        self.config.base.saturating_add(per_branch)
    }
}

//! Single-goal views over multi-goal fitness aggregates.
//!
//! Engines that only understand suite-level fitness (symbolic execution) are
//! pointed at one goal by wrapping the shared aggregate in a view that hides
//! every other goal. The aggregate itself is left untouched, so other
//! consumers keep seeing the full goal set.

use std::sync::Arc;

use crate::branch::{BranchId, CoverageGoal};
use crate::candidate::TestCandidate;
use crate::fitness::SuiteFitness;

/// Narrow `aggregate` to `target`, or `None` if the aggregate is not restrictable
pub fn restrict(
    aggregate: &Arc<dyn SuiteFitness>,
    target: &CoverageGoal,
) -> Option<Arc<dyn SuiteFitness>> {
    Arc::clone(aggregate).restrict_to(target)
}

/// An aggregate that reports fitness as though `target` were its only goal
///
/// The declared goal count is always one. The outcome map that does not match
/// the target's polarity is empty, and the matching one only keeps the
/// target's branch.
#[derive(Debug, Clone)]
pub struct RestrictedSuiteFitness {
    inner: Arc<dyn SuiteFitness>,
    target: CoverageGoal,
}

impl RestrictedSuiteFitness {
    pub fn new(inner: Arc<dyn SuiteFitness>, target: CoverageGoal) -> Self {
        Self { inner, target }
    }

    pub fn target(&self) -> &CoverageGoal {
        &self.target
    }

    fn is_target(&self, branch: BranchId, polarity: bool) -> bool {
        branch == self.target.branch && polarity == self.target.polarity
    }
}

impl SuiteFitness for RestrictedSuiteFitness {
    fn total_goals(&self) -> usize {
        1
    }

    fn goals(&self, polarity: bool) -> Vec<BranchId> {
        if polarity != self.target.polarity {
            return Vec::new();
        }
        self.inner
            .goals(polarity)
            .into_iter()
            .filter(|&branch| branch == self.target.branch)
            .collect()
    }

    fn goal_fitness(
        &self,
        branch: BranchId,
        polarity: bool,
        suite: &[TestCandidate],
    ) -> Option<f64> {
        if !self.is_target(branch, polarity) {
            return None;
        }
        self.inner.goal_fitness(branch, polarity, suite)
    }

    fn restrict_to(self: Arc<Self>, target: &CoverageGoal) -> Option<Arc<dyn SuiteFitness>> {
        Some(Arc::new(RestrictedSuiteFitness::new(self, target.clone())))
    }
}

//! Fitness functions for single goals and multi-goal aggregates.
//!
//! A goal fitness maps a candidate to a non-negative value where `0.0` means
//! the goal is covered. A suite fitness aggregates many branch goals and is
//! what natively multi-goal engines (symbolic execution) optimise against.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::branch::{BranchId, CoverageGoal, DependencyChain, DependencyProvider, ExecutionTrace};
use crate::candidate::{TestCandidate, TestExecutor};
use crate::restriction::RestrictedSuiteFitness;

/// Fitness value of a covered goal
pub const COVERED: f64 = 0.0;

/// A branch goal together with its dependency chain
#[derive(Debug, Clone, PartialEq)]
pub struct BranchGoal {
    pub goal: CoverageGoal,
    pub chain: DependencyChain,
}

impl BranchGoal {
    pub fn new(goal: CoverageGoal, chain: DependencyChain) -> Self {
        Self { goal, chain }
    }
}

/// Fitness for exactly one coverage goal
pub trait GoalFitness: Send + Sync + fmt::Debug {
    /// Label used in logs and handed to segment recorders
    fn describe(&self) -> String;

    /// Distance of `candidate` from covering the goal, `0.0` when covered
    fn fitness(&self, candidate: &TestCandidate) -> f64;

    /// Branch goal and chain, or `None` when the goal is not chain-decomposable
    fn branch_goal(&self) -> Option<&BranchGoal> {
        None
    }

    /// The branch outcome this fitness targets, if it targets one
    fn coverage_goal(&self) -> Option<&CoverageGoal> {
        self.branch_goal().map(|bg| &bg.goal)
    }

    fn is_covered(&self, candidate: &TestCandidate) -> bool {
        self.fitness(candidate) == COVERED
    }

    /// Fitness reported when there is no candidate at all
    fn worst_fitness(&self) -> f64 {
        self.branch_goal()
            .map(|bg| bg.chain.branch_count() as f64)
            .unwrap_or(1.0)
    }
}

/// Approach level plus normalised branch distance along a dependency chain
///
/// The approach level counts the chain elements after the first one the
/// trace fails to take with the required outcome.
pub fn chain_fitness(chain: &DependencyChain, trace: &ExecutionTrace) -> f64 {
    if let Some(goal) = chain.goal() {
        if trace.covers(goal.branch, goal.required) {
            return COVERED;
        }
    }

    let covered_prefix = chain
        .iter()
        .take_while(|cb| trace.covers(cb.branch, cb.required))
        .count();

    let Some(blocking) = chain.iter().nth(covered_prefix) else {
        return COVERED;
    };

    let approach_level = (chain.branch_count() - covered_prefix - 1) as f64;
    let normalized = match trace.distance(blocking.branch, blocking.required) {
        Some(d) if d.is_finite() && d >= 0.0 => d / (d + 1.0),
        _ => 1.0,
    };
    approach_level + normalized
}

/// Goal fitness for one branch outcome, evaluated by executing candidates
pub struct BranchCoverageFitness {
    branch_goal: BranchGoal,
    /// Whether the chain came from dependency analysis
    decomposable: bool,
    executor: Arc<dyn TestExecutor>,
}

impl BranchCoverageFitness {
    pub fn new(branch_goal: BranchGoal, executor: Arc<dyn TestExecutor>) -> Self {
        Self {
            branch_goal,
            decomposable: true,
            executor,
        }
    }

    /// Fitness for a goal whose dependency chain is unknown
    ///
    /// Only the goal branch's own distance is used, and the goal reports no
    /// chain to the budget policy or the segmentation analyzer.
    pub fn without_chain(goal: CoverageGoal, executor: Arc<dyn TestExecutor>) -> Self {
        let chain = DependencyChain::new(Vec::new(), &goal);
        Self {
            branch_goal: BranchGoal::new(goal, chain),
            decomposable: false,
            executor,
        }
    }

    /// Fitness from `provider`'s chain when it has one
    pub fn from_provider(
        goal: CoverageGoal,
        provider: &dyn DependencyProvider,
        executor: Arc<dyn TestExecutor>,
    ) -> Self {
        match provider.dependency_chain(&goal) {
            Some(chain) => Self::new(BranchGoal::new(goal, chain), executor),
            None => Self::without_chain(goal, executor),
        }
    }

    pub fn goal(&self) -> &CoverageGoal {
        &self.branch_goal.goal
    }

    /// Fitness of an already collected trace
    pub fn fitness_of_trace(&self, trace: &ExecutionTrace) -> f64 {
        chain_fitness(&self.branch_goal.chain, trace)
    }
}

impl fmt::Debug for BranchCoverageFitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchCoverageFitness")
            .field("branch_goal", &self.branch_goal)
            .finish_non_exhaustive()
    }
}

impl GoalFitness for BranchCoverageFitness {
    fn describe(&self) -> String {
        self.branch_goal.goal.to_string()
    }

    fn fitness(&self, candidate: &TestCandidate) -> f64 {
        let trace = self.executor.execute(candidate);
        self.fitness_of_trace(&trace)
    }

    fn branch_goal(&self) -> Option<&BranchGoal> {
        if self.decomposable {
            Some(&self.branch_goal)
        } else {
            None
        }
    }

    fn coverage_goal(&self) -> Option<&CoverageGoal> {
        Some(&self.branch_goal.goal)
    }
}

/// Fitness aggregated over many branch goals
pub trait SuiteFitness: Send + Sync + fmt::Debug {
    /// Number of goals the aggregate declares
    fn total_goals(&self) -> usize;

    /// Branches with a goal for the given outcome, in ascending order
    fn goals(&self, polarity: bool) -> Vec<BranchId>;

    /// Best fitness over `suite` for one goal, `None` if the goal is unknown
    fn goal_fitness(
        &self,
        branch: BranchId,
        polarity: bool,
        suite: &[TestCandidate],
    ) -> Option<f64>;

    /// Single-goal view of this aggregate, `None` when it cannot be narrowed
    fn restrict_to(self: Arc<Self>, _target: &CoverageGoal) -> Option<Arc<dyn SuiteFitness>> {
        None
    }

    /// Sum of the per-goal fitness values of every declared goal
    fn fitness(&self, suite: &[TestCandidate]) -> f64 {
        [true, false]
            .iter()
            .flat_map(|&polarity| {
                self.goals(polarity)
                    .into_iter()
                    .map(move |branch| (branch, polarity))
            })
            .filter_map(|(branch, polarity)| self.goal_fitness(branch, polarity, suite))
            .sum()
    }

    /// Number of declared goals some member of `suite` covers
    fn covered_goals(&self, suite: &[TestCandidate]) -> usize {
        [true, false]
            .iter()
            .map(|&polarity| {
                self.goals(polarity)
                    .into_iter()
                    .filter(|&branch| self.goal_fitness(branch, polarity, suite) == Some(COVERED))
                    .count()
            })
            .sum()
    }
}

/// Branch-coverage aggregate with one goal map per outcome
#[derive(Debug, Default)]
pub struct BranchSuiteFitness {
    true_goals: BTreeMap<BranchId, Arc<dyn GoalFitness>>,
    false_goals: BTreeMap<BranchId, Arc<dyn GoalFitness>>,
}

impl BranchSuiteFitness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a goal under `goal.branch` / `goal.polarity`
    pub fn add_goal(&mut self, goal: &CoverageGoal, fitness: Arc<dyn GoalFitness>) {
        let map = if goal.polarity {
            &mut self.true_goals
        } else {
            &mut self.false_goals
        };
        map.insert(goal.branch, fitness);
    }

    /// Aggregate over every goal that targets a branch outcome
    pub fn from_goals<I>(goals: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn GoalFitness>>,
    {
        let mut aggregate = Self::new();
        for fitness in goals {
            if let Some(goal) = fitness.coverage_goal().cloned() {
                aggregate.add_goal(&goal, fitness);
            }
        }
        aggregate
    }

    fn map(&self, polarity: bool) -> &BTreeMap<BranchId, Arc<dyn GoalFitness>> {
        if polarity {
            &self.true_goals
        } else {
            &self.false_goals
        }
    }
}

impl SuiteFitness for BranchSuiteFitness {
    fn total_goals(&self) -> usize {
        self.true_goals.len() + self.false_goals.len()
    }

    fn goals(&self, polarity: bool) -> Vec<BranchId> {
        self.map(polarity).keys().copied().collect()
    }

    fn goal_fitness(
        &self,
        branch: BranchId,
        polarity: bool,
        suite: &[TestCandidate],
    ) -> Option<f64> {
        let goal = self.map(polarity).get(&branch)?;
        if suite.is_empty() {
            return Some(goal.worst_fitness());
        }
        let mut best = f64::INFINITY;
        for candidate in suite {
            best = best.min(goal.fitness(candidate));
            if best == COVERED {
                break;
            }
        }
        Some(best)
    }

    fn restrict_to(self: Arc<Self>, target: &CoverageGoal) -> Option<Arc<dyn SuiteFitness>> {
        Some(Arc::new(RestrictedSuiteFitness::new(self, target.clone())))
    }
}

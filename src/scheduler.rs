//! Hybrid round scheduler for a single coverage goal.
//!
//! The scheduler alternates randomly between the strategies of a per-goal
//! pool. Each round runs one strategy for at most the fixed round limit (or
//! whatever is left of the goal budget), harvests its best test and leftover
//! population, and either stops because the goal is covered or attributes the
//! round's chain progress to a new segment and goes again.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::budget::BudgetPolicy;
use crate::cancel::CancellationFlag;
use crate::candidate::{TestCandidate, TestExecutor, TestSuite};
use crate::clock::{Clock, SystemClock};
use crate::config::HybridConfig;
use crate::error::{HybridError, HybridResult};
use crate::fitness::{GoalFitness, SuiteFitness};
use crate::segmentation::{PathSegmentationAnalyzer, Segment};
use crate::strategy::{resolve_best, EngineFactory, StrategyPool};

/// States of the per-goal scheduling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    Initializing,
    RoundSelecting,
    RoundRunning,
    RoundEvaluating,
    /// A round's best test covered the goal
    Covered,
    /// The goal budget ran out
    BudgetExhausted,
    /// A strategy broke its contract and the goal was abandoned
    Aborted,
}

impl SchedulerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SchedulerState::Covered | SchedulerState::BudgetExhausted | SchedulerState::Aborted
        )
    }
}

/// How solving a goal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoalOutcome {
    Covered,
    BudgetExhausted,
}

/// Everything the scheduler learned about one goal
#[derive(Debug, Clone, PartialEq)]
pub struct GoalReport {
    pub goal: String,
    pub outcome: GoalOutcome,
    pub budget: Duration,
    /// Rounds in which a strategy actually ran
    pub rounds: usize,
    /// Rounds skipped because the run was interrupted
    pub skipped_rounds: usize,
    pub segments: Vec<Segment>,
    /// The test that covered the goal
    pub covering: Option<TestCandidate>,
}

impl GoalReport {
    pub fn is_covered(&self) -> bool {
        self.outcome == GoalOutcome::Covered
    }
}

pub struct HybridScheduler {
    config: HybridConfig,
    budget_policy: BudgetPolicy,
    factory: Box<dyn EngineFactory>,
    aggregate: Arc<dyn SuiteFitness>,
    analyzer: PathSegmentationAnalyzer,
    clock: Arc<dyn Clock>,
    cancellation: CancellationFlag,
    rng: ChaCha8Rng,
    state: SchedulerState,
}

impl HybridScheduler {
    /// Build a scheduler, rejecting a configuration that fails
    /// [`HybridConfig::validate`]
    pub fn new(
        config: HybridConfig,
        factory: Box<dyn EngineFactory>,
        aggregate: Arc<dyn SuiteFitness>,
        executor: Arc<dyn TestExecutor>,
    ) -> HybridResult<Self> {
        config.validate()?;
        Ok(Self {
            budget_policy: BudgetPolicy::new(config.budget.clone()),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            factory,
            aggregate,
            analyzer: PathSegmentationAnalyzer::new(executor),
            clock: Arc::new(SystemClock::new()),
            cancellation: CancellationFlag::new(),
            state: SchedulerState::Initializing,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    fn transition_to(&mut self, state: SchedulerState) {
        log::trace!("Scheduler {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Solve one goal, seeding every round from `suite`
    ///
    /// Leftover populations of unsuccessful rounds are appended to `suite`.
    /// The only error is a strategy handing back nothing to pick a best test
    /// from. It comes back as [`HybridError::GoalAborted`] carrying the
    /// segments of the earlier rounds, and leaves the scheduler in
    /// [`SchedulerState::Aborted`].
    pub fn solve_goal(
        &mut self,
        target: Arc<dyn GoalFitness>,
        suite: &mut TestSuite,
    ) -> HybridResult<GoalReport> {
        self.transition_to(SchedulerState::Initializing);
        let goal = target.describe();
        let budget = self.budget_policy.compute_budget(target.as_ref());
        let mut pool = StrategyPool::build(
            self.factory.as_ref(),
            Arc::clone(&target),
            &self.aggregate,
            self.config.round_limit,
        );
        let mut segments: Vec<Segment> = Vec::new();
        let mut rounds = 0;
        let mut skipped_rounds = 0;
        log::info!(
            "Working on {} with budget {:?} and strategies {:?}",
            goal,
            budget,
            pool.names()
        );
        let started = self.clock.now();

        let (outcome, covering) = loop {
            self.transition_to(SchedulerState::RoundSelecting);
            let remaining = budget.saturating_sub(self.clock.since(started));
            if remaining.is_zero() {
                break (GoalOutcome::BudgetExhausted, None);
            }
            let round_limit = self.config.round_limit.min(remaining);
            let Some(index) = pool.select(&mut self.rng) else {
                log::warn!("No strategies available for {}", goal);
                break (GoalOutcome::BudgetExhausted, None);
            };

            self.transition_to(SchedulerState::RoundRunning);
            if self.cancellation.is_interrupted() {
                skipped_rounds += 1;
                log::debug!("Interrupted, skipping round for {}", goal);
                self.clock.sleep(self.config.interrupt_poll_interval);
                continue;
            }
            let Some(strategy) = pool.get_mut(index) else {
                break (GoalOutcome::BudgetExhausted, None);
            };
            let name = strategy.name().to_string();
            log::debug!("Applying {} for {:?}", name, round_limit);

            let round_started = self.clock.now();
            let result = strategy.run(suite, round_limit);
            let elapsed = self.clock.since(round_started);
            rounds += 1;

            self.transition_to(SchedulerState::RoundEvaluating);
            let best = match resolve_best(result.best, target.as_ref(), &name) {
                Ok(best) => best,
                Err(err) => {
                    log::warn!("Aborting {} after {} rounds: {}", goal, rounds, err);
                    self.transition_to(SchedulerState::Aborted);
                    return Err(HybridError::GoalAborted {
                        goal,
                        segments,
                        source: Box::new(err),
                    });
                }
            };
            if target.is_covered(&best) {
                log::info!("Covered {} with {} after {} rounds", goal, name, rounds);
                break (GoalOutcome::Covered, Some(best));
            }

            log::debug!("No solution for {} from {}", goal, name);
            suite.extend(result.population);
            let segment = self.analyzer.analyze(&segments, &best, elapsed, target.as_ref(), &name);
            segments.push(segment);
        };

        self.transition_to(match outcome {
            GoalOutcome::Covered => SchedulerState::Covered,
            GoalOutcome::BudgetExhausted => SchedulerState::BudgetExhausted,
        });
        if outcome == GoalOutcome::BudgetExhausted {
            log::info!("Budget exhausted for {} after {} rounds", goal, rounds);
        }

        Ok(GoalReport {
            goal,
            outcome,
            budget,
            rounds,
            skipped_rounds,
            segments,
            covering,
        })
    }
}

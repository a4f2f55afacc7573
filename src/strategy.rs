//! Interchangeable search strategies and the per-goal strategy pool.
//!
//! Every engine (stochastic search, evolutionary search, symbolic execution)
//! is driven through the same time-bounded contract: it receives the current
//! seed suite and a round limit, and hands back its best test and whatever
//! population it has left over.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::candidate::{TestCandidate, TestSuite};
use crate::error::{HybridError, HybridResult};
use crate::fitness::{GoalFitness, SuiteFitness};
use crate::restriction::restrict;

/// The best artifact a strategy produced in one round
#[derive(Debug, Clone, PartialEq)]
pub enum BestIndividual {
    /// A single best test
    Test(TestCandidate),
    /// A whole suite, for engines whose individuals are suites
    Suite(Vec<TestCandidate>),
}

/// Result of one strategy round
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub best: BestIndividual,
    /// Leftover population used to seed later rounds
    pub population: Vec<TestCandidate>,
}

impl StrategyOutcome {
    pub fn single(best: TestCandidate, population: Vec<TestCandidate>) -> Self {
        Self {
            best: BestIndividual::Test(best),
            population,
        }
    }

    pub fn suite(best: Vec<TestCandidate>, population: Vec<TestCandidate>) -> Self {
        Self {
            best: BestIndividual::Suite(best),
            population,
        }
    }
}

/// A search engine runnable under a round time limit
///
/// The limit is a soft bound: the scheduler does not preempt a strategy that
/// overruns it.
pub trait SearchStrategy: Send {
    /// Name the strategy is attributed under in segments
    fn name(&self) -> &str;

    fn run(&mut self, seeds: &TestSuite, time_limit: Duration) -> StrategyOutcome;
}

/// Whether `fitness` beats `current`; NaN ranks below every real value
pub(crate) fn improves(fitness: f64, current: f64) -> bool {
    if current.is_nan() {
        !fitness.is_nan()
    } else {
        fitness < current
    }
}

/// Resolve a round's best artifact to a single test
///
/// Suites are scanned for the member with the lowest fitness, ties going to
/// the first one seen. A member with NaN fitness only wins when every member
/// has one. An empty suite is a contract violation.
pub fn resolve_best(
    best: BestIndividual,
    target: &dyn GoalFitness,
    strategy: &str,
) -> HybridResult<TestCandidate> {
    match best {
        BestIndividual::Test(test) => Ok(test),
        BestIndividual::Suite(tests) => {
            let mut best: Option<(TestCandidate, f64)> = None;
            for test in tests {
                let fitness = target.fitness(&test);
                let better = match &best {
                    Some((_, current)) => improves(fitness, *current),
                    None => true,
                };
                if better {
                    best = Some((test, fitness));
                }
            }
            best.map(|(test, _)| test).ok_or_else(|| HybridError::EmptyPopulation {
                strategy: strategy.to_string(),
            })
        }
    }
}

/// Builds configured engine instances for one goal
pub trait EngineFactory {
    /// Stochastic search against the goal's own fitness
    fn stochastic(
        &self,
        target: Arc<dyn GoalFitness>,
        round_limit: Duration,
    ) -> Box<dyn SearchStrategy>;

    /// Symbolic execution against a suite-level fitness
    fn symbolic(
        &self,
        fitness: Arc<dyn SuiteFitness>,
        round_limit: Duration,
    ) -> Box<dyn SearchStrategy>;

    /// Any further engines to put in the pool
    fn additional(
        &self,
        _target: Arc<dyn GoalFitness>,
        _round_limit: Duration,
    ) -> Vec<Box<dyn SearchStrategy>> {
        Vec::new()
    }
}

/// The set of strategies available while solving one goal
pub struct StrategyPool {
    strategies: Vec<Box<dyn SearchStrategy>>,
}

impl StrategyPool {
    /// Build the pool for `target`
    ///
    /// The symbolic engine gets the aggregate narrowed to the target's branch
    /// outcome. When the target has no branch outcome, or the aggregate cannot
    /// be narrowed, it runs against the full aggregate.
    pub fn build(
        factory: &dyn EngineFactory,
        target: Arc<dyn GoalFitness>,
        aggregate: &Arc<dyn SuiteFitness>,
        round_limit: Duration,
    ) -> Self {
        let mut strategies = vec![factory.stochastic(Arc::clone(&target), round_limit)];

        let restricted = target
            .coverage_goal()
            .and_then(|goal| restrict(aggregate, goal));
        let symbolic_fitness = match restricted {
            Some(view) => view,
            None => {
                log::debug!(
                    "Aggregate not restrictable for {}, symbolic engine sees all {} goals",
                    target.describe(),
                    aggregate.total_goals()
                );
                Arc::clone(aggregate)
            }
        };
        strategies.push(factory.symbolic(symbolic_fitness, round_limit));
        strategies.extend(factory.additional(target, round_limit));

        Self { strategies }
    }

    pub fn from_strategies(strategies: Vec<Box<dyn SearchStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// Uniformly pick a strategy index
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.strategies.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..self.strategies.len()))
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn SearchStrategy + 'static)> {
        self.strategies.get_mut(index).map(|s| s.as_mut())
    }
}

impl fmt::Debug for StrategyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyPool")
            .field("strategies", &self.names())
            .finish()
    }
}

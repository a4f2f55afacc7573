//! Stochastic search strategy.
//!
//! Samples candidates from a generator, mutating seeds from the shared suite
//! when there are any, and keeps the fittest ones until the round limit runs
//! out or the goal is covered.

use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::candidate::{TestCandidate, TestSuite};
use crate::clock::Clock;
use crate::fitness::{GoalFitness, COVERED};
use crate::strategy::{improves, SearchStrategy, StrategyOutcome};

/// Produces fresh or mutated test candidates
pub trait CandidateGenerator: Send {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> TestCandidate;

    fn mutate(&mut self, _seed: &TestCandidate, rng: &mut ChaCha8Rng) -> TestCandidate {
        self.generate(rng)
    }
}

#[derive(Debug, Clone)]
pub struct RandomSearchConfig {
    /// Leftover candidates handed back for seeding
    pub population_size: usize,
    /// Hard cap on fitness evaluations per round, on top of the time limit
    pub max_evaluations: Option<usize>,
    pub seed: u64,
}

impl Default for RandomSearchConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            max_evaluations: None,
            seed: 0,
        }
    }
}

pub struct RandomSearch {
    name: String,
    target: Arc<dyn GoalFitness>,
    generator: Box<dyn CandidateGenerator>,
    clock: Arc<dyn Clock>,
    config: RandomSearchConfig,
    rng: ChaCha8Rng,
}

impl RandomSearch {
    pub fn new(
        target: Arc<dyn GoalFitness>,
        generator: Box<dyn CandidateGenerator>,
        clock: Arc<dyn Clock>,
        config: RandomSearchConfig,
    ) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            name: "RandomSearch".to_string(),
            target,
            generator,
            clock,
            config,
            rng,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn budget_left(&self, started: Duration, time_limit: Duration, evaluations: usize) -> bool {
        if let Some(max) = self.config.max_evaluations {
            if evaluations >= max {
                return false;
            }
        }
        self.clock.since(started) < time_limit
    }
}

impl SearchStrategy for RandomSearch {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, seeds: &TestSuite, time_limit: Duration) -> StrategyOutcome {
        let started = self.clock.now();
        let mut best: Option<(TestCandidate, f64)> = None;
        let mut generated: Vec<(TestCandidate, f64)> = Vec::new();
        let mut evaluations = 0;

        for seed in seeds {
            let fitness = self.target.fitness(seed);
            evaluations += 1;
            if best.as_ref().map_or(true, |(_, f)| improves(fitness, *f)) {
                best = Some((seed.clone(), fitness));
            }
            if fitness == COVERED {
                break;
            }
        }

        // Always sample at least once so a round contributes something new
        loop {
            if best.as_ref().map_or(false, |(_, f)| *f == COVERED) {
                break;
            }

            let candidate = if seeds.is_empty() {
                self.generator.generate(&mut self.rng)
            } else {
                let parent = &seeds.as_slice()[self.rng.gen_range(0..seeds.len())];
                self.generator.mutate(parent, &mut self.rng)
            };
            let fitness = self.target.fitness(&candidate);
            evaluations += 1;

            if best.as_ref().map_or(true, |(_, current)| improves(fitness, *current)) {
                if let Some(previous) = best.replace((candidate, fitness)) {
                    generated.push(previous);
                }
            } else {
                generated.push((candidate, fitness));
            }

            if !self.budget_left(started, time_limit, evaluations) {
                break;
            }
        }

        // Stable sort keeps first-seen order among equal fitness
        generated.sort_by(|a, b| a.1.total_cmp(&b.1));
        let population: Vec<TestCandidate> = generated
            .into_iter()
            .filter(|(candidate, _)| !seeds.iter().any(|s| s == candidate))
            .take(self.config.population_size)
            .map(|(candidate, _)| candidate)
            .collect();

        let best = match best {
            Some((candidate, _)) => candidate,
            None => self.generator.generate(&mut self.rng),
        };

        log::debug!(
            "{} finished after {} evaluations in {:?}",
            self.name,
            evaluations,
            self.clock.since(started)
        );
        StrategyOutcome::single(best, population)
    }
}

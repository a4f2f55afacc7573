//! Runner driving the stochastic search engine against a real fitness.

use std::sync::Arc;
use std::time::Duration;

use hybridsearch::{
    BranchCoverageFitness, BranchGoal, BranchId, BranchSuiteFitness, CandidateGenerator,
    ChainBranch, Clock, CoverageGoal, DependencyChain, EngineFactory, ExecutionTrace, GoalFitness,
    GoalOutcome, HybridConfig, HybridRunner, HybridScheduler, InMemoryRecorder, ManualClock,
    RandomSearch, RandomSearchConfig, SearchStrategy, StrategyOutcome, SuiteFitness,
    TestCandidate, TestExecutor, TestSuite,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const THRESHOLD: u8 = 200;

/// b1 is true once the first byte reaches the threshold; b2 mirrors the second byte
fn byte_executor() -> Arc<dyn TestExecutor> {
    Arc::new(|candidate: &TestCandidate| {
        let mut trace = ExecutionTrace::new();
        for (i, &byte) in candidate.payload.iter().take(2).enumerate() {
            let branch = BranchId(i as u32 + 1);
            let taken = byte >= THRESHOLD;
            let distance = if taken {
                f64::from(byte - THRESHOLD) + 1.0
            } else {
                f64::from(THRESHOLD - byte)
            };
            trace.record(branch, taken, distance);
        }
        trace
    })
}

/// Random two-byte payloads, each draw costing 100ms of manual time
struct Bytes {
    clock: ManualClock,
    next_id: u64,
}

impl CandidateGenerator for Bytes {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> TestCandidate {
        self.clock.advance(Duration::from_millis(100));
        self.next_id += 1;
        TestCandidate::new(self.next_id, vec![rng.gen(), rng.gen()])
    }

    fn mutate(&mut self, seed: &TestCandidate, rng: &mut ChaCha8Rng) -> TestCandidate {
        let mut child = self.generate(rng);
        if let Some(first) = seed.payload.first() {
            child.payload[0] = first.saturating_add(rng.gen_range(0..16));
        }
        child
    }
}

/// Symbolic stand-in that burns its limit and proposes the seeds plus one fixed test
struct Replay {
    clock: ManualClock,
}

impl SearchStrategy for Replay {
    fn name(&self) -> &str {
        "dse"
    }

    fn run(&mut self, seeds: &TestSuite, time_limit: Duration) -> StrategyOutcome {
        self.clock.advance(time_limit);
        let mut tests: Vec<TestCandidate> = seeds.iter().cloned().collect();
        tests.push(TestCandidate::new(0, vec![0, 0]));
        StrategyOutcome::suite(tests, Vec::new())
    }
}

struct Factory {
    clock: ManualClock,
}

impl EngineFactory for Factory {
    fn stochastic(
        &self,
        target: Arc<dyn GoalFitness>,
        _round_limit: Duration,
    ) -> Box<dyn SearchStrategy> {
        let generator = Bytes {
            clock: self.clock.clone(),
            next_id: 1_000,
        };
        let config = RandomSearchConfig {
            population_size: 5,
            max_evaluations: None,
            seed: 17,
        };
        let clock = Arc::new(self.clock.clone());
        Box::new(RandomSearch::new(target, Box::new(generator), clock, config))
    }

    fn symbolic(
        &self,
        _fitness: Arc<dyn SuiteFitness>,
        _round_limit: Duration,
    ) -> Box<dyn SearchStrategy> {
        Box::new(Replay {
            clock: self.clock.clone(),
        })
    }
}

fn goal(branch: u32, predecessors: Vec<ChainBranch>) -> Arc<dyn GoalFitness> {
    let goal = CoverageGoal::new(BranchId(branch), true, "Bytes.check");
    let chain = DependencyChain::new(predecessors, &goal);
    Arc::new(BranchCoverageFitness::new(BranchGoal::new(goal, chain), byte_executor()))
}

#[test]
fn test_random_search_covers_reachable_goals() {
    let clock = ManualClock::new();
    let goals = vec![goal(1, vec![]), goal(2, vec![ChainBranch::new(BranchId(1), true)])];
    let aggregate: Arc<dyn SuiteFitness> = Arc::new(BranchSuiteFitness::from_goals(goals.clone()));

    let config = HybridConfig::default()
        .with_seed(3)
        .with_round_limit(Duration::from_secs(5));
    let scheduler = HybridScheduler::new(
        config,
        Box::new(Factory { clock: clock.clone() }),
        aggregate,
        byte_executor(),
    )
    .unwrap()
    .with_clock(Arc::new(clock.clone()));
    let mut runner = HybridRunner::new(scheduler, InMemoryRecorder::new());

    let report = runner.generate_tests(goals).unwrap();

    assert_eq!(report.total_goals(), 2);
    assert_eq!(report.goals[0].budget, Duration::from_secs(55));
    assert_eq!(report.goals[1].budget, Duration::from_secs(60));
    for goal_report in &report.goals {
        assert_eq!(goal_report.outcome, GoalOutcome::Covered, "{}", goal_report.goal);
        let covering = goal_report.covering.as_ref().unwrap();
        assert!(report.suite.iter().any(|t| t == covering));
    }
    assert!(report.goals[0].covering.as_ref().unwrap().payload[0] >= THRESHOLD);
    assert!(report.goals[1].covering.as_ref().unwrap().payload[1] >= THRESHOLD);

    // no goal overran its budget
    assert!(clock.now() <= report.total_budget());
    assert_eq!(runner.recorder().records().len(), 2);
}

//! Attribution of dependency-chain progress to strategy rounds.
//!
//! After each round the analyzer replays the round's best test and walks the
//! goal's dependency chain. The unbroken prefix of branches the test takes with
//! the required outcome is credited to the round's strategy, minus anything an
//! earlier round was already credited with. Across rounds this partitions the
//! chain into segments, each owned by the round that first reached it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::branch::{BranchId, DependencyChain, ExecutionTrace};
use crate::candidate::{TestCandidate, TestExecutor};
use crate::fitness::GoalFitness;

/// Newly covered chain branches attributed to one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Position of the segment within its goal, in round order
    pub ordinal: usize,
    pub strategy: String,
    /// Wall-clock time the round took
    pub elapsed: Duration,
    /// Branches in dependency order
    pub branches: Vec<BranchId>,
}

/// Covered prefix of `chain` under `trace`
///
/// Predecessors are credited while they are taken with their required
/// outcome; the first miss ends the walk. The goal branch is only considered
/// once every predecessor was credited.
pub fn covered_prefix(chain: &DependencyChain, trace: &ExecutionTrace) -> Vec<BranchId> {
    let predecessors = chain.predecessors();
    let mut covered = Vec::with_capacity(chain.branch_count());

    for link in predecessors {
        if !trace.covers(link.branch, link.required) {
            break;
        }
        covered.push(link.branch);
    }

    if covered.len() == predecessors.len() {
        if let Some(goal) = chain.goal() {
            if trace.covers(goal.branch, goal.required) {
                covered.push(goal.branch);
            }
        }
    }

    covered
}

pub struct PathSegmentationAnalyzer {
    executor: Arc<dyn TestExecutor>,
}

impl PathSegmentationAnalyzer {
    pub fn new(executor: Arc<dyn TestExecutor>) -> Self {
        Self { executor }
    }

    /// Build the segment for a finished round
    ///
    /// Goals without a dependency chain yield a segment with no branches.
    pub fn analyze(
        &self,
        prior: &[Segment],
        best: &TestCandidate,
        elapsed: Duration,
        goal: &dyn GoalFitness,
        strategy: &str,
    ) -> Segment {
        let branches = match goal.branch_goal() {
            Some(branch_goal) => {
                let trace = self.executor.execute(best);
                let raw = covered_prefix(&branch_goal.chain, &trace);
                let seen: HashSet<BranchId> = prior
                    .iter()
                    .flat_map(|segment| segment.branches.iter().copied())
                    .collect();
                raw.into_iter().filter(|branch| !seen.contains(branch)).collect()
            }
            None => Vec::new(),
        };

        log::debug!(
            "Segment {} for {} by {}: {:?} in {:?}",
            prior.len(),
            goal.describe(),
            strategy,
            branches,
            elapsed
        );

        Segment {
            ordinal: prior.len(),
            strategy: strategy.to_string(),
            elapsed,
            branches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::{ChainBranch, CoverageGoal};
    use crate::fitness::{BranchCoverageFitness, BranchGoal};

    fn b(id: u32) -> BranchId {
        BranchId(id)
    }

    fn chain() -> DependencyChain {
        DependencyChain::new(
            vec![
                ChainBranch::new(b(1), true),
                ChainBranch::new(b(2), false),
                ChainBranch::new(b(3), true),
            ],
            &CoverageGoal::new(b(4), false, ""),
        )
    }

    /// Executor whose trace is the candidate payload read as (branch, outcome) pairs
    fn payload_executor() -> Arc<dyn TestExecutor> {
        Arc::new(|candidate: &TestCandidate| {
            let mut trace = ExecutionTrace::new();
            for pair in candidate.payload.chunks(2) {
                if let [branch, outcome] = pair {
                    trace.record(b(u32::from(*branch)), *outcome != 0, 1.0);
                }
            }
            trace
        })
    }

    fn test_with(pairs: &[(u8, bool)]) -> TestCandidate {
        let payload = pairs.iter().flat_map(|&(br, o)| [br, u8::from(o)]).collect();
        TestCandidate::new(0, payload)
    }

    fn goal() -> BranchCoverageFitness {
        BranchCoverageFitness::new(
            BranchGoal::new(CoverageGoal::new(b(4), false, ""), chain()),
            payload_executor(),
        )
    }

    #[test]
    fn test_prefix_stops_at_first_miss() {
        let trace = ExecutionTrace::new()
            .with(b(1), true, 0.0)
            .with(b(2), false, 0.0)
            .with(b(3), false, 2.0);
        assert_eq!(covered_prefix(&chain(), &trace), vec![b(1), b(2)]);
    }

    #[test]
    fn test_gap_voids_later_branches() {
        // b3 taken, but b2 went the wrong way
        let trace = ExecutionTrace::new()
            .with(b(1), true, 0.0)
            .with(b(2), true, 0.0)
            .with(b(3), true, 0.0)
            .with(b(4), false, 0.0);
        assert_eq!(covered_prefix(&chain(), &trace), vec![b(1)]);
    }

    #[test]
    fn test_goal_included_after_full_prefix() {
        let trace = ExecutionTrace::new()
            .with(b(1), true, 0.0)
            .with(b(2), false, 0.0)
            .with(b(3), true, 0.0)
            .with(b(4), false, 0.0);
        assert_eq!(covered_prefix(&chain(), &trace), vec![b(1), b(2), b(3), b(4)]);

        let wrong_goal_outcome = ExecutionTrace::new()
            .with(b(1), true, 0.0)
            .with(b(2), false, 0.0)
            .with(b(3), true, 0.0)
            .with(b(4), true, 0.0);
        assert_eq!(covered_prefix(&chain(), &wrong_goal_outcome), vec![b(1), b(2), b(3)]);
    }

    #[test]
    fn test_analyze_subtracts_prior_segments() {
        let analyzer = PathSegmentationAnalyzer::new(payload_executor());
        let goal = goal();

        let first = analyzer.analyze(
            &[],
            &test_with(&[(1, true), (2, false)]),
            Duration::from_millis(5),
            &goal,
            "random",
        );
        assert_eq!(first.branches, vec![b(1), b(2)]);
        assert_eq!(first.ordinal, 0);

        let second = analyzer.analyze(
            &[first.clone()],
            &test_with(&[(1, true), (2, false), (3, true)]),
            Duration::from_millis(7),
            &goal,
            "dse",
        );
        assert_eq!(second.branches, vec![b(3)]);
        assert_eq!(second.ordinal, 1);
        assert_eq!(second.strategy, "dse");
        assert_eq!(second.elapsed, Duration::from_millis(7));

        // no new progress
        let third = analyzer.analyze(
            &[first, second],
            &test_with(&[(1, true)]),
            Duration::from_millis(1),
            &goal,
            "random",
        );
        assert!(third.branches.is_empty());
    }

    #[derive(Debug)]
    struct Opaque;

    impl GoalFitness for Opaque {
        fn describe(&self) -> String {
            "opaque".to_string()
        }

        fn fitness(&self, _candidate: &TestCandidate) -> f64 {
            1.0
        }
    }

    #[test]
    fn test_non_decomposable_goal_yields_empty_segment() {
        let analyzer = PathSegmentationAnalyzer::new(payload_executor());
        let segment = analyzer.analyze(
            &[],
            &test_with(&[(1, true)]),
            Duration::from_millis(3),
            &Opaque,
            "random",
        );
        assert!(segment.branches.is_empty());
        assert_eq!(segment.strategy, "random");
    }
}

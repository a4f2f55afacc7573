//! HybridRunner - drives the scheduler across every coverage goal
//!
//! Goals are solved one after another. A single append-only suite is shared
//! by all of them and is the run's output: leftover populations of failed
//! rounds and the covering test of each solved goal end up in it. After each
//! goal, its segment list goes to the configured recorder, whether the goal
//! was covered or not. A goal abandoned after a strategy contract violation
//! still has its partial segment list recorded before the run stops.

use std::sync::Arc;
use std::time::Duration;

use crate::candidate::TestSuite;
use crate::error::{HybridError, HybridResult};
use crate::fitness::GoalFitness;
use crate::report::SegmentRecorder;
use crate::scheduler::{GoalReport, HybridScheduler};

/// Outcome of a whole generation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub suite: TestSuite,
    pub goals: Vec<GoalReport>,
}

impl RunReport {
    pub fn covered_goals(&self) -> usize {
        self.goals.iter().filter(|g| g.is_covered()).count()
    }

    pub fn total_goals(&self) -> usize {
        self.goals.len()
    }

    /// Sum of the budgets allotted to every goal
    pub fn total_budget(&self) -> Duration {
        self.goals.iter().map(|g| g.budget).sum()
    }
}

pub struct HybridRunner<R: SegmentRecorder> {
    scheduler: HybridScheduler,
    recorder: R,
}

impl<R: SegmentRecorder> HybridRunner<R> {
    pub fn new(scheduler: HybridScheduler, recorder: R) -> Self {
        Self { scheduler, recorder }
    }

    pub fn scheduler(&self) -> &HybridScheduler {
        &self.scheduler
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn into_recorder(self) -> R {
        self.recorder
    }

    /// Solve `goals` in order
    ///
    /// A strategy contract violation aborts the run with
    /// [`HybridError::GoalAborted`]. The recorder has by then received every
    /// finished goal and the partial segments of the abandoned one.
    pub fn generate_tests(&mut self, goals: Vec<Arc<dyn GoalFitness>>) -> HybridResult<RunReport> {
        let mut report = RunReport::default();
        log::info!("Total number of test goals: {}", goals.len());
        if goals.is_empty() {
            log::info!("No testable goals, returning an empty suite");
            return Ok(report);
        }

        for goal in goals {
            let goal_report = match self.scheduler.solve_goal(goal, &mut report.suite) {
                Ok(goal_report) => goal_report,
                Err(err) => {
                    if let HybridError::GoalAborted { goal, segments, .. } = &err {
                        self.recorder.record(goal, segments);
                    }
                    return Err(err);
                }
            };
            if let Some(covering) = &goal_report.covering {
                report.suite.push(covering.clone());
            }
            self.recorder.record(&goal_report.goal, &goal_report.segments);
            report.goals.push(goal_report);
        }

        log::info!(
            "Covered {} of {} goals, final suite has {} tests",
            report.covered_goals(),
            report.total_goals(),
            report.suite.len()
        );
        Ok(report)
    }
}

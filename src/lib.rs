//! # Hybrid Search
//!
//! Orchestration core for search-based test generation. For each coverage
//! goal a time budget is derived from the goal's dependency chain, and a
//! scheduler alternates at random between interchangeable search strategies
//! (stochastic search, symbolic execution, ...) until the goal is covered or
//! the budget runs out. Every unsuccessful round is analysed to find which
//! part of the goal's dependency chain it newly reached, and that progress is
//! recorded as a segment attributed to the round's strategy.

pub mod branch;
pub mod budget;
pub mod cancel;
pub mod candidate;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod random_search;
pub mod report;
pub mod restriction;
pub mod scheduler;
pub mod segmentation;
pub mod strategy;

// Re-export core types for easy access
pub use branch::{
    BranchId, ChainBranch, CoverageGoal, DependencyChain, DependencyProvider, DependencyTable,
    ExecutionTrace,
};
pub use budget::BudgetPolicy;
pub use cancel::CancellationFlag;
pub use candidate::{TestCandidate, TestExecutor, TestSuite};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BudgetConfig, HybridConfig};
pub use engine::{HybridRunner, RunReport};
pub use error::{HybridError, HybridResult};
pub use fitness::{
    BranchCoverageFitness, BranchGoal, BranchSuiteFitness, GoalFitness, SuiteFitness, COVERED,
};
pub use random_search::{CandidateGenerator, RandomSearch, RandomSearchConfig};
pub use report::{InMemoryRecorder, NullRecorder, SegmentRecord, SegmentRecorder};
pub use restriction::{restrict, RestrictedSuiteFitness};
pub use scheduler::{GoalOutcome, GoalReport, HybridScheduler, SchedulerState};
pub use segmentation::{covered_prefix, PathSegmentationAnalyzer, Segment};
pub use strategy::{
    resolve_best, BestIndividual, EngineFactory, SearchStrategy, StrategyOutcome, StrategyPool,
};

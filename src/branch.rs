//! Branches, coverage goals, dependency chains and execution traces.
//!
//! These are the read-only facts the scheduler consumes from control-flow
//! analysis and from test execution. Nothing here is mutated once a goal's
//! solving has started.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a conditional branch instruction in the program under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchId(pub u32);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// A single branch outcome that a test has to exercise
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageGoal {
    /// The branch instruction
    pub branch: BranchId,
    /// Required outcome: `true` for the taken edge, `false` otherwise
    pub polarity: bool,
    /// Human-readable location of the branch node (class, method, line)
    pub location: String,
}

impl CoverageGoal {
    pub fn new(branch: BranchId, polarity: bool, location: impl Into<String>) -> Self {
        Self {
            branch,
            polarity,
            location: location.into(),
        }
    }
}

impl fmt::Display for CoverageGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.polarity { "true" } else { "false" };
        if self.location.is_empty() {
            write!(f, "{} - {}", self.branch, outcome)
        } else {
            write!(f, "{} {} - {}", self.location, self.branch, outcome)
        }
    }
}

/// One element of a dependency chain: a branch and the outcome it must take
/// for the goal to stay reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainBranch {
    pub branch: BranchId,
    pub required: bool,
}

impl ChainBranch {
    pub fn new(branch: BranchId, required: bool) -> Self {
        Self { branch, required }
    }
}

/// Ordered branches that must resolve, in sequence, before the goal branch is
/// reachable. The goal's own branch is the last element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyChain {
    branches: Vec<ChainBranch>,
}

impl DependencyChain {
    /// Build a chain from its predecessors and the goal tail
    pub fn new(predecessors: Vec<ChainBranch>, goal: &CoverageGoal) -> Self {
        let mut branches = predecessors;
        branches.push(ChainBranch::new(goal.branch, goal.polarity));
        Self { branches }
    }

    /// Number of branches in the chain, goal included
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Every chain element except the goal tail, in dependency order
    pub fn predecessors(&self) -> &[ChainBranch] {
        match self.branches.split_last() {
            Some((_, init)) => init,
            None => &[],
        }
    }

    /// The goal branch at the tail of the chain
    pub fn goal(&self) -> Option<&ChainBranch> {
        self.branches.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainBranch> {
        self.branches.iter()
    }
}

/// Source of dependency chains, normally backed by control-dependence analysis
pub trait DependencyProvider {
    /// Chain for `goal`, or `None` when the goal cannot be decomposed
    fn dependency_chain(&self, goal: &CoverageGoal) -> Option<DependencyChain>;
}

/// Dependency provider backed by a precomputed table of predecessor lists
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    predecessors: HashMap<BranchId, Vec<ChainBranch>>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the predecessors that guard `branch`
    pub fn insert(&mut self, branch: BranchId, predecessors: Vec<ChainBranch>) {
        self.predecessors.insert(branch, predecessors);
    }
}

impl DependencyProvider for DependencyTable {
    fn dependency_chain(&self, goal: &CoverageGoal) -> Option<DependencyChain> {
        self.predecessors
            .get(&goal.branch)
            .map(|preds| DependencyChain::new(preds.clone(), goal))
    }
}

/// Branch outcomes exercised by one execution of a test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionTrace {
    pub covered_true: HashSet<BranchId>,
    pub covered_false: HashSet<BranchId>,
    /// Smallest observed distance towards each outcome not (yet) taken
    pub distances: HashMap<(BranchId, bool), f64>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `branch` evaluated to `outcome`, `distance` away from
    /// flipping to the opposite outcome
    pub fn record(&mut self, branch: BranchId, outcome: bool, distance: f64) {
        if outcome {
            self.covered_true.insert(branch);
        } else {
            self.covered_false.insert(branch);
        }
        let entry = self.distances.entry((branch, !outcome)).or_insert(distance);
        if distance < *entry {
            *entry = distance;
        }
    }

    /// Builder-style variant of [`ExecutionTrace::record`]
    pub fn with(mut self, branch: BranchId, outcome: bool, distance: f64) -> Self {
        self.record(branch, outcome, distance);
        self
    }

    pub fn covers(&self, branch: BranchId, polarity: bool) -> bool {
        if polarity {
            self.covered_true.contains(&branch)
        } else {
            self.covered_false.contains(&branch)
        }
    }

    /// Recorded distance towards `branch` taking `polarity`
    pub fn distance(&self, branch: BranchId, polarity: bool) -> Option<f64> {
        if self.covers(branch, polarity) {
            return Some(0.0);
        }
        self.distances.get(&(branch, polarity)).copied()
    }
}

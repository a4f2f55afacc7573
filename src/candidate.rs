//! Test candidates, the shared seed suite and the execution seam.

use std::slice;

use crate::branch::ExecutionTrace;

/// An executable test, carried as an opaque encoded payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestCandidate {
    pub id: u64,
    pub payload: Vec<u8>,
}

impl TestCandidate {
    pub fn new(id: u64, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }
}

/// Runs candidates against the program under test
pub trait TestExecutor: Send + Sync {
    fn execute(&self, candidate: &TestCandidate) -> ExecutionTrace;
}

impl<F> TestExecutor for F
where
    F: Fn(&TestCandidate) -> ExecutionTrace + Send + Sync,
{
    fn execute(&self, candidate: &TestCandidate) -> ExecutionTrace {
        self(candidate)
    }
}

/// Ordered, append-only collection of candidates
///
/// The suite seeds successive rounds with partial progress. There is no way to
/// remove a test once it has been added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSuite {
    tests: Vec<TestCandidate>,
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, test: TestCandidate) {
        self.tests.push(test);
    }

    pub fn extend<I: IntoIterator<Item = TestCandidate>>(&mut self, tests: I) {
        self.tests.extend(tests);
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, TestCandidate> {
        self.tests.iter()
    }

    pub fn as_slice(&self) -> &[TestCandidate] {
        &self.tests
    }
}

impl<'a> IntoIterator for &'a TestSuite {
    type Item = &'a TestCandidate;
    type IntoIter = slice::Iter<'a, TestCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}

//! Hand-off of per-goal segment lists to a reporting collaborator.

use serde::Serialize;

use crate::segmentation::Segment;

/// Receives the ordered segment list of every goal once it is solved
///
/// Goals are handed over whatever their terminal state, including goals
/// abandoned after a strategy contract violation.
pub trait SegmentRecorder {
    fn record(&mut self, goal: &str, segments: &[Segment]);
}

/// One recorded goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRecord {
    pub goal: String,
    pub segments: Vec<Segment>,
}

/// Recorder that keeps everything in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecorder {
    records: Vec<SegmentRecord>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SegmentRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SegmentRecord> {
        self.records
    }
}

impl SegmentRecorder for InMemoryRecorder {
    fn record(&mut self, goal: &str, segments: &[Segment]) {
        self.records.push(SegmentRecord {
            goal: goal.to_string(),
            segments: segments.to_vec(),
        });
    }
}

/// Recorder that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl SegmentRecorder for NullRecorder {
    fn record(&mut self, _goal: &str, _segments: &[Segment]) {}
}

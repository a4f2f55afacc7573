//! Cooperative interruption of a generation run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "interrupted" flag, polled by the scheduler at round boundaries
///
/// Raising the flag never aborts a round in progress. The scheduler skips
/// rounds while it is set and keeps polling until the goal budget runs out.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    interrupted: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

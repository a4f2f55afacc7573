//! Error types for hybrid test generation.

use crate::segmentation::Segment;

/// Type alias for results produced by the scheduler and runner
pub type HybridResult<T> = Result<T, HybridError>;

/// Errors that escape a goal's solving attempt
///
/// Recoverable conditions (goals without a dependency chain, aggregates that
/// cannot be restricted, interruption) are absorbed by the scheduler and never
/// show up here.
#[derive(Debug, thiserror::Error)]
pub enum HybridError {
    #[error("strategy '{strategy}' returned an empty population and no best test")]
    EmptyPopulation { strategy: String },

    /// A goal was abandoned mid-round; the segments of its earlier rounds are kept
    #[error("solving {goal} aborted after {} segments: {source}", .segments.len())]
    GoalAborted {
        goal: String,
        segments: Vec<Segment>,
        #[source]
        source: Box<HybridError>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = HybridError::EmptyPopulation { strategy: "dse".to_string() };
        assert_eq!(
            err.to_string(),
            "strategy 'dse' returned an empty population and no best test"
        );

        let err = HybridError::GoalAborted {
            goal: "b4 - true".to_string(),
            segments: Vec::new(),
            source: Box::new(err),
        };
        assert_eq!(
            err.to_string(),
            "solving b4 - true aborted after 0 segments: \
             strategy 'dse' returned an empty population and no best test"
        );
        assert!(std::error::Error::source(&err).is_some());

        let err = HybridError::InvalidConfig("round_limit must be positive".to_string());
        assert!(err.to_string().contains("round_limit"));
    }
}

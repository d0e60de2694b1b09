//! Error types for the council.
//!
//! Sampling itself never fails: completion errors are folded into the
//! sample text. These variants surface from the backend contract and from
//! selection over an empty set.

use thiserror::Error;

/// Errors that can occur during sampling and selection.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// The completion backend could not produce a response.
    #[error("{0}")]
    Completion(String),

    /// Selection was asked to choose from zero candidates.
    #[error("Cannot select from an empty sample set")]
    EmptySampleSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_display_is_bare_detail() {
        let err = CouncilError::Completion("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_empty_sample_set_display() {
        let err = CouncilError::EmptySampleSet;
        assert!(err.to_string().contains("empty sample set"));
    }
}

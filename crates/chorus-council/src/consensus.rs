//! Consensus selection over sampled responses.
//!
//! Picks the response that is textually most central to the sample set:
//! each candidate is scored by its mean similarity to every *other*
//! candidate, and the highest mean wins. Without any semantic
//! understanding this approximates the majority opinion of the model.
//!
//! # Selection Rules
//!
//! - A single candidate is returned unchanged, nothing is compared
//! - Self-comparison is excluded from each mean
//! - Ties go to the first candidate in input order
//! - O(n²) comparisons; n is the sample count (3 by default)

use serde::{Deserialize, Serialize};

use crate::error::CouncilError;
use crate::similarity::similarity;
use crate::Result;

/// Pairwise scoring function used by the selector.
pub type Scorer = fn(&str, &str) -> f64;

/// Outcome of ranking a sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Index of the winning candidate in input order.
    pub winner: usize,
    /// Mean similarity of each candidate to the others, in input order.
    ///
    /// A lone candidate is trivially central and gets `1.0`.
    pub scores: Vec<f64>,
}

impl ConsensusResult {
    /// Mean similarity of the winning candidate.
    pub fn winning_score(&self) -> f64 {
        self.scores[self.winner]
    }
}

/// Similarity-based consensus selector.
#[derive(Debug, Clone)]
pub struct ConsensusSelector {
    scorer: Scorer,
}

impl Default for ConsensusSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusSelector {
    /// Creates a selector using the gestalt [`similarity`] ratio.
    pub fn new() -> Self {
        Self { scorer: similarity }
    }

    /// Creates a selector with a custom pairwise scorer.
    pub fn with_scorer(scorer: Scorer) -> Self {
        Self { scorer }
    }

    /// Ranks candidates by mean pairwise similarity.
    ///
    /// # Errors
    ///
    /// Returns [`CouncilError::EmptySampleSet`] if `responses` is empty.
    pub fn rank<S: AsRef<str>>(&self, responses: &[S]) -> Result<ConsensusResult> {
        match responses.len() {
            0 => return Err(CouncilError::EmptySampleSet),
            1 => {
                return Ok(ConsensusResult {
                    winner: 0,
                    scores: vec![1.0],
                })
            }
            _ => {}
        }

        let others = (responses.len() - 1) as f64;
        let scores: Vec<f64> = responses
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                let total: f64 = responses
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, other)| (self.scorer)(candidate.as_ref(), other.as_ref()))
                    .sum();
                total / others
            })
            .collect();

        // Strict comparison keeps the earliest maximum.
        let mut winner = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[winner] {
                winner = i;
            }
        }

        Ok(ConsensusResult { winner, scores })
    }

    /// Returns the most representative response of the set.
    ///
    /// # Errors
    ///
    /// Returns [`CouncilError::EmptySampleSet`] if `responses` is empty.
    pub fn select<S: AsRef<str>>(&self, responses: &[S]) -> Result<String> {
        let result = self.rank(responses)?;
        Ok(responses[result.winner].as_ref().to_string())
    }
}

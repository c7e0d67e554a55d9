//! Score → recommendation mapping.
//!
//! The label is a pure function of the match score. Whatever label the
//! service sends is ignored; `revalidate` sweeps a batch once more before it
//! is stored and overwrites any label that disagrees with its score.

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::warn;

use crate::screening::AnalysisResult;

/// Minimum score at which a candidate counts as suitable.
pub const SUITABLE_THRESHOLD: u8 = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    HighlyRecommended,
    Recommended,
    Maybe,
    NotRecommended,
}

impl Recommendation {
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::HighlyRecommended => "Highly Recommended",
            Recommendation::Recommended => "Recommended",
            Recommendation::Maybe => "Maybe",
            Recommendation::NotRecommended => "Not Recommended",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

pub fn recommendation_for(score: u8) -> Recommendation {
    match score {
        80.. => Recommendation::HighlyRecommended,
        65..=79 => Recommendation::Recommended,
        40..=64 => Recommendation::Maybe,
        _ => Recommendation::NotRecommended,
    }
}

pub fn is_suitable(score: u8) -> bool {
    score >= SUITABLE_THRESHOLD
}

/// Forces every result's label and suitability back in line with its score.
/// Returns how many results were corrected.
pub fn revalidate(results: &mut [AnalysisResult]) -> usize {
    let mut corrected = 0;
    for result in results.iter_mut() {
        let expected = recommendation_for(result.match_score);
        let suitable = is_suitable(result.match_score);
        if result.recommendation != expected || result.suitable != suitable {
            warn!(
                "Correcting recommendation for {} from '{}' to '{}' (score {})",
                result.name, result.recommendation, expected, result.match_score
            );
            result.recommendation = expected;
            result.suitable = suitable;
            corrected += 1;
        }
    }
    corrected
}

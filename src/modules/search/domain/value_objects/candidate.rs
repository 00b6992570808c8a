use serde::{Deserialize, Serialize};

use crate::modules::title::MatchScore;

/// A result row pulled off a storefront results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub raw_title: String,
    pub url: String,
    pub site_id: String,
}

/// A candidate together with how well it matched the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: CandidateResult,
    pub score: MatchScore,
}

impl ScoredCandidate {
    /// Strictly better only; ties keep the earlier candidate
    pub fn beats(&self, other: &ScoredCandidate) -> bool {
        self.score.value > other.score.value
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::candidate::{CandidateResult, ScoredCandidate};
use crate::modules::title::MatchTier;
use crate::shared::errors::AppError;

/// Terminal status of one book search on one site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchStatus {
    Accepted,
    NoResults,
    LowConfidence,
    Error,
    Cancelled,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Accepted => "ACCEPTED",
            SearchStatus::NoResults => "NO_RESULTS",
            SearchStatus::LowConfidence => "LOW_CONFIDENCE",
            SearchStatus::Error => "ERROR",
            SearchStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Why a search did not end in a confident match
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum SearchFailure {
    /// No selector in a list matched; recovered by moving on
    #[error("No selector matched: {0}")]
    SelectorNotFound(String),

    #[error("Transient network failure: {0}")]
    TransientNetworkFailure(String),

    #[error("No candidates found")]
    NoCandidatesFound,

    #[error("Best candidate scored {score:.3}, below threshold {threshold:.3}")]
    LowConfidenceMatch { score: f64, threshold: f64 },

    #[error("Site unavailable: {0}")]
    SiteUnavailable(String),

    #[error("Search cancelled")]
    Cancelled,
}

impl From<SearchFailure> for AppError {
    fn from(failure: SearchFailure) -> Self {
        match failure {
            SearchFailure::Cancelled => AppError::Cancelled(failure.to_string()),
            SearchFailure::NoCandidatesFound | SearchFailure::LowConfidenceMatch { .. } => {
                AppError::NotFound(failure.to_string())
            }
            SearchFailure::SelectorNotFound(_)
            | SearchFailure::TransientNetworkFailure(_)
            | SearchFailure::SiteUnavailable(_) => AppError::ExternalServiceError(failure.to_string()),
        }
    }
}

/// Typed result of `find_best_match`; never an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub site_id: String,
    pub query: String,
    pub url: Option<String>,
    pub score: Option<f64>,
    pub tier: Option<MatchTier>,
    /// Search submissions actually made, across all variants
    pub attempts: u32,
    pub candidate: Option<CandidateResult>,
    pub failure: Option<SearchFailure>,
}

impl SearchOutcome {
    fn base(status: SearchStatus, site_id: &str, query: &str, attempts: u32) -> Self {
        Self {
            status,
            site_id: site_id.to_string(),
            query: query.to_string(),
            url: None,
            score: None,
            tier: None,
            attempts,
            candidate: None,
            failure: None,
        }
    }

    fn with_candidate(mut self, best: ScoredCandidate) -> Self {
        self.url = Some(best.candidate.url.clone());
        self.score = Some(best.score.value);
        self.tier = Some(best.score.tier);
        self.candidate = Some(best.candidate);
        self
    }

    pub fn accepted(site_id: &str, query: &str, attempts: u32, best: ScoredCandidate) -> Self {
        Self::base(SearchStatus::Accepted, site_id, query, attempts).with_candidate(best)
    }

    pub fn low_confidence(
        site_id: &str,
        query: &str,
        attempts: u32,
        best: ScoredCandidate,
        threshold: f64,
    ) -> Self {
        let failure = SearchFailure::LowConfidenceMatch {
            score: best.score.value,
            threshold,
        };
        let mut outcome =
            Self::base(SearchStatus::LowConfidence, site_id, query, attempts).with_candidate(best);
        outcome.failure = Some(failure);
        outcome
    }

    pub fn no_results(site_id: &str, query: &str, attempts: u32, failure: SearchFailure) -> Self {
        let mut outcome = Self::base(SearchStatus::NoResults, site_id, query, attempts);
        outcome.failure = Some(failure);
        outcome
    }

    pub fn error(site_id: &str, query: &str, attempts: u32, cause: String) -> Self {
        let mut outcome = Self::base(SearchStatus::Error, site_id, query, attempts);
        outcome.failure = Some(SearchFailure::SiteUnavailable(cause));
        outcome
    }

    pub fn cancelled(site_id: &str, query: &str, attempts: u32) -> Self {
        let mut outcome = Self::base(SearchStatus::Cancelled, site_id, query, attempts);
        outcome.failure = Some(SearchFailure::Cancelled);
        outcome
    }

    pub fn is_accepted(&self) -> bool {
        self.status == SearchStatus::Accepted
    }

    /// The URL only when the match is confident
    pub fn accepted_url(&self) -> Option<&str> {
        if self.is_accepted() {
            self.url.as_deref()
        } else {
            None
        }
    }
}

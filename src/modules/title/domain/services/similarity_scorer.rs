use std::collections::BTreeSet;
use std::sync::LazyLock;

use strsim::levenshtein;

use super::keyword_extractor::KeywordExtractor;
use super::title_normalizer::TitleNormalizer;
use crate::modules::title::domain::value_objects::{MatchScore, MatchTier, NormalizedTitle};

/// Threshold used by `is_title_match` when the caller has no site-specific value
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

const EXACT_SCORE: f64 = 1.0;
const FORWARD_CONTAINMENT_SCORE: f64 = 0.9;
const REVERSE_CONTAINMENT_SCORE: f64 = 0.85;
const LONG_TITLE_CHARS: usize = 20;
const LONG_TITLE_FLOOR: f64 = 0.15;

fn clamp(lo: f64, hi: f64, x: f64) -> f64 {
    lo.max(hi.min(x))
}

/// Jaccard and common ratio of two sets; `None` if either is empty or they share nothing
fn overlap<T: Ord>(query: &BTreeSet<T>, candidate: &BTreeSet<T>) -> Option<(f64, f64)> {
    if query.is_empty() || candidate.is_empty() {
        return None;
    }

    let common = query.intersection(candidate).count();
    if common == 0 {
        return None;
    }

    let union = query.len() + candidate.len() - common;
    let jaccard = common as f64 / union as f64;
    let common_ratio = common as f64 / query.len().min(candidate.len()) as f64;
    Some((jaccard, common_ratio))
}

/// Keyword-set tier. `None` means the tier does not apply.
pub fn score_keyword_sets(query: &BTreeSet<String>, candidate: &BTreeSet<String>) -> Option<MatchScore> {
    let (jaccard, common_ratio) = overlap(query, candidate)?;

    let score = if jaccard >= 0.3 || common_ratio >= 0.5 {
        MatchScore::new(
            clamp(0.6, 0.9, jaccard * 1.5 + common_ratio * 0.5),
            MatchTier::KeywordHigh,
        )
    } else if jaccard >= 0.15 || common_ratio >= 0.3 {
        MatchScore::new(
            clamp(0.4, 0.7, jaccard * 1.8 + common_ratio * 0.6),
            MatchTier::KeywordMid,
        )
    } else {
        MatchScore::new(
            clamp(0.25, 0.5, jaccard * 2.0 + common_ratio * 0.8),
            MatchTier::KeywordLow,
        )
    };

    Some(score)
}

/// Word-set tier for space-delimited titles with at least two distinct words per side
pub fn score_word_sets(query: &NormalizedTitle, candidate: &NormalizedTitle) -> Option<MatchScore> {
    let query_words: BTreeSet<&str> = query.words().collect();
    let candidate_words: BTreeSet<&str> = candidate.words().collect();
    if query_words.len() < 2 || candidate_words.len() < 2 {
        return None;
    }

    let (jaccard, common_ratio) = overlap(&query_words, &candidate_words)?;

    let value = if jaccard > 0.15 {
        clamp(0.3, 0.8, (jaccard * 1.2).max(common_ratio * 0.8))
    } else {
        0.25_f64.max(jaccard * 1.5)
    };

    Some(MatchScore::new(value, MatchTier::WordLevel))
}

/// Character-level Levenshtein similarity with a floor for long titles
pub fn edit_distance_score(query: &NormalizedTitle, candidate: &NormalizedTitle) -> MatchScore {
    let max_len = query.char_len().max(candidate.char_len());
    if max_len == 0 {
        return MatchScore::new(0.0, MatchTier::EditDistance);
    }

    let distance = levenshtein(query.as_str(), candidate.as_str());
    let similarity = 1.0 - distance as f64 / max_len as f64;
    let floor = if max_len > LONG_TITLE_CHARS {
        LONG_TITLE_FLOOR
    } else {
        0.0
    };

    MatchScore::new(similarity.max(floor), MatchTier::EditDistance)
}

/// Scores how well a candidate title matches a query title.
///
/// Tiers are tried in a fixed order and the first that applies wins. The
/// score is not symmetric: containment direction decides between 0.9 and 0.85.
pub struct SimilarityScorer {
    normalizer: TitleNormalizer,
    keywords: KeywordExtractor,
}

impl SimilarityScorer {
    pub fn new(normalizer: TitleNormalizer, keywords: KeywordExtractor) -> Self {
        Self {
            normalizer,
            keywords,
        }
    }

    pub fn normalize(&self, title: &str) -> NormalizedTitle {
        self.normalizer.normalize(title)
    }

    pub fn score(&self, query: &str, candidate: &str) -> MatchScore {
        let query = self.normalize(query);
        let candidate = self.normalize(candidate);
        self.score_normalized(&query, &candidate)
    }

    pub fn score_normalized(&self, query: &NormalizedTitle, candidate: &NormalizedTitle) -> MatchScore {
        if query == candidate {
            return MatchScore::new(EXACT_SCORE, MatchTier::Exact);
        }

        if !query.is_empty() && candidate.contains(query) {
            return MatchScore::new(FORWARD_CONTAINMENT_SCORE, MatchTier::ContainmentForward);
        }

        if !candidate.is_empty() && query.contains(candidate) {
            return MatchScore::new(REVERSE_CONTAINMENT_SCORE, MatchTier::ContainmentReverse);
        }

        let query_keywords = self.keywords.extract(query);
        let candidate_keywords = self.keywords.extract(candidate);
        if let Some(score) = score_keyword_sets(&query_keywords, &candidate_keywords) {
            return score;
        }

        if let Some(score) = score_word_sets(query, candidate) {
            return score;
        }

        edit_distance_score(query, candidate)
    }

    pub fn is_match(&self, expected: &str, actual: &str, threshold: f64) -> bool {
        self.score(expected, actual).meets(threshold)
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(TitleNormalizer::default_pipeline(), KeywordExtractor::default())
    }
}

static DEFAULT_SCORER: LazyLock<SimilarityScorer> = LazyLock::new(SimilarityScorer::default);

/// Score with the default normalizer and genre lexicon
pub fn score(query: &str, candidate: &str) -> MatchScore {
    DEFAULT_SCORER.score(query, candidate)
}

pub fn is_title_match(expected: &str, actual: &str, threshold: f64) -> bool {
    DEFAULT_SCORER.is_match(expected, actual, threshold)
}

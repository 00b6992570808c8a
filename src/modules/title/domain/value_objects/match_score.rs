use serde::{Deserialize, Serialize};
use std::fmt;

/// Which scoring rule produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    Exact,
    #[serde(rename = "containment-fwd")]
    ContainmentForward,
    #[serde(rename = "containment-rev")]
    ContainmentReverse,
    KeywordHigh,
    KeywordMid,
    KeywordLow,
    WordLevel,
    EditDistance,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::ContainmentForward => "containment-fwd",
            MatchTier::ContainmentReverse => "containment-rev",
            MatchTier::KeywordHigh => "keyword-high",
            MatchTier::KeywordMid => "keyword-mid",
            MatchTier::KeywordLow => "keyword-low",
            MatchTier::WordLevel => "word-level",
            MatchTier::EditDistance => "edit-distance",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence that a candidate title names the same book as the query.
///
/// `value` is always within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub value: f64,
    pub tier: MatchTier,
}

impl MatchScore {
    pub fn new(value: f64, tier: MatchTier) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            tier,
        }
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.value >= threshold
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} ({})", self.value, self.tier)
    }
}

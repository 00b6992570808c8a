//! Title comparison: normalization, volume notation and similarity scoring

pub mod domain;

pub use domain::services::{
    create_volume_variants, extract_volume, is_title_match, normalize, render_in_style, score,
    SimilarityScorer,
};
pub use domain::value_objects::{MatchScore, MatchTier, NormalizedTitle, NotationStyle, VolumeToken};

pub mod match_score;
pub mod normalized_title;
pub mod volume_token;

pub use match_score::{MatchScore, MatchTier};
pub use normalized_title::NormalizedTitle;
pub use volume_token::{NotationStyle, VolumeToken};

pub mod keyword_extractor;
pub mod similarity_scorer;
pub mod title_normalizer;
pub mod volume_extractor;

pub use keyword_extractor::{KeywordExtractor, DEFAULT_GENRE_LEXICON};
pub use similarity_scorer::{is_title_match, score, SimilarityScorer, DEFAULT_MATCH_THRESHOLD};
pub use title_normalizer::{normalize, TitleNormalizer, TitleTransformation};
pub use volume_extractor::{
    create_volume_variants, extract_volume, render_in_style, VolumeExtraction, VolumeExtractor,
};

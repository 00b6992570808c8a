use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::modules::title::domain::value_objects::NormalizedTitle;

/// Annotation spans such as 【新装版】 or [完結] carry no title content
static ANNOTATION_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"【[^】]*】|《[^》]*》|\[[^\]]*\]").unwrap());

const BRACKET_GLYPHS: &[char] = &[
    '【', '】', '[', ']', '（', '）', '(', ')', '「', '」', '『', '』', '《', '》', '〈', '〉',
    '〔', '〕', '{', '}',
];

const DECORATIVE_SYMBOLS: &[char] = &[
    '★', '☆', '◆', '◇', '■', '□', '●', '○', '◎', '♪', '※', '・', '▼', '▽', '▲', '△', '♡', '♥',
];

/// Transformation that can be applied to a title
///
/// Each transformation is composable and testable in isolation.
pub trait TitleTransformation: Send + Sync {
    fn transform(&self, title: &str) -> String;
    fn name(&self) -> &'static str;
}

/// Unicode compatibility normalization (full-width forms, circled digits)
#[derive(Debug, Clone)]
pub struct NfkcTransform;

impl TitleTransformation for NfkcTransform {
    fn transform(&self, title: &str) -> String {
        title.nfkc().collect()
    }

    fn name(&self) -> &'static str {
        "Nfkc"
    }
}

/// Drops bracket-delimited annotation spans together with their content
#[derive(Debug, Clone)]
pub struct RemoveAnnotationsTransform;

impl TitleTransformation for RemoveAnnotationsTransform {
    fn transform(&self, title: &str) -> String {
        ANNOTATION_SPAN.replace_all(title, " ").into_owned()
    }

    fn name(&self) -> &'static str {
        "RemoveAnnotations"
    }
}

/// Deletes stray bracket glyphs, keeping whatever they enclosed
#[derive(Debug, Clone)]
pub struct RemoveBracketGlyphsTransform;

impl TitleTransformation for RemoveBracketGlyphsTransform {
    fn transform(&self, title: &str) -> String {
        title.chars().filter(|c| !BRACKET_GLYPHS.contains(c)).collect()
    }

    fn name(&self) -> &'static str {
        "RemoveBracketGlyphs"
    }
}

/// Trims leading and trailing decorative symbols (★, ◆, ♪ …)
#[derive(Debug, Clone)]
pub struct TrimDecorativeTransform;

impl TitleTransformation for TrimDecorativeTransform {
    fn transform(&self, title: &str) -> String {
        title
            .trim_matches(|c: char| c.is_whitespace() || DECORATIVE_SYMBOLS.contains(&c))
            .to_string()
    }

    fn name(&self) -> &'static str {
        "TrimDecorative"
    }
}

/// Lower-cases ASCII letters only; kana and kanji are left untouched
#[derive(Debug, Clone)]
pub struct AsciiLowercaseTransform;

impl TitleTransformation for AsciiLowercaseTransform {
    fn transform(&self, title: &str) -> String {
        title.to_ascii_lowercase()
    }

    fn name(&self) -> &'static str {
        "AsciiLowercase"
    }
}

/// Normalizes whitespace (collapses runs, trims)
#[derive(Debug, Clone)]
pub struct NormalizeWhitespaceTransform;

impl TitleTransformation for NormalizeWhitespaceTransform {
    fn transform(&self, title: &str) -> String {
        title.split_whitespace().collect::<Vec<&str>>().join(" ")
    }

    fn name(&self) -> &'static str {
        "NormalizeWhitespace"
    }
}

/// Canonical recomposition after characters were removed.
///
/// Deleting a glyph can leave a combining mark next to a new base character;
/// NFC folds that pair so a second pass over the output is a no-op.
#[derive(Debug, Clone)]
pub struct RecomposeTransform;

impl TitleTransformation for RecomposeTransform {
    fn transform(&self, title: &str) -> String {
        title.nfc().collect()
    }

    fn name(&self) -> &'static str {
        "Recompose"
    }
}

/// Title normalizer that applies a pipeline of transformations
///
/// Uses the builder pattern for composability and testability.
pub struct TitleNormalizer {
    transformations: Vec<Box<dyn TitleTransformation>>,
}

impl TitleNormalizer {
    /// Create a new empty normalizer
    pub fn new() -> Self {
        Self {
            transformations: Vec::new(),
        }
    }

    /// The pipeline used for every title comparison
    pub fn default_pipeline() -> Self {
        Self::new()
            .with_nfkc()
            .with_remove_annotations()
            .with_remove_bracket_glyphs()
            .with_trim_decorative()
            .with_ascii_lowercase()
            .with_normalize_whitespace()
            .with_recompose()
    }

    pub fn with_nfkc(mut self) -> Self {
        self.transformations.push(Box::new(NfkcTransform));
        self
    }

    pub fn with_remove_annotations(mut self) -> Self {
        self.transformations.push(Box::new(RemoveAnnotationsTransform));
        self
    }

    pub fn with_remove_bracket_glyphs(mut self) -> Self {
        self.transformations
            .push(Box::new(RemoveBracketGlyphsTransform));
        self
    }

    pub fn with_trim_decorative(mut self) -> Self {
        self.transformations.push(Box::new(TrimDecorativeTransform));
        self
    }

    pub fn with_ascii_lowercase(mut self) -> Self {
        self.transformations.push(Box::new(AsciiLowercaseTransform));
        self
    }

    pub fn with_normalize_whitespace(mut self) -> Self {
        self.transformations
            .push(Box::new(NormalizeWhitespaceTransform));
        self
    }

    pub fn with_recompose(mut self) -> Self {
        self.transformations.push(Box::new(RecomposeTransform));
        self
    }

    /// Add custom transformation
    pub fn with_custom(mut self, transformation: Box<dyn TitleTransformation>) -> Self {
        self.transformations.push(transformation);
        self
    }

    /// Apply all transformations in order
    pub fn normalize(&self, title: &str) -> NormalizedTitle {
        let mut result = title.to_string();

        for transformation in &self.transformations {
            let before = result.clone();
            result = transformation.transform(&result);

            if before != result {
                log::trace!(
                    "Transform '{}': '{}' -> '{}'",
                    transformation.name(),
                    before,
                    result
                );
            }
        }

        NormalizedTitle::new(result)
    }

    pub fn transformation_count(&self) -> usize {
        self.transformations.len()
    }

    pub fn transformation_names(&self) -> Vec<&'static str> {
        self.transformations.iter().map(|t| t.name()).collect()
    }
}

impl Default for TitleNormalizer {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

static DEFAULT_NORMALIZER: LazyLock<TitleNormalizer> = LazyLock::new(TitleNormalizer::default_pipeline);

/// Normalize with the default pipeline
pub fn normalize(title: &str) -> NormalizedTitle {
    DEFAULT_NORMALIZER.normalize(title)
}

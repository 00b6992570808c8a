use crate::modules::search::domain::config::SiteHints;
use crate::modules::search::domain::value_objects::{QueryVariant, VariantStrategy};
use crate::modules::title::domain::services::volume_extractor::{
    compact_renderings, notation_renderings, VolumeExtractor,
};

/// Produces the ordered, bounded list of queries tried for one book
pub struct QueryVariantGenerator {
    extractor: VolumeExtractor,
    max_variants: usize,
}

impl QueryVariantGenerator {
    pub fn new(max_variants: usize) -> Self {
        Self {
            extractor: VolumeExtractor::new(),
            max_variants,
        }
    }

    pub fn max_variants(&self) -> usize {
        self.max_variants
    }

    /// Priority order: exact phrase or original, volume notations, stripped
    /// base title, base title with genre suffix. Duplicates keep their first
    /// position and the list is cut at `max_variants`.
    pub fn generate_variants(&self, title: &str, hints: Option<&SiteHints>) -> Vec<QueryVariant> {
        let title = title.trim();
        if title.is_empty() {
            return Vec::new();
        }

        let default_hints = SiteHints::default();
        let hints = hints.unwrap_or(&default_hints);
        let mut variants: Vec<QueryVariant> = Vec::new();

        if hints.supports_exact_phrase {
            variants.push(QueryVariant::new(
                format!("\"{}\"", title),
                VariantStrategy::ExactPhrase,
            ));
        } else {
            variants.push(QueryVariant::new(title, VariantStrategy::Original));
        }

        let extraction = self.extractor.extract(title);
        let base = extraction.base_title.trim().to_string();

        if let Some(volume) = extraction.volume.filter(|_| !base.is_empty()) {
            let renderings = notation_renderings(&base, volume.value)
                .into_iter()
                .chain(compact_renderings(&base, volume.value));
            for rendering in renderings {
                variants.push(QueryVariant::new(rendering, VariantStrategy::VolumeNotation));
            }
            variants.push(QueryVariant::new(base.clone(), VariantStrategy::VolumeStripped));
        }

        if let Some(suffix) = hints.genre_suffix.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            variants.push(QueryVariant::new(
                format!("{} {}", base, suffix),
                VariantStrategy::GenreSuffix,
            ));
        }

        if let Some(domain) = hints.site_filter.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            for variant in variants.iter_mut() {
                variant.text = format!("site:{} {}", domain, variant.text);
            }
        }

        let mut unique: Vec<QueryVariant> = Vec::with_capacity(variants.len());
        for variant in variants {
            if !unique.iter().any(|v| v.text == variant.text) {
                unique.push(variant);
            }
        }
        unique.truncate(self.max_variants);

        log::debug!(
            "VARIANTS: {} queries for '{}': {:?}",
            unique.len(),
            title,
            unique.iter().map(|v| v.text.as_str()).collect::<Vec<_>>()
        );

        unique
    }
}

impl Default for QueryVariantGenerator {
    fn default() -> Self {
        Self::new(8)
    }
}

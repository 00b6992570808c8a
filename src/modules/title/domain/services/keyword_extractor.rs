use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::modules::title::domain::value_objects::NormalizedTitle;

static ASCII_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());
static IDEOGRAPH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Han}々]{2,}").unwrap());
static KATAKANA_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Katakana}ー]{2,}").unwrap());

/// Genre and subject words that light novel and tech book titles share
pub const DEFAULT_GENRE_LEXICON: &[&str] = &[
    "異世界",
    "転生",
    "魔法",
    "冒険",
    "勇者",
    "魔王",
    "rpg",
    "sf",
    "艦隊",
    "提督",
    "課長",
    "デザイン",
    "パターン",
    "設計",
    "手法",
    "入門",
    "プログラミング",
    "python",
    "ファンタジー",
    "小説",
    "物語",
    "魔法使い",
    "冒険者",
];

/// Splits a normalized title into a keyword set.
///
/// Keywords are the union of ASCII alphanumeric runs, runs of two or more
/// ideographs, runs of two or more katakana, and every lexicon entry that
/// occurs as a substring. Hiragana never forms a keyword on its own, which
/// keeps particles and okurigana out of the set.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    lexicon: Vec<String>,
}

impl KeywordExtractor {
    pub fn new(lexicon: Vec<String>) -> Self {
        let lexicon = lexicon
            .into_iter()
            .map(|entry| entry.trim().to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &[String] {
        &self.lexicon
    }

    pub fn extract(&self, title: &NormalizedTitle) -> BTreeSet<String> {
        let text = title.as_str();
        let mut keywords = BTreeSet::new();

        for regex in [&*ASCII_RUN, &*IDEOGRAPH_RUN, &*KATAKANA_RUN] {
            keywords.extend(regex.find_iter(text).map(|m| m.as_str().to_string()));
        }

        for entry in &self.lexicon {
            if text.contains(entry.as_str()) {
                keywords.insert(entry.clone());
            }
        }

        keywords
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_GENRE_LEXICON.iter().map(|s| s.to_string()).collect())
    }
}

use serde::{Deserialize, Serialize};

/// Why a query variant was generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantStrategy {
    ExactPhrase,
    Original,
    VolumeNotation,
    VolumeStripped,
    GenreSuffix,
}

/// One rendering of the query title to type into a search box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryVariant {
    pub text: String,
    pub strategy: VariantStrategy,
}

impl QueryVariant {
    pub fn new(text: impl Into<String>, strategy: VariantStrategy) -> Self {
        Self {
            text: text.into(),
            strategy,
        }
    }
}

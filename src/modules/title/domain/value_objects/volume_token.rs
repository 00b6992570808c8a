use serde::{Deserialize, Serialize};

/// The way a volume number is written in a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotationStyle {
    /// ① … ㊿
    Circled,
    /// 三巻, 十二話
    KanjiNumeral,
    /// 第3巻
    Dai,
    /// vol.3, Volume 3
    Vol,
    /// (3), （3）
    Parenthesized,
    /// "Title 3"
    ArabicSuffix,
}

impl NotationStyle {
    /// Every style, in recognizer precedence order
    pub const ALL: [NotationStyle; 6] = [
        NotationStyle::Circled,
        NotationStyle::KanjiNumeral,
        NotationStyle::Dai,
        NotationStyle::Vol,
        NotationStyle::Parenthesized,
        NotationStyle::ArabicSuffix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotationStyle::Circled => "circled",
            NotationStyle::KanjiNumeral => "kanji",
            NotationStyle::Dai => "dai",
            NotationStyle::Vol => "vol",
            NotationStyle::Parenthesized => "parenthesized",
            NotationStyle::ArabicSuffix => "arabic_suffix",
        }
    }
}

/// Volume number recognized in a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeToken {
    pub value: u32,
    pub style: NotationStyle,
}

impl VolumeToken {
    pub fn new(value: u32, style: NotationStyle) -> Self {
        Self { value, style }
    }
}

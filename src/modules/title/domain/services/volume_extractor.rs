use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::modules::title::domain::value_objects::{NotationStyle, VolumeToken};

static KANJI_VOLUME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第?(?:([一二三四五六七八九])?十([一二三四五六七八九])?|([一二三四五六七八九]))[巻話]")
        .unwrap()
});
static DAI_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第?\s*([0-9０-９]+)\s*巻").unwrap());
static VOL_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vol(?:ume)?\.?\s*([0-9０-９]+)").unwrap());
static PAREN_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（]\s*([0-9０-９]+)\s*[)）]\s*$").unwrap());
static TRAILING_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([0-9０-９]+)\s*$").unwrap());

const KANJI_DIGITS: [char; 9] = ['一', '二', '三', '四', '五', '六', '七', '八', '九'];
const FULL_WIDTH_DIGITS: [char; 10] = ['０', '１', '２', '３', '４', '５', '６', '７', '８', '９'];

/// Recognizes one volume notation inside a raw title
pub trait VolumeRecognizer: Send + Sync {
    /// Byte range of the matched notation and the volume number it encodes
    fn recognize(&self, title: &str) -> Option<(Range<usize>, u32)>;
    fn style(&self) -> NotationStyle;
}

/// ①…⑳, ㉑…㉟, ㊱…㊿
#[derive(Debug, Clone)]
pub struct CircledRecognizer;

impl VolumeRecognizer for CircledRecognizer {
    fn recognize(&self, title: &str) -> Option<(Range<usize>, u32)> {
        title.char_indices().find_map(|(idx, c)| {
            circled_value(c).map(|value| (idx..idx + c.len_utf8(), value))
        })
    }

    fn style(&self) -> NotationStyle {
        NotationStyle::Circled
    }
}

/// 三巻, 第十二巻, 二十話
#[derive(Debug, Clone)]
pub struct KanjiNumeralRecognizer;

impl VolumeRecognizer for KanjiNumeralRecognizer {
    fn recognize(&self, title: &str) -> Option<(Range<usize>, u32)> {
        let caps = KANJI_VOLUME.captures(title)?;
        let whole = caps.get(0)?;
        let digit = |idx: usize| caps.get(idx).and_then(|m| m.as_str().chars().next()).and_then(kanji_digit);

        let value = match caps.get(3) {
            Some(_) => digit(3)?,
            None => digit(1).unwrap_or(1) * 10 + digit(2).unwrap_or(0),
        };
        Some((whole.range(), value))
    }

    fn style(&self) -> NotationStyle {
        NotationStyle::KanjiNumeral
    }
}

// Recognizer over a regex whose first group is the number
macro_rules! regex_recognizer {
    ($name:ident, $regex:ident, $style:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name;

        impl VolumeRecognizer for $name {
            fn recognize(&self, title: &str) -> Option<(Range<usize>, u32)> {
                let caps = $regex.captures(title)?;
                let value = parse_digits(caps.get(1)?.as_str())?;
                Some((caps.get(0)?.range(), value))
            }

            fn style(&self) -> NotationStyle {
                $style
            }
        }
    };
}

regex_recognizer!(DaiRecognizer, DAI_VOLUME, NotationStyle::Dai);
regex_recognizer!(ParenthesizedRecognizer, PAREN_VOLUME, NotationStyle::Parenthesized);
regex_recognizer!(ArabicSuffixRecognizer, TRAILING_VOLUME, NotationStyle::ArabicSuffix);

/// vol.3, Vol 3, volume 3; not when glued to a preceding latin word
#[derive(Debug, Clone)]
pub struct VolRecognizer;

impl VolumeRecognizer for VolRecognizer {
    fn recognize(&self, title: &str) -> Option<(Range<usize>, u32)> {
        VOL_VOLUME.captures_iter(title).find_map(|caps| {
            let whole = caps.get(0)?;
            let glued = title[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphabetic());
            if glued {
                return None;
            }
            Some((whole.range(), parse_digits(caps.get(1)?.as_str())?))
        })
    }

    fn style(&self) -> NotationStyle {
        NotationStyle::Vol
    }
}

/// Result of running the recognizers over a title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeExtraction {
    pub base_title: String,
    pub volume: Option<VolumeToken>,
}

/// Precedence-ordered volume recognition
pub struct VolumeExtractor {
    recognizers: Vec<Box<dyn VolumeRecognizer>>,
}

impl VolumeExtractor {
    pub fn new() -> Self {
        Self {
            recognizers: vec![
                Box::new(CircledRecognizer),
                Box::new(KanjiNumeralRecognizer),
                Box::new(DaiRecognizer),
                Box::new(VolRecognizer),
                Box::new(ParenthesizedRecognizer),
                Box::new(ArabicSuffixRecognizer),
            ],
        }
    }

    /// First recognizer that matches wins; its text is cut out of the base title
    pub fn extract(&self, title: &str) -> VolumeExtraction {
        for recognizer in &self.recognizers {
            if let Some((range, value)) = recognizer.recognize(title) {
                let mut base = String::with_capacity(title.len());
                base.push_str(&title[..range.start]);
                base.push(' ');
                base.push_str(&title[range.end..]);

                let token = VolumeToken::new(value, recognizer.style());
                log::trace!("Volume {:?} recognized in '{}'", token, title);

                return VolumeExtraction {
                    base_title: collapse_whitespace(&base),
                    volume: Some(token),
                };
            }
        }

        VolumeExtraction {
            base_title: title.to_string(),
            volume: None,
        }
    }
}

impl Default for VolumeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_EXTRACTOR: LazyLock<VolumeExtractor> = LazyLock::new(VolumeExtractor::new);

pub fn extract_volume(title: &str) -> (String, Option<VolumeToken>) {
    let extraction = DEFAULT_EXTRACTOR.extract(title);
    (extraction.base_title, extraction.volume)
}

/// Write `base` with volume `n` in the given notation.
///
/// `None` when the style cannot express `n` (circled past 50, kanji past 99, zero).
pub fn render_in_style(base: &str, n: u32, style: NotationStyle) -> Option<String> {
    match style {
        NotationStyle::Circled => circled_glyph(n).map(|c| format!("{}{}", base, c)),
        NotationStyle::KanjiNumeral => to_kanji(n).map(|k| format!("{} {}巻", base, k)),
        NotationStyle::Dai => Some(format!("{} 第{}巻", base, n)),
        NotationStyle::Vol => Some(format!("{} vol.{}", base, n)),
        NotationStyle::Parenthesized => Some(format!("{}({})", base, n)),
        NotationStyle::ArabicSuffix => Some(format!("{} {}", base, n)),
    }
}

/// Styles storefront search boxes commonly index, in the order they are tried
pub const SEARCH_NOTATIONS: [NotationStyle; 4] = [
    NotationStyle::Circled,
    NotationStyle::ArabicSuffix,
    NotationStyle::Dai,
    NotationStyle::Parenthesized,
];

/// `base` with volume `n` in each search notation the style can express
pub fn notation_renderings(base: &str, n: u32) -> Vec<String> {
    SEARCH_NOTATIONS
        .iter()
        .filter_map(|style| render_in_style(base, n, *style))
        .collect()
}

/// Spaceless `baseN`, plus the full-width digit form for single digits
pub fn compact_renderings(base: &str, n: u32) -> Vec<String> {
    let mut renderings = vec![format!("{}{}", base, n)];
    if n <= 9 {
        renderings.push(format!("{}{}", base, FULL_WIDTH_DIGITS[n as usize]));
    }
    renderings
}

/// The input title plus every other volume rendering and the bare base title
pub fn create_volume_variants(title: &str) -> Vec<String> {
    let mut variants = vec![title.to_string()];

    let (base, volume) = extract_volume(title);
    let Some(token) = volume else {
        return variants;
    };
    if base.is_empty() {
        return variants;
    }

    let renderings = notation_renderings(&base, token.value)
        .into_iter()
        .chain(std::iter::once(base.clone()))
        .chain(compact_renderings(&base, token.value));

    for rendering in renderings {
        if !variants.contains(&rendering) {
            variants.push(rendering);
        }
    }

    variants
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn parse_digits(digits: &str) -> Option<u32> {
    let ascii: String = digits
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            other => other,
        })
        .collect();
    ascii.parse().ok()
}

fn circled_value(c: char) -> Option<u32> {
    let code = c as u32;
    match code {
        0x2460..=0x2473 => Some(code - 0x2460 + 1),
        0x3251..=0x325F => Some(code - 0x3251 + 21),
        0x32B1..=0x32BF => Some(code - 0x32B1 + 36),
        _ => None,
    }
}

fn circled_glyph(n: u32) -> Option<char> {
    let code = match n {
        1..=20 => 0x2460 + n - 1,
        21..=35 => 0x3251 + n - 21,
        36..=50 => 0x32B1 + n - 36,
        _ => return None,
    };
    char::from_u32(code)
}

fn kanji_digit(c: char) -> Option<u32> {
    KANJI_DIGITS
        .iter()
        .position(|&k| k == c)
        .map(|idx| idx as u32 + 1)
}

fn to_kanji(n: u32) -> Option<String> {
    if n == 0 || n > 99 {
        return None;
    }
    let (tens, ones) = (n / 10, n % 10);
    let mut out = String::new();
    if tens > 1 {
        out.push(KANJI_DIGITS[(tens - 1) as usize]);
    }
    if tens >= 1 {
        out.push('十');
    }
    if ones > 0 {
        out.push(KANJI_DIGITS[(ones - 1) as usize]);
    }
    Some(out)
}

//! Hebrew product-name normalization
//!
//! Turns retailer-specific product strings into a canonical form:
//! - markup and HTML entities removed
//! - Hebrew punctuation variants mapped to ASCII, niqqud and bidi marks dropped
//! - retailer chain names and promotional words removed
//! - whitespace collapsed
//!
//! The cleaned name is then classified against the term tables and reduced to
//! a `normalized_id`, the identity key used by the unifier. Names that differ
//! only in whitespace or punctuation variants share the same id.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::Html;

use crate::domain::product::{NormalizedAttributes, Weight, WeightUnit};
use crate::domain::services::term_tables::{TAXONOMY, Taxonomy};
use crate::domain::taxonomy::{
    KosherCertification, MeatCategory, MeatCut, ProcessingMethod, QualityGrade,
};

const NUMBER: &str =
    r"(?:(?P<thousands>\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?)|(?P<plain>\d+(?:[.,]\d{1,2})?))";

/// Currency-anchored price forms: shekel sign before the amount, after it,
/// or a shekel word after it. The leftmost match across all forms wins.
static CURRENCY_PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"₪\s*{NUMBER}"),
        format!(r"{NUMBER}\s*₪"),
        format!(r#"(?i){NUMBER}\s*(?:ש"ח|ש'ח|שח|שקלים|שקל|nis|ils)"#),
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Any bare number, used only when no currency-anchored form matches
static BARE_PRICE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(NUMBER).ok());

static WEIGHT_PATTERNS: Lazy<Vec<(Regex, WeightUnit)>> = Lazy::new(|| {
    [
        (
            r#"(\d+(?:[.,]\d+)?)\s*(?:ק"ג|ק'ג|קג|קילוגרם|קילו|kg)"#,
            WeightUnit::Kilogram,
        ),
        (
            r"(\d+(?:[.,]\d+)?)\s*(?:גרם|גר'|גר|ג'|grams|gram|gr|g)(?:[^\p{L}]|$)",
            WeightUnit::Gram,
        ),
        (
            r"(\d+)\s*(?:יחידות|יחידה|יח'|יח|חתיכות|units|unit|pcs)",
            WeightUnit::Unit,
        ),
    ]
    .into_iter()
    .filter_map(|(pattern, unit)| Regex::new(pattern).ok().map(|re| (re, unit)))
    .collect()
});

/// Maps one character to its canonical form, `None` drops it
fn canonical_char(c: char) -> Option<char> {
    match c {
        // gershayim and typographic double quotes
        '\u{05F4}' | '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => Some('"'),
        // geresh and typographic single quotes
        '\u{05F3}' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '`' | '\u{00B4}' => Some('\''),
        '\u{060C}' => Some(','),
        '\u{05BE}' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => Some('-'),
        // bidi controls, zero-width characters, BOM
        '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}' => None,
        // niqqud and cantillation marks
        '\u{0591}'..='\u{05BD}' | '\u{05BF}' | '\u{05C1}' | '\u{05C2}' | '\u{05C4}' | '\u{05C5}' | '\u{05C7}' => None,
        _ => Some(c),
    }
}

fn canonicalize_chars(text: &str) -> String {
    text.chars().filter_map(canonical_char).collect()
}

fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<Vec<_>>().join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hebrew letters (including final forms and Yiddish ligatures)
pub const fn is_hebrew_letter(c: char) -> bool {
    matches!(c, '\u{05D0}'..='\u{05EA}' | '\u{05F0}'..='\u{05F2}')
}

pub fn has_hebrew(text: &str) -> bool {
    text.chars().any(is_hebrew_letter)
}

/// Identity key of a product name.
///
/// Lowercased, whitespace runs become `_`, everything except Hebrew letters,
/// ASCII alphanumerics and `_` is dropped.
pub fn normalized_id(name: &str) -> String {
    canonicalize_chars(name)
        .to_lowercase()
        .split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| is_hebrew_letter(*c) || c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn capture_amount(caps: &Captures<'_>) -> Option<f64> {
    let amount = if let Some(m) = caps.name("thousands") {
        m.as_str().replace(',', "")
    } else {
        caps.name("plain")?.as_str().replace(',', ".")
    };
    amount.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

#[derive(Debug, Clone, Copy)]
pub struct TextNormalizer {
    taxonomy: &'static Taxonomy,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self { taxonomy: &*TAXONOMY }
    }

    /// Produces the canonical name, taxonomy attributes and identity key
    pub fn normalize(&self, raw_name: &str) -> NormalizedAttributes {
        let normalized_name = self.clean_name(raw_name);
        let lower = normalized_name.to_lowercase();

        NormalizedAttributes {
            english_name: self.translate_to_english(&normalized_name),
            category: self.category_of(&lower),
            cut: self.taxonomy.cuts.first_match(&lower).unwrap_or(MeatCut::Unknown),
            quality_grade: self
                .taxonomy
                .quality_grades
                .first_match(&lower)
                .unwrap_or(QualityGrade::Regular),
            processing_method: self
                .taxonomy
                .processing_methods
                .first_match(&lower)
                .unwrap_or(ProcessingMethod::Fresh),
            normalized_id: normalized_id(&normalized_name),
            normalized_name,
        }
    }

    /// Canonical display form of a product name
    pub fn clean_name(&self, raw_name: &str) -> String {
        let text = canonicalize_chars(&strip_markup(raw_name));
        text.split_whitespace()
            .filter(|word| {
                let core = word.trim_matches(|c: char| !c.is_alphanumeric());
                core.is_empty() || !self.taxonomy.is_noise_word(core)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn category_of(&self, lowercase_name: &str) -> MeatCategory {
        self.taxonomy
            .categories
            .first_match(lowercase_name)
            .unwrap_or(MeatCategory::Unknown)
    }

    /// First positive amount found in a price string
    pub fn extract_price(&self, text: &str) -> Option<f64> {
        let text = collapse_whitespace(&canonicalize_chars(&strip_markup(text)));
        let anchored = CURRENCY_PRICE_PATTERNS
            .iter()
            .filter_map(|pattern| {
                pattern.captures_iter(&text).find_map(|caps| {
                    let start = caps.get(0)?.start();
                    capture_amount(&caps).map(|amount| (start, amount))
                })
            })
            .min_by_key(|(start, _)| *start)
            .map(|(_, amount)| amount);

        anchored.or_else(|| {
            BARE_PRICE_PATTERN
                .as_ref()?
                .captures_iter(&text)
                .find_map(|caps| capture_amount(&caps))
        })
    }

    /// Package weight, or the `1kg` placeholder when none is found
    pub fn extract_weight(&self, text: &str) -> Weight {
        let text = canonicalize_chars(text).to_lowercase();
        WEIGHT_PATTERNS
            .iter()
            .find_map(|(pattern, unit)| {
                pattern.captures_iter(&text).find_map(|caps| {
                    let amount = caps.get(1)?.as_str().replace(',', ".").parse::<f64>().ok()?;
                    (amount.is_finite() && amount > 0.0).then(|| Weight::new(amount, *unit))
                })
            })
            .unwrap_or_else(Weight::placeholder)
    }

    /// Certification named on a kashrut badge; any other non-empty badge is plain kosher
    pub fn extract_kosher(&self, badge: &str) -> Option<KosherCertification> {
        let badge = collapse_whitespace(&canonicalize_chars(badge)).to_lowercase();
        if badge.is_empty() {
            return None;
        }
        Some(self.taxonomy.kosher.first_match(&badge).unwrap_or(KosherCertification::Kosher))
    }

    /// Transliterated brand for known Hebrew brands, the cleaned text otherwise
    pub fn map_brand(&self, brand: &str) -> Option<String> {
        let brand = collapse_whitespace(&canonicalize_chars(&strip_markup(brand)));
        if brand.is_empty() || brand.eq_ignore_ascii_case("unknown") {
            return None;
        }
        let mapped = self
            .taxonomy
            .brands
            .iter()
            .find(|(hebrew, _)| brand.contains(hebrew.as_str()))
            .map_or(brand.clone(), |(_, latin)| (*latin).to_string());
        Some(mapped)
    }

    /// Word-by-word English rendering; untranslated words are kept as they are
    pub fn translate_to_english(&self, cleaned_name: &str) -> String {
        if !has_hebrew(cleaned_name) {
            return cleaned_name.to_string();
        }
        cleaned_name
            .split_whitespace()
            .map(|word| {
                let core: String = word.chars().filter(|c| is_hebrew_letter(*c)).collect();
                self.taxonomy.translate_word(&core).unwrap_or(word)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

//! Hebrew/English term tables for the meat taxonomy
//!
//! Tables are ordered: when a name contains terms for more than one value the
//! entry listed first wins. [`TAXONOMY`] compiles them once into lowercase
//! lookup structures that are shared by every normalizer.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::domain::taxonomy::{
    KosherCertification, MeatCategory, MeatCut, ProcessingMethod, QualityGrade,
};

type TermEntry<T> = (T, &'static [&'static str]);

pub const CATEGORY_TERMS: &[TermEntry<MeatCategory>] = &[
    (MeatCategory::Beef, &["בקר", "beef"]),
    (MeatCategory::Chicken, &["עוף", "פרגית", "chicken"]),
    (MeatCategory::Lamb, &["כבש", "טלה", "lamb"]),
    (MeatCategory::Veal, &["עגל", "veal"]),
    (MeatCategory::Turkey, &["הודו", "turkey"]),
];

pub const CUT_TERMS: &[TermEntry<MeatCut>] = &[
    (MeatCut::Entrecote, &["אנטריקוט", "entrecote", "ribeye"]),
    (MeatCut::Filet, &["פילה", "filet", "fillet"]),
    (MeatCut::Breast, &["חזה", "breast"]),
    (MeatCut::Thigh, &["ירכיים", "ירך", "thigh"]),
    (MeatCut::Wing, &["כנפיים", "כנפי", "כנף", "wing"]),
    (MeatCut::Drumstick, &["שוקיים", "שוק", "drumstick"]),
    (MeatCut::Shoulder, &["כתף", "shoulder"]),
    (MeatCut::Ribs, &["צלעות", "ribs"]),
    (MeatCut::Cutlet, &["קוטלט", "שניצל", "cutlet", "schnitzel"]),
    (MeatCut::Sirloin, &["סינטה", "sirloin"]),
    (MeatCut::Neck, &["צוואר", "neck"]),
    (MeatCut::Leg, &["רגל", "leg"]),
];

pub const QUALITY_TERMS: &[TermEntry<QualityGrade>] = &[
    (QualityGrade::Wagyu, &["וואגיו", "ואגיו", "wagyu"]),
    (QualityGrade::Angus, &["אנגוס", "angus"]),
    (QualityGrade::Organic, &["אורגני", "organic"]),
    (QualityGrade::FreeRange, &["שדה חופשי", "free range", "free-range"]),
    (QualityGrade::Premium, &["פרימיום", "premium"]),
];

pub const PROCESSING_TERMS: &[TermEntry<ProcessingMethod>] = &[
    (ProcessingMethod::Smoked, &["מעושן", "smoked"]),
    (ProcessingMethod::Ground, &["טחון", "ground", "minced"]),
    (ProcessingMethod::Seasoned, &["מתובל", "seasoned", "marinated"]),
    (ProcessingMethod::Aged, &["מיושן", "aged"]),
    (ProcessingMethod::Frozen, &["קפוא", "frozen"]),
    (ProcessingMethod::Cooked, &["מבושל", "cooked"]),
    (ProcessingMethod::Roasted, &["צלוי", "roasted"]),
];

/// Most specific certification first; any other non-empty badge counts as plain kosher
pub const KOSHER_TERMS: &[TermEntry<KosherCertification>] = &[
    (KosherCertification::Badatz, &["בד\"ץ", "בדץ", "badatz"]),
    (KosherCertification::Mehadrin, &["מהדרין", "mehadrin"]),
    (KosherCertification::ChalavYisrael, &["חלב ישראל", "chalav yisrael"]),
    (KosherCertification::Pareve, &["פרווה", "פרוה", "pareve"]),
    (KosherCertification::Kosher, &["כשר", "kosher"]),
];

/// Hebrew brand names and their transliteration
pub const BRAND_TERMS: &[(&str, &str)] = &[
    ("טבע ועוף", "Teva V'Of"),
    ("עולם הטעם", "Olam HaTaam"),
    ("מעדני יהודה", "Maadanei Yehuda"),
    ("האח הגדול", "HaAch HaGadol"),
    ("זוגלובק", "Zoglovek"),
    ("תבור", "Tavor"),
    ("אל על", "El Al"),
    ("עוף טוב", "Of Tov"),
    ("מעדני מיקי", "Maadanei Miki"),
];

/// Retailer chain names and promotional words removed from product names
pub const NOISE_TERMS: &[&str] = &[
    "ויקטורי",
    "מגא",
    "שופרסל",
    "מבצע",
    "הנחה",
    "חדש",
    "victory",
    "mega",
    "shufersal",
];

/// Single-word Hebrew to English renderings
pub const TRANSLATIONS: &[(&str, &str)] = &[
    ("בקר", "beef"),
    ("עוף", "chicken"),
    ("פרגית", "chicken thigh"),
    ("כבש", "lamb"),
    ("טלה", "lamb"),
    ("עגל", "veal"),
    ("הודו", "turkey"),
    ("אנטריקוט", "entrecote"),
    ("פילה", "filet"),
    ("חזה", "breast"),
    ("ירך", "thigh"),
    ("ירכיים", "thighs"),
    ("כנף", "wing"),
    ("כנפיים", "wings"),
    ("שוק", "drumstick"),
    ("שוקיים", "drumsticks"),
    ("כתף", "shoulder"),
    ("צלעות", "ribs"),
    ("קוטלט", "cutlet"),
    ("שניצל", "schnitzel"),
    ("סינטה", "sirloin"),
    ("צוואר", "neck"),
    ("רגל", "leg"),
    ("פרימיום", "premium"),
    ("רגיל", "regular"),
    ("אנגוס", "angus"),
    ("וואגיו", "wagyu"),
    ("אורגני", "organic"),
    ("טחון", "ground"),
    ("מעושן", "smoked"),
    ("מיושן", "aged"),
    ("מתובל", "seasoned"),
    ("טרי", "fresh"),
    ("קפוא", "frozen"),
    ("מבושל", "cooked"),
    ("צלוי", "roasted"),
    ("קג", "kg"),
    ("קילו", "kg"),
    ("גרם", "gram"),
    ("ליברה", "pound"),
    ("יחידה", "unit"),
    ("חבילה", "package"),
    ("שדה", "field"),
    ("חופשי", "free"),
];

/// An ordered term table with lowercase terms
#[derive(Debug)]
pub struct CompiledTable<T: Copy> {
    entries: Vec<(T, Vec<String>)>,
}

impl<T: Copy> CompiledTable<T> {
    pub fn compile(source: &[TermEntry<T>]) -> Self {
        let entries = source
            .iter()
            .map(|(value, terms)| (*value, terms.iter().map(|t| t.to_lowercase()).collect()))
            .collect();
        Self { entries }
    }

    /// First entry (in table order) with a term found in `haystack`.
    ///
    /// ASCII terms must match whole words; Hebrew terms may carry a prefix
    /// letter such as ה or ו. `haystack` must already be lowercase.
    pub fn first_match(&self, haystack: &str) -> Option<T> {
        self.entries
            .iter()
            .find(|(_, terms)| terms.iter().any(|term| term_matches(haystack, term)))
            .map(|(value, _)| *value)
    }
}

fn term_matches(haystack: &str, term: &str) -> bool {
    if term.is_ascii() {
        contains_word(haystack, term)
    } else {
        haystack.contains(term)
    }
}

/// `term` occurs in `haystack` with no letter or digit directly on either side
fn contains_word(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, found)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + found.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Every table compiled once
#[derive(Debug)]
pub struct Taxonomy {
    pub categories: CompiledTable<MeatCategory>,
    pub cuts: CompiledTable<MeatCut>,
    pub quality_grades: CompiledTable<QualityGrade>,
    pub processing_methods: CompiledTable<ProcessingMethod>,
    pub kosher: CompiledTable<KosherCertification>,
    pub brands: Vec<(String, &'static str)>,
    pub noise: Vec<String>,
    pub translations: HashMap<&'static str, &'static str>,
}

impl Taxonomy {
    fn compile() -> Self {
        Self {
            categories: CompiledTable::compile(CATEGORY_TERMS),
            cuts: CompiledTable::compile(CUT_TERMS),
            quality_grades: CompiledTable::compile(QUALITY_TERMS),
            processing_methods: CompiledTable::compile(PROCESSING_TERMS),
            kosher: CompiledTable::compile(KOSHER_TERMS),
            brands: BRAND_TERMS
                .iter()
                .map(|(hebrew, latin)| ((*hebrew).to_string(), *latin))
                .collect(),
            noise: NOISE_TERMS.iter().map(|t| t.to_lowercase()).collect(),
            translations: TRANSLATIONS.iter().copied().collect(),
        }
    }

    pub fn is_noise_word(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.noise.iter().any(|noise| *noise == word)
    }

    pub fn translate_word(&self, word: &str) -> Option<&'static str> {
        self.translations.get(word).copied()
    }
}

pub static TAXONOMY: Lazy<Taxonomy> = Lazy::new(Taxonomy::compile);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_respects_table_order() {
        // "שוק" also occurs inside "שוקיים"; both map to drumstick
        assert_eq!(TAXONOMY.cuts.first_match("שוקיים עוף"), Some(MeatCut::Drumstick));
        // beef is listed before veal
        assert_eq!(TAXONOMY.categories.first_match("עגל בקר"), Some(MeatCategory::Beef));
        assert_eq!(TAXONOMY.categories.first_match("טופו"), None);
    }

    #[test]
    fn test_english_terms_match_lowercase_input() {
        assert_eq!(TAXONOMY.categories.first_match("angus beef burger"), Some(MeatCategory::Beef));
        assert_eq!(TAXONOMY.quality_grades.first_match("angus beef burger"), Some(QualityGrade::Angus));
    }

    #[test]
    fn test_english_terms_need_word_boundaries() {
        let name = "vacuum packaged beef legs";
        assert_eq!(TAXONOMY.processing_methods.first_match(name), None);
        assert_eq!(TAXONOMY.cuts.first_match(name), None);
        assert_eq!(TAXONOMY.categories.first_match(name), Some(MeatCategory::Beef));
        assert_eq!(TAXONOMY.processing_methods.first_match("dry-aged beef"), Some(ProcessingMethod::Aged));
        assert_eq!(TAXONOMY.quality_grades.first_match("free range chicken"), Some(QualityGrade::FreeRange));
    }

    #[test]
    fn test_hebrew_terms_match_with_prefix_letters() {
        assert_eq!(TAXONOMY.categories.first_match("והבקר הטחון"), Some(MeatCategory::Beef));
    }

    #[test]
    fn test_noise_words_are_whole_words() {
        assert!(TAXONOMY.is_noise_word("ויקטורי"));
        assert!(TAXONOMY.is_noise_word("Victory"));
        assert!(!TAXONOMY.is_noise_word("בקר"));
    }

    #[test]
    fn test_tables_have_no_empty_terms() {
        for (_, terms) in CATEGORY_TERMS {
            assert!(terms.iter().all(|t| !t.trim().is_empty()));
        }
        // noise is stripped word by word
        assert!(NOISE_TERMS.iter().all(|t| !t.contains(' ')));
    }
}

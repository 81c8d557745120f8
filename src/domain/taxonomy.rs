//! Canonical meat taxonomy
//!
//! Every normalized record is classified into these fixed enumerations. The
//! Hebrew/English vocabulary mapping onto them lives in
//! [`crate::domain::services::term_tables`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Animal category of a product
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeatCategory {
    Beef,
    Chicken,
    Lamb,
    Veal,
    Turkey,
    #[default]
    Unknown,
}

impl MeatCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beef => "beef",
            Self::Chicken => "chicken",
            Self::Lamb => "lamb",
            Self::Veal => "veal",
            Self::Turkey => "turkey",
            Self::Unknown => "unknown",
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for MeatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Butchery cut
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeatCut {
    Entrecote,
    Filet,
    Breast,
    Thigh,
    Wing,
    Drumstick,
    Shoulder,
    Ribs,
    Cutlet,
    Sirloin,
    Neck,
    Leg,
    #[default]
    Unknown,
}

impl MeatCut {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entrecote => "entrecote",
            Self::Filet => "filet",
            Self::Breast => "breast",
            Self::Thigh => "thigh",
            Self::Wing => "wing",
            Self::Drumstick => "drumstick",
            Self::Shoulder => "shoulder",
            Self::Ribs => "ribs",
            Self::Cutlet => "cutlet",
            Self::Sirloin => "sirloin",
            Self::Neck => "neck",
            Self::Leg => "leg",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MeatCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality grade, `Regular` when no grade term is present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    #[default]
    Regular,
    Premium,
    Angus,
    Wagyu,
    Organic,
    FreeRange,
}

impl QualityGrade {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Premium => "premium",
            Self::Angus => "angus",
            Self::Wagyu => "wagyu",
            Self::Organic => "organic",
            Self::FreeRange => "free_range",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing method, `Fresh` when nothing else is mentioned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    #[default]
    Fresh,
    Smoked,
    Ground,
    Seasoned,
    Aged,
    Frozen,
    Cooked,
    Roasted,
}

impl ProcessingMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Smoked => "smoked",
            Self::Ground => "ground",
            Self::Seasoned => "seasoned",
            Self::Aged => "aged",
            Self::Frozen => "frozen",
            Self::Cooked => "cooked",
            Self::Roasted => "roasted",
        }
    }
}

impl fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kashrut certification printed on a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KosherCertification {
    Badatz,
    Mehadrin,
    Kosher,
    ChalavYisrael,
    Pareve,
}

impl KosherCertification {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Badatz => "badatz",
            Self::Mehadrin => "mehadrin",
            Self::Kosher => "kosher",
            Self::ChalavYisrael => "chalav_yisrael",
            Self::Pareve => "pareve",
        }
    }
}

impl fmt::Display for KosherCertification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_taxonomy_fallbacks() {
        assert_eq!(MeatCategory::default(), MeatCategory::Unknown);
        assert_eq!(MeatCut::default(), MeatCut::Unknown);
        assert_eq!(QualityGrade::default(), QualityGrade::Regular);
        assert_eq!(ProcessingMethod::default(), ProcessingMethod::Fresh);
        assert!(!MeatCategory::Unknown.is_known());
        assert!(MeatCategory::Lamb.is_known());
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&QualityGrade::FreeRange).unwrap();
        assert_eq!(json, "\"free_range\"");
        assert_eq!(QualityGrade::FreeRange.to_string(), "free_range");

        let kosher: KosherCertification = serde_json::from_str("\"chalav_yisrael\"").unwrap();
        assert_eq!(kosher, KosherCertification::ChalavYisrael);
    }
}

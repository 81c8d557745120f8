//! Static listing fixtures for the reference adapters
//!
//! A fixture is a JSON object mapping a category path to the listings a
//! retailer shows on that page:
//!
//! ```json
//! { "/categories/meat-beef": [ { "title": "...", "price": "₪68.90" } ] }
//! ```
//!
//! Each category is decoded separately so that one malformed page does not
//! take the whole source down.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub type CategoryPages = BTreeMap<String, Value>;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("category {category}: {source}")]
    Category {
        category: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where a reference adapter reads its listings from
#[derive(Debug, Clone)]
pub enum FixtureSource {
    /// Bundled listing snapshot compiled into the binary
    Embedded(&'static str),
    File(PathBuf),
}

impl FixtureSource {
    pub fn new(embedded: &'static str, path: Option<PathBuf>) -> Self {
        path.map_or(Self::Embedded(embedded), Self::File)
    }

    pub async fn load(&self) -> Result<CategoryPages, FixtureError> {
        let text = match self {
            Self::Embedded(text) => (*text).to_string(),
            Self::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| FixtureError::Read { path: path.clone(), source })?,
        };
        Ok(serde_json::from_str(&text)?)
    }
}

/// Listings of one category page; a category missing from the fixture has none
pub fn category_listings<T: DeserializeOwned>(
    pages: &CategoryPages,
    category: &str,
) -> Result<Vec<T>, FixtureError> {
    match pages.get(category) {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|source| FixtureError::Category { category: category.to_string(), source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Listing {
        title: String,
    }

    const PAGES: &str = r#"{
        "/a": [{ "title": "חזה עוף" }],
        "/b": [{ "name": "missing title" }]
    }"#;

    #[tokio::test]
    async fn test_embedded_fixture_decodes_per_category() {
        let pages = FixtureSource::Embedded(PAGES).load().await.unwrap();

        let good: Vec<Listing> = category_listings(&pages, "/a").unwrap();
        assert_eq!(good, vec![Listing { title: "חזה עוף".to_string() }]);

        let bad: Result<Vec<Listing>, _> = category_listings(&pages, "/b");
        let err = bad.unwrap_err();
        assert!(matches!(&err, FixtureError::Category { category, .. } if category == "/b"));
        assert!(err.to_string().starts_with("category /b"));

        let missing: Vec<Listing> = category_listings(&pages, "/c").unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_file_fixture_overrides_embedded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "/x": [] }}"#).unwrap();

        let source = FixtureSource::new(PAGES, Some(file.path().to_path_buf()));
        let pages = source.load().await.unwrap();
        assert_eq!(pages.keys().collect::<Vec<_>>(), vec!["/x"]);
    }

    #[tokio::test]
    async fn test_unreadable_fixture_is_an_error() {
        let source = FixtureSource::File(PathBuf::from("/nonexistent/listings.json"));
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, FixtureError::Read { .. }));
        assert!(err.to_string().contains("cannot read"));
    }

    #[tokio::test]
    async fn test_malformed_fixture_is_a_json_error() {
        let err = FixtureSource::Embedded("[not json").load().await.unwrap_err();
        assert!(matches!(err, FixtureError::Json(_)));
    }
}

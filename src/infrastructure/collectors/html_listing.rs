//! Generic HTML listing collector
//!
//! Fetches configured category pages from a retailer site and extracts one
//! raw record per product container using CSS selector lists. For every
//! field the first selector yielding non-empty text wins.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::errors::{CollectorError, CollectorErrorKind};
use crate::domain::records::{RawRecord, SourceId};
use crate::domain::services::collector::SourceCollector;
use crate::infrastructure::config::HtmlSelectorConfig;
use crate::infrastructure::http_client::HttpClient;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectorError {
    #[error("no valid {field} selector in {candidates:?}")]
    NoValidSelector { field: &'static str, candidates: Vec<String> },
}

/// Selector lists compiled once per collector
#[derive(Debug)]
pub struct ListingSelectors {
    product_container: Vec<Selector>,
    name: Vec<Selector>,
    price: Vec<Selector>,
    weight: Vec<Selector>,
    original_price: Vec<Selector>,
    brand: Vec<Selector>,
    kosher: Vec<Selector>,
}

impl ListingSelectors {
    pub fn compile(config: &HtmlSelectorConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            product_container: Self::compile_required("product_container", &config.product_container)?,
            name: Self::compile_required("name", &config.name)?,
            price: Self::compile_required("price", &config.price)?,
            weight: Self::compile_optional(&config.weight),
            original_price: Self::compile_optional(&config.original_price),
            brand: Self::compile_optional(&config.brand),
            kosher: Self::compile_optional(&config.kosher),
        })
    }

    fn compile_required(
        field: &'static str,
        selector_strings: &[String],
    ) -> Result<Vec<Selector>, SelectorError> {
        let selectors = Self::compile_optional(selector_strings);
        if selectors.is_empty() {
            return Err(SelectorError::NoValidSelector {
                field,
                candidates: selector_strings.to_vec(),
            });
        }
        Ok(selectors)
    }

    fn compile_optional(selector_strings: &[String]) -> Vec<Selector> {
        selector_strings
            .iter()
            .filter_map(|selector_str| match Selector::parse(selector_str) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!("Failed to compile selector '{}': {}", selector_str, e);
                    None
                }
            })
            .collect()
    }
}

fn first_text(element: &ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        element.select(selector).find_map(|found| {
            let text = found.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
    })
}

/// Extracts the product tiles of one category page
pub fn parse_listing_page(
    source_id: &SourceId,
    selectors: &ListingSelectors,
    html: &str,
    category: &str,
) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let Some(container_selector) = selectors
        .product_container
        .iter()
        .find(|selector| document.select(selector).next().is_some())
    else {
        debug!("No product containers on {}", category);
        return Vec::new();
    };

    let mut records = Vec::new();
    for container in document.select(container_selector) {
        let (Some(name), Some(price)) = (
            first_text(&container, &selectors.name),
            first_text(&container, &selectors.price),
        ) else {
            debug!("Skipping product tile without name or price on {}", category);
            continue;
        };

        let mut record = RawRecord::new(source_id.clone(), name, price).with_category_hint(category);
        if let Some(weight) = first_text(&container, &selectors.weight) {
            record = record.with_weight(weight);
        }
        if let Some(original) = first_text(&container, &selectors.original_price) {
            record = record.with_original_price(original);
        }
        if let Some(brand) = first_text(&container, &selectors.brand) {
            record = record.with_brand(brand);
        }
        if let Some(kosher) = first_text(&container, &selectors.kosher) {
            record = record.with_kosher(kosher);
        }
        records.push(record);
    }
    records
}

pub struct HtmlListingCollector {
    source_id: SourceId,
    base_url: Url,
    categories: Vec<String>,
    selectors: ListingSelectors,
    http: HttpClient,
    timeout: Duration,
}

impl HtmlListingCollector {
    pub fn new(
        source_id: SourceId,
        base_url: Url,
        categories: Vec<String>,
        selectors: ListingSelectors,
        http: HttpClient,
        timeout: Duration,
    ) -> Self {
        Self { source_id, base_url, categories, selectors, http, timeout }
    }

    async fn fetch_category(&self, category: &str) -> Result<Vec<RawRecord>, String> {
        let url = self
            .base_url
            .join(category)
            .map_err(|e| format!("invalid category path {}: {}", category, e))?;
        let html = self.http.get_text(url.as_str()).await.map_err(|e| e.to_string())?;
        Ok(parse_listing_page(&self.source_id, &self.selectors, &html, category))
    }
}

#[async_trait]
impl SourceCollector for HtmlListingCollector {
    fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, CollectorError> {
        let mut records = Vec::new();
        let mut failed = 0;
        let mut last_error = String::new();

        for category in &self.categories {
            match self.fetch_category(category).await {
                Ok(page) => {
                    debug!("🔍 {} {}: {} listings", self.source_id, category, page.len());
                    records.extend(page);
                }
                Err(e) => {
                    warn!("⚠️ {} category {} failed: {}", self.source_id, category, e);
                    failed += 1;
                    last_error = e;
                }
            }
        }

        if failed > 0 && failed == self.categories.len() {
            return Err(CollectorError::new(
                self.source_id.clone(),
                CollectorErrorKind::AllCategoriesFailed { attempted: failed, last_error },
            ));
        }

        info!("✅ {} collected {} listings", self.source_id, records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="tile">
            <h3 class="title">אנטריקוט בקר <b>טרי</b></h3>
            <span class="price">₪ 89.90</span>
            <span class="was">₪99.90</span>
            <span class="size">1 ק"ג</span>
            <span class="kashrut">מהדרין</span>
          </div>
          <div class="tile">
            <h3 class="title">חזה עוף</h3>
          </div>
          <div class="tile">
            <span class="name-alt">כנפי עוף</span>
            <span class="price">₪24.90</span>
          </div>
        </body></html>
    "#;

    fn selectors() -> ListingSelectors {
        let list = |items: &[&str]| items.iter().map(ToString::to_string).collect::<Vec<_>>();
        ListingSelectors::compile(&HtmlSelectorConfig {
            product_container: list(&["article.product", ".tile"]),
            name: list(&[".title", ".name-alt"]),
            price: list(&[".price"]),
            weight: list(&[".size"]),
            original_price: list(&[".was"]),
            brand: list(&[".brand"]),
            kosher: list(&[".kashrut"]),
        })
        .unwrap()
    }

    #[test]
    fn test_parse_listing_page() {
        let source = SourceId::new("corner-butcher");
        let records = parse_listing_page(&source, &selectors(), PAGE, "/meat");

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.name, "אנטריקוט בקר טרי");
        assert_eq!(first.price_text, "₪ 89.90");
        assert_eq!(first.original_price_text.as_deref(), Some("₪99.90"));
        assert_eq!(first.weight_text.as_deref(), Some("1 ק\"ג"));
        assert_eq!(first.kosher_text.as_deref(), Some("מהדרין"));
        assert_eq!(first.brand, None);
        assert_eq!(first.category_hint.as_deref(), Some("/meat"));

        assert_eq!(records[1].name, "כנפי עוף");
    }

    #[test]
    fn test_page_without_containers_is_empty() {
        let source = SourceId::new("corner-butcher");
        assert!(parse_listing_page(&source, &selectors(), "<p>סגור</p>", "/meat").is_empty());
    }

    #[test]
    fn test_required_selectors_must_compile() {
        let config = HtmlSelectorConfig {
            product_container: vec!["<<<".to_string()],
            name: vec![".title".to_string()],
            price: vec![".price".to_string()],
            weight: Vec::new(),
            original_price: Vec::new(),
            brand: Vec::new(),
            kosher: Vec::new(),
        };
        let err = ListingSelectors::compile(&config).unwrap_err();
        assert_eq!(
            err,
            SelectorError::NoValidSelector {
                field: "product_container",
                candidates: vec!["<<<".to_string()],
            }
        );
        assert!(err.to_string().contains("product_container"));
    }
}

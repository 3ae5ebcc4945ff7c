use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

use super::strategy::StrategyError;
use crate::http::PageSnapshot;
use crate::storage::types::PlayerField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Profile,
    Bio,
}

/// One item of a structured list, e.g. an award title and the years it was won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub label: String,
    pub detail: String,
}

impl RawEntry {
    pub fn new(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: detail.into(),
        }
    }
}

/// Extractor output before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Entries(Vec<RawEntry>),
}

impl RawValue {
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Text(text) => text.trim().is_empty(),
            RawValue::Entries(entries) => entries.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(text) => Some(text),
            RawValue::Entries(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    values: BTreeMap<PlayerField, RawValue>,
}

impl ExtractionResult {
    pub fn insert(&mut self, field: PlayerField, value: RawValue) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: PlayerField) -> Option<&RawValue> {
        self.values.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerField, &RawValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parsed snapshot that strategies query.
pub struct Document {
    url: Option<Url>,
    html: Html,
}

impl Document {
    pub fn parse(page: &PageSnapshot) -> Self {
        Self {
            url: Some(page.url.clone()),
            html: Html::parse_document(&page.body),
        }
    }

    pub fn from_html(body: &str) -> Self {
        Self {
            url: None,
            html: Html::parse_document(body),
        }
    }

    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, StrategyError> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).collect())
    }

    /// Absolute form of a link found in the document.
    pub fn resolve(&self, link: &str) -> String {
        match &self.url {
            Some(base) => base
                .join(link)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| link.to_string()),
            None => link.to_string(),
        }
    }
}

pub fn parse_selector(css: &str) -> Result<Selector, StrategyError> {
    Selector::parse(css).map_err(|e| StrategyError::Selector {
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Visible text of an element with whitespace runs collapsed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::base::{collapse_whitespace, element_text, parse_selector, Document, RawEntry, RawValue};

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A single way of locating a field in a document. Strategies are plain data
/// so the table can be revised from a JSON file when the markup drifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Text of the first matching element that has any.
    Text { selector: String },

    /// Attribute of the first matching element, optionally only where the
    /// value contains `contains`. Links are resolved against the page URL.
    Attr {
        selector: String,
        attr: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contains: Option<String>,
    },

    /// Remainder of the first `items` element whose text starts with `label`.
    Labeled { items: String, label: String },

    /// Capture group 1 of `pattern` applied to the `href` of matching links.
    LinkSlug { selector: String, pattern: String },

    /// First matching element whose text matches `pattern`; yields group 1
    /// when the pattern has one, the whole match otherwise.
    Pattern { selector: String, pattern: String },

    /// Label and detail sub-element text of every `items` element.
    Entries {
        items: String,
        label: String,
        detail: String,
    },

    /// Label (group 1) and detail (group 2) parsed from each item's text.
    EntryPattern { items: String, pattern: String },
}

impl Strategy {
    pub fn text(selector: &str) -> Self {
        Strategy::Text {
            selector: selector.to_string(),
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Strategy::Attr {
            selector: selector.to_string(),
            attr: attr.to_string(),
            contains: None,
        }
    }

    pub fn attr_containing(selector: &str, attr: &str, contains: &str) -> Self {
        Strategy::Attr {
            selector: selector.to_string(),
            attr: attr.to_string(),
            contains: Some(contains.to_string()),
        }
    }

    pub fn labeled(items: &str, label: &str) -> Self {
        Strategy::Labeled {
            items: items.to_string(),
            label: label.to_string(),
        }
    }

    pub fn link_slug(selector: &str, pattern: &str) -> Self {
        Strategy::LinkSlug {
            selector: selector.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn pattern(selector: &str, pattern: &str) -> Self {
        Strategy::Pattern {
            selector: selector.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn entries(items: &str, label: &str, detail: &str) -> Self {
        Strategy::Entries {
            items: items.to_string(),
            label: label.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn entry_pattern(items: &str, pattern: &str) -> Self {
        Strategy::EntryPattern {
            items: items.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn apply(&self, doc: &Document) -> Result<Option<RawValue>, StrategyError> {
        let value = match self {
            Strategy::Text { selector } => doc
                .select(selector)?
                .iter()
                .map(element_text)
                .find(|text| !text.is_empty())
                .map(RawValue::Text),

            Strategy::Attr {
                selector,
                attr,
                contains,
            } => doc
                .select(selector)?
                .iter()
                .filter_map(|el| el.value().attr(attr))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .find(|value| contains.as_ref().map_or(true, |c| value.contains(c.as_str())))
                .map(|value| RawValue::Text(doc.resolve(value))),

            Strategy::Labeled { items, label } => doc
                .select(items)?
                .iter()
                .map(element_text)
                .find_map(|text| strip_label(&text, label))
                .map(RawValue::Text),

            Strategy::LinkSlug { selector, pattern } => {
                let re = Regex::new(pattern)?;
                doc.select(selector)?
                    .iter()
                    .filter_map(|el| el.value().attr("href"))
                    .find_map(|href| {
                        re.captures(href)
                            .and_then(|caps| caps.get(1))
                            .map(|m| m.as_str().to_string())
                    })
                    .map(RawValue::Text)
            }

            Strategy::Pattern { selector, pattern } => {
                let re = Regex::new(pattern)?;
                doc.select(selector)?
                    .iter()
                    .map(element_text)
                    .find_map(|text| {
                        re.captures(&text).map(|caps| {
                            caps.get(1)
                                .or_else(|| caps.get(0))
                                .map(|m| m.as_str().to_string())
                                .unwrap_or_default()
                        })
                    })
                    .map(RawValue::Text)
            }

            Strategy::Entries {
                items,
                label,
                detail,
            } => {
                let label_sel = parse_selector(label)?;
                let detail_sel = parse_selector(detail)?;
                let entries: Vec<RawEntry> = doc
                    .select(items)?
                    .iter()
                    .filter_map(|item| {
                        let label = item.select(&label_sel).next().map(|el| element_text(&el))?;
                        if label.is_empty() {
                            return None;
                        }
                        let detail = item
                            .select(&detail_sel)
                            .next()
                            .map(|el| element_text(&el))
                            .unwrap_or_default();
                        Some(RawEntry::new(label, detail))
                    })
                    .collect();
                Some(RawValue::Entries(entries))
            }

            Strategy::EntryPattern { items, pattern } => {
                let re = Regex::new(pattern)?;
                let entries: Vec<RawEntry> = doc
                    .select(items)?
                    .iter()
                    .map(element_text)
                    .filter_map(|text| {
                        let caps = re.captures(&text)?;
                        let label = collapse_whitespace(caps.get(1)?.as_str());
                        let detail = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                        Some(RawEntry::new(label, detail))
                    })
                    .collect();
                Some(RawValue::Entries(entries))
            }
        };

        Ok(value.filter(|v| !v.is_empty()))
    }
}

fn strip_label(text: &str, label: &str) -> Option<String> {
    let head = text.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = text[label.len()..]
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

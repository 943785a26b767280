//! Parsed-page querying: CSS selection, text flattening, reference
//! harvesting.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

const INVENTORY_CAP: usize = 15;

/// Flatten an element's text nodes into one whitespace-collapsed string.
/// Inner markup disappears; `<td>a <b>b</b></td>` reads as `"a b"`.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A parsed page plus the URL its relative references resolve against.
///
/// `scraper::Html` is not `Send`, so documents are materialized on demand
/// from the stored body and never held across awaits.
pub struct Document {
    html: Html,
    base: Option<Url>,
}

impl Document {
    /// Parse an HTML body. An absent or unparseable base disables relative
    /// reference resolution.
    pub fn parse(body: &str, base: Option<&str>) -> Self {
        Self {
            html: Html::parse_document(body),
            base: base.and_then(|b| Url::parse(b).ok()),
        }
    }

    fn selector(selector: &str) -> Result<Selector> {
        Selector::parse(selector).map_err(|_| Error::Selector(selector.to_string()))
    }

    /// First element matching a CSS selector.
    pub fn select_one(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let sel = Self::selector(selector)?;
        Ok(self.html.select(&sel).next())
    }

    /// All elements matching a CSS selector, in document order.
    pub fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let sel = Self::selector(selector)?;
        Ok(self.html.select(&sel).collect())
    }

    /// Flattened text of every match.
    pub fn select_text(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self.select_all(selector)?.iter().map(element_text).collect())
    }

    /// Attribute value of the first match.
    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .select_one(selector)?
            .and_then(|el| el.value().attr(name).map(str::to_string)))
    }

    /// Unique anchor targets, resolved against the base, in document order.
    pub fn links(&self) -> Vec<String> {
        let sel = Selector::parse("a[href]").unwrap();
        self.resolved_attrs(&sel, "href")
    }

    /// Unique image sources, resolved against the base, in document order.
    pub fn images(&self) -> Vec<String> {
        let sel = Selector::parse("img[src]").unwrap();
        self.resolved_attrs(&sel, "src")
    }

    fn resolved_attrs(&self, sel: &Selector, attr: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.html.select(sel) {
            let raw = element.value().attr(attr).unwrap_or("");
            if raw.is_empty() || raw.starts_with('#') || raw.starts_with("javascript:") {
                continue;
            }
            let resolved = match &self.base {
                Some(base) => base.join(raw),
                None => Url::parse(raw),
            };
            let resolved = match resolved {
                Ok(u) => u.to_string(),
                Err(e) => {
                    debug!(raw, error = %e, "skipping unresolvable reference");
                    continue;
                }
            };
            if seen.insert(resolved.clone()) {
                out.push(resolved);
            }
        }
        out
    }

    /// Up to 15 distinct tag names, ids, and classes in document order.
    /// A first look at an unfamiliar page before writing selectors.
    pub fn selector_inventory(&self) -> SelectorInventory {
        let all = Selector::parse("*").unwrap();
        let mut inv = SelectorInventory::default();
        for element in self.html.select(&all) {
            push_capped(&mut inv.tags, element.value().name());
            if let Some(id) = element.value().id() {
                push_capped(&mut inv.ids, id);
            }
            for class in element.value().classes() {
                push_capped(&mut inv.classes, class);
            }
        }
        inv
    }
}

/// What a page offers to selectors: tag names, ids, classes.
#[derive(Debug, Default)]
pub struct SelectorInventory {
    pub tags: Vec<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
}

fn push_capped(list: &mut Vec<String>, value: &str) {
    if list.len() < INVENTORY_CAP && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

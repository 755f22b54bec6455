use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::{element_text, parse_selector};
use crate::candidate::IndexHint;
use crate::error::Result;
use crate::text::collapse_ws;

static SLUG_HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}(?:-\d{2})?)/?$").expect("valid regex"));
static CANCELED_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*-\s*canceled\s*$").expect("valid regex"));

/// Date/location hints from the devmtg index page.
///
/// Each `<li><a href="2024-10/">October 22-24, 2024</a> - Santa Clara, CA</li>`
/// becomes one entry keyed by slug; a trailing "- Canceled" is dropped from
/// the location.
pub fn parse_index_hints(html: &str) -> Result<BTreeMap<String, IndexHint>> {
    let document = Html::parse_document(html);
    let li_selector = parse_selector("li")?;
    let anchor_selector = parse_selector("a[href]")?;

    let mut hints = BTreeMap::new();
    for li in document.select(&li_selector) {
        let Some((anchor, slug)) = li.select(&anchor_selector).find_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let caps = SLUG_HREF_RE.captures(href)?;
            Some((anchor, caps[1].to_string()))
        }) else {
            continue;
        };

        let rest = text_after(&anchor);
        let location = match rest.split_once('-') {
            Some((_, after)) => collapse_ws(after),
            None => rest,
        };
        let location = CANCELED_SUFFIX_RE.replace(&location, "").trim().to_string();

        hints.insert(
            slug,
            IndexHint {
                date: element_text(&anchor),
                location,
            },
        );
    }
    Ok(hints)
}

/// Text of everything following `element` inside its parent.
fn text_after(element: &ElementRef<'_>) -> String {
    let parts: Vec<String> = element
        .next_siblings()
        .map(|node| match ElementRef::wrap(node) {
            Some(el) => element_text(&el),
            None => node
                .value()
                .as_text()
                .map(|t| t.to_string())
                .unwrap_or_default(),
        })
        .collect();
    collapse_ws(&parts.join(" "))
}

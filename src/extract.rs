//! Heuristic extraction of thumbnail/full image URL pairs from a page.
//!
//! There is no universal markup standard for "the original image", so the
//! full-resolution guess walks an ordered chain of signals (enclosing link,
//! explicit data attributes, source-set tail, plain sources) gated by an
//! image-extension/keyword filter, while the thumbnail guess takes the first
//! source that resolves at all. Precision for `full`, recall for `thumb`.

use crate::resolve::resolve;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

/// A discovered thumbnail/full URL pair believed to reference an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub thumb: Url,
    pub full: Url,
}

/// One image-bearing element, decoupled from the HTML parser so the
/// heuristic chains are testable against plain structs.
pub trait ImageElement {
    /// Attribute value as written in the markup.
    fn attr(&self, name: &str) -> Option<String>;
    /// href of the nearest enclosing `<a>`, if any.
    fn enclosing_href(&self) -> Option<String>;
}

/// Parsed page exposing image-bearing elements in document order.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All `<img>` elements in document order.
    pub fn image_elements(&self) -> Vec<DomImage<'_>> {
        let selector = Selector::parse("img").unwrap();
        self.html.select(&selector).map(DomImage).collect()
    }
}

/// `ImageElement` view over a parsed `<img>` element.
pub struct DomImage<'a>(ElementRef<'a>);

impl ImageElement for DomImage<'_> {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.value().attr(name).map(str::to_string)
    }

    fn enclosing_href(&self) -> Option<String> {
        self.0
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a")
            .and_then(|a| a.value().attr("href").map(str::to_string))
    }
}

/// First and last URL tokens of a source-set attribute.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SrcsetEnds {
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Pick the first and last URL tokens out of a `srcset` value.
///
/// Entries are comma-separated, each a URL token optionally followed by a
/// width or density descriptor. Sets are conventionally ordered low to high
/// resolution, so the last entry doubles as a higher-resolution hint.
pub fn srcset_ends(srcset: Option<&str>) -> SrcsetEnds {
    let Some(srcset) = srcset else {
        return SrcsetEnds::default();
    };
    let urls: Vec<&str> = srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .collect();
    SrcsetEnds {
        first: urls.first().map(|s| s.to_string()),
        last: urls.last().map(|s| s.to_string()),
    }
}

/// Parse raw HTML and extract candidates in one step.
///
/// `scraper` documents are not `Send`; async callers run this inside
/// `tokio::task::spawn_blocking`.
pub fn extract_from_html(html: &str, base: &Url) -> Vec<ImageCandidate> {
    let doc = HtmlDocument::parse(html);
    extract(doc.image_elements(), base)
}

/// Run the candidate heuristics over image-bearing elements in order.
pub fn extract<E: ImageElement>(
    elements: impl IntoIterator<Item = E>,
    base: &Url,
) -> Vec<ImageCandidate> {
    let mut found = Vec::new();

    for el in elements {
        let src = el.attr("src");
        let data_src = el.attr("data-src");
        let ends = srcset_ends(el.attr("srcset").as_deref());

        let full = full_url(&el, &src, &data_src, &ends, base);
        let thumb = thumb_url(&src, &data_src, &ends, base);

        // Either side can stand in for a missing other; an element with
        // neither contributes nothing.
        let (thumb, full) = match (thumb, full) {
            (Some(thumb), Some(full)) => (thumb, full),
            (Some(thumb), None) => (thumb.clone(), thumb),
            (None, Some(full)) => (full.clone(), full),
            (None, None) => continue,
        };

        found.push(ImageCandidate { thumb, full });
    }

    found
}

/// Case-insensitive pattern for common raster/vector image file extensions
/// at the end of a URL path, compiled once.
fn image_ext_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\.(jpe?g|png|gif|webp|avif|svg)$").unwrap())
}

/// Does this resolved URL look like a full-resolution asset: an image file
/// extension on the path, or a path mentioning "/orig" or "large" (several
/// galleries expose original-size endpoints without an extension).
fn looks_full_size(url: &Url) -> bool {
    let path = url.path();
    image_ext_pattern().is_match(path) || path.contains("/orig") || path.contains("large")
}

/// The gated priority chain for the full-resolution guess, then the ungated
/// fallback chain. Tiers are tried in order; the first hit wins. A tier that
/// fails to resolve or fails the gate never blocks later tiers.
fn full_url<E: ImageElement>(
    el: &E,
    src: &Option<String>,
    data_src: &Option<String>,
    ends: &SrcsetEnds,
    base: &Url,
) -> Option<Url> {
    let gated = [
        el.enclosing_href(),
        el.attr("data-full"),
        el.attr("data-original"),
        el.attr("data-large"),
        ends.last.clone(),
        src.clone(),
        data_src.clone(),
    ];
    for raw in &gated {
        if let Some(url) = resolve(raw.as_deref(), base) {
            if looks_full_size(&url) {
                return Some(url);
            }
        }
    }

    let fallback = [src, data_src, &ends.last, &ends.first];
    fallback.iter().find_map(|raw| resolve(raw.as_deref(), base))
}

/// Ungated thumbnail chain: any resolvable source is an acceptable preview.
fn thumb_url(
    src: &Option<String>,
    data_src: &Option<String>,
    ends: &SrcsetEnds,
    base: &Url,
) -> Option<Url> {
    [src, data_src, &ends.first, &ends.last]
        .iter()
        .find_map(|raw| resolve(raw.as_deref(), base))
}

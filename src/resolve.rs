//! Resolution of raw markup references into absolute http(s) URLs.
//!
//! Markup hands us everything from clean absolute URLs to relative paths,
//! protocol-relative references, inline `data:` payloads and javascript
//! pseudo-links. This module is the single choke point that turns a raw
//! attribute value into something fetchable, or rejects it.

use url::Url;

/// Resolve a raw attribute value against the page URL it was found on.
///
/// Returns `None` for absent or blank input, `data:`/`blob:` payloads,
/// values that do not parse relative to `base`, and any resolved scheme
/// other than http or https. Query strings and fragments survive
/// resolution untouched.
pub fn resolve(raw: Option<&str>, base: &Url) -> Option<Url> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.starts_with("data:") || trimmed.starts_with("blob:") {
        return None;
    }
    let resolved = base.join(trimmed).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

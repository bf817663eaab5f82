//! Discovery orchestration: fetch the requested pages, extract candidates,
//! merge them deduplicated, and expose a paginated view.
//!
//! Pages are fetched concurrently but merged in input order, so the
//! first-occurrence-wins dedup is deterministic regardless of which fetch
//! finishes first. A failed page is an empty contribution, never an error.

use crate::config::DiscoveryLimits;
use crate::extract::{self, ImageCandidate};
use crate::fetch::Fetcher;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// One page of merged discovery results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    /// The slice of candidates for the requested result page.
    pub images: Vec<ImageCandidate>,
    /// Whether the merged list extends beyond this page's end.
    pub has_more: bool,
    /// Length of the complete merged list.
    pub total: usize,
}

/// The discovery engine.
pub struct Discovery {
    fetcher: Fetcher,
    limits: DiscoveryLimits,
}

impl Discovery {
    pub fn new(fetcher: Fetcher, limits: DiscoveryLimits) -> Self {
        Self { fetcher, limits }
    }

    /// Discover image candidates across `pages` and return the 1-based
    /// result page `page`. Page indexes at or below zero read as page one.
    ///
    /// At most `max_pages` entries of `pages` are considered; the cap is
    /// applied before per-URL validation, so an invalid entry inside the cap
    /// still consumes a slot. This never fails: an empty result is the
    /// honest answer when nothing was usable.
    pub async fn discover(&self, pages: &[String], page: i64) -> DiscoveryResult {
        if pages.len() > self.limits.max_pages {
            warn!(
                "ignoring {} page(s) past the {}-page cap",
                pages.len() - self.limits.max_pages,
                self.limits.max_pages
            );
        }
        let considered = &pages[..pages.len().min(self.limits.max_pages)];

        let mut fetches = stream::iter(considered.iter().cloned())
            .map(|raw| self.page_candidates(raw))
            .buffered(self.limits.max_pages.max(1));

        let mut merged: Vec<ImageCandidate> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(found) = fetches.next().await {
            for candidate in found {
                if merged.len() >= self.limits.max_images {
                    break;
                }
                if seen.insert(candidate.full.as_str().to_string()) {
                    merged.push(candidate);
                }
            }
            if merged.len() >= self.limits.max_images {
                // Ceiling reached: dropping the stream cancels in-flight
                // fetches and leaves unstarted pages unfetched.
                break;
            }
        }
        drop(fetches);

        info!(
            "discovered {} candidate(s) across {} page(s)",
            merged.len(),
            considered.len()
        );
        paginate(merged, page, self.limits.page_size)
    }

    /// Fetch one page and extract its candidates. Any failure yields an
    /// empty contribution; one bad page never aborts the batch.
    async fn page_candidates(&self, raw: String) -> Vec<ImageCandidate> {
        let Ok(target) = Url::parse(&raw) else {
            debug!("skipping unparseable page url: {raw}");
            return Vec::new();
        };
        if !matches!(target.scheme(), "http" | "https") {
            debug!("skipping non-http(s) page url: {raw}");
            return Vec::new();
        }

        let page = match self.fetcher.get_text(&target, self.limits.fetch_timeout).await {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                debug!("skipping {target}: status {}", page.status);
                return Vec::new();
            }
            Err(e) => {
                debug!("skipping {target}: {e}");
                return Vec::new();
            }
        };

        // scraper types are !Send; parse on the blocking pool.
        tokio::task::spawn_blocking(move || extract::extract_from_html(&page.body, &target))
            .await
            .unwrap_or_default()
    }
}

/// Slice the merged candidate list for a 1-based page index.
fn paginate(all: Vec<ImageCandidate>, page: i64, page_size: usize) -> DiscoveryResult {
    let page = page.max(1) as usize;
    let total = all.len();
    let start = (page - 1).saturating_mul(page_size);
    let has_more = total > start.saturating_add(page_size);

    let begin = start.min(total);
    let end = start.saturating_add(page_size).min(total);

    DiscoveryResult {
        images: all[begin..end].to_vec(),
        has_more,
        total,
    }
}

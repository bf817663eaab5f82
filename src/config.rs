//! Request budgets for discovery and bundling.
//!
//! Every ceiling lives in an explicit struct handed to the engine that
//! enforces it, so tests can shrink a budget to a handful of bytes or a
//! single page instead of staging megabytes of fixtures.

use std::time::Duration;

/// Budgets applied to a single discovery request.
#[derive(Debug, Clone)]
pub struct DiscoveryLimits {
    /// Page URLs considered per request; entries past this are ignored.
    pub max_pages: usize,
    /// Hard ceiling on merged candidates. Accumulation stops mid-page the
    /// moment it is reached.
    pub max_images: usize,
    /// Candidates per result page.
    pub page_size: usize,
    /// Per-page fetch deadline, covering connect through body read.
    pub fetch_timeout: Duration,
}

impl Default for DiscoveryLimits {
    fn default() -> Self {
        Self {
            max_pages: 5,
            max_images: 10_000,
            page_size: 200,
            fetch_timeout: Duration::from_secs(12),
        }
    }
}

/// Budgets applied to a single bundle request.
#[derive(Debug, Clone)]
pub struct BundleLimits {
    /// Entries allowed per request, counted before any validation or
    /// fetching happens.
    pub max_items: usize,
    /// Ceiling on the running total of fetched body bytes. Crossing it
    /// aborts the whole bundle, not just the offending item.
    pub max_total_bytes: u64,
    /// Per-item fetch deadline. Items are fetched one at a time, so a
    /// single stalled download would otherwise hold up the entire archive.
    pub fetch_timeout: Duration,
}

impl Default for BundleLimits {
    fn default() -> Self {
        Self {
            max_items: 100,
            max_total_bytes: 50 * 1024 * 1024,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

//! `imgharvest bundle <url>...`: fetch image URLs into a local zip archive.

use crate::bundle::Bundler;
use crate::config::BundleLimits;
use crate::fetch::Fetcher;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the bundle command, writing the archive to `out`.
pub async fn run(urls: &[String], out: &Path) -> Result<()> {
    let bundler = Bundler::new(Fetcher::new(), BundleLimits::default());
    let bundle = bundler.bundle(urls).await?;

    std::fs::write(out, &bundle.bytes)
        .with_context(|| format!("failed to write {}", out.display()))?;

    eprintln!(
        "Wrote {} ({} entries, {} bytes).",
        out.display(),
        bundle.entries,
        bundle.bytes.len()
    );
    Ok(())
}

//! `imgharvest discover <url>...`: one-shot discovery from the terminal.

use crate::config::DiscoveryLimits;
use crate::discover::Discovery;
use crate::fetch::Fetcher;
use anyhow::Result;

/// Run the discover command.
pub async fn run(urls: &[String], page: i64, json: bool) -> Result<()> {
    let discovery = Discovery::new(Fetcher::new(), DiscoveryLimits::default());
    let result = discovery.discover(urls, page).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.images.is_empty() {
        eprintln!("No images found.");
        return Ok(());
    }

    for candidate in &result.images {
        println!("{}", candidate.full);
        if candidate.thumb != candidate.full {
            println!("  thumb: {}", candidate.thumb);
        }
    }
    eprintln!(
        "{} image(s) shown, {} discovered{}",
        result.images.len(),
        result.total,
        if result.has_more {
            ", more pages available"
        } else {
            ""
        }
    );

    Ok(())
}

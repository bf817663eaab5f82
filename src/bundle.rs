//! Bundling: fetch a bounded set of image URLs and package them into a
//! single zip archive.
//!
//! Items are fetched sequentially, one at a time. That keeps the byte
//! budget check deterministic in input order and bounds peak memory to one
//! in-flight body, at the cost of total latency scaling with item count.

use crate::config::BundleLimits;
use crate::fetch::Fetcher;
use std::io::{Cursor, Write};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Terminal bundle failures. Per-item problems (invalid entries, failed
/// fetches) are absorbed by skipping the item and never surface here.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("no urls provided")]
    EmptyInput,
    #[error("too many urls (max {max})")]
    TooManyItems { max: usize },
    #[error("total download exceeds limit ({} MiB)", .limit_bytes / (1024 * 1024))]
    QuotaExceeded { limit_bytes: u64 },
    #[error("failed to download any image")]
    NoContent,
    #[error("archive assembly failed: {0}")]
    Archive(String),
}

impl BundleError {
    /// Whether the failure is the caller's fault (bad input, budget) as
    /// opposed to an internal assembly problem.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, BundleError::Archive(_))
    }
}

/// A finished archive.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Serialized zip bytes.
    pub bytes: Vec<u8>,
    /// Number of entries that made it into the archive.
    pub entries: usize,
}

/// One successfully fetched item staged for archiving.
struct StagedItem {
    name: String,
    bytes: Vec<u8>,
}

/// The bundling engine.
pub struct Bundler {
    fetcher: Fetcher,
    limits: BundleLimits,
}

impl Bundler {
    pub fn new(fetcher: Fetcher, limits: BundleLimits) -> Self {
        Self { fetcher, limits }
    }

    /// Fetch every usable URL in `urls` sequentially and zip the successes.
    ///
    /// Entries are named `image-<n>.<ext>` where `n` is the 1-based
    /// position in the input list, so a failed slot leaves a gap in the
    /// numbering rather than renumbering later items. The count cap is
    /// checked against the raw input length before anything is fetched.
    pub async fn bundle(&self, urls: &[String]) -> Result<Bundle, BundleError> {
        if urls.is_empty() {
            return Err(BundleError::EmptyInput);
        }
        if urls.len() > self.limits.max_items {
            return Err(BundleError::TooManyItems {
                max: self.limits.max_items,
            });
        }

        let mut staged: Vec<StagedItem> = Vec::new();
        let mut total_bytes: u64 = 0;

        for (index, raw) in urls.iter().enumerate() {
            let Some(target) = item_url(raw) else {
                debug!("bundle: skipping invalid entry at position {}", index + 1);
                continue;
            };

            let fetched = match self.fetcher.get_bytes(&target, self.limits.fetch_timeout).await {
                Ok(fetched) if fetched.is_success() => fetched,
                Ok(fetched) => {
                    debug!("bundle: skipping {target}: status {}", fetched.status);
                    continue;
                }
                Err(e) => {
                    debug!("bundle: skipping {target}: {e}");
                    continue;
                }
            };

            total_bytes += fetched.body.len() as u64;
            if total_bytes > self.limits.max_total_bytes {
                info!(
                    "bundle aborted: {total_bytes} bytes fetched, budget is {}",
                    self.limits.max_total_bytes
                );
                return Err(BundleError::QuotaExceeded {
                    limit_bytes: self.limits.max_total_bytes,
                });
            }

            staged.push(StagedItem {
                name: entry_name(index, &target),
                bytes: fetched.body,
            });
        }

        if staged.is_empty() {
            return Err(BundleError::NoContent);
        }

        let entries = staged.len();
        // Deflate is CPU-bound; keep it off the async workers.
        let bytes = match tokio::task::spawn_blocking(move || build_archive(&staged)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(BundleError::Archive(e.to_string())),
            Err(e) => return Err(BundleError::Archive(e.to_string())),
        };

        info!("bundled {entries} item(s) into a {} byte archive", bytes.len());
        Ok(Bundle { bytes, entries })
    }
}

/// Accept only absolute http(s) URLs as bundle items.
fn item_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

/// Archive entry name for the item at 0-based `index`: the 1-based input
/// position plus the URL path's extension, defaulting to jpg.
fn entry_name(index: usize, url: &Url) -> String {
    let ext = std::path::Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("jpg");
    format!("image-{}.{ext}", index + 1)
}

/// Write staged items into an in-memory zip archive.
fn build_archive(items: &[StagedItem]) -> Result<Vec<u8>, zip::result::ZipError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for item in items {
        writer.start_file(item.name.as_str(), options)?;
        writer.write_all(&item.bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_image(server: &MockServer, route: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    fn bundler(limits: BundleLimits) -> Bundler {
        Bundler::new(Fetcher::new(), limits)
    }

    fn entry_names(bundle: &Bundle) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bundle.bytes.clone())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_entry_name_uses_position_and_path_extension() {
        let url = Url::parse("https://img.example/a/photo.PNG?raw=1").unwrap();
        assert_eq!(entry_name(0, &url), "image-1.PNG");

        let no_ext = Url::parse("https://img.example/orig/4711").unwrap();
        assert_eq!(entry_name(3, &no_ext), "image-4.jpg");

        let trailing_dot = Url::parse("https://img.example/weird.").unwrap();
        assert_eq!(entry_name(1, &trailing_dot), "image-2.jpg");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(BundleError::EmptyInput.to_string(), "no urls provided");
        assert_eq!(
            BundleError::TooManyItems { max: 100 }.to_string(),
            "too many urls (max 100)"
        );
        assert_eq!(
            BundleError::QuotaExceeded { limit_bytes: 50 * 1024 * 1024 }.to_string(),
            "total download exceeds limit (50 MiB)"
        );
        assert_eq!(
            BundleError::NoContent.to_string(),
            "failed to download any image"
        );
        assert!(BundleError::EmptyInput.is_input_error());
        assert!(!BundleError::Archive("boom".into()).is_input_error());
    }

    #[tokio::test]
    async fn test_failed_slot_leaves_gap_in_numbering() {
        let server = MockServer::start().await;
        mount_image(&server, "/a.jpg", b"AAA").await;
        mount_image(&server, "/b.png", b"BBB").await;
        Mock::given(method("GET"))
            .and(path("/c.gif"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_image(&server, "/d.webp", b"DDD").await;

        let urls = vec![
            format!("{}/a.jpg", server.uri()),
            format!("{}/b.png", server.uri()),
            format!("{}/c.gif", server.uri()),
            format!("{}/d.webp", server.uri()),
        ];
        let bundle = bundler(BundleLimits::default()).bundle(&urls).await.unwrap();

        assert_eq!(bundle.entries, 3);
        assert_eq!(
            entry_names(&bundle),
            vec!["image-1.jpg", "image-2.png", "image-4.webp"]
        );

        // Entry bytes survive the round trip.
        let mut archive = zip::ZipArchive::new(Cursor::new(bundle.bytes)).unwrap();
        let mut body = Vec::new();
        archive.by_name("image-2.png").unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"BBB");
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let result = bundler(BundleLimits::default()).bundle(&[]).await;
        assert!(matches!(result, Err(BundleError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_too_many_items_rejected_before_any_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let urls: Vec<String> =
            (0..4).map(|i| format!("{}/{i}.jpg", server.uri())).collect();
        let limits = BundleLimits {
            max_items: 3,
            ..BundleLimits::default()
        };
        let result = bundler(limits).bundle(&urls).await;
        assert!(matches!(result, Err(BundleError::TooManyItems { max: 3 })));
    }

    #[tokio::test]
    async fn test_quota_exceeded_discards_partial_work() {
        let server = MockServer::start().await;
        mount_image(&server, "/first.jpg", &[0u8; 600]).await;
        mount_image(&server, "/second.jpg", &[0u8; 600]).await;

        let urls = vec![
            format!("{}/first.jpg", server.uri()),
            format!("{}/second.jpg", server.uri()),
        ];
        let limits = BundleLimits {
            max_total_bytes: 1000,
            ..BundleLimits::default()
        };
        let result = bundler(limits).bundle(&urls).await;
        assert!(matches!(
            result,
            Err(BundleError::QuotaExceeded { limit_bytes: 1000 })
        ));
    }

    #[tokio::test]
    async fn test_exact_budget_is_allowed() {
        let server = MockServer::start().await;
        mount_image(&server, "/first.jpg", &[0u8; 400]).await;
        mount_image(&server, "/second.jpg", &[0u8; 600]).await;

        let urls = vec![
            format!("{}/first.jpg", server.uri()),
            format!("{}/second.jpg", server.uri()),
        ];
        let limits = BundleLimits {
            max_total_bytes: 1000,
            ..BundleLimits::default()
        };
        let bundle = bundler(limits).bundle(&urls).await.unwrap();
        assert_eq!(bundle.entries, 2);
    }

    #[tokio::test]
    async fn test_all_fetches_failing_is_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let urls = vec![format!("{}/gone.jpg", server.uri())];
        let result = bundler(BundleLimits::default()).bundle(&urls).await;
        assert!(matches!(result, Err(BundleError::NoContent)));
    }

    #[tokio::test]
    async fn test_invalid_entries_skipped_but_keep_their_position() {
        let server = MockServer::start().await;
        mount_image(&server, "/real.png", b"REAL").await;

        let urls = vec![
            "ftp://files.example/nope.jpg".to_string(),
            "".to_string(),
            format!("{}/real.png", server.uri()),
        ];
        let bundle = bundler(BundleLimits::default()).bundle(&urls).await.unwrap();
        assert_eq!(bundle.entries, 1);
        assert_eq!(entry_names(&bundle), vec!["image-3.png"]);
    }

    #[tokio::test]
    async fn test_stalled_item_is_skipped_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"SLOW".to_vec())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        mount_image(&server, "/fast.jpg", b"FAST").await;

        let urls = vec![
            format!("{}/slow.jpg", server.uri()),
            format!("{}/fast.jpg", server.uri()),
        ];
        let limits = BundleLimits {
            fetch_timeout: Duration::from_millis(200),
            ..BundleLimits::default()
        };
        let bundle = bundler(limits).bundle(&urls).await.unwrap();
        assert_eq!(entry_names(&bundle), vec!["image-2.jpg"]);
    }
}

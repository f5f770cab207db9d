//! PDF text extraction from local files or remote URLs.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};

// Some hosts (Cloudinary among them) reject default HTTP client
// signatures with 401, so remote fetches present a browser user-agent.
const FETCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Extracts raw text from a PDF given a file path or HTTP(S) URL.
pub struct TextExtractor {
    http: Client,
}

impl TextExtractor {
    /// Create an extractor with the given fetch timeout.
    pub fn new(fetch_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(FETCH_USER_AGENT)
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| Error::Extraction(format!("HTTP client error: {}", e)))?;

        Ok(Self { http })
    }

    /// Extract text from `source`, page by page.
    ///
    /// Pages without extractable text are skipped; the rest are joined
    /// with a blank line. Any failure is an extraction error with the
    /// underlying cause; callers never receive partial text.
    pub async fn extract(&self, source: &str) -> Result<String> {
        let bytes = if source.starts_with("http://") || source.starts_with("https://") {
            self.fetch(source).await?
        } else {
            tokio::fs::read(Path::new(source))
                .await
                .map_err(|e| Error::Extraction(format!("failed to read {}: {}", source, e)))?
        };

        // PDF decoding is CPU-bound.
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| Error::Extraction(format!("extraction task failed: {}", e)))?
        .map_err(|e| Error::Extraction(format!("failed to parse PDF: {}", e)))?;

        let text = pages
            .iter()
            .map(|page| page.trim())
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!("Extracted {} characters from {} pages", text.len(), pages.len());
        Ok(text)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/pdf, */*")
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Extraction(format!(
                "fetch of {} returned {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Extraction(format!("failed to read body of {}: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}

mod basic;
mod client;
mod source;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use source::{DataSource, FileSource, HttpSource};

use crate::loader::LoadError;

/// Fetches a URL and returns the response body as text.
///
/// Fails with [`LoadError::Status`] on any non-2xx response so callers never
/// mistake an error page for CSV data.
pub async fn fetch_text<C: HttpClient>(client: &C, url: &str) -> Result<String, LoadError> {
    let parsed = url
        .parse()
        .map_err(|e| LoadError::InvalidUrl(format!("{url}: {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status(status));
    }

    Ok(resp.text().await?)
}

use std::time::Duration;

use async_trait::async_trait;

use super::client::HttpClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Plain [`HttpClient`] with a bounded request timeout, so a dead data host
/// cannot hang a reload forever.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self(client)
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}

use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests for the CSV loader.
///
/// The seam exists so wrappers (retry, header injection) can compose around
/// the real client without the loader knowing.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

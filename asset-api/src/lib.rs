pub mod endpoints;
mod error;
mod macros;
pub mod repositories;

pub use crate::error::{AssetApiError, ErrorDetail};
pub use tower_api_client::StatusCode;
use repositories::*;
use tower_api_client::{Client as ApiClient, Request as ApiRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8500/api/v1";

pub struct Client {
    inner: ApiClient,
    base_url: String,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            inner: ApiClient::new(base_url),
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, AssetApiError>
    where
        R: ApiRequest,
    {
        self.inner.send(request).await.map_err(From::from)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

pub struct Request;

impl Request {
    pub fn accounts() -> AccountRepository {
        AccountRepository::new()
    }

    pub fn transactions() -> TransactionRepository {
        TransactionRepository::new()
    }

    pub fn recurring() -> RecurringRepository {
        RecurringRepository::new()
    }

    pub fn summary() -> SummaryRepository {
        SummaryRepository::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = Client::new("http://localhost:8500/api/v1/");
        assert_eq!(client.base_url(), "http://localhost:8500/api/v1");
    }

    #[test]
    fn default_client_points_at_local_backend() {
        assert_eq!(Client::default().base_url(), DEFAULT_BASE_URL);
    }
}

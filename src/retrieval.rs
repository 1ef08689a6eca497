use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::CONFIG;
use crate::data_models::{QueryRequest, QueryResponse, SearchRequest, SearchResult};
use crate::error::{Result, SearchError};

/// Client for the local retrieval API (`POST {base}/query`).
#[derive(Debug, Clone)]
pub struct RetrievalClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl RetrievalClient {
    /// Create a client against `base_url`, e.g. `http://localhost:3333`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Same as [`RetrievalClient::new`] but reuses a preconfigured `reqwest::Client`
    /// (timeouts, proxies and so on are the caller's business).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let raw = format!("{}/query", base_url.trim_end_matches('/'));
        let endpoint =
            Url::parse(&raw).map_err(|e| SearchError::InvalidUrl(format!("{raw}: {e}")))?;
        Ok(Self { client, endpoint })
    }

    /// Create a client using environment configuration
    pub fn from_config() -> Result<Self> {
        Self::new(&CONFIG.retrieval_base_url)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run a single query and map the first result set into unified results.
    /// `timerange` and `region` are not sent to the retrieval API.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        log::debug!("querying retrieval api {} for {:?}", self.endpoint, request.query);

        let res = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&QueryRequest::single(&request.query))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            log::warn!("retrieval api answered {status} for {:?}", request.query);
            return Err(SearchError::Fetch {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("<unknown status code>")
                    .to_string(),
            });
        }

        let body = res.text().await?;
        Self::parse_response(&body)
    }

    /// Decode a retrieval API body. Only the first result set is consumed.
    pub fn parse_response(body: &str) -> Result<Vec<SearchResult>> {
        let response: QueryResponse = serde_json::from_str(body)?;
        let first = response.results.into_iter().next().ok_or_else(|| {
            SearchError::MalformedResponse("response contains no result sets".to_string())
        })?;

        Ok(first.results.into_iter().map(SearchResult::from).collect())
    }
}

#[test]
fn test_endpoint_from_base_url() {
    let client = RetrievalClient::new(crate::config::DEFAULT_BASE_URL).unwrap();
    assert_eq!(client.endpoint().as_str(), "http://localhost:3333/query");

    let client = RetrievalClient::from_config().unwrap();
    let expected = format!("{}/query", CONFIG.retrieval_base_url.trim_end_matches('/'));
    assert_eq!(client.endpoint().as_str(), expected);
    if std::env::var("RETRIEVAL_BASE_URL").is_err() {
        assert_eq!(client.endpoint().as_str(), "http://localhost:3333/query");
    }
}

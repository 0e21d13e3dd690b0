//! Remote catalog client.
//!
//! Calls the catalog's HTTP functions with rate limiting and request validation:
//!
//! - **Search**: `POST {base}/functions/searchListings` with `{searchPhrase, pageNumber, pageSize}`
//! - **Fetch by id**: `POST {base}/functions/getListingsByIds` with `{ids}`
//! - **Authentication**: optional `Authorization: Bearer` token.
//!
//! Both functions answer with `{"result": [...]}` or `{"error": "..."}`.

pub mod error;
pub mod request;
pub mod response;

pub use error::ClientError;
pub use request::{FetchRequest, validate_search};
pub use response::FunctionResponse;

use reqwest::header;
use roost_core::{AppConfig, Error, Record, RecordId, RecordSource, RemoteSearch, SearchQuery};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "roost/0.1";

/// Minimum interval between remote calls.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

const SEARCH_FUNCTION: &str = "searchListings";
const FETCH_FUNCTION: &str = "getListingsByIds";

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the function endpoints.
    pub base_url: String,
    /// Bearer token, if the remote requires one.
    pub api_key: Option<String>,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: roost/0.x).
    pub user_agent: String,
    /// Minimum spacing between calls.
    pub min_interval: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_interval: MIN_REQUEST_INTERVAL,
        }
    }
}

impl CatalogConfig {
    /// Build from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        }
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// HTTP client for the remote catalog functions.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl CatalogClient {
    /// Create a new catalog client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, ClientError> {
        url::Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid base url {}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Network(Arc::new(e)))?;

        let rate_limiter = Arc::new(RateLimiter::new(config.min_interval));
        Ok(Self { http, config, rate_limiter })
    }

    /// Run a full-text search for one page of records.
    pub async fn search_listings(&self, query: &SearchQuery) -> Result<Vec<Record>, ClientError> {
        validate_search(query)?;

        let start = Instant::now();
        tracing::debug!("searching catalog: phrase={} page={}", query.search_phrase, query.page_number);

        let records = self.call(SEARCH_FUNCTION, query).await?;

        tracing::debug!("search completed in {:?}, {} results", start.elapsed(), records.len());
        Ok(records)
    }

    /// Fetch full records by identifier. An empty id list makes no call.
    pub async fn listings_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Record>, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("fetching {} records from catalog", ids.len());
        self.call(FETCH_FUNCTION, &FetchRequest { ids }).await
    }

    async fn call<B: Serialize + ?Sized>(&self, function: &str, body: &B) -> Result<Vec<Record>, ClientError> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/functions/{function}", self.config.base_url.trim_end_matches('/'));

        let mut request = self
            .http
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .json(body);

        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let http_response = request.send().await?;

        let status = http_response.status();
        tracing::debug!("catalog {} response status: {}", function, status);

        if status == 401 || status == 403 {
            return Err(ClientError::AuthError);
        }

        if status == 429 {
            return Err(ClientError::RateLimited);
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        FunctionResponse::parse(&bytes)?.into_records()
    }
}

#[async_trait::async_trait]
impl RemoteSearch for CatalogClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, Error> {
        self.search_listings(query)
            .await
            .map_err(|e| Error::SearchFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RecordSource for CatalogClient {
    async fn fetch_records(&self, ids: &[RecordId]) -> Result<Vec<Record>, Error> {
        self.listings_by_ids(ids)
            .await
            .map_err(|e| Error::SyncUnavailable(e.to_string()))
    }
}

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{env_parse, CommonError};
use crate::model::{
    AnalyzeRequest, CitationList, ContributionList, NewCitation, StatsSummary, SubmitResponse,
    TopCitedList,
};

#[derive(Clone, Debug)]
pub struct ApiClientConfig {
    pub base_url: String,
    /// `None` leaves requests unbounded; a hung backend keeps its widget loading.
    pub timeout: Option<Duration>,
    pub max_error_body_bytes: usize,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout: None,
            max_error_body_bytes: 8 * 1024,
        }
    }
}

impl ApiClientConfig {
    /// Optional:
    /// - `AICIF_API_BASE_URL` (default: "http://127.0.0.1:5000")
    /// - `AICIF_API_TIMEOUT_SECS` (default: no timeout)
    /// - `AICIF_MAX_ERROR_BODY_BYTES` (default: 8192)
    pub fn from_env() -> Result<Self, CommonError> {
        let defaults = Self::default();

        let base_url = std::env::var("AICIF_API_BASE_URL").unwrap_or(defaults.base_url);
        reqwest::Url::parse(&base_url).map_err(|e| {
            CommonError::Config(format!("AICIF_API_BASE_URL is not a valid URL: {e}"))
        })?;

        let timeout = env_parse::<u64>("AICIF_API_TIMEOUT_SECS")?.map(Duration::from_secs);
        let max_error_body_bytes = env_parse::<usize>("AICIF_MAX_ERROR_BODY_BYTES")?
            .unwrap_or(defaults.max_error_body_bytes);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_error_body_bytes,
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("backend returned error: status={status} body={body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid request path: {0}")]
    InvalidPath(String),
}

/// HTTP adapter for the citation API. Every call is a single round trip;
/// failures come back as `FetchError` and are never retried.
#[derive(Clone)]
pub struct ApiClient {
    config: ApiClientConfig,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent("aicif-dashboard")
            .build()?;
        Ok(Self { config, http })
    }

    /// Send `body` (if any) as JSON to `path` and parse the reply as JSON.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, FetchError> {
        self.send(method, path, body).await
    }

    pub async fn log_citation(&self, citation: &NewCitation) -> Result<SubmitResponse, FetchError> {
        self.send(Method::POST, "/api/citations", Some(citation)).await
    }

    pub async fn recent_citations(&self, limit: u32) -> Result<CitationList, FetchError> {
        let path = format!("/api/citations?limit={limit}");
        self.send::<(), _>(Method::GET, &path, None).await
    }

    pub async fn stats(&self) -> Result<StatsSummary, FetchError> {
        self.send::<(), _>(Method::GET, "/api/stats", None).await
    }

    pub async fn top_cited(&self) -> Result<TopCitedList, FetchError> {
        self.send::<(), _>(Method::GET, "/api/stats/top-cited", None)
            .await
    }

    pub async fn feature_contributions(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<ContributionList, FetchError> {
        self.send(Method::POST, "/demo/feature-contributions", Some(request))
            .await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, FetchError> {
        if !path.starts_with('/') {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        let url = format!("{}{}", self.config.base_url, path);
        debug!(%method, url = %url, "api request");

        let mut req = self.http.request(method, &url);
        if let Some(timeout) = self.config.timeout {
            req = req.timeout(timeout);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        Self::parse_json_response(resp, self.config.max_error_body_bytes).await
    }

    async fn parse_json_response<T: DeserializeOwned>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, FetchError> {
        let status = resp.status();
        if !status.is_success() {
            let body = read_limited_text(resp, max_error_body_bytes).await;
            return Err(FetchError::Status { status, body });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read backend error body");
            "<failed to read error body>".to_string()
        }
    }
}

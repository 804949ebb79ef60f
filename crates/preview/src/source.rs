//! Backend data sources.

use async_trait::async_trait;
use megribi_core::config::BackendConfig;
use megribi_core::{Error, Result};
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Which forecast endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastKind {
    /// Rest of tonight.
    Today,
    /// The coming hour.
    NextHour,
}

impl ForecastKind {
    /// Endpoint path.
    pub fn path(self) -> &'static str {
        match self {
            ForecastKind::Today => "/api/forecast_today",
            ForecastKind::NextHour => "/api/forecast_next_hour",
        }
    }
}

/// Source of raw range and forecast bodies.
///
/// Bodies that cannot be decoded are returned as `Value::Null`, which the
/// ingestion layer treats as empty. Only transport failures are errors.
#[async_trait]
pub trait PreviewSource: Send + Sync {
    /// Fetch the latest `limit` measured rows for a store.
    async fn fetch_range(&self, store: &str, limit: u32) -> Result<Value>;

    /// Fetch forecast rows for a store.
    async fn fetch_forecast(&self, store: &str, kind: ForecastKind) -> Result<Value>;
}

/// HTTP source talking to the forecasting backend.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    /// Create a new HTTP source.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL with trailing slashes removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the range endpoint.
    pub fn range_url(&self, store: &str, limit: u32) -> Result<Url> {
        let limit = limit.to_string();
        self.endpoint("/api/range", &[("store", store), ("limit", limit.as_str())])
    }

    /// URL of a forecast endpoint.
    pub fn forecast_url(&self, store: &str, kind: ForecastKind) -> Result<Url> {
        self.endpoint(kind.path(), &[("store", store)])
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .map_err(|e| Error::fetch(format!("invalid backend URL {}: {e}", self.base_url)))
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::fetch(format!("failed to fetch backend: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("failed to read backend body: {e}")))?;

        if !status.is_success() {
            warn!(%url, %status, "backend returned an error status");
        }

        match serde_json::from_str(&body) {
            Ok(value) => {
                debug!(%url, %status, bytes = body.len(), "backend body decoded");
                Ok(value)
            }
            Err(e) => {
                warn!(%url, %status, error = %e, "undecodable backend body, treating as empty");
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl PreviewSource for HttpSource {
    async fn fetch_range(&self, store: &str, limit: u32) -> Result<Value> {
        let url = self.range_url(store, limit)?;
        self.get_json(url).await
    }

    async fn fetch_forecast(&self, store: &str, kind: ForecastKind) -> Result<Value> {
        let url = self.forecast_url(store, kind)?;
        self.get_json(url).await
    }
}

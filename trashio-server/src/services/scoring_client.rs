//! Scoring service client
//!
//! The report service never scores images itself; it asks trashio-ai over
//! HTTP. Every error here means "collaborator unavailable" to the caller.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use trashio_common::scoring::{
    AfterAnalysisRequest, AfterAnalysisResponse, BeforeAnalysisRequest, BeforeAnalysisResponse,
};

const USER_AGENT: &str = concat!("trashio-server/", env!("CARGO_PKG_VERSION"));

/// Scoring client errors
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Scoring call timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Remote image scoring
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn analyze_before(
        &self,
        request: &BeforeAnalysisRequest,
    ) -> Result<BeforeAnalysisResponse, ScoringError>;

    async fn analyze_after(
        &self,
        request: &AfterAnalysisRequest,
    ) -> Result<AfterAnalysisResponse, ScoringError>;
}

/// HTTP client for trashio-ai
pub struct HttpScoringClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpScoringClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScoringError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ScoringError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Calling scoring service");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoringError::Timeout(self.timeout)
                } else {
                    ScoringError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Api(status.as_u16(), body));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| ScoringError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn analyze_before(
        &self,
        request: &BeforeAnalysisRequest,
    ) -> Result<BeforeAnalysisResponse, ScoringError> {
        self.post_json("/analyze/before", request).await
    }

    async fn analyze_after(
        &self,
        request: &AfterAnalysisRequest,
    ) -> Result<AfterAnalysisResponse, ScoringError> {
        self.post_json("/analyze/after", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = HttpScoringClient::new("http://127.0.0.1:5811/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:5811");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // port 9 (discard) is closed on any sane test host
        let client = HttpScoringClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = BeforeAnalysisRequest {
            report_id: "r".to_string(),
            ..Default::default()
        };
        let result = client.analyze_before(&request).await;
        assert!(matches!(result, Err(ScoringError::Network(_))));
    }
}

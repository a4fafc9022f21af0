//! API client: the single point of entry for all calls to the verification service.
//!
//! No other module may issue HTTP requests. The workflow controller only sees the
//! `ResumeApi` trait, so tests drive it with an in-memory implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{AnalysisResponse, ParsedResume};

pub const PARSE_RESUME_PATH: &str = "/api/get-parsed-resume";
pub const ANALYZE_RESUME_PATH: &str = "/api/analyze-resume";
pub const GITHUB_LINK_PATH: &str = "/api/get-github-link";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Service rejected the request: {message}")]
    Rejected { message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A résumé file selected by the user, already read into memory.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub bytes: bytes::Bytes,
}

/// The remote collaborators the workflow depends on.
#[async_trait]
pub trait ResumeApi: Send + Sync {
    /// `POST /api/get-parsed-resume`
    async fn parse_resume(&self, upload: &ResumeUpload) -> Result<ParsedResume, ApiError>;

    /// `POST /api/analyze-resume`
    async fn analyze_resume(&self, resume: &ParsedResume) -> Result<AnalysisResponse, ApiError>;

    /// `POST /api/get-github-link`
    async fn github_link(&self, upload: &ResumeUpload) -> Result<Value, ApiError>;
}

/// FastAPI-style error body: `{"detail": ...}` or `{"message": ...}`.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()?,
            base_url: config.api_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn file_form(upload: &ResumeUpload) -> multipart::Form {
        let part = multipart::Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone());
        multipart::Form::new().part("file", part)
    }

    /// Sends a prepared request and decodes a JSON body.
    /// Non-2xx statuses become `ApiError::Api` with the service's message if it sent one.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{path} returned {status}");
            let message = serde_json::from_str::<ServiceErrorBody>(&body)
                .ok()
                .and_then(|e| {
                    e.message.or(e.detail.map(|d| match d {
                        Value::String(s) => s,
                        other => other.to_string(),
                    }))
                })
                .unwrap_or(body);
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        debug!("{path} succeeded: {} bytes", body.len());
        serde_json::from_str(&body).map_err(ApiError::Parse)
    }
}

#[async_trait]
impl ResumeApi for ApiClient {
    async fn parse_resume(&self, upload: &ResumeUpload) -> Result<ParsedResume, ApiError> {
        let request = self
            .client
            .post(self.url(PARSE_RESUME_PATH))
            .multipart(Self::file_form(upload));
        self.send_json(request, PARSE_RESUME_PATH).await
    }

    async fn analyze_resume(&self, resume: &ParsedResume) -> Result<AnalysisResponse, ApiError> {
        let request = self.client.post(self.url(ANALYZE_RESUME_PATH)).json(resume);
        self.send_json(request, ANALYZE_RESUME_PATH).await
    }

    async fn github_link(&self, upload: &ResumeUpload) -> Result<Value, ApiError> {
        let request = self
            .client
            .post(self.url(GITHUB_LINK_PATH))
            .multipart(Self::file_form(upload));
        let value: Value = self.send_json(request, GITHUB_LINK_PATH).await?;
        if value.get("status").and_then(Value::as_str) == Some("error") {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("GitHub link lookup failed")
                .to_string();
            return Err(ApiError::Rejected { message });
        }
        Ok(value)
    }
}

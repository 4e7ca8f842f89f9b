//! Client side of the external analysis service.
//!
//! [`Analyzer`] is the seam the review session talks to; [`HttpAnalyzer`]
//! is the real implementation, posting the document as JSON and decoding an
//! [`AnalysisResult`].

use crate::config::ServiceConfig;
use crate::model::AnalysisResult;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("could not reach analysis service at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("analysis service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid analysis response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can turn a document into findings.
pub trait Analyzer {
    fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError>;
}

impl<A: Analyzer + ?Sized> Analyzer for &A {
    fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        (**self).analyze(text)
    }
}

/// Blocking HTTP client for the analysis endpoint.
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    /// Full endpoint URL (e.g. `http://localhost:8000/auditar`)
    url: String,

    /// JSON field carrying the document text
    text_field: String,

    client: reqwest::blocking::Client,
}

impl HttpAnalyzer {
    /// Create a client from config.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, AnalysisError> {
        Self::build(
            &config.url,
            &config.text_field,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a client with the default request field and timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, AnalysisError> {
        let defaults = ServiceConfig::default();
        Self::build(
            &url.into(),
            &defaults.text_field,
            Duration::from_secs(defaults.timeout_secs),
        )
    }

    fn build(url: &str, text_field: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| AnalysisError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(Self {
            url: url.to_string(),
            text_field: text_field.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.text_field.clone(),
            serde_json::Value::String(text.to_string()),
        );
        serde_json::Value::Object(body)
    }
}

impl Analyzer for HttpAnalyzer {
    fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        let transport = |source| AnalysisError::Transport {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&self.request_body(text))
            .send()
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().map_err(transport)?;

        if !status.is_success() {
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = parse_response(&body)?;
        tracing::info!(
            findings = result.findings.len(),
            document_type = %result.document_type_label,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );
        Ok(result)
    }
}

/// Decode a service response body.
pub fn parse_response(body: &str) -> Result<AnalysisResult, AnalysisError> {
    Ok(serde_json::from_str(body)?)
}

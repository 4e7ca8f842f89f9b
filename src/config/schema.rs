use serde::Deserialize;
use std::fmt;

/// Default analysis endpoint for a locally running service.
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000/auditar";

/// Context label the service uses for the main body of a document.
pub const DEFAULT_PRIMARY_CONTEXT: &str = "Resolução";

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ReviewConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub review: ReviewSettings,
}

impl ReviewConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let url = self.service.url.trim();
        if url.is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "service.url",
            });
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            issues.push(ValidationIssue::InvalidValue {
                field: "service.url",
                message: format!("expected an http(s) URL, got {url:?}"),
            });
        }

        if self.service.text_field.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "service.text_field",
            });
        }

        if self.service.timeout_secs == 0 {
            issues.push(ValidationIssue::InvalidValue {
                field: "service.timeout_secs",
                message: "timeout must be at least one second".to_string(),
            });
        }

        if self.review.primary_context.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "review.primary_context",
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// JSON field carrying the document in the request body
    #[serde(default = "default_text_field")]
    pub text_field: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            text_field: default_text_field(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReviewSettings {
    #[serde(default = "default_primary_context")]
    pub primary_context: String,
    /// Normalize line endings before submitting and before batch apply
    #[serde(default = "default_true")]
    pub normalize_newlines: bool,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            primary_context: default_primary_context(),
            normalize_newlines: true,
        }
    }
}

fn default_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_text_field() -> String {
    "text".to_string()
}

fn default_primary_context() -> String {
    DEFAULT_PRIMARY_CONTEXT.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field {field}")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid {field}: {message}")
            }
        }
    }
}

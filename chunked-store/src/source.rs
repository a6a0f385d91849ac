//! Where publishable content comes from.
//!
//! Failures here are kept apart from storage errors: nothing has been written
//! yet when a source fails.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

/// Shortest `html` body accepted from the formatter API.
pub const MIN_HTML_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid source url {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self) -> Result<Value, SourceError>;

    /// Provenance recorded in the manifest's `source` field.
    fn describe(&self) -> Value {
        json!({})
    }
}

/// Content that is already in hand.
#[derive(Debug, Clone)]
pub struct StaticSource(pub Value);

#[async_trait]
impl ContentSource for StaticSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        Ok(self.0.clone())
    }
}

/// Fetches a rendered email template from the formatter API.
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: reqwest::Client,
    url: String,
    endpoint: Url,
    message_id: String,
    bearer: Option<String>,
}

impl HttpContentSource {
    pub fn new(url: &str, stage: &str, message_id: &str, bearer: Option<String>) -> Result<Self, SourceError> {
        let parsed = Url::parse(url)
            .map_err(|source| SourceError::InvalidUrl { url: url.to_string(), source })?;
        let endpoint = stage_url(&parsed, stage)
            .join("api/format")
            .map_err(|source| SourceError::InvalidUrl { url: url.to_string(), source })?;
        if bearer.is_none() {
            tracing::warn!("no bearer token configured, calling {} without Authorization", endpoint);
        }
        Ok(Self {
            client: reqwest::Client::default(),
            url: url.to_string(),
            endpoint,
            message_id: message_id.to_string(),
            bearer,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        let endpoint = self.endpoint.to_string();
        tracing::info!("requesting template {} from {}", self.message_id, endpoint);

        let body = json!({
            "emailId": self.message_id,
            "content": { "code": "{####}" },
        });
        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await
            .map_err(|source| SourceError::Request { url: endpoint.clone(), source })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Status { url: endpoint, status: status.as_u16(), body });
        }
        let value: Value = resp.json().await
            .map_err(|source| SourceError::Request { url: endpoint, source })?;
        validate_template(value)
    }

    fn describe(&self) -> Value {
        json!({ "url": self.url, "messageId": self.message_id })
    }
}

/// Inserts the stage as the second host label for every stage but `prod`:
/// `https://fmt.example.com` on `dev` becomes `https://fmt.dev.example.com`.
pub fn stage_url(url: &Url, stage: &str) -> Url {
    if stage.is_empty() || stage == "prod" {
        return url.clone();
    }
    let Some(host) = url.host_str() else {
        return url.clone();
    };
    let mut labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return url.clone();
    }
    labels.insert(1, stage);
    let mut staged = url.clone();
    match staged.set_host(Some(&labels.join("."))) {
        Ok(()) => staged,
        Err(e) => {
            tracing::warn!("cannot apply stage {} to {}: {}", stage, url, e);
            url.clone()
        }
    }
}

/// Checks the formatter response carries a usable `html` body.
pub fn validate_template(value: Value) -> Result<Value, SourceError> {
    let html_len = match value.get("html") {
        Some(Value::String(html)) => html.chars().count(),
        _ => return Err(SourceError::InvalidResponse("missing 'html' field".to_string())),
    };
    if html_len < MIN_HTML_LEN {
        return Err(SourceError::InvalidResponse(format!("html is empty or too short ({} chars)", html_len)));
    }
    Ok(value)
}

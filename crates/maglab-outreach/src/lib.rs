//! HTTP client for the Reach outreach API.
//!
//! Reach accepts batches of qualified leads and reports acceptance per lead,
//! so callers can mark exactly the accepted subset as pushed and leave the
//! rest for the next cycle.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_BASE_URL: &str = "https://api.reach.app/v1/";

#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Reach API error: {0}")]
    Api(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// The subset of a lead forwarded to Reach.
#[derive(Debug, Clone, Serialize)]
pub struct LeadSummary {
    pub lead_id: Uuid,
    pub profile_url: String,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub icp_score: i16,
}

/// Per-lead acceptance result from a push.
#[derive(Debug, Clone, Deserialize)]
pub struct PushReceipt {
    pub lead_id: Uuid,
    pub accepted: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    leads: &'a [LeadSummary],
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(default)]
    results: Vec<PushReceipt>,
}

/// Client for the Reach REST API.
pub struct ReachClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl ReachClient {
    /// Creates a new client pointed at the production Reach API.
    ///
    /// # Errors
    ///
    /// Returns [`OutreachError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, OutreachError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`OutreachError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`OutreachError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, OutreachError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("maglab/0.1 (signal-engine)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| OutreachError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Pushes a batch of leads and returns one receipt per lead.
    ///
    /// An empty input short-circuits to an empty receipt list without any
    /// network call.
    ///
    /// # Errors
    ///
    /// - [`OutreachError::Api`] if the API returns an error envelope.
    /// - [`OutreachError::Http`] / [`OutreachError::UnexpectedStatus`] on
    ///   transport failures — the caller treats these as whole-batch failure.
    /// - [`OutreachError::Deserialize`] if the response shape is unexpected.
    pub async fn push_leads(&self, leads: &[LeadSummary]) -> Result<Vec<PushReceipt>, OutreachError> {
        if leads.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(batch = leads.len(), "pushing lead batch to Reach");

        let url = self
            .base_url
            .join("leads/push")
            .map_err(|e| OutreachError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&PushRequest { leads })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(OutreachError::Api(format!("push rejected: {body}")));
        }
        if !status.is_success() {
            return Err(OutreachError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let status_field = body.get("status").and_then(|s| s.as_str()).unwrap_or("ok");
        if !status_field.eq_ignore_ascii_case("ok") {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(OutreachError::Api(message.to_string()));
        }

        let envelope: PushResponse =
            serde_json::from_value(body).map_err(|e| OutreachError::Deserialize {
                context: format!("push_leads(count={})", leads.len()),
                source: e,
            })?;

        Ok(envelope.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_summary_serializes_expected_shape() {
        let lead = LeadSummary {
            lead_id: Uuid::nil(),
            profile_url: "https://linkedin.com/in/jane".to_string(),
            full_name: Some("Jane Doe".to_string()),
            job_title: Some("Founder".to_string()),
            company: None,
            icp_score: 80,
        };
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["profile_url"], "https://linkedin.com/in/jane");
        assert_eq!(value["icp_score"], 80);
        assert!(value["company"].is_null());
    }
}

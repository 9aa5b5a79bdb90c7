//! HTTP client for the Harvest REST API.
//!
//! All endpoints share a JSON envelope carrying a `"status"` field; non-`"ok"`
//! statuses surface as [`HarvestError::Api`] before any payload
//! deserialization is attempted.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::HarvestError;
use crate::retry::retry_with_backoff;
use crate::types::{
    CommentsResponse, HarvestComment, HarvestPost, HarvestProfile, ReactionsResponse,
    SearchResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.harvest-api.com/v1/";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Client for the Harvest REST API.
///
/// Use [`HarvestClient::new`] for production or
/// [`HarvestClient::with_base_url`] to point at a mock server in tests.
pub struct HarvestClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HarvestClient {
    /// Creates a new client pointed at the production Harvest API.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, HarvestError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`HarvestError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("maglab/0.1 (signal-engine)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join treats it as a directory rather than replacing the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| HarvestError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Override the retry policy (defaults: 3 retries, 1 s base back-off).
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Searches recent posts matching a keyword.
    ///
    /// # Errors
    ///
    /// - [`HarvestError::Api`] if the API returns an error status.
    /// - [`HarvestError::Http`] on network failure after retries.
    /// - [`HarvestError::Deserialize`] if the response shape is unexpected.
    pub async fn search_posts_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<HarvestPost>, HarvestError> {
        self.search_posts("keyword", keyword).await
    }

    /// Searches recent posts published by a company page (by URN).
    ///
    /// # Errors
    ///
    /// Same as [`HarvestClient::search_posts_by_keyword`].
    pub async fn search_posts_by_company(
        &self,
        company_urn: &str,
    ) -> Result<Vec<HarvestPost>, HarvestError> {
        self.search_posts("company", company_urn).await
    }

    /// Searches recent posts authored by a profile (by URN).
    ///
    /// # Errors
    ///
    /// Same as [`HarvestClient::search_posts_by_keyword`].
    pub async fn search_posts_by_profile(
        &self,
        profile_urn: &str,
    ) -> Result<Vec<HarvestPost>, HarvestError> {
        self.search_posts("profile", profile_urn).await
    }

    /// Fetches comments for a post, each with its author profile.
    ///
    /// # Errors
    ///
    /// Same as [`HarvestClient::search_posts_by_keyword`].
    pub async fn get_post_comments(
        &self,
        post_id: &str,
    ) -> Result<Vec<HarvestComment>, HarvestError> {
        let url = self.endpoint(&format!("posts/{post_id}/comments"), &[])?;
        let body = self.request_json(url).await?;

        let envelope: CommentsResponse =
            serde_json::from_value(body).map_err(|e| HarvestError::Deserialize {
                context: format!("get_post_comments(post_id={post_id})"),
                source: e,
            })?;
        Ok(envelope.comments)
    }

    /// Fetches the profiles that reacted to a post.
    ///
    /// # Errors
    ///
    /// Same as [`HarvestClient::search_posts_by_keyword`].
    pub async fn get_post_reactions(
        &self,
        post_id: &str,
    ) -> Result<Vec<HarvestProfile>, HarvestError> {
        let url = self.endpoint(&format!("posts/{post_id}/reactions"), &[])?;
        let body = self.request_json(url).await?;

        let envelope: ReactionsResponse =
            serde_json::from_value(body).map_err(|e| HarvestError::Deserialize {
                context: format!("get_post_reactions(post_id={post_id})"),
                source: e,
            })?;
        Ok(envelope.reactions)
    }

    async fn search_posts(
        &self,
        mode: &str,
        query: &str,
    ) -> Result<Vec<HarvestPost>, HarvestError> {
        let url = self.endpoint("posts/search", &[("mode", mode), ("query", query)])?;
        let body = self.request_json(url).await?;

        let envelope: SearchResponse =
            serde_json::from_value(body).map_err(|e| HarvestError::Deserialize {
                context: format!("search_posts(mode={mode}, query={query})"),
                source: e,
            })?;
        Ok(envelope.posts)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, HarvestError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| HarvestError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issues a GET with retry and envelope-status checking, returning the
    /// raw JSON body for endpoint-specific deserialization.
    async fn request_json(&self, url: Url) -> Result<serde_json::Value, HarvestError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move { self.request_json_once(url).await }
        })
        .await
    }

    async fn request_json_once(&self, url: Url) -> Result<serde_json::Value, HarvestError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30);
            return Err(HarvestError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(HarvestError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        Self::check_api_error(&body)?;
        Ok(body)
    }

    /// Checks the `"status"` field of the response envelope.
    ///
    /// Harvest reports application errors with HTTP 200 and
    /// `{"status": "error", "message": "..."}`.
    fn check_api_error(body: &serde_json::Value) -> Result<(), HarvestError> {
        let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("ok");
        if status.eq_ignore_ascii_case("ok") {
            return Ok(());
        }
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        Err(HarvestError::Api(message.to_string()))
    }
}

//! Response shapes for the Harvest API.
//!
//! Harvest's JSON is loosely typed and varies by endpoint, so every profile
//! field is optional with a serde default. Missing data degrades to `None`
//! rather than failing the whole response.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use maglab_core::ProfileSnapshot;

/// A scraped LinkedIn profile as Harvest returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarvestProfile {
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub current_title: Option<String>,
    #[serde(default)]
    pub current_company: Option<String>,
    #[serde(default)]
    pub company_size: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
}

impl HarvestProfile {
    /// Project the scrape shape onto the domain snapshot used by the scorer
    /// and lead store.
    #[must_use]
    pub fn to_snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            profile_url: self.profile_url.clone(),
            full_name: self.full_name.clone(),
            headline: self.headline.clone(),
            job_title: self.current_title.clone(),
            company: self.current_company.clone(),
            company_size: self.company_size,
            location: self.location.clone(),
        }
    }
}

/// A post returned by one of the search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestPost {
    pub id: String,
    #[serde(default)]
    pub author: Option<HarvestProfile>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

/// A single comment on a post.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestComment {
    #[serde(default)]
    pub author: Option<HarvestProfile>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub commented_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Envelope types (internal)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) posts: Vec<HarvestPost>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsResponse {
    #[serde(default)]
    pub(crate) comments: Vec<HarvestComment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReactionsResponse {
    #[serde(default)]
    pub(crate) reactions: Vec<HarvestProfile>,
}

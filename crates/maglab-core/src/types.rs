//! Domain types shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a monitor watches: a search keyword, a company page, or a single
/// profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    Keyword,
    Company,
    Profile,
}

impl MonitorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorKind::Keyword => "keyword",
            MonitorKind::Company => "company",
            MonitorKind::Profile => "profile",
        }
    }

    /// Parse a database/CLI string into a kind. Returns `None` for anything
    /// unrecognized.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "keyword" => Some(MonitorKind::Keyword),
            "company" => Some(MonitorKind::Company),
            "profile" => Some(MonitorKind::Profile),
            _ => None,
        }
    }
}

impl std::fmt::Display for MonitorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed engagement occurrence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Comment,
    Reaction,
    PostAuthorship,
}

impl SignalType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Comment => "comment",
            SignalType::Reaction => "reaction",
            SignalType::PostAuthorship => "post_authorship",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort tone of a comment. Enrichment only — never an input to
/// scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

/// Seniority band inferred from a job title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Ic,
    Manager,
    Director,
    Vp,
    CLevel,
}

impl Seniority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Seniority::Ic => "ic",
            Seniority::Manager => "manager",
            Seniority::Director => "director",
            Seniority::Vp => "vp",
            Seniority::CLevel => "c_level",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ic" => Some(Seniority::Ic),
            "manager" => Some(Seniority::Manager),
            "director" => Some(Seniority::Director),
            "vp" => Some(Seniority::Vp),
            "c_level" => Some(Seniority::CLevel),
            _ => None,
        }
    }
}

/// Inclusive employee-count range for the company-size criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: i32,
    pub max: i32,
}

impl SizeRange {
    #[must_use]
    pub fn contains(&self, size: i32) -> bool {
        size >= self.min && size <= self.max
    }
}

/// Per-owner Ideal Customer Profile definition.
///
/// Every criterion is optional; an empty/unset criterion never excludes a
/// profile. `excluded_companies` is a hard veto on match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IcpFilters {
    #[serde(default)]
    pub title_keywords: Vec<String>,
    #[serde(default)]
    pub company_size_range: Option<SizeRange>,
    #[serde(default)]
    pub excluded_companies: Vec<String>,
    #[serde(default)]
    pub required_seniority: Option<Seniority>,
    #[serde(default)]
    pub industry_keywords: Vec<String>,
}

impl IcpFilters {
    /// True when no criterion is configured at all: every profile matches
    /// with a full score.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.title_keywords.is_empty()
            && self.company_size_range.is_none()
            && self.excluded_companies.is_empty()
            && self.required_seniority.is_none()
            && self.industry_keywords.is_empty()
    }
}

/// Normalized view of a scraped profile as the scorer and the lead store see
/// it. All fields are optional: scraped data is untrusted and variable in
/// shape, so absence is the common case, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub profile_url: Option<String>,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub company_size: Option<i32>,
    pub location: Option<String>,
}

/// A single engagement tuple fed into the signal engine.
#[derive(Debug, Clone)]
pub struct Engagement {
    pub profile: ProfileSnapshot,
    pub signal_type: SignalType,
    pub sentiment: Option<Sentiment>,
    pub occurred_at: DateTime<Utc>,
    pub snippet: Option<String>,
}

//! Tolerant extraction of job title, company, and seniority from profile
//! snapshots.
//!
//! Scraped headlines are free text ("Jane Doe - VP of Sales at Acme",
//! "Co-Founder @ Brightloop | ex-Stripe"). Structured fields are preferred
//! when the scrape provides them; otherwise the headline is split on common
//! separators and scanned for a recognizable title segment.

use std::sync::LazyLock;

use regex::Regex;

use maglab_core::{ProfileSnapshot, Seniority};

/// Words that mark a headline segment as a job title. Lowercase.
const TITLE_TOKENS: &[&str] = &[
    "founder",
    "co-founder",
    "cofounder",
    "ceo",
    "cto",
    "cfo",
    "coo",
    "cmo",
    "cro",
    "chief",
    "president",
    "owner",
    "partner",
    "principal",
    "vp",
    "vice president",
    "director",
    "head",
    "manager",
    "lead",
    "engineer",
    "developer",
    "architect",
    "designer",
    "consultant",
    "advisor",
    "analyst",
    "scientist",
    "recruiter",
    "marketer",
    "sales",
    "marketing",
    "growth",
    "product",
    "operations",
    "officer",
    "specialist",
    "strategist",
    "coach",
];

// Dashes split only when surrounded by whitespace so "Co-Founder" stays whole.
static SEGMENT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—]\s+|\s*\|\s*|\s*·\s*|\s*•\s*|,\s*").expect("valid regex"));

static AT_COMPANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\bat\b|@)\s*(.+)$").expect("valid regex"));

/// Best-effort job-title extraction.
///
/// Prefers the structured current-title field; otherwise splits the headline
/// into segments and returns the first one containing a recognizable title
/// token, with any trailing `" at Company"` stripped.
///
/// Returns `None` when no field yields a recognizable title. Never panics on
/// missing or garbage input.
#[must_use]
pub fn extract_job_title(profile: &ProfileSnapshot) -> Option<String> {
    if let Some(title) = non_empty(profile.job_title.as_deref()) {
        let stripped = strip_company_suffix(title);
        if !stripped.is_empty() {
            return Some(stripped);
        }
    }

    let headline = non_empty(profile.headline.as_deref())?;
    for segment in SEGMENT_SPLIT.split(headline) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let candidate = strip_company_suffix(segment);
        if contains_title_token(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Best-effort current-employer extraction.
///
/// Prefers the structured company field; otherwise looks for the
/// `"<title> at <company>"` / `"<title> @ <company>"` headline pattern and
/// returns the trailing company name trimmed of punctuation.
#[must_use]
pub fn extract_company(profile: &ProfileSnapshot) -> Option<String> {
    if let Some(company) = non_empty(profile.company.as_deref()) {
        return Some(company.to_string());
    }

    let headline = non_empty(profile.headline.as_deref())?;
    for segment in SEGMENT_SPLIT.split(headline) {
        if let Some(caps) = AT_COMPANY.captures(segment.trim()) {
            let company = caps
                .get(1)
                .map(|m| m.as_str().trim_matches(|c: char| c.is_whitespace() || c == '.'))
                .filter(|s| !s.is_empty())?;
            return Some(company.to_string());
        }
    }
    None
}

/// Map a job title onto a seniority band via token matching.
///
/// Returns `None` when the title carries no seniority cue — callers treat
/// that as "individual contributor, unverified".
#[must_use]
pub fn infer_seniority(title: &str) -> Option<Seniority> {
    let lower = title.to_lowercase();
    let has = |token: &str| contains_word(&lower, token);

    if has("ceo")
        || has("cto")
        || has("cfo")
        || has("coo")
        || has("cmo")
        || has("cro")
        || has("chief")
        || has("founder")
        || has("co-founder")
        || has("cofounder")
        || has("president")
        || has("owner")
    {
        return Some(Seniority::CLevel);
    }
    if has("vp") || lower.contains("vice president") {
        return Some(Seniority::Vp);
    }
    if has("director") {
        return Some(Seniority::Director);
    }
    if has("manager") || lower.contains("head of") {
        return Some(Seniority::Manager);
    }
    if contains_title_token(&lower) {
        return Some(Seniority::Ic);
    }
    None
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn strip_company_suffix(segment: &str) -> String {
    let trimmed = AT_COMPANY
        .find(segment)
        .map_or(segment, |m| &segment[..m.start()]);
    trimmed.trim().to_string()
}

fn contains_title_token(segment: &str) -> bool {
    let lower = segment.to_lowercase();
    TITLE_TOKENS.iter().any(|token| contains_word(&lower, token))
}

/// Substring match bounded by non-alphanumeric characters, so "vp" does not
/// match inside "mvp".
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut search_from = 0;
    while let Some(rel) = haystack[search_from..].find(needle) {
        let start = search_from + rel;
        let end = start + needle.len();
        let before_ok = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
        let after_ok = end == haystack.len()
            || !haystack[end..].chars().next().is_some_and(char::is_alphanumeric);
        if before_ok && after_ok {
            return true;
        }
        search_from = start + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_headline(headline: &str) -> ProfileSnapshot {
        ProfileSnapshot {
            headline: Some(headline.to_string()),
            ..ProfileSnapshot::default()
        }
    }

    #[test]
    fn title_from_dashed_headline() {
        let profile = with_headline("Jane Doe - VP of Sales at Acme");
        let title = extract_job_title(&profile).expect("should extract title");
        assert!(title.contains("VP of Sales"), "got: {title}");
    }

    #[test]
    fn company_from_dashed_headline() {
        let profile = with_headline("Jane Doe - VP of Sales at Acme");
        assert_eq!(extract_company(&profile).as_deref(), Some("Acme"));
    }

    #[test]
    fn structured_fields_win_over_headline() {
        let profile = ProfileSnapshot {
            headline: Some("Building things at Somewhere Else".to_string()),
            job_title: Some("Staff Engineer".to_string()),
            company: Some("Brightloop".to_string()),
            ..ProfileSnapshot::default()
        };
        assert_eq!(extract_job_title(&profile).as_deref(), Some("Staff Engineer"));
        assert_eq!(extract_company(&profile).as_deref(), Some("Brightloop"));
    }

    #[test]
    fn empty_profile_yields_none_without_panicking() {
        let profile = ProfileSnapshot::default();
        assert_eq!(extract_job_title(&profile), None);
        assert_eq!(extract_company(&profile), None);
    }

    #[test]
    fn whitespace_fields_are_treated_as_absent() {
        let profile = ProfileSnapshot {
            headline: Some("   ".to_string()),
            job_title: Some("".to_string()),
            company: Some(" \t".to_string()),
            ..ProfileSnapshot::default()
        };
        assert_eq!(extract_job_title(&profile), None);
        assert_eq!(extract_company(&profile), None);
    }

    #[test]
    fn headline_without_title_token_yields_none() {
        let profile = with_headline("Dog person. Coffee enthusiast.");
        assert_eq!(extract_job_title(&profile), None);
    }

    #[test]
    fn at_symbol_headline_extracts_both() {
        let profile = with_headline("Co-Founder @ Brightloop | ex-Stripe");
        let title = extract_job_title(&profile).expect("should extract title");
        assert!(title.contains("Co-Founder"), "got: {title}");
        assert_eq!(extract_company(&profile).as_deref(), Some("Brightloop"));
    }

    #[test]
    fn pipe_separated_headline_picks_title_segment() {
        let profile = with_headline("Speaker | Head of Growth at Looply | Mentor");
        let title = extract_job_title(&profile).expect("should extract title");
        assert!(title.contains("Head of Growth"), "got: {title}");
        assert_eq!(extract_company(&profile).as_deref(), Some("Looply"));
    }

    #[test]
    fn hyphenated_words_do_not_split() {
        let profile = with_headline("Co-Founder of nothing in particular");
        let title = extract_job_title(&profile).expect("should extract title");
        assert!(title.contains("Co-Founder"), "got: {title}");
    }

    #[test]
    fn seniority_c_level() {
        assert_eq!(infer_seniority("CEO & Co-Founder"), Some(Seniority::CLevel));
        assert_eq!(infer_seniority("Chief Revenue Officer"), Some(Seniority::CLevel));
    }

    #[test]
    fn seniority_vp_director_manager() {
        assert_eq!(infer_seniority("VP of Sales"), Some(Seniority::Vp));
        assert_eq!(infer_seniority("Vice President, Marketing"), Some(Seniority::Vp));
        assert_eq!(infer_seniority("Director of Engineering"), Some(Seniority::Director));
        assert_eq!(infer_seniority("Engineering Manager"), Some(Seniority::Manager));
        assert_eq!(infer_seniority("Head of People"), Some(Seniority::Manager));
    }

    #[test]
    fn seniority_ic_and_unknown() {
        assert_eq!(infer_seniority("Software Engineer"), Some(Seniority::Ic));
        assert_eq!(infer_seniority("beekeeper"), None);
    }

    #[test]
    fn vp_does_not_match_inside_mvp() {
        assert!(!contains_word("mvp builder", "vp"));
        assert!(contains_word("vp, sales", "vp"));
    }
}

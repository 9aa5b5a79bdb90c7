//! ICP match and score evaluation.
//!
//! Match and score are deliberately separate: `matches_icp` answers "does
//! every configured criterion hold", while `compute_icp_score` grades how
//! many configured criteria hold. A profile can score 80 and still be
//! unmatched because the missing 20 points were an excluded-company veto —
//! the UI surfaces "82% match, but excluded" differently from "18% match".

use maglab_core::{IcpFilters, ProfileSnapshot};

use crate::extract::{extract_company, extract_job_title, infer_seniority};

/// Outcome of evaluating one configured criterion.
#[derive(Debug, Clone, Copy)]
struct Criterion {
    configured: bool,
    satisfied: bool,
}

impl Criterion {
    fn unconfigured() -> Self {
        Criterion {
            configured: false,
            satisfied: false,
        }
    }

    fn of(satisfied: bool) -> Self {
        Criterion {
            configured: true,
            satisfied,
        }
    }
}

/// Returns true iff every populated criterion is satisfied.
///
/// Unpopulated criteria pass vacuously, so a fully empty filter set matches
/// any profile. A hit on `excluded_companies` is a hard veto regardless of
/// every other criterion.
#[must_use]
pub fn matches_icp(profile: &ProfileSnapshot, filters: &IcpFilters) -> bool {
    evaluate(profile, filters)
        .iter()
        .all(|c| !c.configured || c.satisfied)
}

/// Score the profile 0–100 against the configured criteria.
///
/// Each configured criterion contributes an equal integer share; unconfigured
/// criteria are excluded from the denominator. `satisfied * 100 / configured`
/// reaches 100 only when every configured criterion holds, so a score of 100
/// implies [`matches_icp`]. Zero configured criteria score 100 (no filters
/// means everything qualifies).
#[must_use]
pub fn compute_icp_score(profile: &ProfileSnapshot, filters: &IcpFilters) -> i16 {
    let criteria = evaluate(profile, filters);
    let configured = criteria.iter().filter(|c| c.configured).count();
    if configured == 0 {
        return 100;
    }
    let satisfied = criteria.iter().filter(|c| c.configured && c.satisfied).count();

    #[allow(clippy::cast_possible_truncation)]
    let score = (satisfied * 100 / configured) as i16;
    score
}

fn evaluate(profile: &ProfileSnapshot, filters: &IcpFilters) -> [Criterion; 5] {
    let title = extract_job_title(profile);
    let company = extract_company(profile);

    let title_criterion = if filters.title_keywords.is_empty() {
        Criterion::unconfigured()
    } else {
        let hit = title.as_deref().is_some_and(|t| {
            let lower = t.to_lowercase();
            filters
                .title_keywords
                .iter()
                .any(|kw| lower.contains(&kw.to_lowercase()))
        });
        Criterion::of(hit)
    };

    // Unknown company size earns no credit against a configured range:
    // unverifiable data neither matches nor scores.
    let size_criterion = match filters.company_size_range {
        None => Criterion::unconfigured(),
        Some(range) => Criterion::of(profile.company_size.is_some_and(|size| range.contains(size))),
    };

    let exclusion_criterion = if filters.excluded_companies.is_empty() {
        Criterion::unconfigured()
    } else {
        let excluded = company.as_deref().is_some_and(|c| {
            let lower = c.to_lowercase();
            filters
                .excluded_companies
                .iter()
                .any(|excl| lower.contains(&excl.to_lowercase()))
        });
        Criterion::of(!excluded)
    };

    let seniority_criterion = match filters.required_seniority {
        None => Criterion::unconfigured(),
        Some(required) => Criterion::of(
            title
                .as_deref()
                .and_then(infer_seniority)
                .is_some_and(|inferred| inferred >= required),
        ),
    };

    // Profiles carry no structured industry field; keywords match against
    // headline + company text.
    let industry_criterion = if filters.industry_keywords.is_empty() {
        Criterion::unconfigured()
    } else {
        let haystack = format!(
            "{} {}",
            profile.headline.as_deref().unwrap_or_default(),
            company.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        let hit = filters
            .industry_keywords
            .iter()
            .any(|kw| haystack.contains(&kw.to_lowercase()));
        Criterion::of(hit)
    };

    [
        title_criterion,
        size_criterion,
        exclusion_criterion,
        seniority_criterion,
        industry_criterion,
    ]
}

#[cfg(test)]
mod tests {
    use maglab_core::{Seniority, SizeRange};

    use super::*;

    fn founder_profile() -> ProfileSnapshot {
        ProfileSnapshot {
            profile_url: Some("https://linkedin.com/in/jane".to_string()),
            full_name: Some("Jane Doe".to_string()),
            headline: Some("Founder & CEO at Brightloop".to_string()),
            company_size: Some(40),
            ..ProfileSnapshot::default()
        }
    }

    #[test]
    fn empty_filters_match_any_profile() {
        let filters = IcpFilters::default();
        assert!(matches_icp(&founder_profile(), &filters));
        assert!(matches_icp(&ProfileSnapshot::default(), &filters));
        assert_eq!(compute_icp_score(&ProfileSnapshot::default(), &filters), 100);
    }

    #[test]
    fn excluded_company_vetoes_even_a_perfect_profile() {
        let filters = IcpFilters {
            title_keywords: vec!["founder".to_string()],
            excluded_companies: vec!["brightloop".to_string()],
            ..IcpFilters::default()
        };
        let profile = founder_profile();
        assert!(!matches_icp(&profile, &filters));
        // Title share still earned; exclusion share lost.
        assert_eq!(compute_icp_score(&profile, &filters), 50);
    }

    #[test]
    fn all_criteria_satisfied_scores_100_and_matches() {
        let filters = IcpFilters {
            title_keywords: vec!["founder".to_string()],
            company_size_range: Some(SizeRange { min: 10, max: 100 }),
            excluded_companies: vec!["rivalco".to_string()],
            required_seniority: Some(Seniority::CLevel),
            industry_keywords: vec!["saas".to_string()],
        };
        let mut profile = founder_profile();
        profile.headline = Some("Founder & CEO at Brightloop (B2B SaaS)".to_string());
        assert_eq!(compute_icp_score(&profile, &filters), 100);
        assert!(matches_icp(&profile, &filters));
    }

    #[test]
    fn score_is_monotonic_in_satisfied_criteria() {
        let base = IcpFilters {
            title_keywords: vec!["founder".to_string()],
            company_size_range: Some(SizeRange { min: 10, max: 100 }),
            industry_keywords: vec!["fintech".to_string()],
            ..IcpFilters::default()
        };
        let profile = founder_profile();
        // title + size satisfied, industry not: 2/3.
        let before = compute_icp_score(&profile, &base);
        assert_eq!(before, 66);

        let mut profile_plus = profile.clone();
        profile_plus.headline = Some("Founder & CEO at Brightloop Fintech".to_string());
        let after = compute_icp_score(&profile_plus, &base);
        assert!(after >= before, "satisfying one more criterion lowered the score");
        assert_eq!(after, 100);
    }

    #[test]
    fn unknown_company_size_fails_a_configured_range() {
        let filters = IcpFilters {
            company_size_range: Some(SizeRange { min: 10, max: 100 }),
            ..IcpFilters::default()
        };
        let mut profile = founder_profile();
        profile.company_size = None;
        assert!(!matches_icp(&profile, &filters));
        assert_eq!(compute_icp_score(&profile, &filters), 0);
    }

    #[test]
    fn required_seniority_is_a_floor() {
        let filters = IcpFilters {
            required_seniority: Some(Seniority::Director),
            ..IcpFilters::default()
        };
        let vp = ProfileSnapshot {
            headline: Some("VP of Sales at Acme".to_string()),
            ..ProfileSnapshot::default()
        };
        let manager = ProfileSnapshot {
            headline: Some("Engineering Manager at Acme".to_string()),
            ..ProfileSnapshot::default()
        };
        assert!(matches_icp(&vp, &filters));
        assert!(!matches_icp(&manager, &filters));
    }

    #[test]
    fn title_keywords_are_case_insensitive() {
        let filters = IcpFilters {
            title_keywords: vec!["FOUNDER".to_string()],
            ..IcpFilters::default()
        };
        assert!(matches_icp(&founder_profile(), &filters));
    }

    #[test]
    fn profile_with_no_company_is_not_excluded() {
        let filters = IcpFilters {
            excluded_companies: vec!["acme".to_string()],
            ..IcpFilters::default()
        };
        let profile = ProfileSnapshot {
            headline: Some("Founder".to_string()),
            ..ProfileSnapshot::default()
        };
        assert!(matches_icp(&profile, &filters));
        assert_eq!(compute_icp_score(&profile, &filters), 100);
    }

    #[test]
    fn null_profile_scores_zero_against_constrained_filters() {
        let filters = IcpFilters {
            title_keywords: vec!["founder".to_string()],
            company_size_range: Some(SizeRange { min: 1, max: 10 }),
            ..IcpFilters::default()
        };
        let profile = ProfileSnapshot::default();
        assert_eq!(compute_icp_score(&profile, &filters), 0);
        assert!(!matches_icp(&profile, &filters));
    }
}

//! End-to-end intake tests: mocked Harvest API → engagement collection →
//! scoring → idempotent upsert + event append against an in-memory store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use maglab_core::{IcpFilters, MonitorKind, SignalType};
use maglab_db::{DbError, NewLeadSnapshot, NewSignalEvent};
use maglab_engine::{collect_post_engagements, process_engagers, LeadStore, StoredLead};
use maglab_harvest::HarvestClient;

// ---------------------------------------------------------------------------
// In-memory lead store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LeadRecord {
    id: i64,
    public_id: Uuid,
    snapshot: NewLeadSnapshot,
    first_seen: u64,
    last_seen: u64,
}

#[derive(Default)]
struct MemoryLeadStore {
    inner: Mutex<MemoryInner>,
    /// Profile URLs whose upsert should fail, for partial-failure tests.
    fail_urls: HashSet<String>,
}

#[derive(Default)]
struct MemoryInner {
    clock: u64,
    next_id: i64,
    leads: HashMap<(Uuid, String), LeadRecord>,
    events: Vec<NewSignalEvent>,
}

impl MemoryLeadStore {
    fn failing_on(urls: &[&str]) -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            fail_urls: urls.iter().map(|u| (*u).to_string()).collect(),
        }
    }

    fn lead(&self, owner_id: Uuid, profile_url: &str) -> Option<LeadRecord> {
        self.inner
            .lock()
            .unwrap()
            .leads
            .get(&(owner_id, profile_url.to_string()))
            .cloned()
    }

    fn lead_count(&self) -> usize {
        self.inner.lock().unwrap().leads.len()
    }

    fn matched_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .leads
            .values()
            .filter(|lead| lead.snapshot.icp_match)
            .count()
    }

    fn events(&self) -> Vec<NewSignalEvent> {
        self.inner.lock().unwrap().events.clone()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn upsert_lead(
        &self,
        owner_id: Uuid,
        snapshot: &NewLeadSnapshot,
    ) -> Result<StoredLead, DbError> {
        if self.fail_urls.contains(&snapshot.profile_url) {
            return Err(DbError::NotFound);
        }

        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let now = inner.clock;
        let key = (owner_id, snapshot.profile_url.clone());

        if let Some(existing) = inner.leads.get_mut(&key) {
            existing.snapshot = snapshot.clone();
            existing.last_seen = now;
            let existing = existing.clone();
            return Ok(StoredLead {
                id: existing.id,
                public_id: existing.public_id,
                icp_score: existing.snapshot.icp_score,
                icp_match: existing.snapshot.icp_match,
                is_new: false,
            });
        }

        inner.next_id += 1;
        let record = LeadRecord {
            id: inner.next_id,
            public_id: Uuid::new_v4(),
            snapshot: snapshot.clone(),
            first_seen: now,
            last_seen: now,
        };
        inner.leads.insert(key, record.clone());
        Ok(StoredLead {
            id: record.id,
            public_id: record.public_id,
            icp_score: record.snapshot.icp_score,
            icp_match: record.snapshot.icp_match,
            is_new: true,
        })
    }

    async fn append_event(&self, event: &NewSignalEvent) -> Result<(), DbError> {
        self.inner.lock().unwrap().events.push(event.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harvest fixtures
// ---------------------------------------------------------------------------

/// Mounts a keyword search for "hiring" returning 2 posts with 3 distinct
/// engagers total: two commenters on the first post, one reactor on the
/// second. Two of the three carry "founder" titles.
async fn mount_hiring_fixture(server: &MockServer) {
    let posts = serde_json::json!({
        "status": "ok",
        "posts": [
            { "id": "post-a", "posted_at": "2026-07-01T09:00:00Z" },
            { "id": "post-b", "posted_at": "2026-07-01T12:00:00Z" }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/posts/search"))
        .and(query_param("mode", "keyword"))
        .and(query_param("query", "hiring"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&posts))
        .mount(server)
        .await;

    let comments_a = serde_json::json!({
        "status": "ok",
        "comments": [
            {
                "author": {
                    "profile_url": "https://linkedin.com/in/jane",
                    "full_name": "Jane Doe",
                    "headline": "Founder & CEO at Brightloop"
                },
                "text": "Congrats, great milestone!",
                "commented_at": "2026-07-01T10:00:00Z"
            },
            {
                "author": {
                    "profile_url": "https://linkedin.com/in/sam",
                    "full_name": "Sam Ortiz",
                    "headline": "VP of Sales at Acme"
                },
                "text": "Interesting take."
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/posts/post-a/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&comments_a))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/posts/post-a/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "reactions": []
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/posts/post-b/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "comments": []
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/posts/post-b/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "reactions": [
                {
                    "profile_url": "https://linkedin.com/in/kai",
                    "full_name": "Kai Wen",
                    "headline": "Co-Founder @ Looply"
                }
            ]
        })))
        .mount(server)
        .await;
}

fn harvest_client(server: &MockServer) -> HarvestClient {
    HarvestClient::with_base_url("test-key", 30, &server.uri())
        .expect("client construction should not fail")
        .with_retry_policy(0, 0)
}

fn founder_filters() -> IcpFilters {
    IcpFilters {
        title_keywords: vec!["founder".to_string()],
        ..IcpFilters::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn keyword_scan_processes_and_matches_engagers_end_to_end() {
    let server = MockServer::start().await;
    mount_hiring_fixture(&server).await;
    let harvest = harvest_client(&server);

    let posts = harvest.search_posts_by_keyword("hiring").await.unwrap();
    assert_eq!(posts.len(), 2);

    let engagements = collect_post_engagements(&harvest, MonitorKind::Keyword, &posts).await;
    assert_eq!(engagements.len(), 3, "two commenters + one reactor");

    let store = MemoryLeadStore::default();
    let owner = Uuid::new_v4();
    let filters = founder_filters();

    let outcome = process_engagers(&store, owner, 1, &engagements, &filters).await;

    assert_eq!(outcome.processed, 3);
    // Jane ("Founder & CEO") and Kai ("Co-Founder") match; Sam ("VP of Sales")
    // does not.
    assert_eq!(outcome.matched, 2);
    assert_eq!(outcome.skipped, 0);

    assert_eq!(store.lead_count(), 3);
    assert_eq!(store.matched_count(), 2);

    let jane = store.lead(owner, "https://linkedin.com/in/jane").unwrap();
    assert!(jane.snapshot.icp_match);
    assert_eq!(jane.snapshot.icp_score, 100);
    let sam = store.lead(owner, "https://linkedin.com/in/sam").unwrap();
    assert!(!sam.snapshot.icp_match);
    assert_eq!(sam.snapshot.icp_score, 0);

    let events = store.events();
    assert_eq!(events.len(), 3);
    let comment_events = events
        .iter()
        .filter(|e| e.signal_type == SignalType::Comment.as_str())
        .count();
    let reaction_events = events
        .iter()
        .filter(|e| e.signal_type == SignalType::Reaction.as_str())
        .count();
    assert_eq!(comment_events, 2);
    assert_eq!(reaction_events, 1);

    // Comment sentiment is attached; reactions carry none.
    let jane_event = events
        .iter()
        .find(|e| e.snippet.as_deref() == Some("Congrats, great milestone!"))
        .unwrap();
    assert_eq!(jane_event.sentiment.as_deref(), Some("positive"));
    let reaction_event = events
        .iter()
        .find(|e| e.signal_type == SignalType::Reaction.as_str())
        .unwrap();
    assert!(reaction_event.sentiment.is_none());
}

#[tokio::test]
async fn rescanning_is_idempotent_and_advances_last_seen() {
    let server = MockServer::start().await;
    mount_hiring_fixture(&server).await;
    let harvest = harvest_client(&server);

    let posts = harvest.search_posts_by_keyword("hiring").await.unwrap();
    let engagements = collect_post_engagements(&harvest, MonitorKind::Keyword, &posts).await;

    let store = MemoryLeadStore::default();
    let owner = Uuid::new_v4();
    let filters = founder_filters();

    process_engagers(&store, owner, 1, &engagements, &filters).await;
    let first = store.lead(owner, "https://linkedin.com/in/jane").unwrap();

    process_engagers(&store, owner, 1, &engagements, &filters).await;
    let second = store.lead(owner, "https://linkedin.com/in/jane").unwrap();

    assert_eq!(store.lead_count(), 3, "re-scan must not duplicate leads");
    assert_eq!(second.id, first.id);
    assert_eq!(second.snapshot.icp_score, first.snapshot.icp_score);
    assert_eq!(second.first_seen, first.first_seen);
    assert!(
        second.last_seen > first.last_seen,
        "last_seen must strictly increase on re-discovery"
    );
    assert_eq!(store.events().len(), 6, "events are append-only");
}

#[tokio::test]
async fn updated_filters_rescore_existing_leads_without_duplicates() {
    let server = MockServer::start().await;
    mount_hiring_fixture(&server).await;
    let harvest = harvest_client(&server);

    let posts = harvest.search_posts_by_keyword("hiring").await.unwrap();
    let engagements = collect_post_engagements(&harvest, MonitorKind::Keyword, &posts).await;

    let store = MemoryLeadStore::default();
    let owner = Uuid::new_v4();

    let outcome = process_engagers(&store, owner, 1, &engagements, &founder_filters()).await;
    assert_eq!(outcome.matched, 2);
    assert!(store
        .lead(owner, "https://linkedin.com/in/kai")
        .unwrap()
        .snapshot
        .icp_match);

    // The owner tightens the ICP: Looply is now excluded. The next scan
    // re-scores against the CURRENT definition.
    let tightened = IcpFilters {
        title_keywords: vec!["founder".to_string()],
        excluded_companies: vec!["looply".to_string()],
        ..IcpFilters::default()
    };
    let outcome = process_engagers(&store, owner, 1, &engagements, &tightened).await;

    assert_eq!(outcome.processed, 3);
    assert_eq!(outcome.matched, 1, "Kai is vetoed by the excluded company");
    assert_eq!(store.lead_count(), 3, "re-scoring must not create rows");

    let kai = store.lead(owner, "https://linkedin.com/in/kai").unwrap();
    assert!(!kai.snapshot.icp_match);
    // Title share still earned: 1 of 2 configured criteria.
    assert_eq!(kai.snapshot.icp_score, 50);
}

#[tokio::test]
async fn one_bad_engager_does_not_abort_the_batch() {
    let server = MockServer::start().await;
    mount_hiring_fixture(&server).await;
    let harvest = harvest_client(&server);

    let posts = harvest.search_posts_by_keyword("hiring").await.unwrap();
    let engagements = collect_post_engagements(&harvest, MonitorKind::Keyword, &posts).await;

    let store = MemoryLeadStore::failing_on(&["https://linkedin.com/in/sam"]);
    let owner = Uuid::new_v4();

    let outcome = process_engagers(&store, owner, 1, &engagements, &founder_filters()).await;

    assert_eq!(outcome.processed, 2, "the failing engager is skipped");
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.matched, 2);
    assert_eq!(store.lead_count(), 2);
}

#[tokio::test]
async fn comment_fetch_failure_is_isolated_to_that_post() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts/search"))
        .and(query_param("mode", "keyword"))
        .and(query_param("query", "hiring"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "posts": [
                { "id": "broken-post" },
                { "id": "good-post" }
            ]
        })))
        .mount(&server)
        .await;

    // broken-post: comments endpoint 500s, reactions empty.
    Mock::given(method("GET"))
        .and(path("/posts/broken-post/comments"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/broken-post/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok", "reactions": []
        })))
        .mount(&server)
        .await;

    // good-post: one commenter.
    Mock::given(method("GET"))
        .and(path("/posts/good-post/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "comments": [
                {
                    "author": {
                        "profile_url": "https://linkedin.com/in/jane",
                        "full_name": "Jane Doe",
                        "headline": "Founder at Brightloop"
                    },
                    "text": "Nice."
                }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/good-post/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok", "reactions": []
        })))
        .mount(&server)
        .await;

    let harvest = harvest_client(&server);
    let posts = harvest.search_posts_by_keyword("hiring").await.unwrap();
    let engagements = collect_post_engagements(&harvest, MonitorKind::Keyword, &posts).await;

    assert_eq!(
        engagements.len(),
        1,
        "the broken post is skipped, the good post still yields its engager"
    );
    assert_eq!(
        engagements[0].profile.profile_url.as_deref(),
        Some("https://linkedin.com/in/jane")
    );
}

#[tokio::test]
async fn profile_scans_record_post_authorship() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts/search"))
        .and(query_param("mode", "profile"))
        .and(query_param("query", "urn:li:person:abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "posts": [
                {
                    "id": "post-x",
                    "author": {
                        "profile_url": "https://linkedin.com/in/ada",
                        "full_name": "Ada Park",
                        "headline": "Founder at Looply"
                    },
                    "text": "Shipping something new this week.",
                    "posted_at": "2026-07-03T08:00:00Z"
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/posts/post-x/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok", "comments": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/post-x/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok", "reactions": []
        })))
        .mount(&server)
        .await;

    let harvest = harvest_client(&server);
    let posts = harvest
        .search_posts_by_profile("urn:li:person:abc")
        .await
        .unwrap();
    let engagements = collect_post_engagements(&harvest, MonitorKind::Profile, &posts).await;

    assert_eq!(engagements.len(), 1);
    assert_eq!(engagements[0].signal_type, SignalType::PostAuthorship);
    assert_eq!(
        engagements[0].snippet.as_deref(),
        Some("Shipping something new this week.")
    );

    let store = MemoryLeadStore::default();
    let owner = Uuid::new_v4();
    let outcome = process_engagers(&store, owner, 9, &engagements, &IcpFilters::default()).await;
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.matched, 1, "unconstrained filters match everything");

    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].signal_type, SignalType::PostAuthorship.as_str());
    assert_eq!(events[0].monitor_id, 9);
}

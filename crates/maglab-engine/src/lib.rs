//! The signal engine: idempotent lead intake, scan orchestration, and
//! push-to-outreach.
//!
//! Everything here is batch-shaped. Failures are caught at the smallest
//! possible scope (per profile, per post, per monitor, per owner batch),
//! logged with identifying context, and never abort a whole run — the
//! pipeline is idempotent and resumable on the next scheduled tick.

mod error;
mod filters;
mod intake;
mod push;
mod scan;
mod store;

pub use error::EngineError;
pub use filters::{FilterSource, PgFilterSource};
pub use intake::{process_engagers, record_event, score_snapshot, upsert_lead, BatchOutcome};
pub use push::{run_push, PushTotals};
pub use scan::{collect_post_engagements, run_scan, ScanRequest, ScanSettings, ScanTotals};
pub use store::{LeadStore, PgLeadStore, StoredLead};

//! Pure ICP (Ideal Customer Profile) evaluation.
//!
//! No I/O lives here: every function takes a [`maglab_core::ProfileSnapshot`]
//! plus a filter definition and returns a value. Scraped input is untrusted
//! and variable in shape, so all extraction is tolerant — worst case is
//! `None`/`0`/`false`, never a panic.

pub mod extract;
pub mod score;
pub mod sentiment;

pub use extract::{extract_company, extract_job_title, infer_seniority};
pub use score::{compute_icp_score, matches_icp};
pub use sentiment::comment_sentiment;

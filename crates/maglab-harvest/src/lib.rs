//! HTTP client for the Harvest LinkedIn-scraping API.
//!
//! Wraps `reqwest` with Harvest-specific error handling, bearer-key auth,
//! typed (but deliberately loose) response shapes, and retry with jittered
//! exponential back-off for transient failures.

mod client;
mod error;
mod retry;
mod types;

pub use client::HarvestClient;
pub use error::HarvestError;
pub use types::{HarvestComment, HarvestPost, HarvestProfile};

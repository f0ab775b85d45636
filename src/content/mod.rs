//! Page content retrieval.
//!
//! Only the fetch is handled here; rendering belongs to the caller. Every
//! fetch goes through [`crate::resilience::retry_with_backoff`] so a briefly
//! unavailable upstream (503) does not fail the request.

pub mod fetcher;

pub use fetcher::{FetchError, PageFetcher};

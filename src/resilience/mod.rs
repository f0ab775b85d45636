//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream page fetch:
//!     → retry.rs (classify failure, retry transient ones)
//!     → backoff.rs (1s, 2s, 4s ... between attempts)
//!
//! KV connection drop:
//!     → storage::kv::connection (reconnect loop)
//!     → backoff.rs ReconnectPolicy (min(n * 100ms, 3s), 10 attempts)
//! ```
//!
//! # Design Decisions
//! - Retries only for errors that signal temporary unavailability
//! - No overall deadline; callers bound latency through the policy
//! - Backoff suspends the task, never blocks a thread

pub mod backoff;
pub mod retry;

pub use backoff::ReconnectPolicy;
pub use retry::{retry_with_backoff, RetriesExhausted, RetryPolicy, Transient};

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config + env snapshot → stores/clients → HTTP server → listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C / SIGTERM / Shutdown::trigger → stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - The KV connection is opened on first use, not at startup

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_state, run, StartupError};

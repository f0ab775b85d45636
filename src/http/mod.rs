//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, metrics)
//!     → views.rs       GET/POST /views/{slug}  → counter::CounterService
//!     → diagnostics.rs GET /views/debug        → storage probe
//!     → pages.rs       GET /pages/{page_id}    → content::PageFetcher
//!     → response.rs (JSON error bodies)
//! ```

pub mod diagnostics;
pub mod pages;
pub mod request;
pub mod response;
pub mod server;
pub mod views;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
pub use views::ViewCount;

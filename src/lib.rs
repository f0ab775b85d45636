//! Page view counter service library

pub mod config;
pub mod content;
pub mod counter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod storage;

pub use config::schema::ServiceConfig;
pub use counter::CounterService;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

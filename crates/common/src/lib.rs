//! ScholarNet Common Library
//! 
//! Shared code for the ScholarNet graph builder and its gateway:
//! - Graph data model (researchers, papers, citation and collaboration edges)
//! - Bibliographic provider clients behind one capability trait
//! - Error types and handling
//! - Configuration management
//! - Response caching
//! - Metrics and observability

pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod providers;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use models::{Graph, Node, SourceTag};
pub use providers::ProviderClient;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent to every bibliographic provider
pub const USER_AGENT: &str = concat!("scholarnet/", env!("CARGO_PKG_VERSION"));

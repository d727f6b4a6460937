//! ScholarNet graph builder
//!
//! Turns a seed researcher (or paper) into a weighted graph of researchers
//! and the citation and co-authorship relationships between them:
//! - `resolver`: merges author records that denote the same person
//! - `accumulator`: per-build node and edge aggregation
//! - `guard`: bounded, timed provider calls that never raise
//! - `builder`: the traversal itself
//! - `fallback`: the fixed sample graph
//! - `service`: the request-facing facade with fallback substitution

pub mod accumulator;
pub mod builder;
pub mod error;
pub mod fallback;
pub mod guard;
pub mod resolver;
pub mod service;

pub use accumulator::GraphAccumulator;
pub use builder::{BuildKind, NetworkBuilder};
pub use error::{GraphError, NetworkError};
pub use fallback::sample_network;
pub use guard::{FetchOutcome, GuardedProvider};
pub use resolver::{CanonicalResearcher, IdentityResolver};
pub use service::{FallbackNotice, FallbackReason, NetworkResponse, NetworkService};

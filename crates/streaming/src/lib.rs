//! Exact-count refinement for clusters.
//!
//! A cluster's reported totals are approximate (a max and a sum over
//! members that may share postings). `RefinementCache` fetches the exact
//! deduplicated total from an external service, keyed by the cluster's
//! `Fingerprint`, with one in-flight call per fingerprint and a freshness
//! window for resolved results.

pub mod cache;
pub mod fingerprint;
pub mod protocol;
pub mod service;
pub mod status;

pub use cache::*;
pub use fingerprint::*;
pub use protocol::*;
pub use service::*;
pub use status::*;

//! Per-location aggregation of job-count observations.
//!
//! Raw counts arrive as one `Observation` per (location, role, seniority)
//! combination. `merge` folds the per-role lists into one
//! `CompositeLocation` per `(city, state)`.

pub mod link;
pub mod location;
pub mod merge;
pub mod observation;
pub mod roles;

pub use link::*;
pub use location::*;
pub use merge::*;
pub use observation::*;
pub use roles::*;

//! Session layer: ties counts loading, merging, clustering and refinement
//! together for one map view.

pub mod context;
pub mod session;

pub use context::*;
pub use session::*;

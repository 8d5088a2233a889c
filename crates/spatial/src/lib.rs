pub mod cluster;
pub mod index;
pub mod kdtree;

pub use cluster::*;
pub use index::*;
pub use kdtree::*;

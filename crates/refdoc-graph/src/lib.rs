//! Reference graph construction and the filters that decide which types
//! receive their own documentation section.

mod graph;
mod requested;

pub use graph::ReferenceGraph;
pub use requested::RequestedSet;

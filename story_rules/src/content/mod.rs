//! Authored content: dialogue graphs, access conditions, and consequences.
//!
//! Everything here is loaded read-only. The engine never creates or deletes
//! nodes or choices.

mod change;
mod condition;
mod graph;

pub use change::*;
pub use condition::*;
pub use graph::*;

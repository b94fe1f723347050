//! # Narrative Core
//!
//! The engine of the branching-narrative system. This crate reads the content
//! and state types from `story_rules`, decides what the player may see and do,
//! and produces the next state after every choice.
//!
//! ## Core Components
//!
//! - **conditions**: Evaluates content conditions against a player state
//! - **navigation**: Reachable nodes and content variant selection
//! - **mutation**: Applies state changes as new immutable snapshots
//! - **ordering**: Narrative gravity and seeded display ordering of choices
//! - **access**: Gates for simulation stages
//! - **persistence**: Versioned saves with migration and a rolling backup
//! - **session**: Drives one player through one dialogue graph
//!
//! ## Design Philosophy
//!
//! - **Snapshots, not mutation**: Every change yields a new `PlayerState` sharing untouched parts
//! - **Never strand the player**: Missing content and locked choices degrade to something playable
//! - **Deterministic where it shows**: Choice order is stable for a given player and node

pub mod access;
pub mod conditions;
pub mod mutation;
pub mod navigation;
pub mod ordering;
pub mod persistence;
pub mod session;

pub use access::*;
pub use conditions::*;
pub use mutation::*;
pub use navigation::*;
pub use ordering::*;
pub use persistence::*;
pub use session::*;

//! # Story Rules
//!
//! The "Story Bible" crate - player save data, authored content types, and the
//! read-only metadata tables the narrative engine consults.
//! This crate is the single source of truth for story state and contains no
//! evaluation or traversal logic.

pub mod characters;
pub mod config;
pub mod content;
pub mod error;
pub mod patterns;
pub mod player_state;

pub use characters::*;
pub use config::*;
pub use content::*;
pub use error::*;
pub use patterns::*;
pub use player_state::*;

//! State module for tracking crawl progress
//!
//! This module provides the run-scoped state shared by every concurrent branch of a crawl.
//!
//! # Components
//!
//! - `Progress`: lock-free counters for created, completed and outstanding fetches
//! - `History`: the visited-URL claim set guaranteeing at-most-once scheduling

mod history;
mod progress;

// Re-export main types
pub use history::History;
pub use progress::Progress;

//! Narration text handling.

/// Sentence splitting and bounded-length segment grouping.
pub mod segment;

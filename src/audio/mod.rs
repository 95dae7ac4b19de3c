//! Narration audio mixing.

pub mod mix;

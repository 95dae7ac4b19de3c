//! Text-to-speech: the client seam, the Google REST backend and the retrying synthesizer.

pub mod client;
pub mod google;
pub mod synth;

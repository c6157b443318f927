//! Harmonigilo Core - multi-voice pitch/delay/pan engine
//!
//! The real-time signal path of a harmonizer effect: per audio block, up to N
//! mono voices are independently pitch-shifted through an external
//! time-stretch engine, delayed, panned and gained with mute/solo
//! arbitration, then summed with a latency-aligned dry path into a stereo
//! output. The plugin shell, parameter marshaling and UI live elsewhere; this
//! crate is only the engine.

pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod ring;
pub mod stretch;
pub mod types;

pub use types::*;

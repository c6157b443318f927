//! The per-block real-time engine
//!
//! Components of the signal path:
//! - PitchShiftAdapter: feeds/drains one voice's external stretch engine
//! - DelayLine: per-voice ring delay with per-block delay changes
//! - LatencyCoordinator: nets engine latency against configured delays
//! - mixer: gain/pan/mute/solo summing into the stereo buses
//! - HarmonigiloEngine: ties everything together, one call per audio block

mod delay;
mod engine;
mod latency;
pub mod mixer;
mod shifter;
mod voice;

pub use delay::*;
pub use engine::*;
pub use latency::*;
pub use shifter::*;
pub use voice::*;

//! Parameter snapshots
//!
//! The host (plugin shell, UI, automation) owns parameter marshaling; the
//! engine just reads these plain values once at the start of every block.
//! Out-of-range values are clamped at the point of use, never rejected.

use serde::{Deserialize, Serialize};

use crate::types::NUM_VOICES;

/// Pitch range in cents (one semitone either way)
pub const PITCH_CENTS_MIN: f32 = -100.0;
pub const PITCH_CENTS_MAX: f32 = 100.0;

/// Gain, pan, mute and solo shared by voices and the dry path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceControls {
    /// Gain in dB, clamped to −60..+6 at mix time
    pub gain_db: f32,
    /// Pan position, 0.0 = hard left, 1.0 = hard right
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
}

impl Default for SourceControls {
    fn default() -> Self {
        Self {
            gain_db: 0.0,
            pan: 0.5,
            mute: false,
            solo: false,
        }
    }
}

/// Per-voice parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    /// Disabled voices are skipped entirely: not fed, not mixed
    pub enabled: bool,
    /// Requested delay in milliseconds, clamped to the configured maximum
    pub delay_ms: f32,
    /// Pitch shift in cents, clamped to −100..+100
    pub pitch_cents: f32,
    pub controls: SourceControls,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 0.0,
            pitch_cents: 0.0,
            controls: SourceControls::default(),
        }
    }
}

/// Full parameter snapshot for one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Master bypass: when false the input is passed through at −3 dB
    pub enabled: bool,
    pub voices: Vec<VoiceParams>,
    pub dry: SourceControls,
    /// Crossfade between the dry path (0.0) and the voice sum (1.0)
    pub dry_wet: f32,
    /// Stereo spread of the voice pans about center, 0.0 = all mono
    pub width: f32,
    /// Master gain in dB, clamped to −60..+48 at mix time
    pub master_gain_db: f32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self::with_voices(NUM_VOICES)
    }
}

impl EngineParams {
    /// Default parameters for the given voice count
    pub fn with_voices(num_voices: usize) -> Self {
        Self {
            enabled: true,
            voices: vec![VoiceParams::default(); num_voices],
            dry: SourceControls::default(),
            dry_wet: 0.5,
            width: 1.0,
            master_gain_db: 0.0,
        }
    }
}

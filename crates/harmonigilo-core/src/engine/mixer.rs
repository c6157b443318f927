//! Stereo summing with gain, pan, mute and solo arbitration
//!
//! Every source (voice or dry) carries gain/pan/mute/solo. Soloing any source
//! silences all non-solo sources; mute always wins for the muted source
//! itself. Gains are clamped to their configured dB ranges - clamping is a
//! saturating policy, never an error.

use crate::params::{SourceControls, VoiceParams};
use crate::types::{Sample, StereoSample};

/// Voice and dry gain range in dB
pub const GAIN_MIN_DB: f32 = -60.0;
pub const GAIN_MAX_DB: f32 = 6.0;

/// Master gain range in dB
pub const MASTER_GAIN_MIN_DB: f32 = -60.0;
pub const MASTER_GAIN_MAX_DB: f32 = 48.0;

/// Convert a gain in dB to a linear factor
#[inline]
pub fn db_to_linear(db: f32) -> Sample {
    (db / 20.0 * std::f32::consts::LN_10).exp()
}

/// Convert a linear factor to dB
#[inline]
pub fn linear_to_db(linear: Sample) -> f32 {
    20.0 * linear.log10()
}

/// Whether any source requests solo, which overrides everything non-solo
pub fn solo_engaged(voices: &[VoiceParams], dry: &SourceControls) -> bool {
    dry.solo || voices.iter().any(|v| v.enabled && v.controls.solo)
}

/// Linear gain a source contributes with, after mute/solo arbitration.
///
/// Zero when the source is muted, or when solo is engaged elsewhere and this
/// source is not itself soloed.
pub fn effective_gain(controls: &SourceControls, solo: bool) -> Sample {
    if controls.mute || (solo && !controls.solo) {
        return 0.0;
    }
    db_to_linear(controls.gain_db.clamp(GAIN_MIN_DB, GAIN_MAX_DB))
}

/// Scale a pan position's distance from center by the stereo width
#[inline]
pub fn spread_pan(pan: f32, width: f32) -> f32 {
    0.5 + (pan.clamp(0.0, 1.0) - 0.5) * width.clamp(0.0, 1.0)
}

/// Sum a panned mono source into the stereo buses
pub fn add_source(out: &mut [StereoSample], source: &[Sample], gain: Sample, pan: f32) {
    debug_assert!(source.len() >= out.len());
    if gain == 0.0 {
        return;
    }
    for (slot, &s) in out.iter_mut().zip(source.iter()) {
        let p = gain * s;
        slot.left += p * (1.0 - pan);
        slot.right += p * pan;
    }
}

/// Apply the master gain to the summed buses
pub fn apply_master_gain(out: &mut [StereoSample], master_gain_db: f32) {
    let gain = db_to_linear(master_gain_db.clamp(MASTER_GAIN_MIN_DB, MASTER_GAIN_MAX_DB));
    if gain == 1.0 {
        return;
    }
    for slot in out.iter_mut() {
        *slot *= gain;
    }
}

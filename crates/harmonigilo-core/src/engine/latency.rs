//! Cross-voice latency reconciliation
//!
//! Each voice's pitch engine introduces its own processing delay, which
//! drifts as the engine's internal buffering ramps up with pitch-ratio
//! changes. Per block that delay is netted against the voice's configured
//! delay; whatever cannot be absorbed becomes reported output latency, which
//! also time-aligns the dry path so dry and wet stay phase-locked.

/// Result of netting a voice's engine latency against its configured delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoiceAlignment {
    /// Delay the voice's delay line actually applies
    pub effective_delay: usize,
    /// Engine latency left over after the configured delay absorbed its share
    pub remaining_latency: usize,
}

/// Convert a delay in milliseconds to samples at the given rate
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    (ms as f64 * sample_rate as f64 / 1000.0).round() as usize
}

/// Net a voice's engine latency against its configured delay.
///
/// The configured delay absorbs as much of the engine latency as it can: if
/// the engine is slower than the requested delay, the delay line applies
/// nothing and the excess must be compensated downstream.
pub fn net_delay(delay_samples: usize, engine_latency: usize) -> VoiceAlignment {
    if engine_latency > delay_samples {
        VoiceAlignment {
            effective_delay: 0,
            remaining_latency: engine_latency - delay_samples,
        }
    } else {
        VoiceAlignment {
            effective_delay: delay_samples - engine_latency,
            remaining_latency: 0,
        }
    }
}

/// Derives the single reported output latency from the per-voice leftovers
#[derive(Debug, Default)]
pub struct LatencyCoordinator {
    reported: usize,
}

impl LatencyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the reported latency as the maximum `remaining_latency`
    /// across the currently active voices.
    pub fn recalculate(&mut self, remaining: impl Iterator<Item = usize>) -> usize {
        let new = remaining.max().unwrap_or(0);
        if new != self.reported {
            log::debug!(
                "output latency changed: {} -> {} samples",
                self.reported,
                new
            );
        }
        self.reported = new;
        new
    }

    /// Latency currently reported to the host
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn reset(&mut self) {
        self.reported = 0;
    }
}

//! One pitch-shifted, delayed signal path

use super::delay::DelayLine;
use super::shifter::PitchShiftAdapter;
use crate::stretch::StretchEngine;
use crate::types::Sample;

/// One voice of the harmonizer.
///
/// Owns its pitch engine (behind the adapter), its delay line, and a
/// persistent output block. The output block is deliberately not cleared
/// between blocks: when the pitch engine yields fewer samples than a full
/// block, the delay line only overwrites the tail and the front keeps what a
/// prior block left there.
pub struct Voice {
    pub shifter: PitchShiftAdapter,
    pub delay: DelayLine,
    /// Per-block output, sized to the maximum block length
    pub out: Vec<Sample>,
    /// Delay the delay line applies this block, after latency netting
    pub effective_delay: usize,
    /// Engine latency this block that the configured delay could not absorb
    pub remaining_latency: usize,
}

impl Voice {
    pub fn new(engine: Box<dyn StretchEngine>, ring_capacity: usize, max_block: usize) -> Self {
        Self {
            shifter: PitchShiftAdapter::new(engine, ring_capacity),
            delay: DelayLine::new(ring_capacity),
            out: vec![0.0; max_block],
            effective_delay: 0,
            remaining_latency: 0,
        }
    }

    /// Flush all per-voice state (activation / host reset)
    pub fn reset(&mut self) {
        self.shifter.reset();
        self.delay.clear();
        self.out.fill(0.0);
        self.effective_delay = 0;
        self.remaining_latency = 0;
    }
}

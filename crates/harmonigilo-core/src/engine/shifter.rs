//! Per-voice pitch-shift adapter
//!
//! Drives one external stretch engine through its feed/drain cycle and
//! accumulates the produced samples in a ring until the delay stage consumes
//! them. The engine's internal chunking is independent of the host's block
//! size, so one block may take several feed/drain iterations, and output may
//! lag input by the engine's latency before a later block delivers a backlog.

use crate::params::{PITCH_CENTS_MAX, PITCH_CENTS_MIN};
use crate::ring::SampleRing;
use crate::stretch::{cents_to_ratio, StretchEngine};
use crate::types::Sample;

/// Wraps a stretch engine and buffers its output for the delay stage.
pub struct PitchShiftAdapter {
    engine: Box<dyn StretchEngine>,
    pitch_ring: SampleRing,
    /// Output samples drained from the engine but not yet consumed
    pending: usize,
}

impl PitchShiftAdapter {
    pub fn new(engine: Box<dyn StretchEngine>, ring_capacity: usize) -> Self {
        Self {
            engine,
            pitch_ring: SampleRing::new(ring_capacity),
            pending: 0,
        }
    }

    /// Set the engine's pitch ratio from a cents parameter, clamped to range
    pub fn set_pitch_cents(&mut self, cents: f32) {
        let cents = cents.clamp(PITCH_CENTS_MIN, PITCH_CENTS_MAX);
        self.engine.set_pitch_scale(cents_to_ratio(cents));
    }

    /// Current engine-internal processing delay in samples
    pub fn latency(&self) -> usize {
        self.engine.latency()
    }

    /// Output samples ready for the delay stage
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Feed one input block through the engine, draining after each chunk.
    ///
    /// Chunks are sized to exactly what the engine reports it will accept.
    /// Draining is bounded so the drained-but-unconsumed backlog never
    /// exceeds the block length; anything beyond that stays inside the engine
    /// until a later block.
    pub fn feed_block(&mut self, input: &[Sample], scratch: &mut [Sample]) {
        let block_len = input.len();
        let mut fed = 0;

        while fed < block_len {
            let chunk = self.engine.samples_required().min(block_len - fed);
            if chunk == 0 {
                // Engine refuses input until more output is drained; the
                // backlog cap means the rest waits for the next block.
                break;
            }
            self.engine.process(&input[fed..fed + chunk]);
            fed += chunk;
            self.drain(block_len, scratch);
        }
    }

    fn drain(&mut self, block_len: usize, scratch: &mut [Sample]) {
        while self.engine.available() > 0 && self.pending < block_len {
            let want = (block_len - self.pending).min(scratch.len());
            let got = self.engine.retrieve(&mut scratch[..want]);
            if got == 0 {
                break;
            }
            self.pitch_ring.put(&scratch[..got]);
            self.pending += got;
        }
    }

    /// Hand up to `dst.len()` buffered samples to the delay stage.
    ///
    /// Returns how many were actually available; fewer than a full block is a
    /// normal startup transient, not an error.
    pub fn pull(&mut self, dst: &mut [Sample]) -> usize {
        let n = self.pending.min(dst.len());
        self.pitch_ring.take(&mut dst[..n]);
        self.pending -= n;
        n
    }

    /// Flush the engine and the accumulated output (activation / host reset)
    pub fn reset(&mut self) {
        self.engine.reset();
        self.pitch_ring.reset();
        self.pending = 0;
    }
}

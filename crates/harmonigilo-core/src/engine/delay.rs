//! Per-voice delay line
//!
//! A ring buffer addressed by a delay-in-samples that may change every block.
//! This is deliberately sample-address arithmetic over a fixed arena, not a
//! queue: the capacity never changes and a new delay value needs no
//! reallocation, just a different read offset.

use crate::ring::SampleRing;
use crate::types::Sample;

/// Delay line over a fixed-capacity ring.
///
/// Each newly available input sample is written into the ring while the
/// sample `delay_samples` positions behind it is read out. When a block has
/// fewer fresh samples than its full length, the valid output is
/// right-aligned: only the tail of the output block is overwritten and the
/// front keeps whatever a prior block (or silence) left there.
#[derive(Debug)]
pub struct DelayLine {
    ring: SampleRing,
    delay_samples: usize,
}

impl DelayLine {
    /// Create a delay line with the given ring capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: SampleRing::new(capacity),
            delay_samples: 0,
        }
    }

    /// Set the delay in samples, clamping to `capacity - 1`.
    ///
    /// Clamping is a saturating policy, never an error.
    pub fn set_delay(&mut self, samples: usize) {
        if samples >= self.ring.capacity() {
            log::warn!(
                "delay of {} samples exceeds ring capacity {}, clamping",
                samples,
                self.ring.capacity()
            );
        }
        self.delay_samples = samples.min(self.ring.capacity() - 1);
    }

    /// Current delay in samples
    pub fn delay(&self) -> usize {
        self.delay_samples
    }

    /// Write `fresh` into the ring and read the delayed stream into the tail
    /// of `out`.
    ///
    /// `fresh` holds the samples that actually became available this block;
    /// `out` is the full block. Only the last `fresh.len()` entries of `out`
    /// are overwritten.
    pub fn process_block(&mut self, fresh: &[Sample], out: &mut [Sample]) {
        let avail = fresh.len();
        assert!(avail <= out.len(), "more fresh samples than block length");

        // Write and read in runs of at most capacity - delay samples so the
        // read span behind the cursor never exceeds the capacity; a longer
        // span would wrap around and return samples written in the same run
        // instead of the oldest retained data. With the delay at its ceiling
        // of capacity - 1 this degenerates to one sample per run.
        let run = self.ring.capacity() - self.delay_samples;
        let mut done = out.len() - avail;
        for chunk in fresh.chunks(run) {
            self.ring.put(chunk);
            // After the put the write cursor sits chunk.len() past the first
            // fresh sample, so the delayed run starts delay + len behind it.
            let span = (self.delay_samples + chunk.len()) as isize;
            self.ring
                .get_relative(-span, &mut out[done..done + chunk.len()]);
            done += chunk.len();
        }
    }

    /// Zero the ring (activation / host reset)
    pub fn clear(&mut self) {
        self.ring.reset();
    }
}

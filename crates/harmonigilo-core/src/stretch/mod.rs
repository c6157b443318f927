//! Pitch shifting via an external time-stretch engine
//!
//! The engine is treated as a capability interface - feed input, drain output,
//! ask for latency - so any conforming implementation can be substituted
//! without touching the control logic. The default implementation wraps
//! signalsmith-stretch configured for causal, real-time mono operation.

use signalsmith_stretch::Stretch;

use crate::types::{Sample, MAX_BLOCK_SAMPLES};

/// Nominal feed chunk for the signalsmith wrapper
const FEED_CHUNK: usize = 512;

/// Output FIFO capacity; covers a full block of backlog plus a block in flight
const FIFO_CAPACITY: usize = 4 * MAX_BLOCK_SAMPLES;

/// Convert a pitch offset in cents to a multiplicative frequency ratio
#[inline]
pub fn cents_to_ratio(cents: f32) -> f64 {
    2f64.powf(cents as f64 / 1200.0)
}

/// Capability interface of a causal, real-time time/pitch-stretch engine.
///
/// The calling convention is pull-based: feed at most `samples_required()`
/// input samples per `process` call, then drain whatever `available()`
/// reports via `retrieve`. `available()` returning 0 is a normal startup
/// transient, not an error, and output may lag input by `latency()` samples.
pub trait StretchEngine: Send {
    /// Set the multiplicative pitch ratio (1.0 = no shift)
    fn set_pitch_scale(&mut self, ratio: f64);

    /// How many input samples the engine will accept in the next `process` call
    fn samples_required(&self) -> usize;

    /// Feed input samples; `input.len()` must not exceed `samples_required()`
    fn process(&mut self, input: &[Sample]);

    /// Count of output samples ready to retrieve
    fn available(&self) -> usize;

    /// Drain up to `output.len()` processed samples; returns the count written
    fn retrieve(&mut self, output: &mut [Sample]) -> usize;

    /// Current internal processing delay in samples
    fn latency(&self) -> usize;

    /// Flush all internal state (host reset)
    fn reset(&mut self);
}

/// Mono pitch shifter backed by signalsmith-stretch.
///
/// signalsmith-stretch is push-style (equal-length input/output with the
/// latency folded into the output stream), so this wrapper runs each fed
/// chunk through the stretcher at unity time ratio and parks the result in a
/// pre-allocated FIFO that the pull side drains. Sample counts are conserved:
/// one output sample per input sample, shifted in time by `latency()`.
pub struct SignalsmithShifter {
    stretch: Stretch,
    fifo: Vec<Sample>,
    fifo_start: usize,
}

impl SignalsmithShifter {
    /// Create a mono shifter at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            stretch: Stretch::preset_default(1, sample_rate),
            fifo: Vec::with_capacity(FIFO_CAPACITY),
            fifo_start: 0,
        }
    }
}

impl StretchEngine for SignalsmithShifter {
    fn set_pitch_scale(&mut self, ratio: f64) {
        let semitones = 12.0 * ratio.max(f64::MIN_POSITIVE).log2();
        self.stretch
            .set_transpose_factor_semitones(semitones as f32, None);
    }

    fn samples_required(&self) -> usize {
        let free = self.fifo.capacity() - self.fifo.len();
        FEED_CHUNK.min(free)
    }

    fn process(&mut self, input: &[Sample]) {
        if input.is_empty() {
            return;
        }
        let start = self.fifo.len();
        debug_assert!(start + input.len() <= self.fifo.capacity());
        // resize stays within the pre-allocated capacity: no allocation
        self.fifo.resize(start + input.len(), 0.0);
        let (_, out) = self.fifo.split_at_mut(start);
        self.stretch.process(input, out);
    }

    fn available(&self) -> usize {
        self.fifo.len() - self.fifo_start
    }

    fn retrieve(&mut self, output: &mut [Sample]) -> usize {
        let n = self.available().min(output.len());
        output[..n].copy_from_slice(&self.fifo[self.fifo_start..self.fifo_start + n]);
        self.fifo_start += n;
        // Compact so samples_required() never collapses to zero
        if self.fifo_start > 0 {
            self.fifo.copy_within(self.fifo_start.., 0);
            self.fifo.truncate(self.fifo.len() - self.fifo_start);
            self.fifo_start = 0;
        }
        n
    }

    fn latency(&self) -> usize {
        self.stretch.input_latency() + self.stretch.output_latency()
    }

    fn reset(&mut self) {
        self.stretch.reset();
        self.fifo.clear();
        self.fifo_start = 0;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_to_ratio() {
        assert!((cents_to_ratio(0.0) - 1.0).abs() < 1e-12);
        // +100 cents = one semitone up
        assert!((cents_to_ratio(100.0) - 2f64.powf(1.0 / 12.0)).abs() < 1e-9);
        assert!((cents_to_ratio(-1200.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_passthrough_lags_by_latency() {
        use super::testing::PassthroughShifter;

        let mut engine = PassthroughShifter::new(3);
        engine.set_pitch_scale(2.0);
        assert_eq!(engine.ratio(), 2.0);

        engine.process(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(engine.available(), 2);

        let mut out = [0.0; 8];
        let got = engine.retrieve(&mut out);
        assert_eq!(got, 2);
        assert_eq!(&out[..2], &[1.0, 2.0]);
        assert_eq!(engine.available(), 0);
    }

    #[test]
    fn test_signalsmith_shifter_contract() {
        let mut engine = SignalsmithShifter::new(48_000);
        assert!(engine.latency() > 0);

        engine.set_pitch_scale(cents_to_ratio(50.0));

        let required = engine.samples_required();
        assert!(required > 0);

        let input = vec![0.1; required];
        engine.process(&input);
        assert_eq!(engine.available(), required);

        let mut out = vec![0.0; required];
        let got = engine.retrieve(&mut out);
        assert_eq!(got, required);
        assert_eq!(engine.available(), 0);

        engine.reset();
        assert_eq!(engine.available(), 0);
    }
}

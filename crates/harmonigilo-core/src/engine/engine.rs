//! Main engine - per-block driver for all voices and the dry path
//!
//! Invoked once per audio block by a real-time callback that must not block
//! or allocate. Everything is pre-allocated at construction; activation is
//! the only lifecycle event that clears state.

use super::delay::DelayLine;
use super::latency::{ms_to_samples, net_delay, LatencyCoordinator};
use super::mixer;
use super::voice::Voice;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::params::EngineParams;
use crate::stretch::{SignalsmithShifter, StretchEngine};
use crate::types::{Sample, StereoBuffer, StereoSample};

/// Attenuation applied to the passed-through signal when the effect is
/// disabled, so toggling it does not jump the perceived level
const BYPASS_GAIN_DB: f32 = -3.0;

/// The multi-voice pitch/delay/pan engine.
///
/// Per block: the input is copied once, fed to every enabled voice's pitch
/// adapter, drained through that voice's delay line, and summed - with the
/// latency-aligned dry signal - into a stereo output. The host reads
/// [`latency`](Self::latency) after each block for downstream compensation.
pub struct HarmonigiloEngine {
    config: EngineConfig,
    params: EngineParams,
    voices: Vec<Voice>,
    /// Delays the raw input by the reported latency to keep it phase-aligned
    dry_delay: DelayLine,
    coordinator: LatencyCoordinator,
    copied_input: Vec<Sample>,
    retrieve_scratch: Vec<Sample>,
    staged: Vec<Sample>,
    dry_out: Vec<Sample>,
}

impl HarmonigiloEngine {
    /// Create an engine with one signalsmith pitch shifter per voice
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let engines = (0..config.num_voices)
            .map(|_| Box::new(SignalsmithShifter::new(config.sample_rate)) as Box<dyn StretchEngine>)
            .collect();
        Self::with_engines(config, engines)
    }

    /// Create an engine with caller-supplied pitch engines.
    ///
    /// Any conforming [`StretchEngine`] can be substituted without touching
    /// the control logic; `engines.len()` must match the configured voice
    /// count.
    pub fn with_engines(
        config: EngineConfig,
        engines: Vec<Box<dyn StretchEngine>>,
    ) -> EngineResult<Self> {
        if config.sample_rate == 0 {
            return Err(EngineError::InvalidSampleRate);
        }
        if config.num_voices == 0 {
            return Err(EngineError::NoVoices);
        }
        if config.max_block_samples == 0 {
            return Err(EngineError::ZeroBlockSize);
        }
        if !(config.max_delay_ms > 0.0) {
            return Err(EngineError::InvalidMaxDelay(config.max_delay_ms));
        }
        if engines.len() != config.num_voices {
            return Err(EngineError::VoiceCountMismatch {
                expected: config.num_voices,
                got: engines.len(),
            });
        }

        // One block of headroom beyond the max delay so a full put and the
        // furthest read never collide
        let ring_capacity = config.max_delay_samples() + config.max_block_samples;
        let max_block = config.max_block_samples;

        let voices = engines
            .into_iter()
            .map(|engine| Voice::new(engine, ring_capacity, max_block))
            .collect();

        Ok(Self {
            params: EngineParams::with_voices(config.num_voices),
            voices,
            dry_delay: DelayLine::new(ring_capacity),
            coordinator: LatencyCoordinator::new(),
            copied_input: vec![0.0; max_block],
            retrieve_scratch: vec![0.0; max_block],
            staged: vec![0.0; max_block],
            dry_out: vec![0.0; max_block],
            config,
        })
    }

    /// Clear all buffers and counters. Must be called before the first block
    /// and may be called again on host reset to flush state.
    pub fn activate(&mut self) {
        log::info!(
            "engine activated: {} voices at {} Hz",
            self.config.num_voices,
            self.config.sample_rate
        );
        for voice in &mut self.voices {
            voice.reset();
        }
        self.dry_delay.clear();
        self.coordinator.reset();
        self.copied_input.fill(0.0);
        self.retrieve_scratch.fill(0.0);
        self.staged.fill(0.0);
        self.dry_out.fill(0.0);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Parameter snapshot the next block will read
    pub fn params_mut(&mut self) -> &mut EngineParams {
        &mut self.params
    }

    /// Output latency in samples currently reported to the host
    pub fn latency(&self) -> usize {
        self.coordinator.reported()
    }

    /// Process one block of mono input into the stereo output.
    ///
    /// `output.len()` must equal `input.len()`, which must not exceed the
    /// configured maximum block size; larger blocks are a contract violation
    /// and fail fast.
    pub fn process(&mut self, input: &[Sample], output: &mut StereoBuffer) {
        let n = input.len();
        assert!(
            n <= self.config.max_block_samples,
            "block of {} samples exceeds preallocated capacity {}",
            n,
            self.config.max_block_samples
        );
        assert_eq!(output.len(), n, "output block length must match input");

        if !self.params.enabled {
            let gain = mixer::db_to_linear(BYPASS_GAIN_DB);
            for (slot, &s) in output.iter_mut().zip(input.iter()) {
                *slot = StereoSample::mono(s * gain);
            }
            return;
        }

        let Self {
            config,
            params,
            voices,
            dry_delay,
            coordinator,
            copied_input,
            retrieve_scratch,
            staged,
            dry_out,
        } = self;

        copied_input[..n].copy_from_slice(input);

        // Net each enabled voice's engine latency against its configured
        // delay, then derive the single reported latency from the leftovers
        for (voice, vp) in voices.iter_mut().zip(params.voices.iter()) {
            if !vp.enabled {
                continue;
            }
            let delay_samples = ms_to_samples(
                vp.delay_ms.clamp(0.0, config.max_delay_ms),
                config.sample_rate,
            );
            let alignment = net_delay(delay_samples, voice.shifter.latency());
            voice.effective_delay = alignment.effective_delay;
            voice.remaining_latency = alignment.remaining_latency;
        }
        let reported = coordinator.recalculate(
            voices
                .iter()
                .zip(params.voices.iter())
                .filter(|(_, vp)| vp.enabled)
                .map(|(voice, _)| voice.remaining_latency),
        );

        // Pitch-shift and delay every enabled voice
        for (voice, vp) in voices.iter_mut().zip(params.voices.iter()) {
            if !vp.enabled {
                continue;
            }
            voice.shifter.set_pitch_cents(vp.pitch_cents);
            voice.shifter.feed_block(&copied_input[..n], retrieve_scratch);

            let avail = voice.shifter.pull(&mut staged[..n]);
            voice.delay.set_delay(voice.effective_delay);
            voice.delay.process_block(&staged[..avail], &mut voice.out[..n]);
        }

        // Mix: latency-aligned dry plus all enabled voices
        output.fill_silence();
        let out = output.as_mut_slice();
        let solo = mixer::solo_engaged(&params.voices, &params.dry);
        let mix = params.dry_wet.clamp(0.0, 1.0);

        dry_delay.set_delay(reported);
        dry_delay.process_block(&copied_input[..n], &mut dry_out[..n]);
        let dry_gain = mixer::effective_gain(&params.dry, solo) * (1.0 - mix);
        mixer::add_source(out, &dry_out[..n], dry_gain, params.dry.pan.clamp(0.0, 1.0));

        for (voice, vp) in voices.iter().zip(params.voices.iter()) {
            if !vp.enabled {
                continue;
            }
            let gain = mixer::effective_gain(&vp.controls, solo) * mix;
            let pan = mixer::spread_pan(vp.controls.pan, params.width);
            mixer::add_source(out, &voice.out[..n], gain, pan);
        }

        mixer::apply_master_gain(out, params.master_gain_db);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::stretch::testing::PassthroughShifter;

    const RATE: u32 = 48_000;

    fn test_config(num_voices: usize) -> EngineConfig {
        EngineConfig {
            sample_rate: RATE,
            num_voices,
            max_block_samples: 1024,
            max_delay_ms: 100.0,
        }
    }

    /// Engine with zero-latency pass-through shifters
    fn test_engine(num_voices: usize) -> HarmonigiloEngine {
        let engines = (0..num_voices)
            .map(|_| Box::new(PassthroughShifter::new(0)) as Box<dyn StretchEngine>)
            .collect();
        let mut engine =
            HarmonigiloEngine::with_engines(test_config(num_voices), engines).unwrap();
        engine.activate();
        engine
    }

    fn sine_1khz(len: usize) -> Vec<Sample> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / RATE as f32).sin())
            .collect()
    }

    #[test]
    fn test_construction_validation() {
        let config = EngineConfig {
            sample_rate: 0,
            ..test_config(1)
        };
        assert!(matches!(
            HarmonigiloEngine::with_engines(config, vec![Box::new(PassthroughShifter::new(0))]),
            Err(EngineError::InvalidSampleRate)
        ));

        assert!(matches!(
            HarmonigiloEngine::with_engines(test_config(0), vec![]),
            Err(EngineError::NoVoices)
        ));

        assert!(matches!(
            HarmonigiloEngine::with_engines(test_config(2), vec![]),
            Err(EngineError::VoiceCountMismatch { expected: 2, got: 0 })
        ));
    }

    #[test]
    #[should_panic(expected = "exceeds preallocated capacity")]
    fn test_oversized_block_fails_fast() {
        let mut engine = test_engine(1);
        let input = vec![0.0; 1025];
        let mut output = StereoBuffer::silence(1025);
        engine.process(&input, &mut output);
    }

    #[test]
    fn test_bypass_passes_input_at_minus_3db() {
        let mut engine = test_engine(1);
        engine.params_mut().enabled = false;

        let input = vec![1.0; 16];
        let mut output = StereoBuffer::silence(16);
        engine.process(&input, &mut output);

        let expected = mixer::db_to_linear(-3.0);
        for s in output.iter() {
            assert!((s.left - expected).abs() < 1e-6);
            assert_eq!(s.left, s.right);
        }

        // The host-facing interleaved view sees the same frames as [L, R, ...]
        let interleaved = output.as_interleaved();
        assert_eq!(interleaved.len(), 32);
        for pair in interleaved.chunks_exact(2) {
            assert_eq!(pair[0], pair[1]);
            assert!((pair[0] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_single_voice_10ms_delay_scenario() {
        // Single voice, pitch 0, delay 10ms, gain 0dB, pan 0.5, dry muted:
        // the output is the input delayed by 480 samples, split equally
        let mut engine = test_engine(1);
        {
            let params = engine.params_mut();
            params.voices[0].enabled = true;
            params.voices[0].delay_ms = 10.0;
            params.dry.mute = true;
            params.dry_wet = 1.0;
        }

        let signal = sine_1khz(960);
        let mut output = StereoBuffer::silence(480);

        engine.process(&signal[..480], &mut output);
        // Delay equals the block length: nothing of the signal is out yet
        assert!(output.peak() < 1e-9);

        engine.process(&signal[480..], &mut output);
        for (i, s) in output.iter().enumerate() {
            let expected = signal[i] * 0.5;
            assert!(
                (s.left - expected).abs() < 1e-6,
                "sample {}: left {} expected {}",
                i,
                s.left,
                expected
            );
            assert!((s.right - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_solo_voice_silences_the_other() {
        // Two voices, delay 0, pitch 0, one soloed: only the soloed voice
        // appears even though the other has +6 dB of gain
        let mut engine = test_engine(2);
        {
            let params = engine.params_mut();
            for vp in &mut params.voices {
                vp.enabled = true;
            }
            params.voices[0].controls.solo = true;
            params.voices[1].controls.gain_db = 6.0;
            params.dry.mute = true;
            params.dry_wet = 1.0;
        }

        let input = vec![1.0; 64];
        let mut output = StereoBuffer::silence(64);
        engine.process(&input, &mut output);

        // Exactly the soloed voice's unity gain at center pan
        for s in output.iter() {
            assert!((s.left - 0.5).abs() < 1e-6);
            assert!((s.right - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_muted_voice_contributes_nothing() {
        let mut engine = test_engine(1);
        {
            let params = engine.params_mut();
            params.voices[0].enabled = true;
            params.voices[0].controls.mute = true;
            params.voices[0].controls.gain_db = 6.0;
            params.dry.mute = true;
        }

        let input = vec![1.0; 64];
        let mut output = StereoBuffer::silence(64);
        engine.process(&input, &mut output);
        assert_eq!(output.peak(), 0.0);
    }

    #[test]
    fn test_dry_path_aligned_to_reported_latency() {
        // A voice whose engine latency exceeds its delay forces nonzero
        // reported latency; the dry signal must be shifted by exactly that
        let latency = Arc::new(AtomicUsize::new(400));
        let engines: Vec<Box<dyn StretchEngine>> = vec![Box::new(
            PassthroughShifter::with_shared_latency(latency.clone()),
        )];
        let mut engine = HarmonigiloEngine::with_engines(test_config(1), engines).unwrap();
        engine.activate();
        {
            let params = engine.params_mut();
            params.voices[0].enabled = true;
            params.voices[0].delay_ms = 0.0;
            params.voices[0].controls.mute = true;
            params.dry_wet = 0.0; // full dry
        }

        let mut input = vec![0.0; 480];
        input[0] = 1.0;
        let mut output = StereoBuffer::silence(480);
        engine.process(&input, &mut output);

        assert_eq!(engine.latency(), 400);
        assert!((output[400].left - 0.5).abs() < 1e-6);
        assert!(output[0].left.abs() < 1e-9);
    }

    #[test]
    fn test_reported_latency_tracks_engine_swing() {
        // Latency ramps up and back down as a pitch ratio would drag it;
        // the reported value follows the max remaining latency exactly
        let latency = Arc::new(AtomicUsize::new(100));
        let engines: Vec<Box<dyn StretchEngine>> = vec![Box::new(
            PassthroughShifter::with_shared_latency(latency.clone()),
        )];
        let mut engine = HarmonigiloEngine::with_engines(test_config(1), engines).unwrap();
        engine.activate();
        {
            let params = engine.params_mut();
            params.voices[0].enabled = true;
            params.voices[0].delay_ms = 5.0; // 240 samples
        }

        let input = vec![0.0; 256];
        let mut output = StereoBuffer::silence(256);

        let mut previous = 0;
        for engine_latency in [100usize, 240, 400, 520, 400, 240, 100] {
            latency.store(engine_latency, Ordering::Relaxed);
            engine.process(&input, &mut output);

            let expected = engine_latency.saturating_sub(240);
            assert_eq!(engine.latency(), expected);
            if engine.latency() < previous {
                assert!(expected < previous, "reported latency fell without cause");
            }
            previous = engine.latency();
        }
    }

    #[test]
    fn test_disabled_voice_is_skipped() {
        let mut engine = test_engine(2);
        {
            let params = engine.params_mut();
            params.voices[0].enabled = true;
            params.voices[1].enabled = false;
            params.voices[1].controls.gain_db = 6.0;
            params.dry.mute = true;
            params.dry_wet = 1.0;
        }

        let input = vec![1.0; 32];
        let mut output = StereoBuffer::silence(32);
        engine.process(&input, &mut output);

        // Only voice 0 at unity and center pan
        assert!((output[0].left - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_activate_flushes_state() {
        let mut engine = test_engine(1);
        {
            let params = engine.params_mut();
            params.voices[0].enabled = true;
            params.voices[0].delay_ms = 10.0;
            params.dry.mute = true;
            params.dry_wet = 1.0;
        }

        let input = vec![1.0; 480];
        let mut output = StereoBuffer::silence(480);
        engine.process(&input, &mut output);

        engine.activate();

        // History is gone: the delayed stream reads silence again
        let silence = vec![0.0; 480];
        engine.process(&silence, &mut output);
        assert_eq!(output.peak(), 0.0);
    }
}

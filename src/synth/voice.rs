//! A single voice: oscillator → filter → envelope → amplifier.
//!
//! The voice owns all per-note mutable state and is created exactly once;
//! it is never destroyed, only reset. Keeping it a plain value type is what
//! leaves the door open to a fixed pool of voices later.

use crate::dsp::envelope::{Envelope, EnvelopeStage};
use crate::dsp::filter::LowPass;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::Waveform;
use crate::synth::params::Params;

pub struct Voice {
    oscillator: Oscillator,
    filter: LowPass,
    envelope: Envelope,
    waveform: Waveform,
    frequency: f32,
    amplitude: f32,
    active: bool,
    sample_rate: f32,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            oscillator: Oscillator::new(),
            filter: LowPass::new(),
            envelope: Envelope::new(),
            waveform: Waveform::Sine,
            frequency: 0.0,
            amplitude: 1.0,
            active: false,
            sample_rate,
        }
    }

    /// Start (or re-start) a note. The envelope re-arms from its current
    /// level; the oscillator phase free-runs across triggers.
    pub fn trigger(&mut self, freq_hz: f32) {
        let freq_hz = freq_hz.clamp(0.0, 20_000.0);
        self.frequency = freq_hz;
        self.oscillator.set_frequency(freq_hz, self.sample_rate);
        self.active = true;
        self.envelope.gate_on();
    }

    /// Gate the note off. Safe to call repeatedly.
    pub fn release(&mut self) {
        self.envelope.gate_off();
    }

    /// Apply control-rate parameters. Called once per block, never per
    /// sample; coefficient and increment derivation happens here so the
    /// per-sample path stays bounded.
    pub fn apply_params(&mut self, params: &Params) {
        self.waveform = params.waveform;
        self.filter
            .set_cutoff(params.cutoff_hz, params.resonance, self.sample_rate);
        self.envelope.set_times(
            params.attack_ms,
            params.decay_ms,
            params.sustain,
            params.release_ms,
            self.sample_rate,
        );
    }

    /// Slide the pitch of the running note (legato). Control-rate only; the
    /// engine calls this for snapshot-gated notes and never for notes
    /// started through the command queue, so the queued frequency stays
    /// authoritative for those. Inactive voices ignore it.
    pub fn set_pitch(&mut self, freq_hz: f32) {
        let freq_hz = freq_hz.clamp(0.0, 20_000.0);
        if self.active && freq_hz > 0.0 && freq_hz != self.frequency {
            self.frequency = freq_hz;
            self.oscillator.set_frequency(freq_hz, self.sample_rate);
        }
    }

    /// Compute one output sample: oscillator, then filter, then envelope
    /// gain, then the voice amplitude. Filtering before gain-shaping keeps
    /// the filter's response independent of envelope-modulated amplitude.
    #[inline]
    pub fn render_sample(&mut self) -> f32 {
        let raw = self.oscillator.advance(self.waveform);
        let filtered = self.filter.process(raw);
        let shaped = filtered * self.envelope.next_sample() * self.amplitude;

        if self.active && self.envelope.stage() == EnvelopeStage::Idle {
            self.active = false;
        }
        shaped
    }

    /// Hard stop: silence immediately and clear all per-note state.
    pub fn reset(&mut self) {
        self.envelope.reset();
        self.filter.reset();
        self.frequency = 0.0;
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 20 kHz cutoff sits exactly at Nyquist here, so the filter is a true
    // pass-through in these tests.
    const SAMPLE_RATE: f32 = 40_000.0;

    fn pass_through_params() -> Params {
        Params {
            cutoff_hz: 20_000.0,
            resonance: 0.0,
            attack_ms: 0.0,
            decay_ms: 0.0,
            sustain: 1.0,
            release_ms: 0.0,
            ..Params::default()
        }
    }

    #[test]
    fn idle_voice_renders_silence() {
        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&pass_through_params());
        for _ in 0..128 {
            assert_eq!(voice.render_sample(), 0.0);
        }
        assert!(!voice.is_active());
    }

    #[test]
    fn triggered_voice_produces_audio_then_goes_idle() {
        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&pass_through_params());
        voice.trigger(440.0);
        assert!(voice.is_active());

        let mut peak = 0.0f32;
        for _ in 0..512 {
            peak = peak.max(voice.render_sample().abs());
        }
        assert!(peak > 0.9, "instant envelope should pass full scale");

        voice.release();
        // Zero-length release: the next rendered sample is silent and the
        // voice frees itself.
        voice.render_sample();
        assert!(!voice.is_active());
        assert_eq!(voice.envelope_stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn output_follows_envelope_gain() {
        let mut params = pass_through_params();
        params.attack_ms = 10.0;
        params.waveform = Waveform::Square;

        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&params);
        voice.trigger(1_000.0);

        // Square at full filter opening: |sample| equals the envelope level.
        let attack_samples = (0.010 * SAMPLE_RATE) as usize;
        let mut last = 0.0;
        for _ in 0..attack_samples / 2 {
            last = voice.render_sample().abs();
        }
        assert!(last > 0.3 && last < 0.7, "mid-attack gain, got {last}");
    }

    #[test]
    fn retrigger_keeps_oscillator_phase() {
        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&pass_through_params());
        voice.trigger(440.0);
        let a: Vec<f32> = (0..64).map(|_| voice.render_sample()).collect();

        // Re-trigger the same note: the waveform continues where it left
        // off instead of snapping back to phase zero. A phase reset here
        // would jump by roughly full scale; a free-running oscillator moves
        // at most one carrier step (2*pi*440/40000 of full scale).
        voice.trigger(440.0);
        let b = voice.render_sample();
        assert!((b - a[63]).abs() <= 0.08, "clicked by {}", (b - a[63]).abs());
    }

    #[test]
    fn amplitude_scales_output() {
        let mut params = pass_through_params();
        params.waveform = Waveform::Square;

        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&params);
        voice.set_amplitude(0.25);
        voice.trigger(440.0);

        for _ in 0..64 {
            assert!(voice.render_sample().abs() <= 0.25 + 1e-6);
        }
    }

    #[test]
    fn apply_params_never_touches_the_triggered_pitch() {
        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&pass_through_params());
        voice.trigger(220.0);
        assert_eq!(voice.frequency(), 220.0);

        // Snapshot says 440 by default; parameter application alone must
        // leave the note where the trigger put it.
        let mut params = pass_through_params();
        params.note_hz = 440.0;
        voice.apply_params(&params);
        assert_eq!(voice.frequency(), 220.0);
    }

    #[test]
    fn set_pitch_slides_a_running_note_only() {
        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&pass_through_params());
        voice.trigger(220.0);
        voice.set_pitch(330.0);
        assert_eq!(voice.frequency(), 330.0);

        // Inactive voices ignore pitch slides.
        let mut idle = Voice::new(SAMPLE_RATE);
        idle.set_pitch(330.0);
        assert_eq!(idle.frequency(), 0.0);
    }

    #[test]
    fn hostile_trigger_frequency_is_clamped() {
        let mut voice = Voice::new(SAMPLE_RATE);
        voice.apply_params(&pass_through_params());
        voice.trigger(1e9);
        assert_eq!(voice.frequency(), 20_000.0);
        for _ in 0..256 {
            assert!(voice.render_sample().abs() <= 1.0);
        }
    }
}

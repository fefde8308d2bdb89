//! Block renderer and the hard-realtime output path.
//!
//! Everything in this module runs (or is designed to run) in the
//! interrupt-driven render context. Nothing here blocks, locks, allocates,
//! or logs; the only hand-offs are the wait-free snapshot load, the bounded
//! note-queue drain, and the scheduler's buffer ownership flip.

/// Top-level context object owning the whole core.
pub mod context;
/// Ping-pong buffer ownership and deadline accounting.
pub mod scheduler;

use rtrb::Consumer;

use crate::synth::message::NoteCommand;
use crate::synth::params::ParamView;
use crate::synth::voice::Voice;
use crate::CHANNELS;

/// Convert one normalized sample to the output format: scale to 16-bit
/// range, round, clamp.
#[inline]
pub fn format_sample(sample: f32) -> i16 {
    (sample * i16::MAX as f32)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Pulls the control-path state and drives the voice to fill output blocks.
pub struct RenderEngine {
    voice: Voice,
    params: ParamView,
    notes: Consumer<NoteCommand>,
    gate_seen: bool,
    /// True while the current note was armed by the snapshot gate rather
    /// than the command queue. Only such notes follow snapshot pitch.
    snapshot_note: bool,
    gain: f32,
}

impl RenderEngine {
    pub fn new(sample_rate: f32, params: ParamView, notes: Consumer<NoteCommand>) -> Self {
        Self {
            voice: Voice::new(sample_rate),
            params,
            notes,
            gate_seen: false,
            snapshot_note: false,
            gain: 1.0,
        }
    }

    /// Fill `out` with interleaved stereo frames. `out.len()` must be a
    /// multiple of [`CHANNELS`].
    ///
    /// Control-rate work happens exactly once per block: the note queue is
    /// drained, the currently published snapshot is loaded and held for the
    /// whole block, and coefficients are rederived from it. Parameters
    /// never change mid-block, which bounds the per-sample cost and keeps a
    /// half-written snapshot impossible to observe.
    pub fn render_block(&mut self, out: &mut [i16]) {
        debug_assert_eq!(out.len() % CHANNELS, 0);
        debug_assert!(out.len() / CHANNELS <= crate::MAX_BLOCK_SIZE);

        while let Ok(command) = self.notes.pop() {
            match command {
                NoteCommand::NoteOn { freq_hz } => {
                    self.voice.trigger(freq_hz);
                    self.snapshot_note = false;
                }
                NoteCommand::NoteOff => self.voice.release(),
                NoteCommand::AllOff => self.voice.reset(),
            }
        }

        let snapshot = self.params.load();
        let params = snapshot.clamped();
        self.voice.apply_params(&params);

        // Gate edges from the snapshot map onto trigger/release. Level
        // (ongoing gate) changes nothing; only the transition does.
        if params.gate != self.gate_seen {
            if params.gate {
                self.voice.trigger(params.note_hz);
                self.snapshot_note = true;
            } else {
                self.voice.release();
            }
            self.gate_seen = params.gate;
        }

        // Legato: snapshot-gated notes track snapshot pitch. A note started
        // through the command queue keeps its triggered frequency.
        if self.snapshot_note {
            self.voice.set_pitch(params.note_hz);
        }

        for frame in out.chunks_exact_mut(CHANNELS) {
            let sample = format_sample(self.voice.render_sample() * self.gain);
            for channel in frame.iter_mut() {
                *channel = sample;
            }
        }
    }

    /// Master output gain, applied before format conversion.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::message::note_channel;
    use crate::synth::params::{param_bus, Params};
    use crate::dsp::Waveform;

    const SAMPLE_RATE: f32 = 40_000.0;

    fn pass_through() -> Params {
        Params {
            cutoff_hz: 20_000.0,
            attack_ms: 0.0,
            decay_ms: 0.0,
            sustain: 1.0,
            release_ms: 0.0,
            ..Params::default()
        }
    }

    #[test]
    fn format_sample_scales_rounds_and_clamps() {
        assert_eq!(format_sample(0.0), 0);
        assert_eq!(format_sample(1.0), i16::MAX);
        assert_eq!(format_sample(-1.0), -i16::MAX);
        assert_eq!(format_sample(2.5), i16::MAX);
        assert_eq!(format_sample(-2.5), i16::MIN);
        // Rounds to nearest, not truncates.
        assert_eq!(format_sample(1.4 / i16::MAX as f32), 1);
    }

    #[test]
    fn silent_until_note_on() {
        let (publisher, view) = param_bus(pass_through());
        let (mut handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        let mut block = [0i16; 128];
        engine.render_block(&mut block);
        assert!(block.iter().all(|s| *s == 0));

        handle.note_on(440.0);
        engine.render_block(&mut block);
        assert!(block.iter().any(|s| *s != 0));
        drop(publisher);
    }

    #[test]
    fn frames_are_duplicated_across_channels() {
        let (_publisher, view) = param_bus(pass_through());
        let (mut handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        handle.note_on(440.0);
        let mut block = [0i16; 256];
        engine.render_block(&mut block);
        for frame in block.chunks_exact(CHANNELS) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn snapshot_gate_edge_triggers_and_releases() {
        let (publisher, view) = param_bus(pass_through());
        let (_handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        let mut block = [0i16; 128];
        engine.render_block(&mut block);
        assert!(!engine.voice().is_active());

        let mut params = pass_through();
        params.gate = true;
        params.note_hz = 440.0;
        publisher.publish(params);
        engine.render_block(&mut block);
        assert!(engine.voice().is_active());
        assert!(block.iter().any(|s| *s != 0));

        params.gate = false;
        publisher.publish(params);
        engine.render_block(&mut block);
        assert!(!engine.voice().is_active());
    }

    #[test]
    fn queue_triggered_note_keeps_its_frequency() {
        // Snapshot note_hz stays at the 440 default the whole time.
        let (publisher, view) = param_bus(pass_through());
        let (mut handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        handle.note_on(220.0);
        let mut block = [0i16; 128];
        engine.render_block(&mut block);
        assert_eq!(engine.voice().frequency(), 220.0);

        // Republishing must not hijack the queue-started note either.
        publisher.publish(pass_through());
        engine.render_block(&mut block);
        assert_eq!(engine.voice().frequency(), 220.0);
    }

    #[test]
    fn snapshot_gated_note_follows_snapshot_pitch() {
        let (publisher, view) = param_bus(pass_through());
        let (_handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        let mut params = pass_through();
        params.gate = true;
        params.note_hz = 440.0;
        publisher.publish(params);
        let mut block = [0i16; 128];
        engine.render_block(&mut block);
        assert_eq!(engine.voice().frequency(), 440.0);

        // Held gate with a new note frequency slides the running note.
        params.note_hz = 330.0;
        publisher.publish(params);
        engine.render_block(&mut block);
        assert_eq!(engine.voice().frequency(), 330.0);
    }

    #[test]
    fn held_gate_does_not_retrigger() {
        let (publisher, view) = param_bus(pass_through());
        let (_handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        let mut params = Params {
            gate: true,
            note_hz: 440.0,
            attack_ms: 1_000.0,
            ..pass_through()
        };
        let mut block = [0i16; 128];
        publisher.publish(params);
        engine.render_block(&mut block);
        let level_after_one = engine.voice().envelope_level();

        // Republishing the same held gate must not re-arm the attack.
        params.cutoff_hz = 10_000.0;
        publisher.publish(params);
        engine.render_block(&mut block);
        assert!(engine.voice().envelope_level() > level_after_one);
    }

    #[test]
    fn all_off_silences_immediately() {
        let (_publisher, view) = param_bus(Params {
            release_ms: 5_000.0,
            ..pass_through()
        });
        let (mut handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        let mut block = [0i16; 128];
        handle.note_on(440.0);
        engine.render_block(&mut block);
        assert!(engine.voice().is_active());

        handle.all_off();
        engine.render_block(&mut block);
        assert!(!engine.voice().is_active());
        assert!(block.iter().all(|s| *s == 0));
    }

    #[test]
    fn square_at_full_gain_hits_full_scale() {
        let (_publisher, view) = param_bus(Params {
            waveform: Waveform::Square,
            ..pass_through()
        });
        let (mut handle, rx) = note_channel();
        let mut engine = RenderEngine::new(SAMPLE_RATE, view, rx);

        handle.note_on(1_000.0);
        let mut block = [0i16; 256];
        engine.render_block(&mut block);
        assert!(block.iter().all(|s| s.unsigned_abs() == i16::MAX as u16));
    }
}

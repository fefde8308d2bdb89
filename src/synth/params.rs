//! The parameter snapshot and its single-slot lock-free publication.
//!
//! The control context (MIDI/UART parsing, pot polling, UI) never touches
//! the voice directly. It assembles a complete [`Params`] value and publishes
//! it through [`ParamPublisher`]; the render context loads the currently
//! published snapshot once per block through [`ParamView`] and holds that
//! `Arc` for the whole block. Publication is one atomic pointer swap, so the
//! render side can never observe a half-written snapshot, and its read path
//! is wait-free: no lock is ever taken on the audio side.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::filter::MAX_RESONANCE;
use crate::dsp::Waveform;

/// One complete set of synthesis parameters, valid for at least one block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub waveform: Waveform,
    /// Filter cutoff in Hz, 20–20000.
    pub cutoff_hz: f32,
    /// Filter resonance, 0.0–0.95.
    pub resonance: f32,
    /// Envelope times in milliseconds, 0–5000 each.
    pub attack_ms: f32,
    pub decay_ms: f32,
    pub release_ms: f32,
    /// Sustain level, 0.0–1.0.
    pub sustain: f32,
    /// Current note frequency in Hz (derived externally from a note number).
    pub note_hz: f32,
    /// Note gate: true while the key is held.
    pub gate: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            cutoff_hz: 20_000.0,
            resonance: 0.0,
            attack_ms: 10.0,
            decay_ms: 100.0,
            release_ms: 300.0,
            sustain: 0.7,
            note_hz: 440.0,
            gate: false,
        }
    }
}

impl Params {
    /// Return a copy with every field forced into its documented range.
    ///
    /// The collaborator that owns parameter input is supposed to clamp
    /// before publishing; this is the second line of defense the render
    /// side applies to whatever snapshot it receives.
    pub fn clamped(&self) -> Self {
        Self {
            waveform: self.waveform,
            cutoff_hz: self.cutoff_hz.clamp(20.0, 20_000.0),
            resonance: self.resonance.clamp(0.0, MAX_RESONANCE),
            attack_ms: self.attack_ms.clamp(0.0, 5_000.0),
            decay_ms: self.decay_ms.clamp(0.0, 5_000.0),
            release_ms: self.release_ms.clamp(0.0, 5_000.0),
            sustain: self.sustain.clamp(0.0, 1.0),
            note_hz: self.note_hz.clamp(0.0, 20_000.0),
            gate: self.gate,
        }
    }
}

/// Create a connected publisher/view pair seeded with `initial`.
pub fn param_bus(initial: Params) -> (ParamPublisher, ParamView) {
    let slot = Arc::new(ArcSwap::from_pointee(initial));
    (
        ParamPublisher { slot: slot.clone() },
        ParamView { slot },
    )
}

/// Control-context half: builds and publishes complete snapshots.
pub struct ParamPublisher {
    slot: Arc<ArcSwap<Params>>,
}

impl ParamPublisher {
    /// Publish a complete snapshot. One pointer swap; the previous snapshot
    /// stays alive until the render context drops its block-held reference.
    pub fn publish(&self, params: Params) {
        debug!(
            waveform = ?params.waveform,
            cutoff_hz = params.cutoff_hz,
            gate = params.gate,
            "publishing snapshot"
        );
        self.slot.store(Arc::new(params));
    }

    /// The most recently published snapshot, for read-modify-write updates.
    pub fn current(&self) -> Params {
        **self.slot.load()
    }
}

/// Render-context half: wait-free snapshot loads.
pub struct ParamView {
    slot: Arc<ArcSwap<Params>>,
}

impl ParamView {
    /// Load the currently published snapshot. Called once per block; the
    /// returned `Arc` is held for the whole block so every frame in it sees
    /// the same values.
    #[inline]
    pub fn load(&self) -> Arc<Params> {
        self.slot.load_full()
    }
}

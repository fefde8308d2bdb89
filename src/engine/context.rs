//! The single top-level owner of the core's mutable state.
//!
//! Buffers, voice, snapshot slot, and note queue are all created in one
//! place and handed out as exactly two halves: [`AudioContext`] for the
//! interrupt-driven render context and [`Controller`] for the cooperative
//! control context. Nothing else in the crate owns shared state, which
//! keeps the ownership story auditable: every cross-context hand-off is
//! visible right here, and each one is wait-free.

use tracing::info;

use crate::engine::scheduler::{BufferId, DmaEvent, OutputScheduler, UnderrunCounter, BUFFER_SAMPLES};
use crate::engine::RenderEngine;
use crate::synth::message::{note_channel, NoteHandle};
use crate::synth::params::{param_bus, ParamPublisher, Params};

pub struct SynthContext;

impl SynthContext {
    /// Build the core and split it into its two execution halves.
    pub fn new(sample_rate: f32, initial: Params) -> (AudioContext, Controller) {
        let (publisher, view) = param_bus(initial.clamped());
        let (notes, note_rx) = note_channel();

        let engine = RenderEngine::new(sample_rate, view, note_rx);
        let scheduler = OutputScheduler::new();
        let underruns = scheduler.underrun_counter();

        info!(sample_rate, "synth context created");

        (
            AudioContext { engine, scheduler },
            Controller {
                params: publisher,
                notes,
                underruns,
            },
        )
    }
}

/// Interrupt-context half. Entered only from completion notifications (or a
/// simulated clock); never blocks, never allocates.
pub struct AudioContext {
    engine: RenderEngine,
    scheduler: OutputScheduler,
}

impl AudioContext {
    /// Fill both buffers before starting the peripheral's circular
    /// transfer. Called once, before the first completion event.
    pub fn prefill(&mut self) {
        self.scheduler.prefill(&mut self.engine);
    }

    /// Entry point for the completion interrupt. Returns the buffer that
    /// was refilled, or `None` for an out-of-turn event (recorded as an
    /// underrun).
    pub fn on_dma_event(&mut self, event: DmaEvent) -> Option<BufferId> {
        self.scheduler.handle_event(event, &mut self.engine)
    }

    /// Read access for the transmit side.
    pub fn buffer(&self, id: BufferId) -> &[i16; BUFFER_SAMPLES] {
        self.scheduler.buffer(id)
    }

    pub fn underruns(&self) -> u32 {
        self.scheduler.underruns()
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.engine.set_gain(gain);
    }
}

/// Control-context half: parameter publication, note triggers, diagnostics.
pub struct Controller {
    pub params: ParamPublisher,
    pub notes: NoteHandle,
    pub underruns: UnderrunCounter,
}

impl Controller {
    pub fn note_on(&mut self, freq_hz: f32) {
        self.notes.note_on(freq_hz);
    }

    pub fn note_off(&mut self) {
        self.notes.note_off();
    }

    pub fn all_off(&mut self) {
        self.notes.all_off();
    }

    /// Publish a new snapshot, clamping on behalf of sloppy collaborators.
    pub fn publish(&self, params: Params) {
        self.params.publish(params.clamped());
    }

    pub fn current_params(&self) -> Params {
        self.params.current()
    }

    pub fn underrun_count(&self) -> u32 {
        self.underruns.count()
    }
}

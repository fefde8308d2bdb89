use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::engine::RenderEngine;
use crate::{BUFFER_FRAMES, CHANNELS};

/*
Ping-Pong Output Scheduling
===========================

The output peripheral loops continuously over two fixed buffers and raises
two completion events per pass:

    HalfComplete   buffer B has finished transmitting; hardware moved on
    FullComplete   buffer A has finished transmitting; hardware wrapped

On each event exactly one buffer has just been handed back to software, and
the scheduler renders the next block into it while hardware transmits the
other. Ownership is encoded in the event alternation itself; software never
holds a reference into the buffer hardware currently owns.

Buffers play back-to-back with no gap, so a fill must finish strictly
before hardware reaches that buffer again. There is no within-core recovery
from missing that deadline: hardware replays stale data, and the scheduler
only records the miss. Retrying or blocking would add lag on top of the
glitch. An event arriving out of the expected Half/Full alternation is the
observable symptom of a missed deadline (the previous completion was never
serviced in time), so that is what increments the counter; the out-of-turn
fill is skipped to avoid writing a buffer mid-transmit.
*/

/// Samples per ping-pong buffer (frames times channels).
pub const BUFFER_SAMPLES: usize = BUFFER_FRAMES * CHANNELS;

/// Completion notifications from the output peripheral's transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaEvent {
    HalfComplete,
    FullComplete,
}

impl DmaEvent {
    fn next(self) -> Self {
        match self {
            DmaEvent::HalfComplete => DmaEvent::FullComplete,
            DmaEvent::FullComplete => DmaEvent::HalfComplete,
        }
    }
}

/// Which of the two output buffers an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferId {
    A,
    B,
}

/// Shared, read-only view of the missed-deadline count for diagnostics on
/// the control side.
#[derive(Clone)]
pub struct UnderrunCounter(Arc<AtomicU32>);

impl UnderrunCounter {
    pub fn count(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct OutputScheduler {
    buffer_a: [i16; BUFFER_SAMPLES],
    buffer_b: [i16; BUFFER_SAMPLES],
    expected: DmaEvent,
    underruns: Arc<AtomicU32>,
}

impl OutputScheduler {
    pub fn new() -> Self {
        Self {
            buffer_a: [0; BUFFER_SAMPLES],
            buffer_b: [0; BUFFER_SAMPLES],
            // B transmits first, so its completion arrives first.
            expected: DmaEvent::HalfComplete,
            underruns: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fill both buffers before the peripheral starts looping. Called once
    /// at startup, outside the realtime context.
    pub fn prefill(&mut self, engine: &mut RenderEngine) {
        engine.render_block(&mut self.buffer_b);
        engine.render_block(&mut self.buffer_a);
        self.expected = DmaEvent::HalfComplete;
    }

    /// Service one completion event: render the next block into the buffer
    /// the event handed back. Returns the buffer that was filled, or `None`
    /// when the event was out of turn and counted as an underrun.
    pub fn handle_event(&mut self, event: DmaEvent, engine: &mut RenderEngine) -> Option<BufferId> {
        if event != self.expected {
            // A skipped or repeated completion means the stream already
            // glitched. Record it and resynchronize on this event; do not
            // touch either buffer out of turn.
            self.underruns.fetch_add(1, Ordering::Relaxed);
            self.expected = event.next();
            return None;
        }

        let filled = match event {
            DmaEvent::HalfComplete => {
                engine.render_block(&mut self.buffer_b);
                BufferId::B
            }
            DmaEvent::FullComplete => {
                engine.render_block(&mut self.buffer_a);
                BufferId::A
            }
        };
        self.expected = event.next();
        Some(filled)
    }

    /// Read access for the transmitting side (hardware, or a simulated
    /// clock in tests).
    pub fn buffer(&self, id: BufferId) -> &[i16; BUFFER_SAMPLES] {
        match id {
            BufferId::A => &self.buffer_a,
            BufferId::B => &self.buffer_b,
        }
    }

    pub fn underruns(&self) -> u32 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn underrun_counter(&self) -> UnderrunCounter {
        UnderrunCounter(self.underruns.clone())
    }
}

impl Default for OutputScheduler {
    fn default() -> Self {
        Self::new()
    }
}

//! Note commands crossing from the control context into the render context.
//!
//! A bounded SPSC ring carries the commands; the render side drains it once
//! per block before touching the voice. A full ring drops the newest command
//! instead of blocking either side.

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{trace, warn};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NoteCommand {
    NoteOn { freq_hz: f32 },
    NoteOff,
    /// Panic path: gate off and silence regardless of note state.
    AllOff,
}

const NOTE_QUEUE_SIZE: usize = 64;

/// Create a connected handle/consumer pair.
pub fn note_channel() -> (NoteHandle, Consumer<NoteCommand>) {
    let (tx, rx) = RingBuffer::<NoteCommand>::new(NOTE_QUEUE_SIZE);
    (NoteHandle { tx }, rx)
}

/// Control-context half of the note interface.
pub struct NoteHandle {
    tx: Producer<NoteCommand>,
}

impl NoteHandle {
    pub fn note_on(&mut self, freq_hz: f32) {
        self.push(NoteCommand::NoteOn { freq_hz });
    }

    pub fn note_off(&mut self) {
        self.push(NoteCommand::NoteOff);
    }

    pub fn all_off(&mut self) {
        self.push(NoteCommand::AllOff);
    }

    fn push(&mut self, command: NoteCommand) {
        trace!(?command, "note command");
        if self.tx.push(command).is_err() {
            warn!(?command, "note queue full, dropping command");
        }
    }
}

// Purpose: voice composition and the control-to-render hand-off surface.
// This layer sits between the dsp primitives and the engine.

pub mod message;
pub mod params;
pub mod voice;

pub use message::{NoteCommand, NoteHandle};
pub use params::{ParamPublisher, ParamView, Params};
pub use voice::Voice;

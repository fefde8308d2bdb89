pub mod dsp; // Allocation-free signal primitives
pub mod engine; // Block renderer and output scheduler
pub mod synth; // Voice composition and control hand-off

/// Frames per ping-pong output buffer (one DMA half-transfer).
pub const BUFFER_FRAMES: usize = 256;

/// Interleaved channels in the output format (mono signal duplicated).
pub const CHANNELS: usize = 2;

/// Largest block any render call will be asked to fill, in frames.
pub const MAX_BLOCK_SIZE: usize = 2048;

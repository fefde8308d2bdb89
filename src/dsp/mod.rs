//! Low-level DSP primitives that make up the voice signal chain.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They intentionally stay focused on the
//! signal-processing math; orchestration (parameter hand-off, buffer
//! scheduling) lives in the engine layer.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// One-pole low-pass IIR filter with bounded resonance feedback.
pub mod filter;
/// Phase-accumulator oscillator with four waveforms.
pub mod oscillator;
/// Shared read-only sine table with interpolated lookup.
pub mod wavetable;

pub use envelope::EnvelopeStage;
pub use oscillator::Waveform;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::wavetable;

/*
Phase-Accumulator Oscillator
============================

The oscillator keeps a single running `phase` in [0.0, 1.0) representing the
position within one waveform cycle. Every sample it advances by a fixed
`increment` and wraps modulo one cycle:

    increment = frequency / sample_rate

The increment is recomputed at control rate (when the frequency changes), not
per sample, so the per-sample cost is one add, one wrap, and one waveform
evaluation.

Waveform shapes, all derived from the same phase:

  Sine      interpolated lookup into the shared wavetable
  Saw       the phase ramp itself, rescaled to [-1, +1]; wraps naturally
  Square    +1 for the first half cycle, -1 for the second (50% duty)
  Triangle  the phase ramp folded at the half cycle (up then down), written
            directly as piecewise-linear math rather than by integrating the
            square, which would drift

On note re-trigger the phase is NOT reset: the oscillator free-runs so a fast
re-trigger never lands a phase discontinuity (an audible click) on the output.
Only the envelope restarts.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    /// Decode a raw selector. Unknown values fall back to `Sine`
    /// deterministically; selectors come from external input and the core
    /// stays defensive about them.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Waveform::Sine,
            1 => Waveform::Saw,
            2 => Waveform::Square,
            3 => Waveform::Triangle,
            _ => Waveform::Sine,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Oscillator {
    phase: f32,
    increment: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            increment: 0.0,
        }
    }

    /// Recompute the per-sample phase increment. Control-rate only.
    ///
    /// A frequency at or below zero holds the phase still (DC at the current
    /// phase) instead of erroring; gating the voice silent is the caller's
    /// job.
    pub fn set_frequency(&mut self, freq_hz: f32, sample_rate: f32) {
        if freq_hz > 0.0 && sample_rate > 0.0 {
            self.increment = freq_hz / sample_rate;
        } else {
            self.increment = 0.0;
        }
    }

    /// Advance one sample and return the waveform value at the new phase.
    /// Output is always within [-1.0, 1.0].
    #[inline]
    pub fn advance(&mut self, waveform: Waveform) -> f32 {
        self.phase += self.increment;
        if self.phase >= 1.0 {
            // True modular wrap: an increment of a cycle or more (frequency
            // at or above the sample rate) must still land inside [0, 1).
            self.phase -= self.phase.floor();
        }

        match waveform {
            Waveform::Sine => wavetable::lookup(self.phase),
            Waveform::Saw => 2.0 * self.phase - 1.0,
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                // Fold the ramp: rises over the first half cycle, falls over
                // the second.
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.increment = 0.0;
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}

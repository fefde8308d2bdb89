use std::f32::consts::TAU;

/*
One-Pole Low-Pass with Resonance Feedback
=========================================

The base stage is the classic one-pole smoother:

    y[n] = a * x[n] + (1 - a) * y[n-1]

where `a` is the cutoff coefficient in (0, 1]. At a = 1 the filter is a
pass-through; small values smooth harder. Resonance is added as a second
feedback term built from the difference of the last two outputs:

    y[n] = a * x[n] + (1 - a) * y[n-1] + r * (y[n-1] - y[n-2])

Characteristic polynomial: z^2 - (1 - a + r) z + r. The pole product is r,
so |poles| < 1 for r < 1, and the remaining Jury conditions reduce to
a > 0 and a < 2 + 2r. The stage is therefore stable over the whole
operating region a in (0, 1], r in [0, 0.95].

Coefficient derivation runs at control rate only; the per-sample path is
three multiplies and two adds plus a guard clamp.
*/

/// Resonance ceiling. Keeps the feedback poles comfortably inside the unit
/// circle.
pub const MAX_RESONANCE: f32 = 0.95;

/// Guard range for the per-sample output clamp. Resonance can overshoot
/// full scale legitimately; runaway values cannot pass this.
const OUTPUT_GUARD: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct LowPass {
    coefficient: f32,
    resonance: f32,
    prev_output: f32,
    prev_output2: f32,
}

impl LowPass {
    pub fn new() -> Self {
        Self {
            coefficient: 1.0,
            resonance: 0.0,
            prev_output: 0.0,
            prev_output2: 0.0,
        }
    }

    /// Derive the cutoff coefficient from a cutoff frequency. Control-rate
    /// only.
    ///
    /// Inputs are clamped here again even though the snapshot publisher
    /// already clamps them; a malformed snapshot must not be able to push
    /// the stage out of its stability region. Cutoff at or above Nyquist
    /// saturates the coefficient at 1.0 and the stage becomes a
    /// pass-through.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, resonance: f32, sample_rate: f32) {
        let nyquist = sample_rate / 2.0;
        let cutoff = cutoff_hz.clamp(1.0, nyquist.max(1.0));
        self.resonance = resonance.clamp(0.0, MAX_RESONANCE);

        self.coefficient = if cutoff >= nyquist {
            1.0
        } else {
            (1.0 - (-TAU * cutoff / sample_rate).exp()).clamp(f32::EPSILON, 1.0)
        };
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.coefficient * input
            + (1.0 - self.coefficient) * self.prev_output
            + self.resonance * (self.prev_output - self.prev_output2);
        let output = output.clamp(-OUTPUT_GUARD, OUTPUT_GUARD);

        self.prev_output2 = self.prev_output;
        self.prev_output = output;
        output
    }

    pub fn reset(&mut self) {
        self.prev_output = 0.0;
        self.prev_output2 = 0.0;
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }
}

impl Default for LowPass {
    fn default() -> Self {
        Self::new()
    }
}

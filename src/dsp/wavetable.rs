//! Shared sine wavetable.
//!
//! One full cycle at fixed resolution, built once and shared read-only by
//! every oscillator. Lookups interpolate between adjacent entries so
//! sub-table phase precision is not thrown away, which keeps quantization
//! noise below the table's raw step size.

use std::f32::consts::TAU;

use lazy_static::lazy_static;

/// Entries in one full cycle of the sine table.
pub const TABLE_SIZE: usize = 1024;

lazy_static! {
    /// One cycle of sine, signed and normalized to [-1.0, 1.0].
    pub static ref SINE_TABLE: [f32; TABLE_SIZE] = {
        let mut table = [0.0f32; TABLE_SIZE];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = (TAU * i as f32 / TABLE_SIZE as f32).sin();
        }
        table
    };
}

/// Look up the table at a normalized phase in [0.0, 1.0), interpolating
/// linearly between the two bracketing entries. The read wraps at the table
/// end so the last segment interpolates back toward entry zero.
#[inline]
pub fn lookup(phase: f32) -> f32 {
    let position = phase * TABLE_SIZE as f32;
    let index = position as usize % TABLE_SIZE;
    let next = (index + 1) % TABLE_SIZE;
    let frac = position - position.floor();

    SINE_TABLE[index] + frac * (SINE_TABLE[next] - SINE_TABLE[index])
}

/*
ADSR Envelope Generator
=======================

Linear ADSR with one precomputed increment per stage. The state machine:

    ┌──────┐ gate_on  ┌────────┐ level=1  ┌───────┐ level=S ┌─────────┐
    │ Idle │ ───────→ │ Attack │ ───────→ │ Decay │ ──────→ │ Sustain │
    └──────┘          └────────┘          └───────┘         └─────────┘
        ↑                  │                  │                  │
        │                  └────── gate_off ──┴──────────────────┘
        │   level=0             ┌─────────┐
        └────────────────────── │ Release │ ←─ gate_on from here rearms
                                └─────────┘    Attack immediately

Two rules keep re-triggering click-free:

  * gate_on enters Attack from the CURRENT level, never from zero. A fast
    re-trigger mid-release ramps back up from wherever the level sits.
  * gate_off enters Release from the current level, so releasing mid-attack
    ramps down from the partial level reached.

Each stage entry computes one increment:

    increment = (target_level - start_level) / stage_samples

and the per-sample path is a single add plus boundary checks. A stage whose
duration is zero samples transitions on the same sample it was entered; the
level jumps straight to the target. Stage durations are converted from
milliseconds to samples at control rate, not per sample.

The level is clamped to [0.0, 1.0] every sample to absorb float rounding.
This stage is the sole authority on voice audibility: stage == Idle means
silent and reassignable.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Copy)]
pub struct Envelope {
    stage: EnvelopeStage,
    level: f32,
    increment: f32,

    attack_samples: u32,
    decay_samples: u32,
    sustain_level: f32,
    release_samples: u32,
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            increment: 0.0,
            attack_samples: 0,
            decay_samples: 0,
            sustain_level: 1.0,
            release_samples: 0,
        }
    }

    /// Convert ADSR times from milliseconds to stage durations in samples.
    /// Control-rate only; clamps defensively against a malformed snapshot.
    pub fn set_times(
        &mut self,
        attack_ms: f32,
        decay_ms: f32,
        sustain_level: f32,
        release_ms: f32,
        sample_rate: f32,
    ) {
        let to_samples = |ms: f32| -> u32 {
            let ms = ms.clamp(0.0, 5_000.0);
            (ms / 1_000.0 * sample_rate).round() as u32
        };
        self.attack_samples = to_samples(attack_ms);
        self.decay_samples = to_samples(decay_ms);
        self.sustain_level = sustain_level.clamp(0.0, 1.0);
        self.release_samples = to_samples(release_ms);
    }

    /// Gate high. Re-arms Attack from the current level, overriding whatever
    /// stage was running.
    pub fn gate_on(&mut self) {
        self.enter_attack();
    }

    /// Gate low. Enters Release from the current level. Calling it again
    /// while already releasing (or idle) is a no-op.
    pub fn gate_off(&mut self) {
        match self.stage {
            EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Sustain => {
                self.enter_release();
            }
            EnvelopeStage::Release | EnvelopeStage::Idle => {}
        }
    }

    fn enter_attack(&mut self) {
        if self.attack_samples == 0 || self.level >= 1.0 {
            self.level = 1.0;
            self.enter_decay();
            return;
        }
        self.increment = (1.0 - self.level) / self.attack_samples as f32;
        self.stage = EnvelopeStage::Attack;
    }

    fn enter_decay(&mut self) {
        if self.decay_samples == 0 || self.level <= self.sustain_level {
            self.level = self.sustain_level;
            self.stage = EnvelopeStage::Sustain;
            return;
        }
        self.increment = (self.sustain_level - self.level) / self.decay_samples as f32;
        self.stage = EnvelopeStage::Decay;
    }

    fn enter_release(&mut self) {
        if self.release_samples == 0 || self.level <= 0.0 {
            self.level = 0.0;
            self.stage = EnvelopeStage::Idle;
            return;
        }
        self.increment = -self.level / self.release_samples as f32;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance one sample and return the gain for it.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.level += self.increment;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.enter_decay();
                }
            }
            EnvelopeStage::Decay => {
                self.level += self.increment;
                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }
            EnvelopeStage::Release => {
                self.level += self.increment;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        self.level = self.level.clamp(0.0, 1.0);
        self.level
    }

    /// Fill a buffer with envelope gain values.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.increment = 0.0;
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

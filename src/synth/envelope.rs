//! ADSR envelope generator
//!
//! Each stage approaches its target exponentially. The time constant is set
//! so a stage gets within [`LEVEL_EPSILON`] of its target in the configured
//! time, which keeps the final release-to-idle step below that threshold.
//! Stage changes never move the level.

use serde::{Deserialize, Serialize};

/// Shortest stage duration in seconds
pub const MIN_STAGE_TIME: f64 = 0.001;

/// Distance from the target at which a stage counts as finished
pub const LEVEL_EPSILON: f64 = 0.001;

/// Time constants per stage duration: ln(1 / LEVEL_EPSILON)
const CURVE: f64 = 6.907_755_278_982_137;

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR settings. Times are in seconds, sustain is a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl EnvelopeParams {
    pub const fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Copy with every field moved into its valid range
    pub fn clamped(self) -> Self {
        Self {
            attack: clamp_time(self.attack),
            decay: clamp_time(self.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                0.0
            },
            release: clamp_time(self.release),
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::new(0.01, 0.3, 0.6, 0.5)
    }
}

fn clamp_time(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(MIN_STAGE_TIME)
    } else {
        MIN_STAGE_TIME
    }
}

/// ADSR envelope generator
#[derive(Debug, Clone)]
pub struct Envelope {
    params: EnvelopeParams,

    stage: EnvelopeStage,
    level: f64,
    time_in_stage: f64,
    stage_start_level: f64,
}

impl Envelope {
    pub fn new(params: EnvelopeParams) -> Self {
        Self {
            params: params.clamped(),
            stage: EnvelopeStage::Idle,
            level: 0.0,
            time_in_stage: 0.0,
            stage_start_level: 0.0,
        }
    }

    /// Replace the ADSR settings. Takes effect from the next tick.
    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params.clamped();
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    /// Gate on. Restarts the attack from the current level.
    pub fn note_on(&mut self) {
        self.enter(EnvelopeStage::Attack);
    }

    /// Gate off. Calling it again while releasing changes nothing.
    pub fn note_off(&mut self) {
        if self.stage != EnvelopeStage::Idle && self.stage != EnvelopeStage::Release {
            self.enter(EnvelopeStage::Release);
        }
    }

    /// Reset envelope to idle state
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.time_in_stage = 0.0;
        self.stage_start_level = 0.0;
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Get current level without advancing
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Level at the moment the current stage was entered
    pub fn stage_start_level(&self) -> f64 {
        self.stage_start_level
    }

    pub fn time_in_stage(&self) -> f64 {
        self.time_in_stage
    }

    /// Advance by `dt` seconds and return the new level
    pub fn tick(&mut self, dt: f64) -> f64 {
        let EnvelopeParams {
            attack,
            decay,
            sustain,
            release,
        } = self.params;

        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.approach(1.0, attack, dt);
                self.time_in_stage += dt;
                if 1.0 - self.level <= LEVEL_EPSILON || self.time_in_stage >= attack {
                    self.enter(EnvelopeStage::Decay);
                }
            }

            EnvelopeStage::Decay => {
                self.approach(sustain, decay, dt);
                self.time_in_stage += dt;
                if (self.level - sustain).abs() <= LEVEL_EPSILON || self.time_in_stage >= decay {
                    self.enter(EnvelopeStage::Sustain);
                }
            }

            EnvelopeStage::Sustain => {
                // Follows sustain changes smoothly instead of jumping
                self.approach(sustain, decay, dt);
                self.time_in_stage += dt;
            }

            EnvelopeStage::Release => {
                // Checked before moving so the last audible level is within epsilon
                if self.level <= LEVEL_EPSILON || self.time_in_stage >= release {
                    self.enter(EnvelopeStage::Idle);
                    self.level = 0.0;
                } else {
                    self.approach(0.0, release, dt);
                    self.time_in_stage += dt;
                }
            }
        }

        self.level = self.level.clamp(0.0, 1.0);
        self.level
    }

    fn approach(&mut self, target: f64, duration: f64, dt: f64) {
        let coeff = (-CURVE * dt / duration).exp();
        self.level = target + (self.level - target) * coeff;
    }

    fn enter(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        self.time_in_stage = 0.0;
        self.stage_start_level = self.level;
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(EnvelopeParams::default())
    }
}

/// Sinusoidal oscillation driving a light anchor along one axis

use std::f32::consts::TAU;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillationAnimation {
    amplitude: f32,
    period_ms: f32,
    phase: f32,
}

impl OscillationAnimation {
    /// `period_ms` is the elapsed time that advances the phase by one radian
    pub fn new(amplitude: f32, period_ms: f32) -> Result<Self> {
        if !(period_ms > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "Animation period must be > 0 ms (got {})",
                period_ms
            )));
        }
        Ok(Self { amplitude, period_ms, phase: 0.0 })
    }

    /// Accumulate `dt_ms` and return the new displacement
    ///
    /// The phase is kept in `[0, TAU)` so long sessions keep full precision.
    pub fn advance(&mut self, dt_ms: f32) -> f32 {
        let step = (dt_ms / self.period_ms).rem_euclid(TAU);
        self.phase = (self.phase + step).rem_euclid(TAU);
        self.displacement()
    }

    pub fn displacement(&self) -> f32 {
        self.phase.sin() * self.amplitude
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

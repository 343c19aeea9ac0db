//! The scalar growth clock driving branch, blossom and petal progress.

use crate::config::GrowthConfig;

/// Accumulates scaled real time and maps it to a growth value.
///
/// Growth reaches `1.0` after `duration_secs` at 1x speed and keeps going up
/// to `max_growth`, so blossoms scheduled past full branch growth still get
/// to play out.
#[derive(Clone, Debug)]
pub struct GrowthClock {
    elapsed_secs: f32,
    duration_secs: f32,
    max_growth: f32,
}

impl GrowthClock {
    pub fn new(cfg: &GrowthConfig) -> Self {
        Self {
            elapsed_secs: 0.0,
            duration_secs: cfg.duration_secs,
            max_growth: cfg.max_growth,
        }
    }

    /// Advances by `scaled_dt` seconds (already multiplied by the speed).
    pub fn advance(&mut self, scaled_dt: f32) {
        if scaled_dt > 0.0 {
            // Stop accumulating once clamped so the value never drifts.
            self.elapsed_secs =
                (self.elapsed_secs + scaled_dt).min(self.duration_secs * self.max_growth);
        }
    }

    /// Jumps straight to the fully grown state.
    pub fn fast_forward(&mut self) {
        self.elapsed_secs = self.duration_secs * self.max_growth;
    }

    pub fn growth(&self) -> f32 {
        if self.duration_secs <= 0.0 {
            return self.max_growth;
        }
        (self.elapsed_secs / self.duration_secs).clamp(0.0, self.max_growth)
    }

    pub fn max_growth(&self) -> f32 {
        self.max_growth
    }
}

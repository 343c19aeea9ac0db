//! Turns host timestamps into frame deltas and drives one scene frame.

use crate::{paint::Canvas, scene::Scene, types::NOMINAL_FRAME_SECS};

#[derive(Clone, Debug, Default)]
pub struct FrameScheduler {
    last: Option<f64>,
    frames: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call. The first call has nothing to
    /// compare against and reports one nominal frame. A clock that steps
    /// backwards yields zero.
    pub fn frame_delta(&mut self, now_secs: f64) -> f32 {
        let dt = match self.last {
            Some(prev) => (now_secs - prev).max(0.0) as f32,
            None => NOMINAL_FRAME_SECS,
        };
        self.last = Some(now_secs);
        self.frames += 1;
        dt
    }

    /// Advances `scene` to `now_secs` and paints it onto `canvas`.
    ///
    /// ### Returns
    /// The unscaled delta the scene was ticked with.
    pub fn run_frame(&mut self, scene: &mut Scene, now_secs: f64, canvas: &mut impl Canvas) -> f32 {
        let dt = self.frame_delta(now_secs);
        scene.tick(dt);
        scene.draw(canvas);
        dt
    }

    /// Frames driven so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Forgets the last timestamp so the next frame counts as a first one.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

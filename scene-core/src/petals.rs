//! Petals drifting down from baked blossoms.
//!
//! Velocities are expressed per nominal 60 Hz frame and scaled by the number
//! of nominal frames that elapsed, so the fall speed does not depend on the
//! display refresh rate.

use crate::{
    blossom::BlossomSet,
    config::PetalConfig,
    paint::{Canvas, Primitive, Rgba},
};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

const SATURATION: f32 = 0.55;
/// Petals further than this past a side edge are culled.
const SIDE_MARGIN: f32 = 20.0;
const FADE_PER_FRAME: f32 = 0.005;
const SWAY_DRIFT: f32 = 0.06;
const SWAY_SPIN: f32 = 0.008;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Petal {
    pub pos: Vec2,
    pub drift: f32,
    pub fall: f32,
    pub radius: f32,
    /// Minor over major axis.
    pub squeeze: f32,
    pub rotation: f32,
    pub spin: f32,
    pub sway_phase: f32,
    pub sway_speed: f32,
    pub sway_amplitude: f32,
    pub hue: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl Petal {
    fn spawn(source: Vec2, rng: &mut impl Rng) -> Self {
        Self {
            pos: Vec2::new(source.x + rng.random_range(-5.0..5.0), source.y),
            drift: (rng.random::<f32>() - 0.3) * 0.25,
            fall: rng.random_range(0.15..0.45),
            radius: rng.random_range(1.5..7.0),
            squeeze: rng.random_range(0.3..0.7),
            rotation: rng.random_range(0.0..TAU),
            spin: rng.random_range(-0.006..0.006),
            sway_phase: rng.random_range(0.0..TAU),
            sway_speed: rng.random_range(0.006..0.016),
            sway_amplitude: rng.random_range(0.3..0.9),
            hue: rng.random_range(325.0..360.0),
            lightness: rng.random_range(0.72..0.92),
            alpha: rng.random_range(0.7..1.0),
        }
    }

    fn step(&mut self, frames: f32, fade_below: f32) {
        self.sway_phase += self.sway_speed * frames;
        let (sin, cos) = self.sway_phase.sin_cos();
        self.pos.x += (self.drift + sin * self.sway_amplitude * SWAY_DRIFT) * frames;
        self.pos.y += self.fall * frames;
        self.rotation += (self.spin + cos * SWAY_SPIN) * frames;
        if self.pos.y > fade_below {
            self.alpha -= FADE_PER_FRAME * frames;
        }
    }

    fn is_gone(&self, size: Vec2) -> bool {
        self.pos.y > size.y
            || self.alpha <= 0.0
            || self.pos.x < -SIDE_MARGIN
            || self.pos.x > size.x + SIDE_MARGIN
    }
}

#[derive(Clone, Debug)]
pub struct PetalSystem {
    petals: Vec<Petal>,
    frame_counter: u64,
    cfg: PetalConfig,
}

impl PetalSystem {
    pub fn new(cfg: &PetalConfig) -> Self {
        Self {
            petals: Vec::with_capacity(cfg.max_petals),
            frame_counter: 0,
            cfg: *cfg,
        }
    }

    pub fn len(&self) -> usize {
        self.petals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.petals.is_empty()
    }

    pub fn petals(&self) -> &[Petal] {
        &self.petals
    }

    /// Most petals allowed at once for the given bloom ratio.
    pub fn ceiling(&self, ratio: f32) -> usize {
        ((ratio * self.cfg.max_petals as f32).floor() as usize).max(1)
    }

    /// Frames between spawns for the given bloom ratio. Fuller trees shed
    /// more often.
    pub fn spawn_interval(&self, ratio: f32) -> u64 {
        ((self.cfg.sparse_interval as f32 * (1.0 - ratio) + 1.0).floor() as u64).max(1)
    }

    /// Runs one frame: maybe spawns a petal from a baked blossom, then moves
    /// every petal by `frames` nominal frames and culls the finished ones.
    ///
    /// Nothing spawns until at least two blossoms are baked.
    pub fn step(&mut self, frames: f32, blossoms: &BlossomSet, size: Vec2, rng: &mut impl Rng) {
        let baked = blossoms.baked_count();
        if baked >= 2 {
            let ratio = baked as f32 / blossoms.len().max(1) as f32;
            self.frame_counter += 1;
            if self.frame_counter % self.spawn_interval(ratio) == 0
                && self.petals.len() < self.ceiling(ratio)
                && let Some(source) = blossoms.random_baked(rng)
            {
                self.petals.push(Petal::spawn(source.pos, rng));
            }
        }
        self.update(frames, size);
    }

    /// Moves every petal and removes those that left the surface or faded.
    pub fn update(&mut self, frames: f32, size: Vec2) {
        let fade_below = size.y * self.cfg.fade_line;
        let mut i = self.petals.len();
        while i > 0 {
            i -= 1;
            self.petals[i].step(frames, fade_below);
            if self.petals[i].is_gone(size) {
                self.petals.swap_remove(i);
            }
        }
    }

    pub fn draw(&self, canvas: &mut impl Canvas) {
        for p in &self.petals {
            canvas.draw(Primitive::Ellipse {
                center: p.pos,
                radii: Vec2::new(p.radius, p.radius * p.squeeze),
                rotation: p.rotation,
                fill: Rgba::hsla(p.hue, SATURATION, p.lightness, p.alpha),
            });
        }
    }
}

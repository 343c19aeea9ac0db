//! Day phase accumulator and the sun/moon arcs it drives.
//!
//! The sun crosses the sky over the middle of the cycle, the moon over the
//! wraparound window around midnight. Each body rides an inverted parabola
//! whose peak height is re-randomized once per completed day.

use crate::{
    paint::{Canvas, ColorStop, Primitive, Rgba},
    sky::{GROUND_LINE, night_visibility, wrap_phase},
};
use glam::Vec2;
use rand::Rng;

const SUN_RISE: f32 = 0.22;
const SUN_SET: f32 = 0.78;
const MOON_RISE: f32 = 0.82;
const MOON_SET: f32 = 0.18;
/// Length of the moon window, which wraps through midnight.
const MOON_SPAN: f32 = 0.36;
/// Fraction of a window at each end over which a body fades.
const HORIZON_EDGE: f32 = 0.12;

const SUN_RADIUS: f32 = 0.038;
const MOON_RADIUS: f32 = 0.045;
/// Moon crater layout as (dx, dy, radius), relative to the moon radius.
const CRATERS: [(f32, f32, f32); 4] = [
    (0.2, -0.3, 0.12),
    (-0.25, 0.15, 0.09),
    (0.35, 0.2, 0.07),
    (-0.1, -0.15, 0.06),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CelestialBody {
    pub pos: Vec2,
    /// Opacity in `[0, 1]`.
    pub fade: f32,
    /// Progress through the body's arc window.
    pub t: f32,
}

/// Smoothstep fade over the first and last [`HORIZON_EDGE`] of a window.
pub fn horizon_fade(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let k = if t < HORIZON_EDGE {
        t / HORIZON_EDGE
    } else if t > 1.0 - HORIZON_EDGE {
        (1.0 - t) / HORIZON_EDGE
    } else {
        return 1.0;
    };
    k * k * (3.0 - 2.0 * k)
}

/// Position along a parabolic arc that starts and ends slightly past the
/// surface edges on the ground line and tops out at `peak_y`.
pub fn arc_position(t: f32, peak_y: f32, size: Vec2) -> Vec2 {
    let x = size.x * (-0.08 + t * 1.16);
    let lift = 1.0 - 4.0 * (t - 0.5) * (t - 0.5);
    let ground = size.y * GROUND_LINE;
    Vec2::new(x, ground - lift * (ground - peak_y))
}

pub fn sun_at(phase: f32, arc_seed: f32, size: Vec2) -> Option<CelestialBody> {
    let phase = wrap_phase(phase);
    if !(SUN_RISE..=SUN_SET).contains(&phase) {
        return None;
    }
    let t = (phase - SUN_RISE) / (SUN_SET - SUN_RISE);
    let peak = size.y * (0.08 + (1.0 - arc_seed) * 0.07);
    Some(CelestialBody {
        pos: arc_position(t, peak, size),
        fade: horizon_fade(t),
        t,
    })
}

pub fn moon_at(phase: f32, arc_seed: f32, size: Vec2) -> Option<CelestialBody> {
    let phase = wrap_phase(phase);
    let night = night_visibility(phase);
    if night <= 0.01 {
        return None;
    }
    let t = if phase >= MOON_RISE {
        (phase - MOON_RISE) / MOON_SPAN
    } else if phase <= MOON_SET {
        (phase + 1.0 - MOON_RISE) / MOON_SPAN
    } else {
        return None;
    };
    let t = t.clamp(0.0, 1.0);
    let peak = size.y * (0.06 + arc_seed * 0.08);
    Some(CelestialBody {
        pos: arc_position(t, peak, size),
        fade: night * horizon_fade(t),
        t,
    })
}

/// The day phase clock, plus the per-cycle arc seed and this frame's
/// sun and moon.
#[derive(Clone, Debug)]
pub struct CelestialClock {
    day_secs: f64,
    cycle_secs: f64,
    arc_seed: f32,
    last_cycle: u64,
    sun: Option<CelestialBody>,
    moon: Option<CelestialBody>,
}

impl CelestialClock {
    pub fn new(cycle_secs: f32, start_phase: f32, rng: &mut impl Rng) -> Self {
        let cycle_secs = f64::from(cycle_secs.max(f32::EPSILON));
        let day_secs = f64::from(wrap_phase(start_phase)) * cycle_secs;
        Self {
            day_secs,
            cycle_secs,
            arc_seed: rng.random(),
            last_cycle: (day_secs / cycle_secs).floor() as u64,
            sun: None,
            moon: None,
        }
    }

    /// Advances by `scaled_dt` seconds and recomputes sun and moon for a
    /// surface of `size`.
    pub fn advance(&mut self, scaled_dt: f32, size: Vec2, rng: &mut impl Rng) {
        if scaled_dt > 0.0 {
            self.day_secs += f64::from(scaled_dt);
        }

        let cycle = (self.day_secs / self.cycle_secs).floor() as u64;
        if cycle != self.last_cycle {
            self.last_cycle = cycle;
            self.arc_seed = rng.random();
            log::debug!("day {cycle} begins, arc seed {:.3}", self.arc_seed);
        }

        self.locate(size);
    }

    /// Recomputes sun and moon without advancing time.
    pub fn locate(&mut self, size: Vec2) {
        let phase = self.phase();
        self.sun = sun_at(phase, self.arc_seed, size);
        self.moon = moon_at(phase, self.arc_seed, size);
    }

    pub fn phase(&self) -> f32 {
        wrap_phase((self.day_secs / self.cycle_secs).fract() as f32)
    }

    pub fn night_visibility(&self) -> f32 {
        night_visibility(self.phase())
    }

    pub fn arc_seed(&self) -> f32 {
        self.arc_seed
    }

    pub fn cycle_index(&self) -> u64 {
        self.last_cycle
    }

    pub fn sun(&self) -> Option<&CelestialBody> {
        self.sun.as_ref()
    }

    pub fn moon(&self) -> Option<&CelestialBody> {
        self.moon.as_ref()
    }
}

fn stop(offset: f32, r: u8, g: u8, b: u8, a: f32) -> ColorStop {
    ColorStop::new(offset, Rgba::new(r, g, b, a))
}

fn channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Paints the directional wash the sun and moon cast on the sky.
pub fn draw_sky_light(
    sun: Option<&CelestialBody>,
    moon: Option<&CelestialBody>,
    canvas: &mut impl Canvas,
) {
    let size = canvas.size();
    let span = size.x.max(size.y);

    if let Some(sun) = sun.filter(|s| s.fade > 0.01) {
        let height = (1.0 - sun.pos.y / (size.y * GROUND_LINE)).clamp(0.0, 1.0);
        let warmth = 1.0 - height;
        let f = sun.fade;
        let g = 180.0 + height * 50.0;
        let b = 100.0 + height * 80.0;

        canvas.draw(Primitive::RadialGradient {
            center: sun.pos,
            inner_radius: 0.0,
            radius: span * (0.35 + warmth * 0.25),
            stops: vec![
                stop(0.0, 255, channel(g), channel(b), 0.25 * f * (0.4 + warmth * 0.6)),
                stop(0.15, 255, channel(g - 10.0), channel(b - 15.0), 0.15 * f * (0.3 + warmth * 0.7)),
                stop(0.4, 255, channel(g - 30.0), channel(b - 40.0), 0.04 * f),
                stop(0.7, 255, channel(g - 40.0), channel(b - 50.0), 0.008 * f),
                stop(1.0, 255, 150, 80, 0.0),
            ],
        });

        // Pink band along the horizon while the sun is low.
        if warmth > 0.3 {
            let a = f * warmth * 0.12;
            canvas.draw(Primitive::RadialGradient {
                center: Vec2::new(sun.pos.x, size.y * 0.78),
                inner_radius: 0.0,
                radius: size.x * 0.3,
                stops: vec![
                    stop(0.0, 255, 140, 120, a),
                    stop(0.35, 255, 120, 140, a * 0.3),
                    stop(1.0, 255, 100, 130, 0.0),
                ],
            });
        }
    }

    if let Some(moon) = moon.filter(|m| m.fade > 0.01) {
        let f = moon.fade;
        canvas.draw(Primitive::RadialGradient {
            center: moon.pos,
            inner_radius: 0.0,
            radius: span * 0.7,
            stops: vec![
                stop(0.0, 140, 170, 220, 0.07 * f),
                stop(0.3, 120, 150, 200, 0.03 * f),
                stop(0.7, 100, 130, 180, 0.01 * f),
                stop(1.0, 80, 110, 160, 0.0),
            ],
        });
    }
}

pub fn draw_sun(sun: &CelestialBody, canvas: &mut impl Canvas) {
    if sun.fade < 0.005 {
        return;
    }
    let size = canvas.size();
    let r = size.x.min(size.y) * SUN_RADIUS;
    let f = sun.fade;

    canvas.draw(Primitive::RadialGradient {
        center: sun.pos,
        inner_radius: r * 0.8,
        radius: r * 6.0,
        stops: vec![
            stop(0.0, 255, 240, 200, 0.22 * f),
            stop(0.3, 255, 220, 150, 0.08 * f),
            stop(0.7, 255, 200, 100, 0.025 * f),
            stop(1.0, 255, 180, 60, 0.0),
        ],
    });
    canvas.draw(Primitive::RadialGradient {
        center: sun.pos,
        inner_radius: 0.0,
        radius: r,
        stops: vec![
            stop(0.0, 0xff, 0xff, 0xf0, f),
            stop(0.3, 0xff, 0xf8, 0xd0, f),
            stop(0.6, 0xff, 0xe4, 0x80, f),
            stop(0.85, 0xff, 0xcc, 0x40, f),
            stop(1.0, 0xff, 0xaa, 0x20, f),
        ],
    });
    canvas.draw(Primitive::Circle {
        center: sun.pos,
        radius: r * 0.35,
        fill: Rgba::new(255, 255, 255, 0.6 * f * f),
    });
}

pub fn draw_moon(moon: &CelestialBody, canvas: &mut impl Canvas) {
    if moon.fade < 0.005 {
        return;
    }
    let size = canvas.size();
    let r = size.x.min(size.y) * MOON_RADIUS;
    let f = moon.fade;

    canvas.draw(Primitive::RadialGradient {
        center: moon.pos,
        inner_radius: r * 0.5,
        radius: r * 5.0,
        stops: vec![
            stop(0.0, 200, 215, 245, 0.18 * f),
            stop(0.4, 170, 195, 235, 0.06 * f),
            stop(1.0, 150, 175, 220, 0.0),
        ],
    });
    // Lit from the upper left.
    canvas.draw(Primitive::RadialGradient {
        center: moon.pos - Vec2::splat(r * 0.2),
        inner_radius: 0.0,
        radius: r,
        stops: vec![
            stop(0.0, 0xee, 0xf3, 0xff, f),
            stop(0.4, 0xdd, 0xe8, 0xf8, f),
            stop(0.7, 0xc8, 0xd8, 0xf0, f),
            stop(1.0, 0xa0, 0xb8, 0xd8, f),
        ],
    });
    for (dx, dy, cr) in CRATERS {
        canvas.draw(Primitive::Circle {
            center: moon.pos + Vec2::new(dx, dy) * r,
            radius: r * cr,
            fill: Rgba::new(140, 160, 190, 0.25 * f * f),
        });
    }
}

//! Time-of-day sky colors and the night visibility curve.
//!
//! Day phase runs over `[0, 1)`: 0.0 is midnight, 0.25 dawn, 0.5 noon and
//! 0.75 dusk. Both functions here wrap their input, so any phase maps onto
//! the same cycle.

use crate::paint::{Canvas, ColorStop, Primitive, Rgba};
use glam::Vec2;

/// One keyframe anchor of the sky gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyKey {
    pub phase: f32,
    pub top: [u8; 3],
    pub upper: [u8; 3],
    pub lower: [u8; 3],
    pub bottom: [u8; 3],
}

const fn key(phase: f32, top: [u8; 3], upper: [u8; 3], lower: [u8; 3], bottom: [u8; 3]) -> SkyKey {
    SkyKey {
        phase,
        top,
        upper,
        lower,
        bottom,
    }
}

const NIGHT: ([u8; 3], [u8; 3], [u8; 3], [u8; 3]) =
    ([5, 5, 26], [10, 10, 46], [16, 16, 53], [26, 16, 64]);

/// Anchors over one day. Spacing is tighter around dawn and dusk so the
/// color shift slows down there.
pub const SKY_KEYS: [SkyKey; 11] = [
    key(0.00, NIGHT.0, NIGHT.1, NIGHT.2, NIGHT.3),
    key(0.15, NIGHT.0, NIGHT.1, NIGHT.2, NIGHT.3),
    key(0.22, [15, 10, 40], [40, 20, 60], [80, 40, 70], [120, 60, 70]),
    key(0.30, [40, 30, 80], [120, 70, 100], [200, 120, 100], [220, 150, 100]),
    key(0.38, [80, 140, 220], [120, 180, 240], [150, 200, 245], [180, 215, 245]),
    key(0.50, [100, 170, 240], [140, 200, 250], [170, 215, 250], [200, 225, 248]),
    key(0.62, [80, 140, 220], [120, 180, 240], [150, 200, 245], [180, 215, 245]),
    key(0.70, [40, 30, 80], [120, 60, 80], [180, 80, 60], [200, 100, 60]),
    key(0.78, [15, 10, 40], [40, 20, 60], [60, 30, 60], [80, 40, 60]),
    key(0.85, NIGHT.0, NIGHT.1, NIGHT.2, NIGHT.3),
    key(1.00, NIGHT.0, NIGHT.1, NIGHT.2, NIGHT.3),
];

/// Gradient offsets of the four sky channels, top to bottom.
const CHANNEL_OFFSETS: [f32; 4] = [0.0, 0.4, 0.7, 1.0];

// Night visibility breakpoints.
const NIGHT_END: f32 = 0.18;
const DAY_START: f32 = 0.35;
const DAY_END: f32 = 0.65;
const NIGHT_START: f32 = 0.82;

/// Ground line as a fraction of the surface height.
pub const GROUND_LINE: f32 = 0.92;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkyColors {
    pub top: [u8; 3],
    pub upper: [u8; 3],
    pub lower: [u8; 3],
    pub bottom: [u8; 3],
}

fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let ch = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round().clamp(0.0, 255.0) as u8;
    [ch(a[0], b[0]), ch(a[1], b[1]), ch(a[2], b[2])]
}

/// Wraps any phase into `[0, 1)`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let p = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if p >= 1.0 { 0.0 } else { p }
}

/// Interpolates the four sky channels between the anchors around `phase`.
pub fn sky_colors(phase: f32) -> SkyColors {
    let phase = wrap_phase(phase);
    let upper = SKY_KEYS[1..]
        .iter()
        .position(|k| phase <= k.phase)
        .map_or(SKY_KEYS.len() - 1, |i| i + 1);
    let a = &SKY_KEYS[upper - 1];
    let b = &SKY_KEYS[upper];

    let span = b.phase - a.phase;
    let t = if span > 1e-6 {
        ((phase - a.phase) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };

    SkyColors {
        top: lerp_rgb(a.top, b.top, t),
        upper: lerp_rgb(a.upper, b.upper, t),
        lower: lerp_rgb(a.lower, b.lower, t),
        bottom: lerp_rgb(a.bottom, b.bottom, t),
    }
}

/// How visible night elements (stars, moon, glow) are: 1 at night, 0 by day,
/// with linear ramps through dawn and dusk.
pub fn night_visibility(phase: f32) -> f32 {
    let p = wrap_phase(phase);
    if p < NIGHT_END {
        1.0
    } else if p < DAY_START {
        1.0 - (p - NIGHT_END) / (DAY_START - NIGHT_END)
    } else if p < DAY_END {
        0.0
    } else if p < NIGHT_START {
        (p - DAY_END) / (NIGHT_START - DAY_END)
    } else {
        1.0
    }
}

/// Paints the full-surface vertical sky gradient for `phase`.
pub fn draw_sky(phase: f32, canvas: &mut impl Canvas) {
    let size = canvas.size();
    let c = sky_colors(phase);
    let stops = [c.top, c.upper, c.lower, c.bottom]
        .into_iter()
        .zip(CHANNEL_OFFSETS)
        .map(|(rgb, offset)| ColorStop::new(offset, Rgba::rgb(rgb)))
        .collect();
    canvas.draw(Primitive::VerticalGradient {
        min: Vec2::ZERO,
        max: size,
        stops,
    });
}

/// Paints the translucent ground tint along the bottom edge.
pub fn draw_ground(night: f32, canvas: &mut impl Canvas) {
    let size = canvas.size();
    let day = 1.0 - night.clamp(0.0, 1.0);
    let tint = |a: f32| {
        Rgba::new(
            (10.0 + day * 40.0).round() as u8,
            (20.0 + day * 60.0).round() as u8,
            (10.0 + day * 20.0).round() as u8,
            a,
        )
    };
    canvas.draw(Primitive::VerticalGradient {
        min: Vec2::new(0.0, size.y * GROUND_LINE),
        max: size,
        stops: vec![
            ColorStop::new(0.0, tint(0.0)),
            ColorStop::new(0.5, tint(0.3 + day * 0.1)),
            ColorStop::new(1.0, tint(0.5 + day * 0.1)),
        ],
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Layer;

    #[test]
    fn night_visibility_anchor_values() {
        assert_eq!(night_visibility(0.0), 1.0);
        assert_eq!(night_visibility(0.5), 0.0);
        assert_eq!(night_visibility(0.9), 1.0);
        assert!((night_visibility(0.265) - 0.5).abs() < 1e-5);
        assert!((night_visibility(0.735) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn night_visibility_is_continuous_at_breakpoints() {
        let eps = 1e-4;
        for b in [NIGHT_END, DAY_START, DAY_END, NIGHT_START] {
            let left = night_visibility(b - eps);
            let right = night_visibility(b + eps);
            assert!((left - right).abs() < 1e-2, "jump at {b}: {left} vs {right}");
        }
        // Wraparound at midnight.
        assert!((night_visibility(1.0 - eps) - night_visibility(0.0)).abs() < 1e-6);
    }

    #[test]
    fn night_visibility_stays_in_unit_range() {
        for i in 0..=1000 {
            let v = night_visibility(i as f32 / 1000.0);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn colors_and_visibility_are_periodic() {
        for p in [0.0, 0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875, 0.9375] {
            assert_eq!(sky_colors(p), sky_colors(p + 1.0), "phase {p}");
            assert_eq!(sky_colors(p), sky_colors(p - 1.0), "phase {p}");
            assert_eq!(night_visibility(p), night_visibility(p + 1.0), "phase {p}");
            assert_eq!(night_visibility(p), night_visibility(p + 3.0), "phase {p}");
        }
    }

    #[test]
    fn keyframes_are_hit_exactly() {
        for k in &SKY_KEYS[..SKY_KEYS.len() - 1] {
            let c = sky_colors(k.phase);
            assert_eq!(c.top, k.top, "phase {}", k.phase);
            assert_eq!(c.bottom, k.bottom, "phase {}", k.phase);
        }
        assert_eq!(sky_colors(0.5).top, [100, 170, 240]);
    }

    #[test]
    fn colors_interpolate_between_anchors() {
        // Halfway between dawn (0.30) and morning (0.38).
        let c = sky_colors(0.34);
        assert_eq!(c.top, [60, 85, 150]);
    }

    #[test]
    fn keys_are_sorted_and_span_one_day() {
        assert!(SKY_KEYS.windows(2).all(|w| w[0].phase < w[1].phase));
        assert_eq!(SKY_KEYS[0].phase, 0.0);
        assert_eq!(SKY_KEYS[SKY_KEYS.len() - 1].phase, 1.0);
        assert_eq!(SKY_KEYS[0].top, SKY_KEYS[SKY_KEYS.len() - 1].top);
    }

    #[test]
    fn sky_fills_the_whole_surface() {
        let mut layer = Layer::new(Vec2::new(640.0, 480.0));
        draw_sky(0.5, &mut layer);
        let [Primitive::VerticalGradient { min, max, stops }] = layer.primitives() else {
            panic!("expected one gradient");
        };
        assert_eq!(*min, Vec2::ZERO);
        assert_eq!(*max, Vec2::new(640.0, 480.0));
        assert_eq!(stops.len(), 4);
    }

    #[test]
    fn ground_is_brighter_by_day() {
        let mut night = Layer::new(Vec2::new(100.0, 100.0));
        let mut day = Layer::new(Vec2::new(100.0, 100.0));
        draw_ground(1.0, &mut night);
        draw_ground(0.0, &mut day);
        let g = |l: &Layer| match &l.primitives()[0] {
            Primitive::VerticalGradient { stops, min, .. } => {
                assert!((min.y - 92.0).abs() < 1e-3);
                stops[2].color
            }
            other => panic!("unexpected {other:?}"),
        };
        assert!(g(&day).g > g(&night).g);
        assert!(g(&day).a > g(&night).a);
    }
}

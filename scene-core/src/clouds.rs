//! Soft clouds drifting slowly to the right.

use crate::{
    config::CloudConfig,
    paint::{Canvas, ColorStop, Primitive, Rgba},
};
use glam::Vec2;
use rand::Rng;

/// One soft disc of a cloud, relative to the cloud center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
    pub offset: Vec2,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Pixels per nominal frame.
    pub speed: f32,
    pub opacity: f32,
    pub blobs: Vec<Blob>,
}

impl Cloud {
    fn generate(size: Vec2, rng: &mut impl Rng) -> Self {
        let width: f32 = rng.random_range(100.0..300.0);
        let height: f32 = rng.random_range(30.0..70.0);
        let count: usize = rng.random_range(5..=8);

        // Blobs are tallest in the middle and taper towards both ends.
        let blobs = (0..count)
            .map(|j| {
                let t = j as f32 / (count - 1) as f32;
                let taper = 1.0 - (2.0 * t - 1.0).powi(2) * 0.6;
                let offset = Vec2::new(
                    (t - 0.5) * width * 0.8,
                    (rng.random::<f32>() - 0.55) * height * 0.3,
                );
                let radius = (height * 0.4 + rng.random::<f32>() * height * 0.35) * taper;
                Blob { offset, radius }
            })
            .collect();

        Self {
            pos: Vec2::new(
                rng.random::<f32>() * (size.x + 400.0) - 200.0,
                30.0 + rng.random::<f32>() * size.y * 0.3,
            ),
            width,
            height,
            speed: rng.random_range(0.08..0.43),
            opacity: rng.random_range(0.12..0.32),
            blobs,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Clouds {
    clouds: Vec<Cloud>,
}

impl Clouds {
    pub fn generate(size: Vec2, cfg: &CloudConfig, rng: &mut impl Rng) -> Self {
        if !(size.x > 0.0 && size.y > 0.0) {
            return Self::default();
        }
        let count = rng.random_range(cfg.min_clouds..=cfg.max_clouds.max(cfg.min_clouds));
        Self {
            clouds: (0..count).map(|_| Cloud::generate(size, rng)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    /// Drifts every cloud by `frames` nominal frames. A cloud that has fully
    /// left the right edge re-enters from beyond the left one.
    pub fn update(&mut self, frames: f32, surface_width: f32) {
        for c in &mut self.clouds {
            c.pos.x += c.speed * frames;
            if c.pos.x - c.width > surface_width {
                c.pos.x = -c.width * 1.5;
            }
        }
    }

    /// Clouds are brightest by day but never vanish entirely.
    pub fn draw(&self, night: f32, canvas: &mut impl Canvas) {
        let visibility = 0.3 + 0.7 * (1.0 - night.clamp(0.0, 1.0));
        for c in &self.clouds {
            let a = c.opacity * visibility;
            let white = |alpha: f32| Rgba::new(255, 255, 255, alpha);
            for blob in &c.blobs {
                canvas.draw(Primitive::RadialGradient {
                    center: c.pos + blob.offset,
                    inner_radius: 0.0,
                    radius: blob.radius,
                    stops: vec![
                        ColorStop::new(0.0, white(a * 0.8)),
                        ColorStop::new(0.4, white(a * 0.45)),
                        ColorStop::new(0.75, white(a * 0.12)),
                        ColorStop::new(1.0, white(0.0)),
                    ],
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Layer;
    use rand::{SeedableRng, rngs::StdRng};

    const SIZE: Vec2 = Vec2::new(1200.0, 800.0);

    fn clouds(seed: u64) -> Clouds {
        let mut rng = StdRng::seed_from_u64(seed);
        Clouds::generate(SIZE, &CloudConfig::default(), &mut rng)
    }

    #[test]
    fn population_is_within_configured_bounds() {
        for seed in 0..30 {
            let clouds = clouds(seed);
            assert!((5..=10).contains(&clouds.len()));
            for c in clouds.clouds() {
                assert!((5..=8).contains(&c.blobs.len()));
                assert!(c.pos.y >= 30.0 && c.pos.y <= 30.0 + SIZE.y * 0.3);
                assert!(c.blobs.iter().all(|b| b.radius > 0.0));
            }
        }
    }

    #[test]
    fn middle_blobs_are_larger_on_average() {
        let mut edge = 0.0;
        let mut middle = 0.0;
        for seed in 0..20 {
            for c in clouds(seed).clouds() {
                edge += c.blobs[0].radius;
                middle += c.blobs[c.blobs.len() / 2].radius;
            }
        }
        assert!(middle > edge);
    }

    #[test]
    fn clouds_wrap_past_right_edge() {
        let mut clouds = clouds(1);
        let width = clouds.clouds[0].width;
        clouds.clouds[0].pos.x = SIZE.x + width - 0.01;
        clouds.clouds[0].speed = 0.1;
        clouds.update(1.0, SIZE.x);
        assert_eq!(clouds.clouds[0].pos.x, -width * 1.5);
    }

    #[test]
    fn night_dims_but_keeps_clouds() {
        let clouds = clouds(2);
        let center_alpha = |night: f32| {
            let mut layer = Layer::new(SIZE);
            clouds.draw(night, &mut layer);
            match &layer.primitives()[0] {
                Primitive::RadialGradient { stops, .. } => stops[0].color.a,
                other => panic!("unexpected {other:?}"),
            }
        };
        let day = center_alpha(0.0);
        let night = center_alpha(1.0);
        assert!(night > 0.0);
        assert!((night / day - 0.3).abs() < 1e-4);
    }

    #[test]
    fn zero_area_has_no_clouds() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Clouds::generate(Vec2::ZERO, &CloudConfig::default(), &mut rng).is_empty());
    }
}

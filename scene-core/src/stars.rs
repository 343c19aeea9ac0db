//! Night sky decorations: the star field and shooting stars.
//!
//! Most stars never change, so they are recorded once into a baked layer at
//! generation time. Only a small twinkling minority is redrawn per frame.

use crate::{
    config::StarConfig,
    paint::{Canvas, ColorStop, Layer, Primitive, Rgba},
    types::NOMINAL_FRAME_SECS,
};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::{PI, TAU};

const STAR_RGB: [u8; 3] = [255, 255, 240];
/// Stars only populate the upper part of the sky.
const STAR_BAND: f32 = 0.7;
/// Twinklers dim while their wave is above this level.
const TWINKLE_THRESHOLD: f32 = 0.7;
const TWINKLE_DIM: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub pos: Vec2,
    pub radius: f32,
    pub alpha: f32,
}

impl Star {
    fn primitive(&self, alpha: f32) -> Primitive {
        Primitive::Circle {
            center: self.pos,
            radius: self.radius,
            fill: Rgba::rgb(STAR_RGB).with_alpha(alpha),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Twinkler {
    pub star: Star,
    /// Angular speed of the twinkle wave, radians per second.
    pub speed: f32,
    pub offset: f32,
}

impl Twinkler {
    pub fn alpha_at(&self, time_secs: f64) -> f32 {
        let phase = (time_secs * f64::from(self.speed)).rem_euclid(std::f64::consts::TAU) as f32;
        let wave = (phase + self.offset).sin();
        let dim = if wave > TWINKLE_THRESHOLD {
            (wave - TWINKLE_THRESHOLD) / (1.0 - TWINKLE_THRESHOLD)
        } else {
            0.0
        };
        self.star.alpha * (1.0 - dim * TWINKLE_DIM)
    }
}

#[derive(Clone, Debug, Default)]
pub struct StarField {
    twinklers: Vec<Twinkler>,
    total: usize,
}

impl StarField {
    /// Scatters stars over `size`, recording the static ones into `baked`.
    pub fn generate(size: Vec2, cfg: &StarConfig, baked: &mut Layer, rng: &mut impl Rng) -> Self {
        let area = size.x.max(0.0) * size.y.max(0.0);
        let total = (area / cfg.area_per_star.max(1.0)).floor() as usize;
        let mut twinklers = Vec::with_capacity((total as f32 * cfg.twinkle_fraction) as usize + 1);

        for _ in 0..total {
            let star = Star {
                pos: Vec2::new(
                    rng.random::<f32>() * size.x,
                    rng.random::<f32>() * size.y * STAR_BAND,
                ),
                radius: rng.random_range(0.3..1.8),
                alpha: rng.random_range(0.5..1.0),
            };
            if rng.random::<f32>() < cfg.twinkle_fraction {
                twinklers.push(Twinkler {
                    star,
                    speed: rng.random_range(1.0..4.0),
                    offset: rng.random_range(0.0..TAU),
                });
            } else {
                baked.draw(star.primitive(star.alpha));
            }
        }

        Self { twinklers, total }
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn twinklers(&self) -> &[Twinkler] {
        &self.twinklers
    }

    /// Blits the baked stars and redraws the twinklers, all at `night`
    /// opacity. Nothing is drawn in daylight.
    pub fn draw(&self, baked: &Layer, night: f32, time_secs: f64, canvas: &mut impl Canvas) {
        if night < 0.01 {
            return;
        }
        let night = night.min(1.0);
        canvas.blit(baked, night);
        for t in &self.twinklers {
            canvas.draw(t.star.primitive(t.alpha_at(time_secs) * night));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShootingStar {
    pub pos: Vec2,
    /// Velocity in pixels per nominal frame.
    pub vel: Vec2,
    pub length: f32,
    pub life: f32,
    pub decay: f32,
    pub brightness: f32,
}

/// Night-gated meteors on a frame-counted timer.
#[derive(Clone, Debug)]
pub struct ShootingStars {
    stars: Vec<ShootingStar>,
    timer_secs: f32,
    next_secs: f32,
}

impl ShootingStars {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            stars: Vec::new(),
            timer_secs: 0.0,
            next_secs: rng.random_range(5.0..15.0),
        }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[ShootingStar] {
        &self.stars
    }

    fn spawn(&mut self, size: Vec2, rng: &mut impl Rng) {
        let angle = PI * 0.15 + rng.random::<f32>() * PI * 0.2;
        let speed = rng.random_range(4.0..8.0);
        self.stars.push(ShootingStar {
            pos: Vec2::new(
                rng.random::<f32>() * size.x * 0.8,
                rng.random::<f32>() * size.y * 0.3,
            ),
            vel: Vec2::from_angle(angle) * speed,
            length: rng.random_range(80.0..200.0),
            life: 1.0,
            decay: rng.random_range(0.008..0.014),
            brightness: rng.random_range(0.8..1.0),
        });
    }

    /// Advances the spawn timer and every live meteor by `frames` nominal
    /// frames. A due spawn is skipped (and the timer rearmed) unless it is
    /// dark enough.
    pub fn update(&mut self, frames: f32, night: f32, size: Vec2, rng: &mut impl Rng) {
        self.timer_secs += frames * NOMINAL_FRAME_SECS;
        if self.timer_secs >= self.next_secs {
            if night > 0.3 {
                self.spawn(size, rng);
            }
            self.timer_secs = 0.0;
            self.next_secs = rng.random_range(15.0..40.0);
        }

        self.stars.retain_mut(|s| {
            s.pos += s.vel * frames;
            s.life -= s.decay * frames;
            s.life > 0.0 && s.pos.x <= size.x + 50.0 && s.pos.y <= size.y
        });
    }

    pub fn draw(&self, canvas: &mut impl Canvas) {
        for s in &self.stars {
            let a = s.life.clamp(0.0, 1.0) * s.brightness;
            let tail = s.pos - s.vel.normalize_or_zero() * s.length;
            canvas.draw(Primitive::GradientLine {
                from: s.pos,
                to: tail,
                width: 1.5 * s.life + 0.5,
                stops: vec![
                    ColorStop::new(0.0, Rgba::new(255, 255, 255, a)),
                    ColorStop::new(0.3, Rgba::new(200, 220, 255, a * 0.5)),
                    ColorStop::new(1.0, Rgba::new(150, 180, 255, 0.0)),
                ],
            });
            canvas.draw(Primitive::Circle {
                center: s.pos,
                radius: 2.0 * s.life,
                fill: Rgba::new(255, 255, 255, a * 0.8),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    const SIZE: Vec2 = Vec2::new(1200.0, 800.0);

    #[test]
    fn star_count_follows_area_and_bakes_static_majority() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut baked = Layer::new(SIZE);
        let field = StarField::generate(SIZE, &StarConfig::default(), &mut baked, &mut rng);

        assert_eq!(field.len(), 160);
        assert_eq!(baked.len() + field.twinklers().len(), field.len());
        // Roughly 12% twinkle.
        assert!(field.twinklers().len() < field.len() / 4);
        assert!(!field.twinklers().is_empty());
    }

    #[test]
    fn stars_stay_in_upper_sky() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut baked = Layer::new(SIZE);
        StarField::generate(SIZE, &StarConfig::default(), &mut baked, &mut rng);
        for p in baked.primitives() {
            let Primitive::Circle { center, .. } = p else {
                panic!("unexpected {p:?}");
            };
            assert!(center.y <= SIZE.y * STAR_BAND);
        }
    }

    #[test]
    fn zero_area_has_no_stars() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut baked = Layer::new(Vec2::ZERO);
        let field = StarField::generate(Vec2::ZERO, &StarConfig::default(), &mut baked, &mut rng);
        assert!(field.is_empty());
        assert!(baked.is_empty());
    }

    #[test]
    fn twinkle_dims_at_most_sixty_percent() {
        let t = Twinkler {
            star: Star {
                pos: Vec2::ZERO,
                radius: 1.0,
                alpha: 1.0,
            },
            speed: 1.0,
            offset: 0.0,
        };
        // sin peaks at pi/2.
        assert!((t.alpha_at(std::f64::consts::FRAC_PI_2) - 0.4).abs() < 1e-4);
        assert_eq!(t.alpha_at(0.0), 1.0);
        for i in 0..100 {
            let a = t.alpha_at(i as f64 * 0.1);
            assert!((0.4 - 1e-4..=1.0).contains(&a));
        }
    }

    #[test]
    fn daylight_draws_no_stars() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut baked = Layer::new(SIZE);
        let field = StarField::generate(SIZE, &StarConfig::default(), &mut baked, &mut rng);

        let mut out = Layer::new(SIZE);
        field.draw(&baked, 0.0, 1.0, &mut out);
        assert!(out.is_empty());

        field.draw(&baked, 1.0, 1.0, &mut out);
        assert_eq!(out.len(), field.len());
    }

    #[test]
    fn shooting_stars_only_spawn_at_night() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut day = ShootingStars::new(&mut rng);
        // Run a full minute of daylight frames.
        for _ in 0..3600 {
            day.update(1.0, 0.0, SIZE, &mut rng);
        }
        assert!(day.is_empty());

        let mut night = ShootingStars::new(&mut rng);
        let mut seen = false;
        for _ in 0..3600 {
            night.update(1.0, 1.0, SIZE, &mut rng);
            seen |= !night.is_empty();
        }
        assert!(seen);
    }

    #[test]
    fn shooting_stars_burn_out() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut meteors = ShootingStars::new(&mut rng);
        meteors.spawn(SIZE, &mut rng);
        assert_eq!(meteors.len(), 1);

        let s = meteors.stars()[0];
        assert!(s.vel.x > 0.0 && s.vel.y > 0.0);

        // Life decays by at least 0.008 per frame.
        for _ in 0..130 {
            meteors.update(1.0, 0.0, SIZE, &mut rng);
        }
        assert!(meteors.is_empty());
    }
}

//! Blossoms on the outer branch tips and their bake cursor.
//!
//! Blossoms fade in once growth passes their `appear` threshold. A blossom
//! that has finished fading in never changes again, so it is baked into a
//! persistent [`Layer`] and dropped from per-frame drawing. Because the list
//! is sorted by `appear`, a cursor marks where the still-animating entries
//! begin and neither baking nor drawing ever rescans the baked prefix.

use crate::{
    config::BlossomConfig,
    paint::{Canvas, Layer, Primitive, Rgba},
    tree::Tree,
};
use glam::Vec2;
use rand::{Rng, seq::IndexedRandom};

const SATURATION: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blossom {
    pub pos: Vec2,
    pub radius: f32,
    pub hue: f32,
    /// Lightness in `[0, 1]`.
    pub lightness: f32,
    pub alpha: f32,
    /// Growth value at which the blossom starts fading in.
    pub appear: f32,
    pub baked: bool,
}

impl Blossom {
    /// Fade-in fraction in `[0, 1]` at the given growth.
    pub fn fade_in(&self, growth: f32, fade_span: f32) -> f32 {
        ((growth - self.appear) / fade_span).clamp(0.0, 1.0)
    }

    fn primitive(&self, fade: f32) -> Primitive {
        Primitive::Circle {
            center: self.pos,
            radius: self.radius * fade,
            fill: Rgba::hsla(self.hue, SATURATION, self.lightness, self.alpha * fade),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlossomSet {
    blossoms: Vec<Blossom>,
    cursor: usize,
    baked: Vec<usize>,
    fade_span: f32,
    bake_cap: usize,
}

impl BlossomSet {
    /// Picks blossoms for the outer branches of `tree`.
    ///
    /// ### Parameters
    /// - `tree` - The generated tree; only branches at `min_depth` or deeper
    ///   are candidates.
    /// - `cfg` - Selection chance, appear spread, fade span and bake cap.
    /// - `rng` - Random source.
    ///
    /// ### Returns
    /// A set sorted ascending by `appear` with nothing baked yet.
    pub fn generate(tree: &Tree, cfg: &BlossomConfig, rng: &mut impl Rng) -> Self {
        let levels = (tree.max_delay.max(1) + 1) as f32;
        let chance = f64::from(cfg.chance).clamp(0.0, 1.0);

        let mut blossoms = Vec::new();
        for b in &tree.branches {
            if b.depth < cfg.min_depth || !rng.random_bool(chance) {
                continue;
            }
            blossoms.push(Blossom {
                pos: b.end,
                radius: rng.random_range(2.0..6.0),
                hue: rng.random_range(330.0..350.0),
                lightness: rng.random_range(0.75..0.90),
                alpha: rng.random_range(0.7..1.0),
                appear: (b.delay + 1) as f32 / levels + rng.random::<f32>() * cfg.appear_spread,
                baked: false,
            });
        }

        Self::from_blossoms(blossoms, cfg)
    }

    /// Wraps an existing population, sorting it by `appear`.
    pub fn from_blossoms(mut blossoms: Vec<Blossom>, cfg: &BlossomConfig) -> Self {
        blossoms.sort_by(|a, b| a.appear.total_cmp(&b.appear));
        let baked = blossoms
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.baked.then_some(i))
            .collect::<Vec<_>>();
        let cursor = blossoms.iter().take_while(|b| b.baked).count();
        Self {
            blossoms,
            cursor,
            baked,
            fade_span: cfg.fade_span,
            bake_cap: cfg.bake_cap.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.blossoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blossoms.is_empty()
    }

    pub fn blossoms(&self) -> &[Blossom] {
        &self.blossoms
    }

    /// Index of the first blossom that may still be animating.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn baked_count(&self) -> usize {
        self.baked.len()
    }

    /// A uniformly chosen baked blossom, if any.
    pub fn random_baked(&self, rng: &mut impl Rng) -> Option<&Blossom> {
        self.baked.choose(rng).map(|&i| &self.blossoms[i])
    }

    /// Bakes blossoms that finished fading in at `growth` into `layer`.
    ///
    /// Scans forward from the cursor and stops at the first blossom that has
    /// not appeared yet. Blossoms still mid-fade are skipped over. At most
    /// `bake_cap` blossoms are baked per call; the rest wait for the next one.
    ///
    /// ### Returns
    /// How many blossoms were baked by this call.
    pub fn bake_step(&mut self, growth: f32, layer: &mut Layer) -> usize {
        let mut baked_now = 0;
        let mut i = self.cursor;

        while i < self.blossoms.len() && baked_now < self.bake_cap {
            let b = &mut self.blossoms[i];
            if !b.baked {
                if growth < b.appear {
                    break;
                }
                if b.fade_in(growth, self.fade_span) < 1.0 {
                    i += 1;
                    continue;
                }
                b.baked = true;
                layer.draw(b.primitive(1.0));
                self.baked.push(i);
                baked_now += 1;
            }
            if i == self.cursor {
                self.cursor += 1;
            }
            i += 1;
        }

        baked_now
    }

    /// Draws the blossoms still fading in, scaled by their fade fraction.
    pub fn draw_pending(&self, growth: f32, canvas: &mut impl Canvas) {
        for b in &self.blossoms[self.cursor..] {
            if b.baked {
                continue;
            }
            if growth < b.appear {
                break;
            }
            let fade = b.fade_in(growth, self.fade_span);
            if fade > 0.0 {
                canvas.draw(b.primitive(fade));
            }
        }
    }

    /// Blits the baked layer, then draws what is still fading in on top.
    pub fn draw(&self, baked: &Layer, growth: f32, canvas: &mut impl Canvas) {
        canvas.blit(baked, 1.0);
        self.draw_pending(growth, canvas);
    }
}

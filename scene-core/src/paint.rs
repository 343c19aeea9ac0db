//! Drawing capability consumed by the scene.
//!
//! The scene never rasterizes anything itself. It describes what it wants
//! drawn as [`Primitive`]s and hands them to a [`Canvas`] supplied by the
//! host. A [`Layer`] is a recorded list of primitives that can be blitted
//! onto any canvas; it is what the render caches bake into.

use glam::Vec2;
use std::sync::atomic::{AtomicU64, Ordering};

/// 8-bit RGB color with a floating point alpha in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2], 1.0)
    }

    /// Builds a color from hue in degrees and saturation/lightness in `[0, 1]`.
    pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let [r, g, b] = hsl_to_rgb(hue, saturation, lightness);
        Self::new(r, g, b, alpha.clamp(0.0, 1.0))
    }

    /// Returns the same color with its alpha replaced (clamped to `[0, 1]`).
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Returns the same color with its alpha multiplied by `factor`.
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    /// Alpha quantized to a byte, for hosts that want unmultiplied 8-bit RGBA.
    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// Converts HSL (hue in degrees, saturation and lightness in `[0, 1]`) to RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return [v, v, v];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

/// One stop of a gradient. `offset` runs from `0` (start/center) to `1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// A single drawing command in screen space (y grows downwards).
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Axis-aligned rectangle filled with a top-to-bottom gradient.
    VerticalGradient {
        min: Vec2,
        max: Vec2,
        stops: Vec<ColorStop>,
    },
    /// Disc filled with a radial gradient from `inner_radius` to `radius`.
    RadialGradient {
        center: Vec2,
        inner_radius: f32,
        radius: f32,
        stops: Vec<ColorStop>,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Rgba,
    },
    /// Filled ellipse rotated by `rotation` radians around its center.
    Ellipse {
        center: Vec2,
        radii: Vec2,
        rotation: f32,
        fill: Rgba,
    },
    /// Open stroked path with round-ish joins.
    Polyline {
        points: Vec<Vec2>,
        width: f32,
        color: Rgba,
    },
    /// Straight stroke whose color varies along its length.
    GradientLine {
        from: Vec2,
        to: Vec2,
        width: f32,
        stops: Vec<ColorStop>,
    },
}

impl Primitive {
    /// Multiplies every color of the primitive by `opacity`.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity >= 1.0 {
            return self;
        }
        match &mut self {
            Primitive::VerticalGradient { stops, .. }
            | Primitive::RadialGradient { stops, .. }
            | Primitive::GradientLine { stops, .. } => {
                for stop in stops.iter_mut() {
                    stop.color = stop.color.fade(opacity);
                }
            }
            Primitive::Circle { fill, .. } | Primitive::Ellipse { fill, .. } => {
                *fill = fill.fade(opacity);
            }
            Primitive::Polyline { color, .. } => *color = color.fade(opacity),
        }
        self
    }
}

/// Draw passes, in the back-to-front order the scene paints them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    Sky,
    SkyGlow,
    Clouds,
    Stars,
    ShootingStars,
    Sun,
    Moon,
    Ground,
    Tree,
    Blossoms,
    Petals,
}

impl Pass {
    pub const BACK_TO_FRONT: [Pass; 11] = [
        Pass::Sky,
        Pass::SkyGlow,
        Pass::Clouds,
        Pass::Stars,
        Pass::ShootingStars,
        Pass::Sun,
        Pass::Moon,
        Pass::Ground,
        Pass::Tree,
        Pass::Blossoms,
        Pass::Petals,
    ];
}

/// A rendering surface the scene can paint onto.
pub trait Canvas {
    /// Drawable size in pixels.
    fn size(&self) -> Vec2;

    /// Draws one primitive immediately.
    fn draw(&mut self, primitive: Primitive);

    /// Composites a previously recorded layer at the given opacity.
    fn blit(&mut self, layer: &Layer, opacity: f32);

    /// Called before each draw pass. Hosts may ignore it.
    fn begin_pass(&mut self, _pass: Pass) {}
}

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Layer`].
///
/// Hosts can key their own converted-geometry caches by it: a new id means a
/// new cache epoch, while a known id only ever grows by appended primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

impl LayerId {
    fn next() -> Self {
        Self(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A persistent, append-only snapshot of drawn primitives.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    id: LayerId,
    size: Vec2,
    primitives: Vec<Primitive>,
}

impl Layer {
    pub fn new(size: Vec2) -> Self {
        Self {
            id: LayerId::next(),
            size,
            primitives: Vec::new(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Canvas for Layer {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn draw(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    fn blit(&mut self, layer: &Layer, opacity: f32) {
        self.primitives.extend(
            layer
                .primitives
                .iter()
                .cloned()
                .map(|p| p.with_opacity(opacity)),
        );
    }
}

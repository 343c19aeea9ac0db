//! eframe/egui host for the blossom scene.
//!
//! This module defines [`Viewer`], which owns the [`Scene`] and its frame
//! scheduler and implements [`eframe::App`] to drive and paint it once per
//! display refresh. Scene primitives are turned into egui shapes by
//! [`EguiCanvas`]; baked layers go through [`LayerShapeCache`] so each
//! recorded primitive is converted only once.

use eframe::App;
use egui::{Color32, Mesh, Pos2, Shape, Stroke};
use glam::Vec2;
use scene_core::{
    Canvas, Config, FrameScheduler, Layer, LayerId, Primitive, Scene,
    paint::{ColorStop, Rgba},
};
use std::{collections::HashMap, f32::consts::TAU};

/// Speed multipliers offered by the toolbar.
const SPEEDS: [f32; 2] = [1.0, 2.0];
const RING_SEGMENTS: usize = 32;
const ELLIPSE_POINTS: usize = 16;

fn to_pos(p: Vec2, origin: egui::Vec2) -> Pos2 {
    egui::pos2(p.x + origin.x, p.y + origin.y)
}

fn to_color(c: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.alpha_u8())
}

/// Single-stop gradients paint a flat fill.
fn padded_stops(stops: &[ColorStop]) -> Vec<ColorStop> {
    match stops {
        [only] => vec![
            ColorStop::new(0.0, only.color),
            ColorStop::new(1.0, only.color),
        ],
        _ => stops.to_vec(),
    }
}

fn vertical_gradient_mesh(min: Pos2, max: Pos2, stops: &[ColorStop]) -> Mesh {
    let mut mesh = Mesh::default();
    let stops = padded_stops(stops);
    for stop in &stops {
        let y = min.y + (max.y - min.y) * stop.offset;
        let c = to_color(stop.color);
        mesh.colored_vertex(egui::pos2(min.x, y), c);
        mesh.colored_vertex(egui::pos2(max.x, y), c);
    }
    for k in 1..stops.len() as u32 {
        let (a, b) = (2 * (k - 1), 2 * k);
        mesh.add_triangle(a, a + 1, b + 1);
        mesh.add_triangle(a, b + 1, b);
    }
    mesh
}

/// A center vertex plus one ring per stop. Inside the first ring the first
/// stop color is used.
fn radial_gradient_mesh(center: Pos2, inner: f32, radius: f32, stops: &[ColorStop]) -> Mesh {
    let mut mesh = Mesh::default();
    let Some(first) = stops.first() else {
        return mesh;
    };
    mesh.colored_vertex(center, to_color(first.color));
    for stop in stops {
        let r = inner + (radius - inner) * stop.offset;
        let c = to_color(stop.color);
        for s in 0..RING_SEGMENTS {
            let a = s as f32 / RING_SEGMENTS as f32 * TAU;
            mesh.colored_vertex(center + egui::vec2(a.cos(), a.sin()) * r, c);
        }
    }

    let n = RING_SEGMENTS as u32;
    for s in 0..n {
        mesh.add_triangle(0, 1 + s, 1 + (s + 1) % n);
    }
    for k in 1..stops.len() as u32 {
        let (a, b) = (1 + (k - 1) * n, 1 + k * n);
        for s in 0..n {
            let next = (s + 1) % n;
            mesh.add_triangle(a + s, b + s, b + next);
            mesh.add_triangle(a + s, b + next, a + next);
        }
    }
    mesh
}

fn gradient_line_mesh(from: Pos2, to: Pos2, width: f32, stops: &[ColorStop]) -> Option<Mesh> {
    let dir = to - from;
    let len = dir.length();
    if len < 1e-3 {
        return None;
    }
    let half = egui::vec2(-dir.y, dir.x) / len * (width * 0.5);
    let stops = padded_stops(stops);

    let mut mesh = Mesh::default();
    for stop in &stops {
        let p = from + dir * stop.offset;
        let c = to_color(stop.color);
        mesh.colored_vertex(p + half, c);
        mesh.colored_vertex(p - half, c);
    }
    for k in 1..stops.len() as u32 {
        let (a, b) = (2 * (k - 1), 2 * k);
        mesh.add_triangle(a, a + 1, b + 1);
        mesh.add_triangle(a, b + 1, b);
    }
    Some(mesh)
}

/// Converts one primitive into egui shapes offset by `origin`.
///
/// ### Parameters
/// - `primitive` - The primitive in scene coordinates.
/// - `origin` - Screen position of the scene's top-left corner.
/// - `out` - Receives the converted shapes. Degenerate primitives add none.
pub fn primitive_to_shapes(primitive: &Primitive, origin: egui::Vec2, out: &mut Vec<Shape>) {
    match primitive {
        Primitive::VerticalGradient { min, max, stops } => {
            if stops.is_empty() {
                return;
            }
            out.push(Shape::mesh(vertical_gradient_mesh(
                to_pos(*min, origin),
                to_pos(*max, origin),
                stops,
            )));
        }
        Primitive::RadialGradient {
            center,
            inner_radius,
            radius,
            stops,
        } => {
            if *radius <= 0.0 || stops.is_empty() {
                return;
            }
            out.push(Shape::mesh(radial_gradient_mesh(
                to_pos(*center, origin),
                *inner_radius,
                *radius,
                stops,
            )));
        }
        Primitive::Circle {
            center,
            radius,
            fill,
        } => {
            if *radius > 0.0 {
                out.push(Shape::circle_filled(to_pos(*center, origin), *radius, to_color(*fill)));
            }
        }
        Primitive::Ellipse {
            center,
            radii,
            rotation,
            fill,
        } => {
            let (sin, cos) = rotation.sin_cos();
            let c = to_pos(*center, origin);
            let points = (0..ELLIPSE_POINTS)
                .map(|i| {
                    let t = i as f32 / ELLIPSE_POINTS as f32 * TAU;
                    let (x, y) = (radii.x * t.cos(), radii.y * t.sin());
                    c + egui::vec2(x * cos - y * sin, x * sin + y * cos)
                })
                .collect();
            out.push(Shape::convex_polygon(points, to_color(*fill), Stroke::NONE));
        }
        Primitive::Polyline {
            points,
            width,
            color,
        } => {
            if points.len() < 2 {
                return;
            }
            let points = points.iter().map(|p| to_pos(*p, origin)).collect();
            out.push(Shape::line(points, Stroke::new(*width, to_color(*color))));
        }
        Primitive::GradientLine {
            from,
            to,
            width,
            stops,
        } => {
            if stops.is_empty() {
                return;
            }
            if let Some(mesh) =
                gradient_line_mesh(to_pos(*from, origin), to_pos(*to, origin), *width, stops)
            {
                out.push(Shape::mesh(mesh));
            }
        }
    }
}

#[derive(Default)]
struct CachedLayer {
    converted: usize,
    shapes: Vec<Shape>,
    used: bool,
}

/// Converted shapes of every layer blitted recently, keyed by layer id.
///
/// Layers only grow by appending, so each call converts just the primitives
/// added since the last one. A layer that is not blitted between two
/// [`LayerShapeCache::end_frame`] calls is forgotten.
#[derive(Default)]
pub struct LayerShapeCache {
    entries: HashMap<LayerId, CachedLayer>,
    origin: egui::Vec2,
}

impl LayerShapeCache {
    pub fn shapes(&mut self, layer: &Layer, origin: egui::Vec2) -> &[Shape] {
        if origin != self.origin {
            self.entries.clear();
            self.origin = origin;
        }

        let entry = self.entries.entry(layer.id()).or_default();
        if entry.converted > layer.len() {
            *entry = CachedLayer::default();
        }
        for p in &layer.primitives()[entry.converted..] {
            primitive_to_shapes(p, origin, &mut entry.shapes);
        }
        entry.converted = layer.len();
        entry.used = true;
        &entry.shapes
    }

    /// Drops layers that were not used since the previous call.
    pub fn end_frame(&mut self) {
        self.entries.retain(|_, e| std::mem::take(&mut e.used));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Paints scene primitives through an egui painter.
pub struct EguiCanvas<'a> {
    painter: &'a egui::Painter,
    origin: egui::Vec2,
    size: Vec2,
    cache: &'a mut LayerShapeCache,
    scratch: Vec<Shape>,
}

impl<'a> EguiCanvas<'a> {
    pub fn new(painter: &'a egui::Painter, rect: egui::Rect, cache: &'a mut LayerShapeCache) -> Self {
        Self {
            painter,
            origin: rect.min.to_vec2(),
            size: Vec2::new(rect.width(), rect.height()),
            cache,
            scratch: Vec::with_capacity(4),
        }
    }
}

impl Canvas for EguiCanvas<'_> {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn draw(&mut self, primitive: Primitive) {
        primitive_to_shapes(&primitive, self.origin, &mut self.scratch);
        self.painter.extend(self.scratch.drain(..));
    }

    fn blit(&mut self, layer: &Layer, opacity: f32) {
        if opacity <= 0.0 || layer.is_empty() {
            return;
        }
        let shapes = self.cache.shapes(layer, self.origin).iter().cloned();
        if opacity >= 1.0 {
            self.painter.extend(shapes);
        } else {
            let mut faded = self.painter.clone();
            faded.set_opacity(opacity);
            faded.extend(shapes);
        }
    }
}

/// Formats a day phase as a 24-hour clock time.
fn clock_time(phase: f32) -> String {
    let minutes = (phase.rem_euclid(1.0) * 24.0 * 60.0) as u32 % (24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Main application state.
///
/// The scene is created on the first frame, once the drawable size is
/// known, so the tree gets to grow from scratch instead of being treated as
/// a resize.
///
/// ### Fields
/// - `cfg` - Configuration the scene is built from.
/// - `scene` - The running scene, `None` until the first frame.
/// - `scheduler` - Turns egui timestamps into frame deltas.
/// - `shapes` - Converted shapes of baked layers.
/// - `speed` - Currently selected speed multiplier.
pub struct Viewer {
    cfg: Config,
    scene: Option<Scene>,
    scheduler: FrameScheduler,
    shapes: LayerShapeCache,
    speed: f32,
}

impl Viewer {
    pub fn new(cfg: Config) -> Self {
        Self {
            speed: cfg.speed,
            cfg,
            scene: None,
            scheduler: FrameScheduler::new(),
            shapes: LayerShapeCache::default(),
        }
    }

    fn select_speed(&mut self, speed: f32) {
        self.speed = speed;
        if let Some(scene) = &mut self.scene {
            scene.set_speed(speed);
        }
        log::info!("speed set to {speed}x");
    }

    /// Builds the small floating toolbar with the speed selector.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("toolbar".into())
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(Color32::from_rgba_unmultiplied(0, 0, 0, 64))
                    .inner_margin(4.0)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            for speed in SPEEDS {
                                if ui
                                    .selectable_label(self.speed == speed, format!("{speed}×"))
                                    .clicked()
                                    && self.speed != speed
                                {
                                    self.select_speed(speed);
                                }
                            }
                        });
                    });
            });
    }

    /// Builds the bottom status bar (populations and time of day).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let Some(scene) = &self.scene else {
            return;
        };
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("time = {}", clock_time(scene.phase())));
                ui.label(format!("growth = {:.2}", scene.growth()));
                ui.separator();
                ui.label(format!("petals = {}", scene.petals().len()));
                ui.label(format!(
                    "blossoms = {}/{}",
                    scene.blossoms().baked_count(),
                    scene.blossoms().len()
                ));
                ui.label(format!("branches = {}", scene.tree().len()));
            });
        });
    }

    /// Builds the central panel, ticks the scene and paints it.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter_at(rect);
                let size = Vec2::new(rect.width(), rect.height());
                let now = ctx.input(|i| i.time);

                let scene = self.scene.get_or_insert_with(|| Scene::new(self.cfg, size));
                scene.resize(size);

                let mut canvas = EguiCanvas::new(&painter, rect, &mut self.shapes);
                self.scheduler.run_frame(scene, now, &mut canvas);
                self.shapes.end_frame();

                ctx.request_repaint();
            });
    }
}

impl App for Viewer {
    /// eframe callback: panels first, then the scene fills what is left.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_status_bar(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f32) -> Primitive {
        Primitive::Circle {
            center: Vec2::new(x, 5.0),
            radius: 2.0,
            fill: Rgba::rgb([200, 100, 50]),
        }
    }

    fn mesh_of(shape: &Shape) -> &Mesh {
        match shape {
            Shape::Mesh(mesh) => mesh,
            other => panic!("expected mesh, got {other:?}"),
        }
    }

    #[test]
    fn colors_convert_with_alpha() {
        assert_eq!(to_color(Rgba::rgb([1, 2, 3])), Color32::from_rgb(1, 2, 3));
        assert_eq!(to_color(Rgba::TRANSPARENT).a(), 0);
    }

    #[test]
    fn vertical_gradient_becomes_strip_mesh() {
        let stops = vec![
            ColorStop::new(0.0, Rgba::rgb([0, 0, 0])),
            ColorStop::new(0.4, Rgba::rgb([10, 10, 10])),
            ColorStop::new(0.7, Rgba::rgb([20, 20, 20])),
            ColorStop::new(1.0, Rgba::rgb([30, 30, 30])),
        ];
        let mut out = Vec::new();
        primitive_to_shapes(
            &Primitive::VerticalGradient {
                min: Vec2::ZERO,
                max: Vec2::new(100.0, 50.0),
                stops,
            },
            egui::vec2(10.0, 20.0),
            &mut out,
        );
        let mesh = mesh_of(&out[0]);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 3 * 6);
        assert_eq!(mesh.vertices[0].pos, egui::pos2(10.0, 20.0));
        assert_eq!(mesh.vertices[7].pos, egui::pos2(110.0, 70.0));
    }

    #[test]
    fn radial_gradient_has_a_ring_per_stop() {
        let mut out = Vec::new();
        primitive_to_shapes(
            &Primitive::RadialGradient {
                center: Vec2::new(50.0, 50.0),
                inner_radius: 0.0,
                radius: 20.0,
                stops: vec![
                    ColorStop::new(0.0, Rgba::new(255, 255, 255, 0.8)),
                    ColorStop::new(1.0, Rgba::new(255, 255, 255, 0.0)),
                ],
            },
            egui::Vec2::ZERO,
            &mut out,
        );
        let mesh = mesh_of(&out[0]);
        assert_eq!(mesh.vertices.len(), 1 + 2 * RING_SEGMENTS);
        assert_eq!(mesh.indices.len(), 3 * 3 * RING_SEGMENTS);
    }

    #[test]
    fn degenerate_primitives_are_skipped() {
        let mut out = Vec::new();
        primitive_to_shapes(
            &Primitive::GradientLine {
                from: Vec2::ONE,
                to: Vec2::ONE,
                width: 2.0,
                stops: vec![ColorStop::new(0.0, Rgba::rgb([1, 1, 1]))],
            },
            egui::Vec2::ZERO,
            &mut out,
        );
        primitive_to_shapes(
            &Primitive::Polyline {
                points: vec![Vec2::ZERO],
                width: 1.0,
                color: Rgba::rgb([1, 1, 1]),
            },
            egui::Vec2::ZERO,
            &mut out,
        );
        primitive_to_shapes(
            &Primitive::Circle {
                center: Vec2::ZERO,
                radius: 0.0,
                fill: Rgba::rgb([1, 1, 1]),
            },
            egui::Vec2::ZERO,
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn ellipse_is_rotated_polygon() {
        let mut out = Vec::new();
        primitive_to_shapes(
            &Primitive::Ellipse {
                center: Vec2::ZERO,
                radii: Vec2::new(4.0, 2.0),
                rotation: std::f32::consts::FRAC_PI_2,
                fill: Rgba::rgb([255, 0, 0]),
            },
            egui::Vec2::ZERO,
            &mut out,
        );
        let Shape::Path(path) = &out[0] else {
            panic!("expected path");
        };
        assert_eq!(path.points.len(), ELLIPSE_POINTS);
        // The major axis now points down the y axis.
        assert!((path.points[0].x).abs() < 1e-4);
        assert!((path.points[0].y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn cache_converts_appended_primitives_only() {
        let mut cache = LayerShapeCache::default();
        let mut layer = Layer::new(Vec2::splat(100.0));
        layer.draw(circle(1.0));
        layer.draw(circle(2.0));

        assert_eq!(cache.shapes(&layer, egui::Vec2::ZERO).len(), 2);
        layer.draw(circle(3.0));
        let shapes = cache.shapes(&layer, egui::Vec2::ZERO);
        assert_eq!(shapes.len(), 3);
        let Shape::Circle(c) = &shapes[2] else {
            panic!("expected circle");
        };
        assert_eq!(c.center, egui::pos2(3.0, 5.0));
    }

    #[test]
    fn cache_forgets_unused_layers_and_moved_origins() {
        let mut cache = LayerShapeCache::default();
        let mut a = Layer::new(Vec2::splat(10.0));
        a.draw(circle(1.0));
        let b = Layer::new(Vec2::splat(10.0));

        cache.shapes(&a, egui::Vec2::ZERO);
        cache.shapes(&b, egui::Vec2::ZERO);
        cache.end_frame();
        assert_eq!(cache.len(), 2);

        cache.shapes(&a, egui::Vec2::ZERO);
        cache.end_frame();
        assert_eq!(cache.len(), 1);

        let moved = cache.shapes(&a, egui::vec2(5.0, 0.0));
        let Shape::Circle(c) = &moved[0] else {
            panic!("expected circle");
        };
        assert_eq!(c.center, egui::pos2(6.0, 5.0));
    }

    #[test]
    fn clock_time_maps_phase_to_hours() {
        assert_eq!(clock_time(0.0), "00:00");
        assert_eq!(clock_time(0.5), "12:00");
        assert_eq!(clock_time(0.75), "18:00");
        assert_eq!(clock_time(1.25), "06:00");
    }

    #[test]
    fn scene_waits_for_first_frame_and_speed_sticks() {
        let mut viewer = Viewer::new(Config::default());
        assert!(viewer.scene.is_none());

        viewer.select_speed(2.0);
        assert_eq!(viewer.speed, 2.0);

        viewer.scene = Some(Scene::new(
            Config {
                seed: Some(1),
                ..Config::default()
            },
            Vec2::new(320.0, 240.0),
        ));
        viewer.select_speed(1.0);
        assert_eq!(viewer.scene.as_ref().map(Scene::speed), Some(1.0));
    }
}

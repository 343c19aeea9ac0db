//! Stochastic branch builder and its growth schedule.
//!
//! A [`Tree`] is a flat arena of [`Branch`]es. Each branch is a quadratic
//! curve that knows its parent by index. After generation the arena is
//! sorted by delay level and every parent index is smaller than the index of
//! its child, so a single forward pass can derive anything that flows from
//! parent to child (the growth schedule, live start points).

use crate::{
    config::TreeConfig,
    paint::{Canvas, Primitive, Rgba},
    types::BranchId,
};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI};

/// Steepest allowed leftward lean (just above horizontal).
const ANGLE_MIN: f32 = -PI * 0.94;
/// Steepest allowed rightward lean.
const ANGLE_MAX: f32 = -PI * 0.06;

const TRUNK_JITTER: f32 = 0.03;
const THICKNESS_STEP: f32 = 1.6;
/// Control point offset as a fraction of segment length.
const BEND: f32 = 0.15;
/// Total angular fan spread across the children of one branch.
const FAN: f32 = 1.2;
const ANGLE_JITTER: f32 = 0.2;
const SIDE_SPAWN_MIN: f32 = 0.4;
const SIDE_SPAWN_MAX: f32 = 0.85;
const SIDE_LENGTH_PENALTY: f32 = 0.8;
const MIN_VISIBLE_PROGRESS: f32 = 0.001;

pub const INNER_BARK: Rgba = Rgba::rgb([0x3d, 0x2b, 0x1f]);
pub const OUTER_BARK: Rgba = Rgba::rgb([0x5a, 0x3a, 0x28]);

/// Evaluates the quadratic Bézier `p0 → c → p1` at `t`.
#[inline]
pub fn quad_point(t: f32, p0: Vec2, c: Vec2, p1: Vec2) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + c * (2.0 * u * t) + p1 * (t * t)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Branch {
    pub start: Vec2,
    pub end: Vec2,
    pub control: Vec2,
    pub depth: u32,
    pub thickness: f32,
    pub delay: u32,
    pub parent: Option<BranchId>,
    /// Where on the parent curve this branch sprouts (1 = parent tip).
    pub spawn_t: f32,
    /// Growth value at which this branch starts extending.
    pub grow_start: f32,
}

impl Branch {
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec2 {
        quad_point(t, self.start, self.control, self.end)
    }

    pub fn bark(&self) -> Rgba {
        if self.depth < 3 { INNER_BARK } else { OUTER_BARK }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tree {
    pub branches: Vec<Branch>,
    pub max_delay: u32,
    /// Growth span one branch takes to extend fully.
    pub level_duration: f32,
}

struct Sprout {
    origin: Vec2,
    angle: f32,
    length: f32,
    depth: u32,
    delay: u32,
    parent: Option<BranchId>,
    spawn_t: f32,
}

struct Builder<'a, R: Rng> {
    rng: &'a mut R,
    cfg: &'a TreeConfig,
    size: Vec2,
    branches: Vec<Branch>,
}

impl<R: Rng> Builder<'_, R> {
    fn in_bounds(&self, p: Vec2) -> bool {
        p.x >= self.cfg.edge_pad
            && p.x <= self.size.x - self.cfg.edge_pad
            && p.y >= self.size.y * self.cfg.top_margin
    }

    fn child_count(&mut self, depth: u32) -> usize {
        if depth + 1 >= self.cfg.max_depth {
            return 0;
        }
        if depth == 0 {
            return if self.rng.random_bool(0.5) { 3 } else { 2 };
        }
        let r: f32 = self.rng.random();
        if r < 0.05 {
            0
        } else if r < 0.15 {
            1
        } else if r < 0.60 {
            2
        } else if r < 0.85 {
            3
        } else {
            4
        }
    }

    fn grow(&mut self, sprout: Sprout) {
        let Sprout {
            origin,
            angle,
            length,
            depth,
            delay,
            parent,
            spawn_t,
        } = sprout;

        if depth > self.cfg.max_depth || length.is_nan() || length < self.cfg.min_length {
            return;
        }

        let angle = angle.clamp(ANGLE_MIN, ANGLE_MAX);
        let (sin, cos) = angle.sin_cos();
        let end = origin + Vec2::new(cos, sin) * length;

        // Out-of-bounds segments are dropped along with their subtree.
        if !self.in_bounds(end) {
            return;
        }

        let bend = self.rng.random_range(-BEND..BEND) * length;
        let control = (origin + end) * 0.5 + Vec2::new(-sin, cos) * bend;

        let id = self.branches.len();
        self.branches.push(Branch {
            start: origin,
            end,
            control,
            depth,
            thickness: (self.cfg.max_depth.saturating_sub(depth) as f32 * THICKNESS_STEP)
                .max(1.0),
            delay,
            parent,
            spawn_t,
            grow_start: 0.0,
        });

        let shrink: f32 = self.rng.random_range(0.55..0.75);
        let side_chance = f64::from(self.cfg.side_branch_chance).clamp(0.0, 1.0);
        let count = self.child_count(depth);
        let fan_steps = count.saturating_sub(1).max(1) as f32;

        for i in 0..count {
            let spread = (i as f32 / fan_steps - 0.5) * FAN;
            let jitter = self.rng.random_range(-ANGLE_JITTER..ANGLE_JITTER);
            let child_shrink = shrink * self.rng.random_range(0.85..1.15);

            let (spawn_t, child_origin, penalty) =
                if depth >= 1 && self.rng.random_bool(side_chance) {
                    let t = self.rng.random_range(SIDE_SPAWN_MIN..SIDE_SPAWN_MAX);
                    (t, quad_point(t, origin, control, end), SIDE_LENGTH_PENALTY)
                } else {
                    (1.0, end, 1.0)
                };

            self.grow(Sprout {
                origin: child_origin,
                angle: angle + spread + jitter,
                length: length * child_shrink * penalty,
                depth: depth + 1,
                delay: delay + 1,
                parent: Some(id),
                spawn_t,
            });
        }
    }
}

/// Sorts branches by delay level and rewrites every parent reference
/// through an explicit old→new index map.
///
/// The sort is stable, so branches sharing a delay level keep their
/// generation order. Parents always carry a smaller delay than their
/// children, which makes every rewritten parent index point backwards.
pub fn reindex_by_delay(branches: Vec<Branch>) -> Vec<Branch> {
    let mut order: Vec<BranchId> = (0..branches.len()).collect();
    order.sort_by_key(|&old| branches[old].delay);

    let mut remap = vec![0; branches.len()];
    for (new, &old) in order.iter().enumerate() {
        remap[old] = new;
    }

    order
        .iter()
        .map(|&old| {
            let mut b = branches[old];
            b.parent = b.parent.map(|p| remap[p]);
            b
        })
        .collect()
}

impl Tree {
    /// Grows a fresh tree for a surface of the given size.
    ///
    /// The trunk is anchored at the bottom of the surface and the whole
    /// structure grows upwards. A surface without area yields an empty tree.
    ///
    /// ### Parameters
    /// - `size` - Surface width and height in pixels.
    /// - `cfg` - Recursion bounds and shape tunables.
    /// - `schedule_span` - Growth span shared out between delay levels.
    /// - `rng` - Random source for every stochastic choice.
    pub fn generate(
        size: Vec2,
        cfg: &TreeConfig,
        schedule_span: f32,
        rng: &mut impl Rng,
    ) -> Self {
        if !(size.x > 0.0 && size.y > 0.0) {
            return Self::default();
        }

        let mut builder = Builder {
            rng,
            cfg,
            size,
            branches: Vec::with_capacity(256),
        };
        let trunk_angle = -FRAC_PI_2 + builder.rng.random_range(-TRUNK_JITTER..TRUNK_JITTER);
        builder.grow(Sprout {
            origin: Vec2::new(size.x * cfg.trunk_x, size.y),
            angle: trunk_angle,
            length: size.y * cfg.trunk_length,
            depth: 0,
            delay: 0,
            parent: None,
            spawn_t: 1.0,
        });

        Self::from_branches(builder.branches, schedule_span)
    }

    /// Builds a tree from branches in any order: reindexes, then schedules.
    pub fn from_branches(branches: Vec<Branch>, schedule_span: f32) -> Self {
        let mut tree = Self {
            branches: reindex_by_delay(branches),
            max_delay: 0,
            level_duration: 0.0,
        };
        tree.schedule(schedule_span);
        tree
    }

    /// Assigns `grow_start` to every branch.
    ///
    /// Roots start at zero. A child unlocks once its parent has grown as
    /// far as the child's `spawn_t`, so its start is the parent's start plus
    /// that fraction of one level duration.
    fn schedule(&mut self, schedule_span: f32) {
        self.max_delay = self.branches.iter().map(|b| b.delay).max().unwrap_or(0);
        self.level_duration = schedule_span / (self.max_delay.max(1) + 1) as f32;

        for i in 0..self.branches.len() {
            let grow_start = match self.branches[i].parent {
                None => 0.0,
                Some(p) => {
                    debug_assert!(p < i, "parent {p} not before child {i}");
                    self.branches[p].grow_start + self.level_duration * self.branches[i].spawn_t
                }
            };
            self.branches[i].grow_start = grow_start;
        }
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Growth value at which the last branch finishes extending.
    pub fn fully_grown_at(&self) -> f32 {
        self.branches
            .iter()
            .map(|b| b.grow_start + self.level_duration)
            .fold(0.0, f32::max)
    }

    /// Local extension progress of one branch in `[0, 1]`.
    pub fn progress(&self, id: BranchId, growth: f32) -> f32 {
        if self.level_duration <= 0.0 {
            return 1.0;
        }
        ((growth - self.branches[id].grow_start) / self.level_duration).clamp(0.0, 1.0)
    }

    /// Start point of a branch as it is drawn: the point on the parent's
    /// curve at `spawn_t`, or the branch's own start for roots.
    pub fn live_start(&self, id: BranchId) -> Vec2 {
        let b = &self.branches[id];
        match b.parent {
            Some(p) => self.branches[p].point_at(b.spawn_t),
            None => b.start,
        }
    }

    /// The currently visible part of a branch as a polyline.
    ///
    /// Returns `None` while the branch has not started growing. Otherwise
    /// the path holds the live start point followed by `samples` points
    /// along the curve up to the current progress.
    pub fn visible_path(&self, id: BranchId, growth: f32, samples: usize) -> Option<Vec<Vec2>> {
        let b = &self.branches[id];
        if growth < b.grow_start {
            return None;
        }
        let progress = self.progress(id, growth);
        if progress < MIN_VISIBLE_PROGRESS {
            return None;
        }

        let start = self.live_start(id);
        // Keep the bend of the stored curve relative to the live chord.
        let control = (start + b.end) * 0.5 + (b.control - (b.start + b.end) * 0.5);
        let samples = samples.max(1);

        let mut points = Vec::with_capacity(samples + 1);
        points.push(start);
        for j in 1..=samples {
            let t = j as f32 / samples as f32 * progress;
            points.push(quad_point(t, start, control, b.end));
        }
        Some(points)
    }

    /// Draws every visible branch at the given growth.
    pub fn draw(&self, growth: f32, samples: usize, canvas: &mut impl Canvas) {
        for (id, b) in self.branches.iter().enumerate() {
            let Some(points) = self.visible_path(id, growth, samples) else {
                continue;
            };
            canvas.draw(Primitive::Polyline {
                points,
                width: b.thickness * self.progress(id, growth) + 0.5,
                color: b.bark(),
            });
        }
    }
}

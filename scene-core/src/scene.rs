//! The whole animated scene: one tree, its blossoms and petals, and the sky
//! behind them.

use crate::{
    blossom::BlossomSet,
    cache::RenderCache,
    celestial::{self, CelestialClock},
    clouds::Clouds,
    config::Config,
    growth::GrowthClock,
    paint::{Canvas, Pass},
    petals::PetalSystem,
    sky,
    stars::{ShootingStars, StarField},
    tree::Tree,
    types::NOMINAL_FRAME_SECS,
};
use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Owns every population, both clocks and the render caches.
///
/// `tick` is the only place state moves forward; `draw` only reads. Drawing
/// twice without a tick in between produces the same output.
pub struct Scene {
    cfg: Config,
    size: Vec2,
    speed: f32,
    rng: StdRng,
    /// Unscaled seconds since start, used for twinkling.
    elapsed_secs: f64,
    growth: GrowthClock,
    celestial: CelestialClock,
    tree: Tree,
    blossoms: BlossomSet,
    petals: PetalSystem,
    stars: StarField,
    shooting_stars: ShootingStars,
    clouds: Clouds,
    cache: RenderCache,
}

impl Scene {
    /// Builds a scene for a surface of `size` pixels.
    ///
    /// The random source is seeded from `cfg.seed` when set, otherwise from
    /// the thread RNG. The day starts at `cfg.start_phase` or at a random
    /// time of day.
    pub fn new(cfg: Config, size: Vec2) -> Self {
        let seed = cfg.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let start_phase = cfg.start_phase.unwrap_or_else(|| rng.random());
        let mut celestial = CelestialClock::new(cfg.sky.day_cycle_secs, start_phase, &mut rng);
        celestial.locate(size);
        let shooting_stars = ShootingStars::new(&mut rng);

        let mut scene = Self {
            size,
            speed: cfg.speed,
            rng,
            elapsed_secs: 0.0,
            growth: GrowthClock::new(&cfg.growth),
            celestial,
            tree: Tree::default(),
            blossoms: BlossomSet::from_blossoms(Vec::new(), &cfg.blossom),
            petals: PetalSystem::new(&cfg.petals),
            stars: StarField::default(),
            shooting_stars,
            clouds: Clouds::default(),
            cache: RenderCache::new(size),
            cfg,
        };
        scene.populate();
        log::info!("scene seed {seed}, day phase {start_phase:.3}");
        scene
    }

    /// Regenerates every size-dependent population and drops all caches.
    fn populate(&mut self) {
        let size = self.size;
        self.cache = RenderCache::new(size);
        self.tree = Tree::generate(
            size,
            &self.cfg.tree,
            self.cfg.growth.schedule_span,
            &mut self.rng,
        );
        self.blossoms = BlossomSet::generate(&self.tree, &self.cfg.blossom, &mut self.rng);
        self.stars = StarField::generate(
            size,
            &self.cfg.stars,
            self.cache.stars_mut(),
            &mut self.rng,
        );
        self.clouds = Clouds::generate(size, &self.cfg.clouds, &mut self.rng);

        log::info!(
            "scene {}x{}: {} branches (max delay {}), {} blossoms, {} stars ({} twinkling), {} clouds",
            size.x,
            size.y,
            self.tree.len(),
            self.tree.max_delay,
            self.blossoms.len(),
            self.stars.len(),
            self.stars.twinklers().len(),
            self.clouds.len(),
        );
    }

    /// Adapts to a new surface size.
    ///
    /// The tree, blossoms, stars and clouds are regenerated and growth jumps
    /// to fully grown. The day phase and live petals are kept.
    pub fn resize(&mut self, size: Vec2) {
        if size == self.size {
            return;
        }
        log::info!("resize {}x{} -> {}x{}", self.size.x, self.size.y, size.x, size.y);
        self.size = size;
        self.populate();
        self.growth.fast_forward();
        self.celestial.locate(size);
    }

    /// Sets the time multiplier. Clocks keep their current values.
    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        } else {
            log::warn!("ignoring invalid speed {speed}");
        }
    }

    /// Advances the scene by `dt_secs` of real time.
    pub fn tick(&mut self, dt_secs: f32) {
        let raw = dt_secs.max(0.0);
        let scaled = raw * self.speed;
        let frames = scaled / NOMINAL_FRAME_SECS;
        self.elapsed_secs += f64::from(raw);

        self.growth.advance(scaled);
        self.celestial.advance(scaled, self.size, &mut self.rng);
        let night = self.celestial.night_visibility();

        self.clouds.update(frames, self.size.x);
        self.shooting_stars.update(frames, night, self.size, &mut self.rng);

        let growth = self.growth.growth();
        self.cache.bake_tree(&self.tree, growth, self.cfg.growth.path_samples);
        let baked = self.blossoms.bake_step(growth, self.cache.blossoms_mut());
        if baked > 0 {
            log::trace!(
                "baked {baked} blossoms ({}/{})",
                self.blossoms.baked_count(),
                self.blossoms.len()
            );
        }

        self.petals.step(frames, &self.blossoms, self.size, &mut self.rng);
    }

    /// Paints the current state back to front.
    pub fn draw(&self, canvas: &mut impl Canvas) {
        let phase = self.celestial.phase();
        let night = self.celestial.night_visibility();
        let growth = self.growth.growth();

        canvas.begin_pass(Pass::Sky);
        sky::draw_sky(phase, canvas);

        canvas.begin_pass(Pass::SkyGlow);
        celestial::draw_sky_light(self.celestial.sun(), self.celestial.moon(), canvas);

        canvas.begin_pass(Pass::Clouds);
        self.clouds.draw(night, canvas);

        canvas.begin_pass(Pass::Stars);
        self.stars.draw(self.cache.stars(), night, self.elapsed_secs, canvas);

        canvas.begin_pass(Pass::ShootingStars);
        self.shooting_stars.draw(canvas);

        canvas.begin_pass(Pass::Sun);
        if let Some(sun) = self.celestial.sun() {
            celestial::draw_sun(sun, canvas);
        }

        canvas.begin_pass(Pass::Moon);
        if let Some(moon) = self.celestial.moon() {
            celestial::draw_moon(moon, canvas);
        }

        canvas.begin_pass(Pass::Ground);
        sky::draw_ground(night, canvas);

        canvas.begin_pass(Pass::Tree);
        match self.cache.tree() {
            Some(snapshot) => canvas.blit(snapshot, 1.0),
            None => self.tree.draw(growth, self.cfg.growth.path_samples, canvas),
        }

        canvas.begin_pass(Pass::Blossoms);
        self.blossoms.draw(self.cache.blossoms(), growth, canvas);

        canvas.begin_pass(Pass::Petals);
        self.petals.draw(canvas);
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn growth(&self) -> f32 {
        self.growth.growth()
    }

    pub fn phase(&self) -> f32 {
        self.celestial.phase()
    }

    pub fn night_visibility(&self) -> f32 {
        self.celestial.night_visibility()
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn blossoms(&self) -> &BlossomSet {
        &self.blossoms
    }

    pub fn petals(&self) -> &PetalSystem {
        &self.petals
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    pub fn shooting_stars(&self) -> &ShootingStars {
        &self.shooting_stars
    }

    pub fn clouds(&self) -> &Clouds {
        &self.clouds
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Layer, Primitive};

    const SIZE: Vec2 = Vec2::new(1000.0, 800.0);

    fn scene(seed: u64, phase: f32) -> Scene {
        let cfg = Config {
            seed: Some(seed),
            start_phase: Some(phase),
            ..Config::default()
        };
        Scene::new(cfg, SIZE)
    }

    /// Records primitives per pass.
    struct Recorder {
        size: Vec2,
        passes: Vec<Pass>,
        drawn: Vec<(Pass, Primitive)>,
    }

    impl Recorder {
        fn new(size: Vec2) -> Self {
            Self {
                size,
                passes: Vec::new(),
                drawn: Vec::new(),
            }
        }

        fn in_pass(&self, pass: Pass) -> usize {
            self.drawn.iter().filter(|(p, _)| *p == pass).count()
        }
    }

    impl Canvas for Recorder {
        fn size(&self) -> Vec2 {
            self.size
        }

        fn draw(&mut self, primitive: Primitive) {
            let pass = *self.passes.last().expect("draw outside a pass");
            self.drawn.push((pass, primitive));
        }

        fn blit(&mut self, layer: &Layer, opacity: f32) {
            for p in layer.primitives() {
                self.draw(p.clone().with_opacity(opacity));
            }
        }

        fn begin_pass(&mut self, pass: Pass) {
            self.passes.push(pass);
        }
    }

    #[test]
    fn passes_run_back_to_front() {
        let mut scene = scene(1, 0.0);
        scene.tick(0.5);
        let mut rec = Recorder::new(SIZE);
        scene.draw(&mut rec);
        assert_eq!(rec.passes, Pass::BACK_TO_FRONT);
    }

    #[test]
    fn midnight_shows_stars_and_noon_hides_them() {
        let mut night = Recorder::new(SIZE);
        let mut s = scene(2, 0.0);
        s.tick(0.0);
        s.draw(&mut night);
        assert!(night.in_pass(Pass::Stars) > 0);
        assert_eq!(night.in_pass(Pass::Sun), 0);

        let mut noon = Recorder::new(SIZE);
        let mut s = scene(2, 0.5);
        s.tick(0.0);
        s.draw(&mut noon);
        assert_eq!(noon.in_pass(Pass::Stars), 0);
        assert_eq!(noon.in_pass(Pass::Moon), 0);
        assert!(noon.in_pass(Pass::Sun) > 0);
    }

    #[test]
    fn drawing_twice_without_tick_is_identical() {
        let mut scene = scene(3, 0.9);
        // Far enough for the tree snapshot and a first bake batch.
        scene.tick(45.0);
        assert!(scene.cache().tree().is_some());
        assert!(scene.blossoms().baked_count() > 0);

        let before = scene.cache().clone();
        let mut a = Layer::new(SIZE);
        let mut b = Layer::new(SIZE);
        scene.draw(&mut a);
        scene.draw(&mut b);

        assert_eq!(a.primitives(), b.primitives());
        assert_eq!(scene.cache().blossoms(), before.blossoms());
        assert_eq!(scene.cache().tree(), before.tree());
        assert_eq!(scene.cache().stars(), before.stars());
    }

    #[test]
    fn snapshot_replaces_live_tree_strokes() {
        let mut scene = scene(4, 0.5);
        scene.tick(10.0);
        assert!(scene.cache().tree().is_none());

        scene.tick(40.0);
        let snapshot = scene.cache().tree().expect("snapshot taken").clone();
        let mut rec = Recorder::new(SIZE);
        scene.draw(&mut rec);
        assert_eq!(rec.in_pass(Pass::Tree), snapshot.len());
        assert_eq!(snapshot.len(), scene.tree().len());
    }

    #[test]
    fn petals_wait_for_two_baked_blossoms() {
        let mut scene = scene(5, 0.5);
        for _ in 0..2000 {
            scene.tick(NOMINAL_FRAME_SECS);
            if scene.blossoms().baked_count() < 2 {
                assert!(scene.petals().is_empty());
            }
        }
    }

    #[test]
    fn resize_regenerates_and_keeps_phase() {
        let mut scene = scene(6, 0.3);
        scene.tick(1.0);
        let phase = scene.phase();
        let old_blossom_layer = scene.cache().blossoms().id();

        scene.resize(Vec2::new(600.0, 900.0));
        assert_eq!(scene.size(), Vec2::new(600.0, 900.0));
        assert_eq!(scene.phase(), phase);
        assert!((scene.growth() - 1.6).abs() < 1e-5);
        assert_ne!(scene.cache().blossoms().id(), old_blossom_layer);
        assert!(scene.cache().tree().is_none());
        assert_eq!(scene.tree().branches[0].start, Vec2::new(288.0, 900.0));

        // Fully grown, so the next tick snapshots the new tree right away.
        scene.tick(NOMINAL_FRAME_SECS);
        assert!(scene.cache().tree().is_some());
    }

    #[test]
    fn speed_change_keeps_clocks() {
        let mut scene = scene(7, 0.5);
        scene.tick(3.0);
        let growth = scene.growth();
        let phase = scene.phase();

        scene.set_speed(2.0);
        assert_eq!(scene.growth(), growth);
        assert_eq!(scene.phase(), phase);

        scene.tick(3.0);
        assert!((scene.growth() - (growth + 6.0 / 30.0)).abs() < 1e-5);

        scene.set_speed(0.0);
        assert_eq!(scene.speed(), 2.0);
    }

    #[test]
    fn zero_area_scene_runs() {
        let cfg = Config {
            seed: Some(8),
            ..Config::default()
        };
        let mut scene = Scene::new(cfg, Vec2::ZERO);
        assert!(scene.tree().is_empty());
        assert!(scene.blossoms().is_empty());
        assert!(scene.stars().is_empty());

        for _ in 0..10 {
            scene.tick(1.0);
        }
        let mut out = Layer::new(Vec2::ZERO);
        scene.draw(&mut out);
        assert!(scene.petals().is_empty());
    }

    #[test]
    fn same_seed_same_scene() {
        let a = scene(10, 0.25);
        let b = scene(10, 0.25);
        assert_eq!(a.tree().branches, b.tree().branches);
        assert_eq!(a.blossoms().blossoms(), b.blossoms().blossoms());
        assert_eq!(a.clouds().clouds(), b.clouds().clouds());
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Recursion stops once a branch would be deeper than this.
    pub max_depth: u32,
    /// Recursion stops once a segment would be shorter than this (pixels).
    pub min_length: f32,
    /// Horizontal margin a branch end must keep from the surface edges.
    pub edge_pad: f32,
    /// Top margin as a fraction of the surface height.
    pub top_margin: f32,
    /// Trunk anchor x as a fraction of the surface width.
    pub trunk_x: f32,
    /// Trunk length as a fraction of the surface height.
    pub trunk_length: f32,
    /// Chance that a non-trunk child sprouts mid-curve instead of at the tip.
    pub side_branch_chance: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_length: 4.0,
            edge_pad: 15.0,
            top_margin: 0.03,
            trunk_x: 0.48,
            trunk_length: 0.25,
            side_branch_chance: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Real seconds (at 1x) for growth to advance by 1.0.
    pub duration_secs: f32,
    /// Upper clamp of the growth scalar.
    pub max_growth: f32,
    /// Growth span shared out between delay levels.
    pub schedule_span: f32,
    /// Polyline samples per visible branch.
    pub path_samples: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            max_growth: 1.6,
            schedule_span: 1.2,
            path_samples: 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlossomConfig {
    pub min_depth: u32,
    pub chance: f32,
    /// Random extra added to each appear threshold.
    pub appear_spread: f32,
    /// Growth span of the fade-in ramp.
    pub fade_span: f32,
    /// Most blossoms baked in one frame.
    pub bake_cap: usize,
}

impl Default for BlossomConfig {
    fn default() -> Self {
        Self {
            min_depth: 7,
            chance: 0.6,
            appear_spread: 0.8,
            fade_span: 0.12,
            bake_cap: 15,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetalConfig {
    pub max_petals: usize,
    /// Spawn interval in frames when only a couple of blossoms are out.
    pub sparse_interval: u32,
    /// Petals start fading below this fraction of the surface height.
    pub fade_line: f32,
}

impl Default for PetalConfig {
    fn default() -> Self {
        Self {
            max_petals: 80,
            sparse_interval: 30,
            fade_line: 0.85,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    /// Real seconds (at 1x) for one full day/night cycle.
    pub day_cycle_secs: f32,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            day_cycle_secs: 300.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    /// Surface pixels per star.
    pub area_per_star: f32,
    pub twinkle_fraction: f32,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            area_per_star: 6000.0,
            twinkle_fraction: 0.12,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub min_clouds: usize,
    pub max_clouds: usize,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            min_clouds: 5,
            max_clouds: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed scene seed. `None` picks a fresh one per run.
    pub seed: Option<u64>,
    /// Initial speed multiplier.
    pub speed: f32,
    /// Fixed starting day phase. `None` starts at a random time of day.
    pub start_phase: Option<f32>,
    pub tree: TreeConfig,
    pub growth: GrowthConfig,
    pub blossom: BlossomConfig,
    pub petals: PetalConfig,
    pub sky: SkyConfig,
    pub stars: StarConfig,
    pub clouds: CloudConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            speed: 1.0,
            start_phase: None,
            tree: TreeConfig::default(),
            growth: GrowthConfig::default(),
            blossom: BlossomConfig::default(),
            petals: PetalConfig::default(),
            sky: SkyConfig::default(),
            stars: StarConfig::default(),
            clouds: CloudConfig::default(),
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, v: f32) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be > 0, got {v}")))
            }
        }
        fn probability(name: &str, v: f32) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {v}"
                )))
            }
        }

        positive("speed", self.speed)?;
        positive("tree.min_length", self.tree.min_length)?;
        positive("growth.duration_secs", self.growth.duration_secs)?;
        positive("growth.max_growth", self.growth.max_growth)?;
        positive("growth.schedule_span", self.growth.schedule_span)?;
        positive("blossom.fade_span", self.blossom.fade_span)?;
        positive("sky.day_cycle_secs", self.sky.day_cycle_secs)?;
        positive("stars.area_per_star", self.stars.area_per_star)?;

        probability("tree.side_branch_chance", self.tree.side_branch_chance)?;
        probability("tree.trunk_x", self.tree.trunk_x)?;
        probability("tree.top_margin", self.tree.top_margin)?;
        probability("blossom.chance", self.blossom.chance)?;
        probability("stars.twinkle_fraction", self.stars.twinkle_fraction)?;
        probability("petals.fade_line", self.petals.fade_line)?;

        if let Some(phase) = self.start_phase {
            probability("start_phase", phase)?;
        }
        if self.growth.path_samples == 0 {
            return Err(ConfigError::Invalid("growth.path_samples must be >= 1".into()));
        }
        if self.blossom.bake_cap == 0 {
            return Err(ConfigError::Invalid("blossom.bake_cap must be >= 1".into()));
        }
        if self.clouds.min_clouds > self.clouds.max_clouds {
            return Err(ConfigError::Invalid(format!(
                "clouds.min_clouds ({}) exceeds clouds.max_clouds ({})",
                self.clouds.min_clouds, self.clouds.max_clouds
            )));
        }
        Ok(())
    }
}

//! Core library for the blossoming tree and its day/night sky.
//!
//! Main components:
//! - [`tree`] - stochastic branch builder and growth schedule.
//! - [`growth`] - the scalar growth clock.
//! - [`blossom`] - blossoms on the outer tips and their bake cursor.
//! - [`petals`] - petals falling from baked blossoms.
//! - [`sky`] - sky keyframes and the night visibility curve.
//! - [`celestial`] - day phase clock, sun and moon.
//! - [`stars`] - star field and shooting stars.
//! - [`clouds`] - drifting clouds.
//! - [`cache`] - bake-once layers.
//! - [`paint`] - drawing primitives, layers and the `Canvas` capability.
//! - [`scene`] - the scene that owns all of the above.
//! - [`frame`] - per-frame driver.
//! - [`config`] - tunables and JSON loading.
//! - [`types`] - shared type aliases and constants.

pub mod blossom;
pub mod cache;
pub mod celestial;
pub mod clouds;
pub mod config;
pub mod frame;
pub mod growth;
pub mod paint;
pub mod petals;
pub mod scene;
pub mod sky;
pub mod stars;
pub mod tree;
pub mod types;

pub use config::{Config, ConfigError};
pub use frame::FrameScheduler;
pub use paint::{Canvas, Layer, LayerId, Pass, Primitive};
pub use scene::Scene;

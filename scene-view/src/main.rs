//! Application entry point for the Blossom Sky viewer.
//!
//! This binary sets up logging and eframe/egui and delegates all per-frame
//! work to [`Viewer`] from the `viewer` module.

mod viewer;

use scene_core::Config;
use std::path::Path;
use viewer::Viewer;

/// Loads the config named by the first command line argument, if any.
///
/// A file that cannot be read or parsed is reported and the defaults are
/// used instead.
fn load_config() -> Config {
    let Some(arg) = std::env::args_os().nth(1) else {
        return Config::default();
    };
    let path = Path::new(&arg);
    match Config::from_json_file(path) {
        Ok(cfg) => {
            log::info!("loaded config from {}", path.display());
            cfg
        }
        Err(err) => {
            log::error!("{}: {err}; falling back to defaults", path.display());
            Config::default()
        }
    }
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = load_config();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Blossom Sky",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(cfg)))),
    )
}

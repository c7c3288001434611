mod app;
mod capture;
mod config;
mod debug;
mod fish;
mod net;
mod overlay;
mod particles;
mod render;
mod scene;

use std::path::Path;

use config::SceneConfig;

fn main() {
    env_logger::init();
    log::info!("Net Catch starting up");

    let config = match std::env::args().nth(1) {
        Some(path) => match SceneConfig::load(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded scene config from {path}");
                config
            }
            Err(e) => {
                log::error!("Bad config {path}: {e:#}");
                std::process::exit(1);
            }
        },
        None => SceneConfig::default(),
    };

    if let Err(e) = app::run(config) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

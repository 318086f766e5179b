use std::path::PathBuf;
use std::process::ExitCode;

use crate::abs::WindowContext;
use crate::config::HarnessConfig;
use crate::lifecycle::RenderLoop;
use crate::viewer::Viewer;

mod abs;
mod config;
mod error;
mod gui;
mod hotreload;
mod lifecycle;
mod logging;
mod quad;
mod viewer;

fn main() -> ExitCode {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    let config = match HarnessConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.log_level);

    log::info!(
        "Starting dockview {} ({}x{}, shaders {} + {})",
        env!("CARGO_PKG_VERSION"),
        config.window.width,
        config.window.height,
        config.shaders.vertex.display(),
        config.shaders.fragment.display()
    );

    let window_config = config.window.clone();
    let mut viewer = Viewer::new(config);
    let mut render_loop = RenderLoop::new();
    let result = render_loop.run(&mut viewer, |hints| {
        WindowContext::open(&window_config, hints)
    });

    match result {
        Ok(()) => {
            log::info!("Exited after {} frames", render_loop.frames());
            ExitCode::SUCCESS
        }
        Err(e) if e.is_fatal() => {
            log::error!("Startup failed: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e} (render loop {:?})", render_loop.state());
            ExitCode::FAILURE
        }
    }
}

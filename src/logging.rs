//! Logger setup.

use std::sync::Once;

use log::LevelFilter;

static INIT: Once = Once::new();

/// Crates whose chatter is capped at `warn` regardless of the configured level.
const QUIET_TARGETS: &[&str] = &["egui", "egui_glow", "egui_dock"];

/// Installs the global logger. Later calls are ignored.
///
/// `RUST_LOG` wins over `level` when it holds a plain level name.
pub fn init(level: &str) {
    INIT.call_once(|| {
        let env = std::env::var("RUST_LOG").ok();
        let level = resolve_level(env.as_deref(), level);

        let mut dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{} {:<5} {}] {}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level);
        for target in QUIET_TARGETS {
            dispatch = dispatch.level_for(*target, level.min(LevelFilter::Warn));
        }

        if let Err(e) = dispatch.chain(std::io::stderr()).apply() {
            eprintln!("Failed to install logger: {e}");
        }
    });
}

fn resolve_level(env: Option<&str>, configured: &str) -> LevelFilter {
    env.and_then(|s| s.trim().parse().ok())
        .or_else(|| configured.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

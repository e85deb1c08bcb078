use chrono::Local;
use eyre::Result;
use fern::Dispatch;

use crate::debug;

/// Sets up the application logger.
///
/// Records are filtered by the scoped debug levels in [`crate::debug`]
/// (the record target is the scope path) and written to the debug sink,
/// stderr unless a file sink was installed.
///
/// `RUST_LOG` seeds the global debug level; unset leaves it silent.
///
/// # Errors
/// * If a logger was already installed
pub fn setup_logger() -> Result<()> {
    // Set global level from RUST_LOG env var; scope specs refine it later
    if let Ok(token) = std::env::var("RUST_LOG") {
        debug::set_global(debug::Level::parse(&token).unwrap_or(debug::Level::Info));
    }

    Dispatch::new()
        // Level gating is entirely scope-driven
        .level(log::LevelFilter::Trace)
        .filter(|metadata| debug::enabled(metadata.target(), metadata.level()))
        // Format log messages with time, level and scope
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ));
        })
        .chain(Box::new(debug::SinkWriter) as Box<dyn std::io::Write + Send>)
        .apply()?;
    Ok(())
}

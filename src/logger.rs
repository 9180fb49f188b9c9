use std::path::Path;

use anyhow::{Context, Result};

/// Routes `log` records to stdout and, optionally, a log file.
///
/// `RUST_LOG` takes precedence over the `debug` flag when it names a level.
pub fn setup(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if debug { log::Level::Debug } else { log::Level::Info };

    let level_filter = std::env::var("RUST_LOG")
        .ok()
        .as_deref()
        .map(str::parse::<log::Level>)
        .transpose()
        .context("RUST_LOG is not a log level")?
        .unwrap_or(default_level)
        .to_level_filter();

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}:{} -- {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                message
            ));
        })
        .level(log::LevelFilter::Warn)
        .level_for(env!("CARGO_CRATE_NAME"), level_filter)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        let file = fern::log_file(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().context("Logger was already initialised")?;
    Ok(())
}
